//! Opcode and operand lookup tables (spec.md §4.2), built once as
//! process-wide immutable maps and consumed read-only by the decoder.
//!
//! Two-byte (`0x0F xx`) and x87 (`0xD8/0xD9/0xDC xx`) escapes are folded
//! into the same `u16` opcode space the tables key on, rather than modeled
//! as a separate enum: `0x0F`-escaped opcodes live at `0x0F00 + byte`,
//! `0xD8` at `0xD800 + byte`, and so on. This keeps `OpKey`/`OPERAND_LOOKUP`
//! single flat maps, matching the "plain data literal" table shape
//! `original_source/src/operatorTable.h` uses for its one-opcode sample.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::encoding::EncodingForm;
use crate::mnemonic::Mnemonic;
use crate::operand::OperandKind;
use crate::prefix::Prefix;

pub const TWO_BYTE_BASE: u16 = 0x0F00;
pub const X87_D8_BASE: u16 = 0xD800;
pub const X87_D9_BASE: u16 = 0xD900;
pub const X87_DC_BASE: u16 = 0xDC00;

/// `-1` (no `/digit` differentiation — the whole opcode selects one
/// mnemonic regardless of ModR/M.reg).
pub const NO_DIGIT: i8 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpKey {
    pub prefix: Prefix,
    pub opcode: u16,
}

impl OpKey {
    pub fn new(prefix: Prefix, opcode: u16) -> Self {
        OpKey { prefix, opcode }
    }
}

pub type OpRow = HashMap<i8, Mnemonic>;

pub static OP_LOOKUP: Lazy<HashMap<OpKey, OpRow>> = Lazy::new(build_op_lookup);

pub type OperandKey = (Prefix, Mnemonic, u16);
/// `(encoding_form, extra_refs, operands)` (spec.md §4.2). `extra_refs`
/// carries auxiliary per-encoding data; the only kind this table needs is
/// the register index an `O`/`Oi` encoding embeds in the opcode's low 3
/// bits (`0x50+r`, `0xB8+r`, ...), at `extra_refs[0]`.
pub type OperandRow = (EncodingForm, Vec<String>, Vec<OperandKind>);

pub static OPERAND_LOOKUP: Lazy<HashMap<OperandKey, OperandRow>> = Lazy::new(build_operand_lookup);

/// Look up the mnemonic for `(prefix, opcode)`, disambiguating by
/// ModR/M.reg (`digit`) when the row carries more than one mnemonic
/// (spec.md §4.2 — falls back to `NO_DIGIT` when the row has no
/// digit-keyed entries), walking the `REXW -> REX -> NONE` / `P66 -> NONE`
/// fallback chain when the exact prefix key has no row at all (spec.md
/// §4.3 step 7 — a plain REX byte with REX.W=0 keys the same rows as NONE
/// for opcodes whose width doesn't change across that split).
pub fn lookup_mnemonic(prefix: Prefix, opcode: u16, digit: Option<u8>) -> Option<Mnemonic> {
    let mut current = Some(prefix);
    while let Some(p) = current {
        if let Some(row) = OP_LOOKUP.get(&OpKey::new(p, opcode)) {
            if let Some(d) = digit {
                if let Some(m) = row.get(&(d as i8)) {
                    return Some(*m);
                }
            }
            if let Some(m) = row.get(&NO_DIGIT) {
                return Some(*m);
            }
        }
        current = p.fallback();
    }
    None
}

pub fn lookup_operands(prefix: Prefix, mnemonic: Mnemonic, opcode: u16) -> Option<&'static OperandRow> {
    OPERAND_LOOKUP.get(&(prefix, mnemonic, opcode))
}

/// One row of the arithmetic group (ADD/OR/ADC/SBB/AND/SUB/XOR/CMP): each
/// shares the same 6-opcode/`/digit` shape, differing only in base opcode
/// and the `/digit` used for the `80`/`81`/`83` immediate forms.
struct ArithGroup {
    mnemonic: Mnemonic,
    base: u8,
    digit: u8,
}

const ARITH_GROUPS: &[ArithGroup] = &[
    ArithGroup { mnemonic: Mnemonic::Add, base: 0x00, digit: 0 },
    ArithGroup { mnemonic: Mnemonic::Or, base: 0x08, digit: 1 },
    ArithGroup { mnemonic: Mnemonic::Adc, base: 0x10, digit: 2 },
    ArithGroup { mnemonic: Mnemonic::Sbb, base: 0x18, digit: 3 },
    ArithGroup { mnemonic: Mnemonic::And, base: 0x20, digit: 4 },
    ArithGroup { mnemonic: Mnemonic::Sub, base: 0x28, digit: 5 },
    ArithGroup { mnemonic: Mnemonic::Xor, base: 0x30, digit: 6 },
    ArithGroup { mnemonic: Mnemonic::Cmp, base: 0x38, digit: 7 },
];

fn insert_row(table: &mut HashMap<OpKey, OpRow>, prefix: Prefix, opcode: u16, digit: i8, mnemonic: Mnemonic) {
    table.entry(OpKey::new(prefix, opcode)).or_default().insert(digit, mnemonic);
}

fn build_op_lookup() -> HashMap<OpKey, OpRow> {
    use Mnemonic::*;
    use Prefix::*;

    let mut t = HashMap::new();

    for g in ARITH_GROUPS {
        // MR r/m8, r8  |  RM r8, r/m8
        insert_row(&mut t, None, g.base as u16, NO_DIGIT, g.mnemonic);
        insert_row(&mut t, None, (g.base + 2) as u16, NO_DIGIT, g.mnemonic);
        // MR r/m32, r32 (None) / r/m64, r64 (RexW)  |  RM reg, rm
        insert_row(&mut t, None, (g.base + 1) as u16, NO_DIGIT, g.mnemonic);
        insert_row(&mut t, RexW, (g.base + 1) as u16, NO_DIGIT, g.mnemonic);
        insert_row(&mut t, None, (g.base + 3) as u16, NO_DIGIT, g.mnemonic);
        insert_row(&mut t, RexW, (g.base + 3) as u16, NO_DIGIT, g.mnemonic);
        // I AL, imm8 | I eAX, imm32
        insert_row(&mut t, None, (g.base + 4) as u16, NO_DIGIT, g.mnemonic);
        insert_row(&mut t, None, (g.base + 5) as u16, NO_DIGIT, g.mnemonic);
        insert_row(&mut t, RexW, (g.base + 5) as u16, NO_DIGIT, g.mnemonic);
        // MI group opcodes, disambiguated by /digit
        insert_row(&mut t, None, 0x80, g.digit as i8, g.mnemonic);
        insert_row(&mut t, None, 0x81, g.digit as i8, g.mnemonic);
        insert_row(&mut t, RexW, 0x81, g.digit as i8, g.mnemonic);
        insert_row(&mut t, None, 0x83, g.digit as i8, g.mnemonic);
        insert_row(&mut t, RexW, 0x83, g.digit as i8, g.mnemonic);
    }

    // MOV
    insert_row(&mut t, None, 0x88, NO_DIGIT, Mov);
    insert_row(&mut t, None, 0x89, NO_DIGIT, Mov);
    insert_row(&mut t, RexW, 0x89, NO_DIGIT, Mov);
    insert_row(&mut t, None, 0x8A, NO_DIGIT, Mov);
    insert_row(&mut t, None, 0x8B, NO_DIGIT, Mov);
    insert_row(&mut t, RexW, 0x8B, NO_DIGIT, Mov);
    for r in 0xB8u16..=0xBF {
        insert_row(&mut t, None, r, NO_DIGIT, Mov);
        insert_row(&mut t, RexW, r, NO_DIGIT, Mov);
    }
    insert_row(&mut t, None, 0xC7, 0, Mov);
    insert_row(&mut t, RexW, 0xC7, 0, Mov);

    // LEA
    insert_row(&mut t, None, 0x8D, NO_DIGIT, Lea);
    insert_row(&mut t, RexW, 0x8D, NO_DIGIT, Lea);

    // PUSH / POP
    for r in 0x50u16..=0x57 {
        insert_row(&mut t, None, r, NO_DIGIT, Push);
    }
    for r in 0x58u16..=0x5F {
        insert_row(&mut t, None, r, NO_DIGIT, Pop);
    }
    insert_row(&mut t, None, 0xFF, 6, Push);
    insert_row(&mut t, None, 0x8F, 0, Pop);

    // INC/DEC/NOT/NEG/MUL/IMUL/DIV/IDIV group (F6/F7 /digit, FE/FF /digit)
    insert_row(&mut t, None, 0xFE, 0, Inc);
    insert_row(&mut t, None, 0xFE, 1, Dec);
    insert_row(&mut t, None, 0xFF, 0, Inc);
    insert_row(&mut t, RexW, 0xFF, 0, Inc);
    insert_row(&mut t, None, 0xFF, 1, Dec);
    insert_row(&mut t, RexW, 0xFF, 1, Dec);
    for (digit, mnemonic) in [(2u8, Not), (3, Neg), (4, Mul), (5, Imul), (6, Div), (7, Idiv)] {
        insert_row(&mut t, None, 0xF6, digit as i8, mnemonic);
        insert_row(&mut t, None, 0xF7, digit as i8, mnemonic);
        insert_row(&mut t, RexW, 0xF7, digit as i8, mnemonic);
    }

    // TEST
    insert_row(&mut t, None, 0x84, NO_DIGIT, Test);
    insert_row(&mut t, None, 0x85, NO_DIGIT, Test);
    insert_row(&mut t, RexW, 0x85, NO_DIGIT, Test);
    insert_row(&mut t, None, 0xA8, NO_DIGIT, Test);
    insert_row(&mut t, None, 0xA9, NO_DIGIT, Test);
    insert_row(&mut t, None, 0xF6, 0, Test);
    insert_row(&mut t, None, 0xF7, 0, Test);
    insert_row(&mut t, RexW, 0xF7, 0, Test);

    // XCHG
    for r in 0x91u16..=0x97 {
        insert_row(&mut t, None, r, NO_DIGIT, Xchg);
        insert_row(&mut t, RexW, r, NO_DIGIT, Xchg);
    }
    insert_row(&mut t, None, 0x86, NO_DIGIT, Xchg);
    insert_row(&mut t, None, 0x87, NO_DIGIT, Xchg);
    insert_row(&mut t, RexW, 0x87, NO_DIGIT, Xchg);

    // Shift/rotate group
    for (digit, mnemonic) in [
        (0u8, Rol), (1, Ror), (2, Rcl), (3, Rcr), (4, Shl), (5, Shr), (7, Sar),
    ] {
        insert_row(&mut t, None, 0xC0, digit as i8, mnemonic);
        insert_row(&mut t, None, 0xC1, digit as i8, mnemonic);
        insert_row(&mut t, RexW, 0xC1, digit as i8, mnemonic);
        insert_row(&mut t, None, 0xD0, digit as i8, mnemonic);
        insert_row(&mut t, None, 0xD1, digit as i8, mnemonic);
        insert_row(&mut t, RexW, 0xD1, digit as i8, mnemonic);
        insert_row(&mut t, None, 0xD2, digit as i8, mnemonic);
        insert_row(&mut t, None, 0xD3, digit as i8, mnemonic);
        insert_row(&mut t, RexW, 0xD3, digit as i8, mnemonic);
    }

    // Control flow
    insert_row(&mut t, None, 0xE8, NO_DIGIT, Call);
    insert_row(&mut t, None, 0xFF, 2, Call);
    insert_row(&mut t, None, 0xE9, NO_DIGIT, Jmp);
    insert_row(&mut t, None, 0xEB, NO_DIGIT, Jmp);
    insert_row(&mut t, None, 0xFF, 4, Jmp);
    for cc in 0u8..16 {
        insert_row(&mut t, None, (0x70 + cc) as u16, NO_DIGIT, Jcc(cc));
        insert_row(&mut t, None, TWO_BYTE_BASE + 0x80 + cc as u16, NO_DIGIT, Jcc(cc));
    }
    insert_row(&mut t, None, 0xE0, NO_DIGIT, Loopne);
    insert_row(&mut t, None, 0xE1, NO_DIGIT, Loope);
    insert_row(&mut t, None, 0xE2, NO_DIGIT, Loop);
    insert_row(&mut t, None, 0xC3, NO_DIGIT, Ret);
    insert_row(&mut t, None, 0xC2, NO_DIGIT, Ret);

    // String ops
    for (base, mnemonic) in [
        (0xA4u16, Movs), (0xA5, Movs),
        (0xAAu16, Stos), (0xABu16, Stos),
        (0xA6u16, Cmps), (0xA7u16, Cmps),
        (0xAEu16, Scas), (0xAFu16, Scas),
        (0xACu16, Lods), (0xADu16, Lods),
    ] {
        insert_row(&mut t, None, base, NO_DIGIT, mnemonic);
    }

    // Stack/flags misc
    insert_row(&mut t, None, 0x9C, NO_DIGIT, Pushf);
    insert_row(&mut t, None, 0x9D, NO_DIGIT, Popf);
    insert_row(&mut t, None, 0xF8, NO_DIGIT, Clc);
    insert_row(&mut t, None, 0xF9, NO_DIGIT, Stc);
    insert_row(&mut t, None, 0xFC, NO_DIGIT, Cld);
    insert_row(&mut t, None, 0xFD, NO_DIGIT, Std);

    // Fixed/no-operand misc
    insert_row(&mut t, None, 0x90, NO_DIGIT, Nop);
    insert_row(&mut t, None, TWO_BYTE_BASE + 0x0B, NO_DIGIT, Ud2);
    insert_row(&mut t, None, 0xCC, NO_DIGIT, Int3);
    insert_row(&mut t, None, 0xCD, NO_DIGIT, Int);
    insert_row(&mut t, None, TWO_BYTE_BASE + 0xA2, NO_DIGIT, Cpuid);
    insert_row(&mut t, None, TWO_BYTE_BASE + 0x05, NO_DIGIT, Syscall);
    insert_row(&mut t, None, 0xF4, NO_DIGIT, Hlt);
    // ENDBR64/ENDBR32 (fixed 4-byte sequences F3 0F 1E FA / F3 0F 1E FB) are
    // matched directly off the raw bytes in decoder.rs before table lookup
    // runs at all — both encode ModR/M.reg=7 and differ only in rm (2 vs 3),
    // which this flat digit-keyed table has no way to express.

    // SSE subset
    insert_row(&mut t, None, TWO_BYTE_BASE + 0x28, NO_DIGIT, Movaps);
    insert_row(&mut t, None, TWO_BYTE_BASE + 0x29, NO_DIGIT, Movaps);

    // x87 subset
    insert_row(&mut t, None, X87_D8_BASE, 0, Fadd);
    for digit in 1u8..=7 {
        insert_row(&mut t, None, X87_D9_BASE, digit as i8, Fxch);
    }

    t
}

fn insert_operand_row(
    t: &mut HashMap<OperandKey, OperandRow>,
    prefix: Prefix,
    mnemonic: Mnemonic,
    opcode: u16,
    form: EncodingForm,
    operands: &[OperandKind],
) {
    t.insert((prefix, mnemonic, opcode), (form, Vec::new(), operands.to_vec()));
}

/// Like [`insert_operand_row`], but for `O`/`Oi` encodings that embed a
/// register index in the opcode's low 3 bits instead of reading one off a
/// ModR/M byte (spec.md §4.2's `extra_refs[0]`, consumed by
/// `decoder::render_operand` since these forms carry no ModR/M at all).
fn insert_operand_row_with_reg(
    t: &mut HashMap<OperandKey, OperandRow>,
    prefix: Prefix,
    mnemonic: Mnemonic,
    opcode: u16,
    form: EncodingForm,
    operands: &[OperandKind],
    reg: u8,
) {
    t.insert((prefix, mnemonic, opcode), (form, vec![reg.to_string()], operands.to_vec()));
}

fn build_operand_lookup() -> HashMap<OperandKey, OperandRow> {
    use EncodingForm::*;
    use OperandKind::*;
    use Prefix::*;

    let mut t = HashMap::new();

    for g in ARITH_GROUPS {
        let m = g.mnemonic;
        insert_operand_row(&mut t, None, m, g.base as u16, Mr, &[Rm8, Reg8]);
        insert_operand_row(&mut t, None, m, (g.base + 2) as u16, Rm, &[Reg8, Rm8]);
        insert_operand_row(&mut t, None, m, (g.base + 1) as u16, Mr, &[Rm32, Reg32]);
        insert_operand_row(&mut t, RexW, m, (g.base + 1) as u16, Mr, &[Rm64, Reg64]);
        insert_operand_row(&mut t, None, m, (g.base + 3) as u16, Rm, &[Reg32, Rm32]);
        insert_operand_row(&mut t, RexW, m, (g.base + 3) as u16, Rm, &[Reg64, Rm64]);
        insert_operand_row(&mut t, None, m, (g.base + 4) as u16, I, &[Al, Imm8]);
        insert_operand_row(&mut t, None, m, (g.base + 5) as u16, I, &[Eax, Imm32]);
        insert_operand_row(&mut t, RexW, m, (g.base + 5) as u16, I, &[Rax, Imm32]);
        insert_operand_row(&mut t, None, m, 0x80, Mi, &[Rm8, Imm8]);
        insert_operand_row(&mut t, None, m, 0x81, Mi, &[Rm32, Imm32]);
        insert_operand_row(&mut t, RexW, m, 0x81, Mi, &[Rm64, Imm32]);
        insert_operand_row(&mut t, None, m, 0x83, Mi, &[Rm32, Imm8]);
        insert_operand_row(&mut t, RexW, m, 0x83, Mi, &[Rm64, Imm8]);
    }

    insert_operand_row(&mut t, None, Mnemonic::Mov, 0x88, Mr, &[Rm8, Reg8]);
    insert_operand_row(&mut t, None, Mnemonic::Mov, 0x89, Mr, &[Rm32, Reg32]);
    insert_operand_row(&mut t, RexW, Mnemonic::Mov, 0x89, Mr, &[Rm64, Reg64]);
    insert_operand_row(&mut t, None, Mnemonic::Mov, 0x8A, Rm, &[Reg8, Rm8]);
    insert_operand_row(&mut t, None, Mnemonic::Mov, 0x8B, Rm, &[Reg32, Rm32]);
    insert_operand_row(&mut t, RexW, Mnemonic::Mov, 0x8B, Rm, &[Reg64, Rm64]);
    for r in 0xB8u16..=0xBF {
        let reg = (r - 0xB8) as u8;
        insert_operand_row_with_reg(&mut t, None, Mnemonic::Mov, r, Oi, &[Reg32, Imm32], reg);
        insert_operand_row_with_reg(&mut t, RexW, Mnemonic::Mov, r, Oi, &[Reg64, Imm64], reg);
    }
    insert_operand_row(&mut t, None, Mnemonic::Mov, 0xC7, Mi, &[Rm32, Imm32]);
    insert_operand_row(&mut t, RexW, Mnemonic::Mov, 0xC7, Mi, &[Rm64, Imm32]);

    insert_operand_row(&mut t, None, Mnemonic::Lea, 0x8D, Rm, &[Reg32, M]);
    insert_operand_row(&mut t, RexW, Mnemonic::Lea, 0x8D, Rm, &[Reg64, M]);

    for r in 0x50u16..=0x57 {
        insert_operand_row_with_reg(&mut t, None, Mnemonic::Push, r, O, &[Reg64], (r - 0x50) as u8);
    }
    for r in 0x58u16..=0x5F {
        insert_operand_row_with_reg(&mut t, None, Mnemonic::Pop, r, O, &[Reg64], (r - 0x58) as u8);
    }
    insert_operand_row(&mut t, None, Mnemonic::Push, 0xFF, M, &[Rm64]);
    insert_operand_row(&mut t, None, Mnemonic::Pop, 0x8F, M, &[Rm64]);

    insert_operand_row(&mut t, None, Mnemonic::Inc, 0xFE, M, &[Rm8]);
    insert_operand_row(&mut t, None, Mnemonic::Dec, 0xFE, M, &[Rm8]);
    insert_operand_row(&mut t, None, Mnemonic::Inc, 0xFF, M, &[Rm32]);
    insert_operand_row(&mut t, RexW, Mnemonic::Inc, 0xFF, M, &[Rm64]);
    insert_operand_row(&mut t, None, Mnemonic::Dec, 0xFF, M, &[Rm32]);
    insert_operand_row(&mut t, RexW, Mnemonic::Dec, 0xFF, M, &[Rm64]);
    for m in [Mnemonic::Not, Mnemonic::Neg, Mnemonic::Mul, Mnemonic::Imul, Mnemonic::Div, Mnemonic::Idiv] {
        insert_operand_row(&mut t, None, m, 0xF6, M, &[Rm8]);
        insert_operand_row(&mut t, None, m, 0xF7, M, &[Rm32]);
        insert_operand_row(&mut t, RexW, m, 0xF7, M, &[Rm64]);
    }

    insert_operand_row(&mut t, None, Mnemonic::Test, 0x84, Mr, &[Rm8, Reg8]);
    insert_operand_row(&mut t, None, Mnemonic::Test, 0x85, Mr, &[Rm32, Reg32]);
    insert_operand_row(&mut t, RexW, Mnemonic::Test, 0x85, Mr, &[Rm64, Reg64]);
    insert_operand_row(&mut t, None, Mnemonic::Test, 0xA8, I, &[Al, Imm8]);
    insert_operand_row(&mut t, None, Mnemonic::Test, 0xA9, I, &[Eax, Imm32]);
    insert_operand_row(&mut t, None, Mnemonic::Test, 0xF6, Mi, &[Rm8, Imm8]);
    insert_operand_row(&mut t, None, Mnemonic::Test, 0xF7, Mi, &[Rm32, Imm32]);
    insert_operand_row(&mut t, RexW, Mnemonic::Test, 0xF7, Mi, &[Rm64, Imm32]);

    for r in 0x91u16..=0x97 {
        // xchg eAX, r32 is opcode 0x90+r (0x90 itself is plain NOP / xchg eax,eax).
        let reg = (r - 0x90) as u8;
        insert_operand_row_with_reg(&mut t, None, Mnemonic::Xchg, r, O, &[Reg32], reg);
        insert_operand_row_with_reg(&mut t, RexW, Mnemonic::Xchg, r, O, &[Reg64], reg);
    }
    insert_operand_row(&mut t, None, Mnemonic::Xchg, 0x86, Mr, &[Rm8, Reg8]);
    insert_operand_row(&mut t, None, Mnemonic::Xchg, 0x87, Mr, &[Rm32, Reg32]);
    insert_operand_row(&mut t, RexW, Mnemonic::Xchg, 0x87, Mr, &[Rm64, Reg64]);

    for m in [Mnemonic::Rol, Mnemonic::Ror, Mnemonic::Rcl, Mnemonic::Rcr, Mnemonic::Shl, Mnemonic::Shr, Mnemonic::Sar]
    {
        insert_operand_row(&mut t, None, m, 0xC0, Mi, &[Rm8, Imm8]);
        insert_operand_row(&mut t, None, m, 0xC1, Mi, &[Rm32, Imm8]);
        insert_operand_row(&mut t, RexW, m, 0xC1, Mi, &[Rm64, Imm8]);
        insert_operand_row(&mut t, None, m, 0xD0, M1, &[Rm8]);
        insert_operand_row(&mut t, None, m, 0xD1, M1, &[Rm32]);
        insert_operand_row(&mut t, RexW, m, 0xD1, M1, &[Rm64]);
        insert_operand_row(&mut t, None, m, 0xD2, Mc, &[Rm8, Cl]);
        insert_operand_row(&mut t, None, m, 0xD3, Mc, &[Rm32, Cl]);
        insert_operand_row(&mut t, RexW, m, 0xD3, Mc, &[Rm64, Cl]);
    }

    insert_operand_row(&mut t, None, Mnemonic::Call, 0xE8, D, &[Imm32]);
    insert_operand_row(&mut t, None, Mnemonic::Call, 0xFF, M, &[Rm64]);
    insert_operand_row(&mut t, None, Mnemonic::Jmp, 0xE9, D, &[Imm32]);
    insert_operand_row(&mut t, None, Mnemonic::Jmp, 0xEB, D, &[Imm8]);
    insert_operand_row(&mut t, None, Mnemonic::Jmp, 0xFF, M, &[Rm64]);
    for cc in 0u8..16 {
        insert_operand_row(&mut t, None, Mnemonic::Jcc(cc), (0x70 + cc) as u16, D, &[Imm8]);
        insert_operand_row(&mut t, None, Mnemonic::Jcc(cc), TWO_BYTE_BASE + 0x80 + cc as u16, D, &[Imm32]);
    }
    insert_operand_row(&mut t, None, Mnemonic::Loopne, 0xE0, D, &[Imm8]);
    insert_operand_row(&mut t, None, Mnemonic::Loope, 0xE1, D, &[Imm8]);
    insert_operand_row(&mut t, None, Mnemonic::Loop, 0xE2, D, &[Imm8]);
    insert_operand_row(&mut t, None, Mnemonic::Ret, 0xC3, Np, &[]);
    insert_operand_row(&mut t, None, Mnemonic::Ret, 0xC2, I, &[Imm16]);

    for base in [0xA4u16, 0xA5, 0xAA, 0xAB, 0xA6, 0xA7, 0xAE, 0xAF, 0xAC, 0xAD] {
        let mnemonic = lookup_string_op_mnemonic(base);
        insert_operand_row(&mut t, None, mnemonic, base, Np, &[]);
    }

    for (opcode, mnemonic) in [
        (0x9Cu16, Mnemonic::Pushf), (0x9D, Mnemonic::Popf), (0xF8, Mnemonic::Clc),
        (0xF9, Mnemonic::Stc), (0xFC, Mnemonic::Cld), (0xFD, Mnemonic::Std), (0x90, Mnemonic::Nop),
        (TWO_BYTE_BASE + 0x0B, Mnemonic::Ud2), (0xCC, Mnemonic::Int3), (0xF4, Mnemonic::Hlt),
        (TWO_BYTE_BASE + 0xA2, Mnemonic::Cpuid), (TWO_BYTE_BASE + 0x05, Mnemonic::Syscall),
    ] {
        insert_operand_row(&mut t, None, mnemonic, opcode, Np, &[]);
    }
    insert_operand_row(&mut t, None, Mnemonic::Int, 0xCD, I, &[Imm8]);

    insert_operand_row(&mut t, None, Mnemonic::Movaps, TWO_BYTE_BASE + 0x28, Rm, &[Xmm, Xm128]);
    insert_operand_row(&mut t, None, Mnemonic::Movaps, TWO_BYTE_BASE + 0x29, Mr, &[Xm128, Xmm]);

    insert_operand_row(&mut t, None, Mnemonic::Fadd, X87_D8_BASE, M, &[M32Fp]);
    insert_operand_row(&mut t, None, Mnemonic::Fxch, X87_D9_BASE, M, &[Sti]);

    t
}

fn lookup_string_op_mnemonic(base: u16) -> Mnemonic {
    match base {
        0xA4 | 0xA5 => Mnemonic::Movs,
        0xAA | 0xAB => Mnemonic::Stos,
        0xA6 | 0xA7 => Mnemonic::Cmps,
        0xAE | 0xAF => Mnemonic::Scas,
        0xAC | 0xAD => Mnemonic::Lods,
        _ => unreachable!("string op base opcode out of range"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_immediate_group_disambiguates_by_digit() {
        assert_eq!(lookup_mnemonic(Prefix::None, 0x81, Some(0)), Some(Mnemonic::Add));
        assert_eq!(lookup_mnemonic(Prefix::None, 0x81, Some(7)), Some(Mnemonic::Cmp));
    }

    #[test]
    fn mov_immediate_to_register_has_no_digit_rows_to_disambiguate() {
        assert_eq!(lookup_mnemonic(Prefix::RexW, 0xB8, None), Some(Mnemonic::Mov));
    }

    #[test]
    fn jcc_condition_codes_are_all_present() {
        for cc in 0u8..16 {
            assert_eq!(lookup_mnemonic(Prefix::None, (0x70 + cc) as u16, None), Some(Mnemonic::Jcc(cc)));
        }
    }

    #[test]
    fn operand_row_present_for_each_opcode_lookup_row() {
        // Every (prefix, opcode, digit) combination in OP_LOOKUP has a
        // matching (prefix, mnemonic, opcode) row in OPERAND_LOOKUP.
        for (key, row) in OP_LOOKUP.iter() {
            for mnemonic in row.values() {
                assert!(
                    OPERAND_LOOKUP.contains_key(&(key.prefix, *mnemonic, key.opcode)),
                    "missing operand row for {:?} {:?} {:#x}",
                    key.prefix,
                    mnemonic,
                    key.opcode
                );
            }
        }
    }
}
