//! The instruction decoder: turns one properly-aligned byte offset into a
//! `DecodedInstruction`, following the fourteen-step sequence spec.md §4.3
//! lays out (prefixes, REX, opcode [+ escape], ModR/M, SIB, displacement,
//! immediate, operand rendering, text composition).

use log::{debug, trace};

use crate::addressing::{self, GprWidth};
use crate::encoding::EncodingForm;
use crate::error::{DecodeError, DecodeResult};
use crate::instruction::DecodedInstruction;
use crate::mnemonic::Mnemonic;
use crate::modrm::{ModRm, Sib};
use crate::operand::OperandKind;
use crate::prefix::{InstructionPrefix, Prefix, SegmentOverride};
use crate::registers::{st, xmm};
use crate::rex::Rex;
use crate::tables::{self, X87_D8_BASE, X87_D9_BASE, X87_DC_BASE};

const ENDBR64_BYTES: [u8; 4] = [0xF3, 0x0F, 0x1E, 0xFA];
const ENDBR32_BYTES: [u8; 4] = [0xF3, 0x0F, 0x1E, 0xFB];

struct Cursor<'a> {
    bytes: &'a [u8],
    start: usize,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8], start: usize) -> Self {
        Cursor { bytes, start, pos: start }
    }

    fn take(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(DecodeError::Truncated {
                offset: self.start,
                needed: n,
                available: self.bytes.len().saturating_sub(self.pos),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn peek(&self, n: usize) -> Option<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            None
        } else {
            Some(&self.bytes[self.pos..self.pos + n])
        }
    }

    fn length(&self) -> usize {
        self.pos - self.start
    }
}

/// Decode the single instruction starting at `offset` within `bytes`
/// (spec.md §4.3).
pub fn decode_one(bytes: &[u8], offset: usize) -> DecodeResult<DecodedInstruction> {
    if bytes[offset..].starts_with(&ENDBR64_BYTES) {
        return Ok(fixed_instruction(bytes, offset, 4, Mnemonic::Endbr64));
    }
    if bytes[offset..].starts_with(&ENDBR32_BYTES) {
        return Ok(fixed_instruction(bytes, offset, 4, Mnemonic::Endbr32));
    }

    let mut cur = Cursor::new(bytes, offset);

    let mut has_66 = false;
    let mut segment = None;
    let mut instruction_prefix = None;
    loop {
        let Some(b) = cur.peek(1) else { break };
        match b[0] {
            0x66 => {
                has_66 = true;
                cur.take(1)?;
            }
            0x64 | 0x65 => {
                segment = SegmentOverride::from_byte(b[0]);
                cur.take(1)?;
            }
            0xF0 | 0xF2 | 0xF3 | 0x3E => {
                instruction_prefix = InstructionPrefix::from_byte(b[0]);
                cur.take(1)?;
            }
            _ => break,
        }
    }

    let rex = match cur.peek(1) {
        Some(b) if Rex::is_rex_byte(b[0]) => {
            let rex = Rex::from_byte(b[0]);
            cur.take(1)?;
            Some(rex)
        }
        _ => None,
    };

    let table_prefix = match rex {
        Some(r) => r.effective_prefix(),
        None if has_66 => Prefix::P66,
        None => Prefix::None,
    };

    let opcode_byte = cur.take(1)?[0];

    // `0x0F` escapes a genuine second opcode byte, distinct from whatever
    // ModR/M may follow it (spec.md §4.3 step 6). The x87 escapes
    // (`0xD8`/`0xD9`/`0xDC`) work differently: the byte right after them
    // *is* the ModR/M byte, and its `reg` field doubles as the `/digit`
    // that selects the mnemonic, so it must only be peeked here and left
    // for the ModR/M-consumption step below to take.
    let opcode_key: u16 = match opcode_byte {
        0x0F => {
            // Two-byte opcode detection is table-probed, not unconditional
            // (spec.md §9 open question): only consume the second byte when
            // the resulting key actually resolves, so a lone `0x0F` at the
            // end of the stream surfaces as an opcode-lookup miss rather
            // than a truncation.
            match cur.peek(1) {
                Some(second) => {
                    let candidate = tables::TWO_BYTE_BASE + second[0] as u16;
                    let candidate_digit = (second[0] >> 3) & 0x7;
                    if tables::lookup_mnemonic(table_prefix, candidate, Some(candidate_digit)).is_some() {
                        cur.take(1)?;
                        candidate
                    } else {
                        opcode_byte as u16
                    }
                }
                None => opcode_byte as u16,
            }
        }
        0xD8 | 0xD9 | 0xDC => match opcode_byte {
            0xD8 => X87_D8_BASE,
            0xD9 => X87_D9_BASE,
            0xDC => X87_DC_BASE,
            _ => unreachable!(),
        },
        other => other as u16,
    };

    let digit = cur.peek(1).map(|b| (b[0] >> 3) & 0x7);

    let mnemonic = tables::lookup_mnemonic(table_prefix, opcode_key, digit).ok_or_else(|| {
        debug!("opcode lookup miss at {:#x} (prefix {:?}, opcode {:#x})", offset, table_prefix, opcode_key);
        DecodeError::OpcodeLookup { offset, byte: opcode_byte }
    })?;

    let (form, extra_refs, operands) = lookup_operands_with_fallback(table_prefix, mnemonic, opcode_key)
        .ok_or(DecodeError::OperandLookup { offset, byte: opcode_byte })?;

    let mut modrm = None;
    let mut sib = None;
    if form.has_modrm() {
        let byte = cur.take(1)?[0];
        let m = ModRm::from_byte(byte);
        if m.has_sib() {
            let sb = cur.take(1)?[0];
            sib = Some(Sib::from_byte(sb));
        }
        modrm = Some(m);
    }

    let disp8 = needs_disp8(modrm, sib).then(|| cur.take(1)).transpose()?;
    let disp32 = needs_disp32(modrm, sib).then(|| cur.take(4)).transpose()?;

    let mut imm_bytes: Option<&[u8]> = None;
    for &kind in &operands {
        if let Some(width) = kind.width() {
            if matches!(
                kind,
                OperandKind::Imm8 | OperandKind::Imm16 | OperandKind::Imm32 | OperandKind::Imm64
            ) {
                imm_bytes = Some(cur.take(width as usize / 8)?);
            }
        }
    }

    let length = cur.length();
    let rex_present = rex.is_some();
    let rex = rex.unwrap_or_default();

    // Only the direct (`D`-form) control-flow instructions carry a relative
    // immediate to follow; indirect call/jmp (`FF /2`, `FF /4`) are `M`-form
    // and render like any other single-operand instruction, with no
    // resolvable branch target (spec.md §4.4.2).
    let is_direct_branch = mnemonic.is_control_flow() && form == EncodingForm::D;
    let qualifier = instruction_prefix_qualifier(instruction_prefix, mnemonic);

    let text = if is_direct_branch {
        render_control_flow(mnemonic, offset, length, imm_bytes)
    } else {
        let rendered: Vec<String> = operands
            .iter()
            .map(|&kind| {
                render_operand(kind, modrm, sib, rex, rex_present, disp8, disp32, imm_bytes, segment, &extra_refs)
            })
            .collect();
        if rendered.is_empty() {
            mnemonic.to_string()
        } else {
            format!("{mnemonic}  {}", rendered.join(" "))
        }
    };
    let text = match qualifier {
        Some(q) => format!("{q} {text}"),
        None => text,
    };

    let branch_target = is_direct_branch.then(|| branch_target_of(offset, length, imm_bytes));

    trace!("decoded {:#x}: {}", offset, text);

    Ok(DecodedInstruction {
        start_addr: offset,
        length,
        mnemonic,
        text,
        branch_target,
        bytes: bytes[offset..offset + length].to_vec(),
    })
}

/// The textual qualifier an instruction-prefix byte contributes (spec.md
/// §4.3 step 8): `lock`/`rep`/`notrack` unconditionally, `F2` splitting
/// into `bnd` (control-flow mnemonics) or `repne` (everything else).
fn instruction_prefix_qualifier(prefix: Option<InstructionPrefix>, mnemonic: Mnemonic) -> Option<&'static str> {
    match prefix? {
        InstructionPrefix::Lock => Some("lock"),
        InstructionPrefix::Rep => Some("rep"),
        InstructionPrefix::NoTrack => Some("notrack"),
        InstructionPrefix::Repne => Some(if mnemonic.is_control_flow() { "bnd" } else { "repne" }),
    }
}

fn fixed_instruction(bytes: &[u8], offset: usize, length: usize, mnemonic: Mnemonic) -> DecodedInstruction {
    DecodedInstruction {
        start_addr: offset,
        length,
        mnemonic,
        text: mnemonic.to_string(),
        branch_target: None,
        bytes: bytes[offset..offset + length].to_vec(),
    }
}

fn needs_disp8(modrm: Option<ModRm>, sib: Option<Sib>) -> bool {
    let Some(m) = modrm else { return false };
    m.has_disp8() || sib.map(|s| s.has_disp8(m.mod_)).unwrap_or(false)
}

fn needs_disp32(modrm: Option<ModRm>, sib: Option<Sib>) -> bool {
    let Some(m) = modrm else { return false };
    m.has_disp32() || sib.map(|s| s.has_disp32(m.mod_)).unwrap_or(false)
}

/// Walk the `REXW -> REX -> NONE` fallback chain for the operand table
/// (spec.md §4.3 step 7); `P66` falls straight to `NONE`.
fn lookup_operands_with_fallback(
    prefix: Prefix,
    mnemonic: Mnemonic,
    opcode: u16,
) -> Option<(EncodingForm, Vec<String>, Vec<OperandKind>)> {
    let mut current = Some(prefix);
    while let Some(p) = current {
        if let Some((form, extra_refs, operands)) = tables::lookup_operands(p, mnemonic, opcode) {
            return Some((*form, extra_refs.clone(), operands.clone()));
        }
        current = p.fallback();
    }
    None
}

/// The register index an `O`/`Oi` encoding embeds in its opcode's low 3
/// bits (spec.md §4.2 `extra_refs[0]`), extended by REX.B — these forms
/// carry no ModR/M byte at all, so there is no `reg`/`rm` field to read
/// (spec.md §4.3 step 13).
fn opcode_embedded_register(extra_refs: &[String], rex_b: bool) -> u8 {
    let base: u8 = extra_refs
        .first()
        .and_then(|s| s.parse().ok())
        .expect("O/Oi register operand requires extra_refs[0]");
    Rex::extend(rex_b, base)
}

#[allow(clippy::too_many_arguments)]
fn render_operand(
    kind: OperandKind,
    modrm: Option<ModRm>,
    sib: Option<Sib>,
    rex: Rex,
    rex_present: bool,
    disp8: Option<&[u8]>,
    disp32: Option<&[u8]>,
    imm: Option<&[u8]>,
    segment: Option<SegmentOverride>,
    extra_refs: &[String],
) -> String {
    use OperandKind::*;

    match kind {
        Al => "al".to_string(),
        Ax => "ax".to_string(),
        Eax => "eax".to_string(),
        Rax => "rax".to_string(),
        Cl => "cl".to_string(),
        Dx => "dx".to_string(),
        St0 => st(0),
        Sti => {
            // FXCH ST(i) (D9 C8+i) encodes `i` in ModR/M.rm, not .reg — the
            // reg field there is the `/digit` the opcode table resolved the
            // mnemonic from, not the operand index.
            let m = modrm.expect("Sti operand requires ModR/M");
            st(m.rm)
        }
        Reg8 => match modrm {
            Some(m) => {
                let index = Rex::extend(rex.r, m.reg);
                crate::registers::reg8(index, rex_present).to_string()
            }
            None => crate::registers::reg8(opcode_embedded_register(extra_refs, rex.b), rex_present).to_string(),
        },
        Reg16 => {
            let index = match modrm {
                Some(m) => Rex::extend(rex.r, m.reg),
                None => opcode_embedded_register(extra_refs, rex.b),
            };
            addressing::render_gpr(GprWidth::W16, index, true)
        }
        Reg32 => {
            let index = match modrm {
                Some(m) => Rex::extend(rex.r, m.reg),
                None => opcode_embedded_register(extra_refs, rex.b),
            };
            addressing::render_gpr(GprWidth::W32, index, true)
        }
        Reg64 => {
            let index = match modrm {
                Some(m) => Rex::extend(rex.r, m.reg),
                None => opcode_embedded_register(extra_refs, rex.b),
            };
            addressing::render_gpr(GprWidth::W64, index, true)
        }
        Rm8 => render_rm(GprWidth::W8, modrm, sib, rex, rex_present, disp8, disp32, segment),
        Rm16 => render_rm(GprWidth::W16, modrm, sib, rex, rex_present, disp8, disp32, segment),
        Rm32 => render_rm(GprWidth::W32, modrm, sib, rex, rex_present, disp8, disp32, segment),
        Rm64 => render_rm(GprWidth::W64, modrm, sib, rex, rex_present, disp8, disp32, segment),
        Xm128 => {
            let m = modrm.expect("Xm128 operand requires ModR/M");
            if m.mod_ == 3 {
                xmm(Rex::extend(rex.b, m.rm))
            } else {
                addressing::render_memory(m, sib, rex, disp8, disp32, segment)
            }
        }
        Xmm => {
            let m = modrm.expect("Xmm operand requires ModR/M");
            xmm(Rex::extend(rex.r, m.reg))
        }
        Ymm => {
            let m = modrm.expect("Ymm operand requires ModR/M");
            format!("ymm{}", Rex::extend(rex.r, m.reg))
        }
        M | M32Fp | M64Fp => {
            let m = modrm.expect("memory operand requires ModR/M");
            addressing::render_memory(m, sib, rex, disp8, disp32, segment)
        }
        Imm8 => format_imm(imm, 1),
        Imm16 => format_imm(imm, 2),
        Imm32 => format_imm(imm, 4),
        Imm64 => format_imm(imm, 8),
        Moffs8 | Moffs16 | Moffs32 | Moffs64 => format_imm(imm, kind.width().unwrap_or(32) as usize / 8),
        Sreg => {
            let m = modrm.expect("Sreg operand requires ModR/M");
            format!("seg{}", m.reg)
        }
        One => "1".to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn render_rm(
    width: GprWidth,
    modrm: Option<ModRm>,
    sib: Option<Sib>,
    rex: Rex,
    rex_present: bool,
    disp8: Option<&[u8]>,
    disp32: Option<&[u8]>,
    segment: Option<SegmentOverride>,
) -> String {
    let m = modrm.expect("rm operand requires ModR/M");
    if m.mod_ == 3 {
        addressing::render_register_direct(width, m, rex, rex_present)
    } else {
        addressing::render_memory(m, sib, rex, disp8, disp32, segment)
    }
}

fn format_imm(bytes: Option<&[u8]>, width: usize) -> String {
    let bytes = bytes.expect("immediate operand with no immediate bytes consumed");
    let value: u64 = match width {
        1 => bytes[0] as u64,
        2 => u16::from_le_bytes([bytes[0], bytes[1]]) as u64,
        4 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64,
        8 => u64::from_le_bytes(bytes[..8].try_into().unwrap()),
        _ => unreachable!("immediate width must be 1, 2, 4 or 8"),
    };
    format!("{:#0width$x}", value, width = width * 2 + 2)
}

fn branch_target_of(offset: usize, length: usize, imm: Option<&[u8]>) -> usize {
    let rel = imm.map(|b| addressing::sign_extend(b, b.len())).unwrap_or(0);
    ((offset + length) as i64 + rel) as usize
}

fn render_control_flow(mnemonic: Mnemonic, offset: usize, length: usize, imm: Option<&[u8]>) -> String {
    let rel = imm.map(|b| addressing::sign_extend(b, b.len())).unwrap_or(0);
    let target = branch_target_of(offset, length, imm);
    format!("{mnemonic} {target:x} ; relative offset = {rel}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endbr64_is_a_fixed_four_byte_form() {
        let bytes = [0xF3, 0x0F, 0x1E, 0xFA];
        let inst = decode_one(&bytes, 0).unwrap();
        assert_eq!(inst.mnemonic, Mnemonic::Endbr64);
        assert_eq!(inst.length, 4);
        assert_eq!(inst.text, "endbr64");
    }

    #[test]
    fn nop_decodes_with_no_operands() {
        let bytes = [0x90];
        let inst = decode_one(&bytes, 0).unwrap();
        assert_eq!(inst.text, "nop");
        assert_eq!(inst.length, 1);
    }

    #[test]
    fn ret_decodes_with_no_operands() {
        let bytes = [0xC3];
        let inst = decode_one(&bytes, 0).unwrap();
        assert_eq!(inst.mnemonic, Mnemonic::Ret);
        assert_eq!(inst.text, "ret");
    }

    #[test]
    fn mov_eax_imm32() {
        // spec.md §8 scenario 2: B8 44 33 22 11 -> mov eax 0x11223344
        let bytes = [0xB8, 0x44, 0x33, 0x22, 0x11];
        let inst = decode_one(&bytes, 0).unwrap();
        assert_eq!(inst.text, "mov  eax 0x11223344");
        assert_eq!(inst.length, 5);
    }

    #[test]
    fn mov_rax_imm64_with_rexw() {
        // spec.md §8 scenario 3: 48 B8 88 77 66 55 44 33 22 11
        let bytes = [0x48, 0xB8, 0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11];
        let inst = decode_one(&bytes, 0).unwrap();
        assert_eq!(inst.text, "mov  rax 0x1122334455667788");
        assert_eq!(inst.length, 10);
    }

    #[test]
    fn sib_base5_mod0_scenario() {
        // spec.md §8 scenario 4: 01 04 25 00 00 00 00
        let bytes = [0x01, 0x04, 0x25, 0x00, 0x00, 0x00, 0x00];
        let inst = decode_one(&bytes, 0).unwrap();
        assert_eq!(inst.text, "add  [0x00000000 + rsp * 1] eax");
        assert_eq!(inst.length, 7);
    }

    #[test]
    fn sib_general_scenario_with_rex_r() {
        // spec.md §8 scenario 5: 44 01 04 91
        let bytes = [0x44, 0x01, 0x04, 0x91];
        let inst = decode_one(&bytes, 0).unwrap();
        assert_eq!(inst.text, "add  [rcx + rdx * 4] r8d");
        assert_eq!(inst.length, 4);
    }

    #[test]
    fn jz_relative_branch() {
        let bytes = [0x74, 0x02];
        let inst = decode_one(&bytes, 0).unwrap();
        assert_eq!(inst.text, "jz 4 ; relative offset = 2");
        assert_eq!(inst.branch_target, Some(4));
    }

    #[test]
    fn unknown_opcode_is_an_opcode_lookup_error() {
        let bytes = [0x0F, 0xFF];
        let err = decode_one(&bytes, 0).unwrap_err();
        assert!(matches!(err, DecodeError::OpcodeLookup { .. }));
    }

    #[test]
    fn x87_escape_byte_doubles_as_the_modrm_byte() {
        // fadd dword ptr [rax + 0x10] (D8 /0, mod=1 reg=0 rm=0, disp8=0x10):
        // the byte after D8 is both the /digit selector and the real
        // ModR/M byte, not a separate second opcode byte.
        let bytes = [0xD8, 0x40, 0x10];
        let inst = decode_one(&bytes, 0).unwrap();
        assert_eq!(inst.mnemonic, Mnemonic::Fadd);
        assert_eq!(inst.length, 3);
        assert_eq!(inst.text, "fadd  [rax + 0x10]");
    }

    #[test]
    fn fxch_selects_by_modrm_reg_digit() {
        // D9 with ModR/M reg=1 selects FXCH (mod=3 rm=1 -> ST(1)); the
        // opcode-resolution digit and the ModR/M byte are the same byte.
        let bytes = [0xD9, 0xC9];
        let inst = decode_one(&bytes, 0).unwrap();
        assert_eq!(inst.mnemonic, Mnemonic::Fxch);
        assert_eq!(inst.length, 2);
    }

    #[test]
    fn fxch_operand_index_comes_from_modrm_rm_not_reg() {
        // D9 C8 = mod=3 reg=1 rm=0: reg=1 only selects the FXCH mnemonic
        // (the /digit), the ST(i) operand index is rm=0 -> st(0).
        let bytes = [0xD9, 0xC8];
        let inst = decode_one(&bytes, 0).unwrap();
        assert_eq!(inst.mnemonic, Mnemonic::Fxch);
        assert_eq!(inst.text, "fxch  st(0)");
    }

    #[test]
    fn push_pop_register_operand_has_no_modrm_to_read() {
        // push r15 (41 57); pop rbx (5B) -- O-form, register embedded in
        // the opcode's low 3 bits plus REX.B, no ModR/M byte at all.
        let push = decode_one(&[0x41, 0x57], 0).unwrap();
        assert_eq!(push.text, "push  r15");
        let pop = decode_one(&[0x5B], 0).unwrap();
        assert_eq!(pop.text, "pop  rbx");
    }

    #[test]
    fn xchg_register_operand_has_no_modrm_to_read() {
        // xchg r9d, eax (41 96): O-form, register from opcode low bits + REX.B.
        let inst = decode_one(&[0x41, 0x96], 0).unwrap();
        assert_eq!(inst.text, "xchg  r9d");
    }

    #[test]
    fn movaps_reg_and_rm_slots_render_distinct_registers() {
        // movaps xmm0, xmm1 (0F 28 /r, mod=3 reg=0 rm=1): the reg-slot and
        // rm-slot xmm operands must read different ModR/M fields, not both
        // collapse onto `rm`.
        let bytes = [0x0F, 0x28, 0xC1];
        let inst = decode_one(&bytes, 0).unwrap();
        assert_eq!(inst.mnemonic, Mnemonic::Movaps);
        assert_eq!(inst.text, "movaps  xmm0 xmm1");
    }

    #[test]
    fn lock_prefix_qualifies_the_mnemonic_text() {
        // lock add [rax], eax (F0 01 00)
        let bytes = [0xF0, 0x01, 0x00];
        let inst = decode_one(&bytes, 0).unwrap();
        assert!(inst.text.starts_with("lock add"));
    }

    #[test]
    fn f2_on_a_control_flow_mnemonic_renders_as_bnd() {
        // bnd jmp rel8 (F2 EB 04)
        let bytes = [0xF2, 0xEB, 0x04];
        let inst = decode_one(&bytes, 0).unwrap();
        assert!(inst.text.starts_with("bnd jmp"));
    }

    #[test]
    fn f2_on_a_non_control_flow_mnemonic_renders_as_repne() {
        // repne cmps (F2 A6)
        let bytes = [0xF2, 0xA6];
        let inst = decode_one(&bytes, 0).unwrap();
        assert_eq!(inst.text, "repne cmps");
    }

    #[test]
    fn truncated_stream_reports_truncated() {
        let bytes = [0x01, 0x04]; // SIB form but nothing after the ModR/M
        let err = decode_one(&bytes, 0).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { .. }));
    }
}
