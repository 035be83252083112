//! `OperandKind` — abstract operand categories the opcode tables refer to
//! (spec.md §3).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    One,
    Imm8,
    Imm16,
    Imm32,
    Imm64,
    Reg8,
    Reg16,
    Reg32,
    Reg64,
    Rm8,
    Rm16,
    Rm32,
    Rm64,
    Xmm,
    Ymm,
    Xm128,
    M,
    M32Fp,
    M64Fp,
    Al,
    Ax,
    Eax,
    Rax,
    Cl,
    Dx,
    St0,
    Sti,
    Moffs8,
    Moffs16,
    Moffs32,
    Moffs64,
    Sreg,
}

impl OperandKind {
    /// The bit width of this operand, for operands that name one.
    pub fn width(self) -> Option<u32> {
        use OperandKind::*;
        match self {
            Reg8 | Rm8 | Imm8 | Al | Cl | Moffs8 => Some(8),
            Reg16 | Rm16 | Imm16 | Ax | Dx | Moffs16 => Some(16),
            Reg32 | Rm32 | Imm32 | Eax | Moffs32 => Some(32),
            Reg64 | Rm64 | Imm64 | Rax | Moffs64 => Some(64),
            _ => None,
        }
    }

}
