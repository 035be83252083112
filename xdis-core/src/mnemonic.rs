//! `Mnemonic` — the finite enumeration of supported instruction names
//! (spec.md §3). Closed enumeration, exhaustive dispatch everywhere it's
//! matched (spec.md §9 "sum types, not inheritance").

use std::fmt;

use crate::registers::CONDITION_CODES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Add,
    Or,
    Adc,
    Sbb,
    And,
    Sub,
    Xor,
    Cmp,
    Mov,
    Lea,
    Push,
    Pop,
    Inc,
    Dec,
    Not,
    Neg,
    Mul,
    Imul,
    Div,
    Idiv,
    Test,
    Xchg,
    Rol,
    Ror,
    Rcl,
    Rcr,
    Shl,
    Shr,
    Sar,
    Call,
    Jmp,
    /// Conditional jump; the payload is the 4-bit condition code (spec.md
    /// §3 "Jcc", enumerated generically there — the condition is carried
    /// as data rather than fanning out into 16 enum variants).
    Jcc(u8),
    Loop,
    Loope,
    Loopne,
    Ret,
    Movs,
    Stos,
    Cmps,
    Scas,
    Lods,
    Pushf,
    Popf,
    Clc,
    Stc,
    Cld,
    Std,
    Nop,
    Ud2,
    Int3,
    Int,
    Cpuid,
    Syscall,
    Endbr64,
    Endbr32,
    Hlt,
    Movaps,
    Fadd,
    Fxch,
}

impl Mnemonic {
    /// Control-flow mnemonics, per spec.md §4.3 step 14 / §4.4.2.
    pub fn is_control_flow(self) -> bool {
        matches!(
            self,
            Mnemonic::Call | Mnemonic::Jmp | Mnemonic::Jcc(_) | Mnemonic::Loop
                | Mnemonic::Loope
                | Mnemonic::Loopne
        )
    }

    pub fn is_loop(self) -> bool {
        matches!(self, Mnemonic::Loop | Mnemonic::Loope | Mnemonic::Loopne)
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mnemonic::Add => write!(f, "add"),
            Mnemonic::Or => write!(f, "or"),
            Mnemonic::Adc => write!(f, "adc"),
            Mnemonic::Sbb => write!(f, "sbb"),
            Mnemonic::And => write!(f, "and"),
            Mnemonic::Sub => write!(f, "sub"),
            Mnemonic::Xor => write!(f, "xor"),
            Mnemonic::Cmp => write!(f, "cmp"),
            Mnemonic::Mov => write!(f, "mov"),
            Mnemonic::Lea => write!(f, "lea"),
            Mnemonic::Push => write!(f, "push"),
            Mnemonic::Pop => write!(f, "pop"),
            Mnemonic::Inc => write!(f, "inc"),
            Mnemonic::Dec => write!(f, "dec"),
            Mnemonic::Not => write!(f, "not"),
            Mnemonic::Neg => write!(f, "neg"),
            Mnemonic::Mul => write!(f, "mul"),
            Mnemonic::Imul => write!(f, "imul"),
            Mnemonic::Div => write!(f, "div"),
            Mnemonic::Idiv => write!(f, "idiv"),
            Mnemonic::Test => write!(f, "test"),
            Mnemonic::Xchg => write!(f, "xchg"),
            Mnemonic::Rol => write!(f, "rol"),
            Mnemonic::Ror => write!(f, "ror"),
            Mnemonic::Rcl => write!(f, "rcl"),
            Mnemonic::Rcr => write!(f, "rcr"),
            Mnemonic::Shl => write!(f, "shl"),
            Mnemonic::Shr => write!(f, "shr"),
            Mnemonic::Sar => write!(f, "sar"),
            Mnemonic::Call => write!(f, "call"),
            Mnemonic::Jmp => write!(f, "jmp"),
            Mnemonic::Jcc(cc) => write!(f, "j{}", CONDITION_CODES[*cc as usize]),
            Mnemonic::Loop => write!(f, "loop"),
            Mnemonic::Loope => write!(f, "loope"),
            Mnemonic::Loopne => write!(f, "loopne"),
            Mnemonic::Ret => write!(f, "ret"),
            Mnemonic::Movs => write!(f, "movs"),
            Mnemonic::Stos => write!(f, "stos"),
            Mnemonic::Cmps => write!(f, "cmps"),
            Mnemonic::Scas => write!(f, "scas"),
            Mnemonic::Lods => write!(f, "lods"),
            Mnemonic::Pushf => write!(f, "pushf"),
            Mnemonic::Popf => write!(f, "popf"),
            Mnemonic::Clc => write!(f, "clc"),
            Mnemonic::Stc => write!(f, "stc"),
            Mnemonic::Cld => write!(f, "cld"),
            Mnemonic::Std => write!(f, "std"),
            Mnemonic::Nop => write!(f, "nop"),
            Mnemonic::Ud2 => write!(f, "ud2"),
            Mnemonic::Int3 => write!(f, "int3"),
            Mnemonic::Int => write!(f, "int"),
            Mnemonic::Cpuid => write!(f, "cpuid"),
            Mnemonic::Syscall => write!(f, "syscall"),
            Mnemonic::Endbr64 => write!(f, "endbr64"),
            Mnemonic::Endbr32 => write!(f, "endbr32"),
            Mnemonic::Hlt => write!(f, "hlt"),
            Mnemonic::Movaps => write!(f, "movaps"),
            Mnemonic::Fadd => write!(f, "fadd"),
            Mnemonic::Fxch => write!(f, "fxch"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jcc_renders_condition_suffix() {
        assert_eq!(Mnemonic::Jcc(4).to_string(), "jz");
        assert_eq!(Mnemonic::Jcc(5).to_string(), "jnz");
    }

    #[test]
    fn control_flow_classification() {
        assert!(Mnemonic::Call.is_control_flow());
        assert!(Mnemonic::Jcc(0).is_control_flow());
        assert!(Mnemonic::Loope.is_control_flow());
        assert!(!Mnemonic::Mov.is_control_flow());
        assert!(!Mnemonic::Ret.is_control_flow());
    }
}
