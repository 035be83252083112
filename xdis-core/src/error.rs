//! Decode failures (spec.md §4.3/§7): a lookup miss or a truncated stream,
//! each carrying enough context for a useful diagnostic line.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No opcode-table row matched `(prefix, opcode[, /digit])` at `offset`.
    #[error("no opcode table entry for byte {byte:#04x} at offset {offset:#x}")]
    OpcodeLookup { offset: usize, byte: u8 },

    /// The opcode row matched but no operand-table entry covered the
    /// resulting `(prefix, mnemonic, opcode)` key.
    #[error("no operand table entry for mnemonic at offset {offset:#x} (opcode byte {byte:#04x})")]
    OperandLookup { offset: usize, byte: u8 },

    /// Fewer bytes remained in the section than the instruction needed to
    /// finish decoding (ModR/M, SIB, displacement or immediate ran past the
    /// end of the buffer).
    #[error("instruction at offset {offset:#x} truncated: needed {needed} more byte(s), {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
}

impl DecodeError {
    /// The offset at which decoding failed, for building `UNKNOWN-INSTRUCTION`
    /// spans (spec.md §4.4.3).
    pub fn offset(&self) -> usize {
        match self {
            DecodeError::OpcodeLookup { offset, .. } => *offset,
            DecodeError::OperandLookup { offset, .. } => *offset,
            DecodeError::Truncated { offset, .. } => *offset,
        }
    }
}

pub type DecodeResult<T> = Result<T, DecodeError>;
