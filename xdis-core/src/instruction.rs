//! `DecodedInstruction` — the record a successful decode produces
//! (spec.md §3).

use crate::mnemonic::Mnemonic;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Byte offset into the section where this instruction starts.
    pub start_addr: usize,
    /// Total encoded length in bytes, including every prefix.
    pub length: usize,
    pub mnemonic: Mnemonic,
    /// The fully rendered instruction text (mnemonic plus operands, or the
    /// control-flow form with its relative-offset comment).
    pub text: String,
    /// For control-flow instructions whose target lands inside the image,
    /// the resolved absolute byte offset (spec.md §4.4.2 / §4.5).
    pub branch_target: Option<usize>,
    /// Raw encoded bytes, kept for `--show-bytes` style listings.
    pub bytes: Vec<u8>,
}

impl DecodedInstruction {
    pub fn next_offset(&self) -> usize {
        self.start_addr + self.length
    }
}
