//! The effective encoding-context prefix (spec.md §3 "Prefix (enum)").

/// Which of the table-key prefixes is in effect for this instruction.
///
/// At most one of these represents the encoding context used to key the
/// opcode tables; the raw `0x66` and REX bytes are both still consumed
/// from the stream regardless of which one wins (spec.md §4.3 steps 4-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefix {
    None,
    P66,
    Rex,
    RexW,
}

impl Prefix {
    /// The fallback chain used when a table lookup misses: `REXW -> REX -> NONE`
    /// (spec.md §4.3 step 7).
    pub fn fallback(self) -> Option<Prefix> {
        match self {
            Prefix::RexW => Some(Prefix::Rex),
            Prefix::Rex => Some(Prefix::None),
            Prefix::None => None,
            Prefix::P66 => Some(Prefix::None),
        }
    }
}

/// An instruction-prefix byte (spec.md §3), recorded separately from `Prefix`
/// because it never alters the opcode table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionPrefix {
    Lock,
    Repne,
    Rep,
    NoTrack,
}

impl InstructionPrefix {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0xF0 => Some(InstructionPrefix::Lock),
            0xF2 => Some(InstructionPrefix::Repne),
            0xF3 => Some(InstructionPrefix::Rep),
            0x3E => Some(InstructionPrefix::NoTrack),
            _ => None,
        }
    }
}

/// A segment-override prefix byte (spec.md §3); only FS/GS matter in long mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOverride {
    Fs,
    Gs,
}

impl SegmentOverride {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x64 => Some(SegmentOverride::Fs),
            0x65 => Some(SegmentOverride::Gs),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SegmentOverride::Fs => "fs:",
            SegmentOverride::Gs => "gs:",
        }
    }
}
