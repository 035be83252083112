//! Failures that can occur while loading and parsing an ELF64 image
//! (SPEC_FULL.md's ELF front-end module).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElfError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("file is too short to hold an ELF64 header ({len} bytes)")]
    TooShort { len: usize },

    #[error("not an ELF file (bad magic)")]
    BadMagic,

    #[error("not a 64-bit ELF file (e_ident[EI_CLASS] = {class})")]
    NotElf64 { class: u8 },

    #[error("not a little-endian ELF file (e_ident[EI_DATA] = {data})")]
    NotLittleEndian { data: u8 },

    #[error("section header table entry at index {index} lies beyond the file ({len} bytes)")]
    SectionOutOfBounds { index: usize, len: usize },

    #[error("section string table index {shstrndx} has no corresponding section header")]
    MissingStringTable { shstrndx: usize },
}

pub type ElfResult<T> = Result<T, ElfError>;
