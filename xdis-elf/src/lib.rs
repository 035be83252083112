//! The ELF64 front-end collaborator spec.md §1 treats as out of scope for
//! the disassembler core: file/section header parsing, `.symtab`/`.dynsym`
//! symbol walking, and `.rela.plt` relocation walking, producing the
//! `addr -> symbol` / `addr -> relocation-offset` maps `xdis-core`
//! consumes. No disassembly logic lives here.

pub mod error;
pub mod header;
pub mod image;
pub mod reloc;
pub mod section;
pub mod symtab;

pub use error::{ElfError, ElfResult};
pub use image::{AddrToRelocOffset, AddrToSymbol, ElfImage, PLT_SEC_ENTRY_SIZE, PLT_SUFFIX};
