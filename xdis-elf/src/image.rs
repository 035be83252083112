//! `ElfImage` — the external ELF64 front-end collaborator spec.md §1
//! treats as out of scope for the disassembler core: file/section header
//! parsing, symbol-table walking, and `.rela.plt` relocation walking,
//! producing the `addr -> symbol` and `addr -> relocation-offset` maps
//! the core consumes (spec.md §6).
//!
//! Grounded end to end in `original_source/src/elfdisas.h`'s
//! `ELFDisAssembler` constructor sequence (`_parseFileHeader` ->
//! `_parseSectionHeader` -> `_parseSymTabSection` -> `_parseDynSymSection`
//! -> `_parsePltSecSection`).

use std::collections::HashMap;
use std::path::Path;

use log::{debug, warn};

use crate::error::{ElfError, ElfResult};
use crate::header::Elf64Header;
use crate::reloc::{Elf64Rela, RELA_ENTRY_SIZE};
use crate::section::{Elf64SectionHeader, SECTION_HEADER_SIZE};
use crate::symtab::{read_str, Elf64Sym, STT_FUNC, SYM_ENTRY_SIZE};

/// Suffix appended to a symbol name resolved through `.rela.plt`, matching
/// `original_source/src/elfdisas.h`'s `SECTION_LABEL_POSTFIX` map for
/// `.plt.got`/`.plt.sec`.
pub const PLT_SUFFIX: &str = "@plt";

/// Size of one `.plt.sec` stub. Not pinned down anywhere in the original
/// source available to this port; 16 bytes is the standard x86-64
/// `endbr64; bnd jmp *rel32(%rip); nop` stub `gcc`/`ld` emit for
/// `-fcf-protection`, and is the value used here (see DESIGN.md).
pub const PLT_SEC_ENTRY_SIZE: u64 = 16;

pub type AddrToSymbol = HashMap<usize, String>;
pub type AddrToRelocOffset = HashMap<usize, u64>;

/// A loaded, parsed ELF64 image: the raw bytes plus the section header
/// table, ready to build the maps the disassembler core consumes.
pub struct ElfImage {
    bytes: Vec<u8>,
    header: Elf64Header,
    sections: HashMap<String, Elf64SectionHeader>,
}

impl ElfImage {
    /// Read `path` off disk and parse its ELF64 file/section headers.
    pub fn load(path: impl AsRef<Path>) -> ElfResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ElfError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(bytes)
    }

    /// Parse an already-loaded byte image (split out from [`load`] for
    /// in-memory testing without touching the filesystem).
    pub fn parse(bytes: Vec<u8>) -> ElfResult<Self> {
        let header = Elf64Header::parse(&bytes)?;
        let sections = parse_section_headers(&bytes, &header)?;
        Ok(ElfImage { bytes, header, sections })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn header(&self) -> &Elf64Header {
        &self.header
    }

    pub fn section(&self, name: &str) -> Option<&Elf64SectionHeader> {
        self.sections.get(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Walk `.symtab`+`.strtab` (falling back to `.dynsym`+`.dynstr` for a
    /// stripped binary) and return the `addr -> name` map restricted to
    /// non-zero-valued `STT_FUNC` symbols, per
    /// `original_source/src/elfdisas.h`'s `_parseSymTabSection`.
    pub fn symbols(&self) -> AddrToSymbol {
        let mut map = self.walk_symtab(".symtab", ".strtab");
        if map.is_empty() {
            debug!(".symtab absent or empty, falling back to .dynsym");
            map = self.walk_symtab(".dynsym", ".dynstr");
        }
        map
    }

    fn walk_symtab(&self, symtab_name: &str, strtab_name: &str) -> AddrToSymbol {
        let mut map = AddrToSymbol::new();
        let (Some(symtab), Some(strtab)) = (self.section(symtab_name), self.section(strtab_name)) else {
            return map;
        };
        let entry_size = if symtab.sh_entsize > 0 { symtab.sh_entsize as usize } else { SYM_ENTRY_SIZE };
        let count = symtab.sh_size as usize / entry_size;
        let strtab_bytes = &self.bytes[strtab.clamped_range(self.bytes.len())];

        for i in 0..count {
            let off = symtab.sh_offset as usize + i * entry_size;
            if off + SYM_ENTRY_SIZE > self.bytes.len() {
                warn!("{symtab_name} entry {i} lies beyond the file, stopping walk");
                break;
            }
            let sym = Elf64Sym::parse(&self.bytes[off..off + SYM_ENTRY_SIZE]);
            if sym.symbol_type() != STT_FUNC || sym.st_value == 0 {
                continue;
            }
            let name = read_str(strtab_bytes, sym.st_name as usize);
            if !name.is_empty() {
                map.insert(sym.st_value as usize, name);
            }
        }
        map
    }

    /// Walk `.rela.plt` against `.dynsym`/`.dynstr` to resolve each PLT
    /// stub's symbol name and build the `addr -> relocation-offset` side
    /// map, then project those names onto `.plt.sec` stub addresses with
    /// the `@plt` suffix (`original_source/src/elfdisas.h`'s
    /// `_parseDynSymSection` + `_parsePltSecSection`). Returns
    /// `(addr2symbol, addr2roffset)`; the caller merges `addr2symbol` into
    /// the map from [`symbols`].
    pub fn plt_relocations(&self) -> (AddrToSymbol, AddrToRelocOffset) {
        let mut plt_symbols = AddrToSymbol::new();
        let mut plt_roffsets = AddrToRelocOffset::new();

        let (Some(rela_plt), Some(dynsym), Some(dynstr)) =
            (self.section(".rela.plt"), self.section(".dynsym"), self.section(".dynstr"))
        else {
            return (plt_symbols, plt_roffsets);
        };
        let Some(plt_sec) = self.section(".plt.sec") else {
            return (plt_symbols, plt_roffsets);
        };

        let dynsym_entry_size = if dynsym.sh_entsize > 0 { dynsym.sh_entsize as usize } else { SYM_ENTRY_SIZE };
        let dynstr_bytes = &self.bytes[dynstr.clamped_range(self.bytes.len())];
        let rela_entry_size = if rela_plt.sh_entsize > 0 { rela_plt.sh_entsize as usize } else { RELA_ENTRY_SIZE };
        let count = rela_plt.sh_size as usize / rela_entry_size;

        for idx in 0..count {
            let rela_off = rela_plt.sh_offset as usize + idx * rela_entry_size;
            if rela_off + RELA_ENTRY_SIZE > self.bytes.len() {
                warn!(".rela.plt entry {idx} lies beyond the file, stopping walk");
                break;
            }
            let rela = Elf64Rela::parse(&self.bytes[rela_off..rela_off + RELA_ENTRY_SIZE]);

            let sym_off = dynsym.sh_offset as usize + rela.symbol_index() * dynsym_entry_size;
            if sym_off + SYM_ENTRY_SIZE > self.bytes.len() {
                continue;
            }
            let sym = Elf64Sym::parse(&self.bytes[sym_off..sym_off + SYM_ENTRY_SIZE]);
            let name = read_str(dynstr_bytes, sym.st_name as usize);
            if name.is_empty() {
                continue;
            }

            let stub_addr = plt_sec.sh_offset + idx as u64 * PLT_SEC_ENTRY_SIZE;
            plt_symbols.insert(stub_addr as usize, format!("{name}{PLT_SUFFIX}"));
            plt_roffsets.insert(stub_addr as usize, rela.r_offset);
        }

        (plt_symbols, plt_roffsets)
    }

    /// The printable-section allowlist the CLI disassembles by default,
    /// restricted to sections actually present in this image.
    pub fn printable_sections(&self) -> Vec<&str> {
        crate::section::PRINTABLE_SECTIONS
            .iter()
            .copied()
            .filter(|name| self.sections.contains_key(*name))
            .collect()
    }
}

fn parse_section_headers(data: &[u8], header: &Elf64Header) -> ElfResult<HashMap<String, Elf64SectionHeader>> {
    let entsize = if header.e_shentsize > 0 { header.e_shentsize as usize } else { SECTION_HEADER_SIZE };

    let shstr_off = header.e_shoff as usize + header.e_shstrndx as usize * entsize;
    if shstr_off + SECTION_HEADER_SIZE > data.len() {
        return Err(ElfError::MissingStringTable { shstrndx: header.e_shstrndx as usize });
    }
    let shstrtab = Elf64SectionHeader::parse(&data[shstr_off..shstr_off + SECTION_HEADER_SIZE]);
    let shstr_bytes = &data[shstrtab.clamped_range(data.len())];

    let mut sections = HashMap::new();
    for i in 0..header.e_shnum as usize {
        let off = header.e_shoff as usize + i * entsize;
        if off + SECTION_HEADER_SIZE > data.len() {
            return Err(ElfError::SectionOutOfBounds { index: i, len: data.len() });
        }
        let sh = Elf64SectionHeader::parse(&data[off..off + SECTION_HEADER_SIZE]);
        let name = read_str(shstr_bytes, sh.sh_name as usize);
        sections.insert(name, sh);
    }

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal single-section ELF64 image: file header + section
    /// header table with one `.shstrtab` entry (so the parser has
    /// somewhere to resolve names from) and no symbol/relocation tables.
    fn minimal_image() -> Vec<u8> {
        let shstrtab_name = b"\0.shstrtab\0";
        let mut data = vec![0u8; crate::header::FILE_HEADER_SIZE];
        data[0..4].copy_from_slice(&crate::header::EI_MAG);
        data[4] = crate::header::ELFCLASS64;
        data[5] = crate::header::ELFDATA2LSB;

        let shstrtab_off = data.len();
        data.extend_from_slice(shstrtab_name);

        let sh_off = data.len();
        data.extend_from_slice(&[0u8; SECTION_HEADER_SIZE]);
        data[sh_off..sh_off + 4].copy_from_slice(&1u32.to_le_bytes()); // sh_name = "shstrtab"
        data[sh_off + 0x18..sh_off + 0x20].copy_from_slice(&(shstrtab_off as u64).to_le_bytes());
        data[sh_off + 0x20..sh_off + 0x28].copy_from_slice(&(shstrtab_name.len() as u64).to_le_bytes());

        data[0x28..0x30].copy_from_slice(&(sh_off as u64).to_le_bytes());
        data[0x3A..0x3C].copy_from_slice(&(SECTION_HEADER_SIZE as u16).to_le_bytes());
        data[0x3C..0x3E].copy_from_slice(&1u16.to_le_bytes());
        data[0x3E..0x40].copy_from_slice(&0u16.to_le_bytes());

        data
    }

    #[test]
    fn parses_section_names_from_shstrtab() {
        let image = ElfImage::parse(minimal_image()).unwrap();
        assert!(image.section(".shstrtab").is_some());
    }

    #[test]
    fn missing_symbol_tables_yield_an_empty_symbol_map() {
        let image = ElfImage::parse(minimal_image()).unwrap();
        assert!(image.symbols().is_empty());
    }

    #[test]
    fn missing_plt_tables_yield_empty_reloc_maps() {
        let image = ElfImage::parse(minimal_image()).unwrap();
        let (syms, offs) = image.plt_relocations();
        assert!(syms.is_empty());
        assert!(offs.is_empty());
    }

    #[test]
    fn rejects_non_elf_input() {
        let err = ElfImage::parse(vec![0u8; 64]).unwrap_err();
        assert!(matches!(err, ElfError::BadMagic));
    }
}
