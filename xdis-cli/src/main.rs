//! CLI front-end: loads an ELF64 binary, builds the symbol/relocation
//! maps from `xdis-elf`, drives `xdis-core` over each requested section
//! and prints the resulting listing (SPEC_FULL.md's CLI front-end
//! module, grounded in `original_source/src/elfdisas.h`'s `print()`).

mod args;
mod listing;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use args::Args;
use xdis_core::{disassemble, Strategy};
use xdis_elf::ElfImage;

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let image = ElfImage::load(&args.binary)
        .with_context(|| format!("loading {}", args.binary.display()))?;

    let mut symbols = image.symbols();
    let (plt_symbols, reloc_offsets) = image.plt_relocations();
    symbols.extend(plt_symbols);

    let strategy: Strategy = args.strategy.into();

    if args.start.is_some() || args.end.is_some() {
        let (Some(start), Some(end)) = (args.start, args.end) else {
            bail!("--start and --end must be given together");
        };
        let spans = disassemble(image.bytes(), start, end, strategy);
        print!("{}", listing::render_section("<range>", &spans, &symbols, &reloc_offsets, args.show_bytes));
        return Ok(());
    }

    let sections: Vec<String> = if args.sections.is_empty() {
        image.printable_sections().into_iter().map(String::from).collect()
    } else {
        args.sections.clone()
    };

    for name in &sections {
        let Some(section) = image.section(name) else {
            info!("section {name} not present in {}, skipping", args.binary.display());
            continue;
        };
        let range = section.range();
        if range.is_empty() {
            continue;
        }
        let spans = disassemble(image.bytes(), range.start, range.end, strategy);
        print!("{}", listing::render_section(name, &spans, &symbols, &reloc_offsets, args.show_bytes));
    }

    println!("\n-------------------");
    println!("Done!");
    Ok(())
}
