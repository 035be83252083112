//! Command-line flags (SPEC_FULL.md's CLI front-end module), grounded in
//! `original_source/src/elfdisas.h`'s `ELFDisAssembler(binaryPath,
//! strategy)` constructor and `print()` for the flag/field shape.

use clap::{Parser, ValueEnum};
use xdis_core::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    #[value(name = "linear-sweep")]
    LinearSweep,
    #[value(name = "recursive-descent")]
    RecursiveDescent,
}

impl From<StrategyArg> for Strategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::LinearSweep => Strategy::LinearSweep,
            StrategyArg::RecursiveDescent => Strategy::RecursiveDescent,
        }
    }
}

/// Disassemble an ELF64 executable's code sections into a symbol-annotated
/// listing.
#[derive(Debug, Parser)]
#[command(name = "xdis", version, about)]
pub struct Args {
    /// Path to the ELF64 binary to disassemble.
    pub binary: std::path::PathBuf,

    /// Which disassembly driver to use.
    #[arg(long, value_enum, default_value = "linear-sweep")]
    pub strategy: StrategyArg,

    /// Section(s) to disassemble. Repeatable; defaults to every printable
    /// section present in the binary (`.text`, `.init`, `.fini`,
    /// `.plt.got`, `.plt.sec`) when omitted.
    #[arg(long = "section")]
    pub sections: Vec<String>,

    /// Override the start offset (hex, e.g. `0x1000`), bypassing section
    /// bounds. Requires `--end`.
    #[arg(long, value_parser = parse_hex)]
    pub start: Option<usize>,

    /// Override the end offset (hex, exclusive). Requires `--start`.
    #[arg(long, value_parser = parse_hex)]
    pub end: Option<usize>,

    /// Print each instruction's raw encoded bytes after its text.
    #[arg(long)]
    pub show_bytes: bool,

    /// Raise the default log level from `warn` to `debug`.
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_hex(s: &str) -> Result<usize, std::num::ParseIntError> {
    usize::from_str_radix(s.trim_start_matches("0x").trim_start_matches("0X"), 16)
}
