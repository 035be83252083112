//! A static x86-64 instruction decoder and disassembly driver, with no
//! knowledge of ELF or any other container format: callers hand it bytes
//! and get back instruction text, either by sweeping linearly or by
//! following control flow.

#![forbid(unsafe_code)]

pub mod addressing;
pub mod decoder;
pub mod driver;
pub mod encoding;
pub mod error;
pub mod instruction;
pub mod mnemonic;
pub mod modrm;
pub mod operand;
pub mod prefix;
pub mod registers;
pub mod rex;
pub mod state;
pub mod symbols;
pub mod tables;

pub use decoder::decode_one;
pub use driver::{disassemble, Strategy};
pub use error::{DecodeError, DecodeResult};
pub use instruction::DecodedInstruction;
pub use mnemonic::Mnemonic;
pub use state::{DisassemblyState, Span};
pub use symbols::{bind_symbol, SymbolMap};
