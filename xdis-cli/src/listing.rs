//! Listing formatting (SPEC_FULL.md's CLI front-end), grounded in
//! `original_source/src/elfdisas.h`'s `print()`: a section separator line,
//! a `<addr> <symbol>:` header the first time a decoded instruction's
//! address lands exactly on a known symbol, then one padded line per
//! instruction.

use xdis_core::state::Span;
use xdis_core::symbols::bind_symbol;
use xdis_elf::{AddrToRelocOffset, AddrToSymbol};

pub fn render_section(
    name: &str,
    spans: &[Span],
    symbols: &AddrToSymbol,
    reloc_offsets: &AddrToRelocOffset,
    show_bytes: bool,
) -> String {
    let max_text_width = spans
        .iter()
        .filter_map(|s| match s {
            Span::Instruction(i) => Some(i.text.len()),
            Span::Error { .. } => None,
        })
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!("\nsection: {name} ----\n"));

    for span in spans {
        match span {
            Span::Instruction(inst) => {
                if let Some(symbol) = symbols.get(&inst.start_addr) {
                    out.push('\n');
                    out.push_str(&format!("{:x} <{symbol}>:", inst.start_addr));
                    if let Some(offset) = reloc_offsets.get(&inst.start_addr) {
                        out.push_str(&format!(" #{offset:x}"));
                    }
                    out.push('\n');
                }

                let text = bind_symbol(&inst.text, inst.branch_target, symbols);
                out.push_str(&format!(" {:x}: {:<width$}", inst.start_addr, text, width = max_text_width));
                if show_bytes {
                    out.push_str(" ( ");
                    for b in &inst.bytes {
                        out.push_str(&format!("{b:x} "));
                    }
                    out.push(')');
                }
                out.push('\n');
            }
            Span::Error { start, .. } => {
                out.push_str(&format!(" {:x}: {:<width$}\n", start, "UNKNOWN-INSTRUCTION", width = max_text_width));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use xdis_core::{decode_one, Mnemonic};

    #[test]
    fn emits_symbol_header_on_exact_address_match() {
        let inst = decode_one(&[0x90], 0).unwrap();
        assert_eq!(inst.mnemonic, Mnemonic::Nop);
        let spans = vec![Span::Instruction(inst)];
        let mut symbols = HashMap::new();
        symbols.insert(0usize, "main".to_string());
        let text = render_section(".text", &spans, &symbols, &HashMap::new(), false);
        assert!(text.contains("0 <main>:"));
        assert!(text.contains(" 0: nop"));
    }

    #[test]
    fn show_bytes_appends_raw_hex_in_parens() {
        let inst = decode_one(&[0xC3], 0).unwrap();
        let spans = vec![Span::Instruction(inst)];
        let text = render_section(".text", &spans, &HashMap::new(), &HashMap::new(), true);
        assert!(text.contains("( c3 )"));
    }

    #[test]
    fn control_flow_targets_get_inline_symbol_annotation() {
        // call +0 -> target == next_offset == 5
        let inst = decode_one(&[0xE8, 0x00, 0x00, 0x00, 0x00], 0).unwrap();
        let spans = vec![Span::Instruction(inst)];
        let mut symbols = HashMap::new();
        symbols.insert(5usize, "helper".to_string());
        let text = render_section(".text", &spans, &symbols, &HashMap::new(), false);
        // symbol sits between the hex target and the relative-offset comment.
        assert!(text.contains("call 5 <helper> ; relative offset = 0"));
    }

    #[test]
    fn error_spans_render_as_unknown_instruction() {
        let spans = vec![Span::Error { start: 2, end: 3 }];
        let text = render_section(".text", &spans, &HashMap::new(), &HashMap::new(), false);
        assert!(text.contains("UNKNOWN-INSTRUCTION"));
    }
}
