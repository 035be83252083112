//! Symbol binding (spec.md §4.5): a purely textual annotation of
//! control-flow targets, driven by an `addr -> name` map supplied by an
//! external collaborator (the ELF front-end, out of scope for this crate).

use std::collections::HashMap;

/// `addr -> symbol name`, built by a front-end (e.g. from an ELF symbol
/// table) and handed to the driver/renderer read-only.
pub type SymbolMap = HashMap<usize, String>;

/// Splice `<symbol>` into a control-flow instruction's rendered text if
/// `target` resolves to a known symbol (spec.md §4.5). The textual form a
/// control-flow instruction renders to is `<mnemonic> <hex-target> ;
/// relative offset = ...` (spec.md §4.3 step 14 / §6); the symbol belongs
/// right after the hex target, not at the very end of the string, so this
/// inserts it just before the ` ; ` comment rather than appending past it.
/// Returns `text` unchanged when there is no match or no such comment.
pub fn bind_symbol(text: &str, target: Option<usize>, symbols: &SymbolMap) -> String {
    let Some(name) = target.and_then(|addr| symbols.get(&addr)) else {
        return text.to_string();
    };
    match text.find(" ; ") {
        Some(idx) => format!("{} <{name}>{}", &text[..idx], &text[idx..]),
        None => format!("{text} <{name}>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_symbol_name_between_the_hex_target_and_the_comment() {
        let mut symbols = SymbolMap::new();
        symbols.insert(0x1000, "main".to_string());
        let text = bind_symbol("call 1000 ; relative offset = 10", Some(0x1000), &symbols);
        assert_eq!(text, "call 1000 <main> ; relative offset = 10");
    }

    #[test]
    fn leaves_text_unchanged_when_no_symbol_matches() {
        let symbols = SymbolMap::new();
        let text = bind_symbol("call 2000 ; relative offset = 10", Some(0x2000), &symbols);
        assert_eq!(text, "call 2000 ; relative offset = 10");
    }

    #[test]
    fn leaves_text_unchanged_for_non_control_flow_targets() {
        let mut symbols = SymbolMap::new();
        symbols.insert(0x1000, "main".to_string());
        let text = bind_symbol("nop", None, &symbols);
        assert_eq!(text, "nop");
    }
}
