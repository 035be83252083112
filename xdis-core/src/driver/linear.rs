//! Linear sweep: decode forward byte-by-byte, re-synchronizing one byte at
//! a time after a decode failure (spec.md §4.4.1, grounded in
//! `original_source/src/disassembler.h`'s `LinearSweepDisAssembler::disas`).

use log::debug;

use crate::decoder::decode_one;
use crate::state::{DisassemblyState, Span};

pub fn linear_sweep(bytes: &[u8], start: usize, end: usize) -> Vec<Span> {
    let mut state = DisassemblyState::new(bytes.len());
    let mut cur = start;

    while cur < end {
        match decode_one(bytes, cur) {
            Ok(inst) => {
                let next = inst.next_offset();
                state.record_instruction(inst);
                cur = next;
            }
            Err(e) => {
                debug!("{:#x}: {e}", cur);
                state.record_error_byte(cur);
                cur += 1;
            }
        }
    }

    state.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Span;

    #[test]
    fn sweeps_forward_past_an_undecodable_byte() {
        // nop, one junk byte (two-byte escape with an unknown second byte), ret
        let bytes = [0x90, 0x0F, 0xFF, 0xC3];
        let spans = linear_sweep(&bytes, 0, bytes.len());
        assert!(spans.iter().any(|s| matches!(s, Span::Instruction(i) if i.start_addr == 0)));
        assert!(spans.iter().any(|s| matches!(s, Span::Error { .. })));
        assert!(spans.iter().any(|s| matches!(s, Span::Instruction(i) if i.text == "ret")));
    }

    #[test]
    fn decodes_a_straight_line_run() {
        let bytes = [0x90, 0x90, 0xC3];
        let spans = linear_sweep(&bytes, 0, bytes.len());
        assert_eq!(spans.len(), 3);
    }
}
