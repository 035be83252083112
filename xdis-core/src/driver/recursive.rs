//! Recursive descent: follow control flow instead of sweeping linearly,
//! using a worklist stack and a visited-bitmap "pop rule" to avoid
//! re-entering a cycle (spec.md §4.4.1, grounded in
//! `original_source/src/disassembler.h`'s `RecursiveDescentDisAssembler::disas`).
//!
//! `start`/`end` are a half-open `[start, end)` range; the original's
//! inclusive `endAddr` bound is translated accordingly throughout.

use log::debug;

use crate::decoder::decode_one;
use crate::mnemonic::Mnemonic;
use crate::state::DisassemblyState;
use crate::state::Span;

pub fn recursive_descent(bytes: &[u8], start: usize, end: usize) -> Vec<Span> {
    let mut state = DisassemblyState::new(bytes.len());
    let mut visited = vec![false; bytes.len()];
    let mut stack: Vec<usize> = Vec::new();
    let mut cur = start;
    let mut done = false;

    while !done {
        match decode_one(bytes, cur) {
            Ok(inst) => {
                visited[cur] = true;
                let next_addr = inst.next_offset();
                let mnemonic = inst.mnemonic;
                let branch_target = inst.branch_target;
                state.record_instruction(inst);

                if mnemonic == Mnemonic::Ret || next_addr >= end {
                    pop_addr(&mut stack, &visited, &state, &mut cur, &mut done);
                } else if let Some(target) = branch_target {
                    if target == next_addr {
                        if next_addr < end && !visited[next_addr] {
                            cur = next_addr;
                        } else {
                            pop_addr(&mut stack, &visited, &state, &mut cur, &mut done);
                        }
                    } else {
                        if next_addr < end && !state.is_decoded(next_addr) && !visited[next_addr] {
                            stack.push(next_addr);
                        }
                        if target < end && !visited[target] {
                            cur = target;
                        } else {
                            pop_addr(&mut stack, &visited, &state, &mut cur, &mut done);
                        }
                    }
                } else {
                    // indirect control flow (unresolvable target) behaves
                    // like a terminator: there is nowhere textual to follow.
                    pop_addr(&mut stack, &visited, &state, &mut cur, &mut done);
                }
            }
            Err(e) => {
                debug!("{:#x}: {e}", cur);
                visited[cur] = true;
                state.record_error_byte(cur);

                if cur + 1 < end && !visited[cur + 1] {
                    cur += 1;
                } else {
                    pop_addr(&mut stack, &visited, &state, &mut cur, &mut done);
                }
            }
        }
    }

    state.finish()
}

/// Repeatedly pop the worklist until an address that is neither already
/// decoded nor already visited is found, or the stack empties.
fn pop_addr(stack: &mut Vec<usize>, visited: &[bool], state: &DisassemblyState, cur: &mut usize, done: &mut bool) {
    loop {
        match stack.pop() {
            None => {
                *done = true;
                return;
            }
            Some(addr) => {
                if !state.is_decoded(addr) && !visited[addr] {
                    *cur = addr;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Span;

    #[test]
    fn follows_an_unconditional_jump_forward() {
        // jmp +1 (to the nop at offset 3), then ret; the fallthrough at
        // offset 2 is still pushed as a speculative candidate (the pop-rule
        // worklist doesn't distinguish unconditional jumps from conditional
        // ones — see the original driver this is grounded on) and gets
        // explored too once the jump's own chain hits `ret`.
        let bytes = [0xEB, 0x01, 0xFF, 0x90, 0xC3];
        let spans = recursive_descent(&bytes, 0, bytes.len());
        assert!(spans.iter().any(|s| matches!(s, Span::Instruction(i) if i.start_addr == 0)));
        assert!(spans.iter().any(|s| matches!(s, Span::Instruction(i) if i.start_addr == 3)));
        assert!(spans.iter().any(|s| matches!(s, Span::Instruction(i) if i.start_addr == 4)));
    }

    #[test]
    fn stops_at_ret_and_does_not_loop_forever_on_a_backward_jump() {
        // loop: jmp back to self (EB FE) — visited-bitmap must terminate this
        let bytes = [0xEB, 0xFE];
        let spans = recursive_descent(&bytes, 0, bytes.len());
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn explores_both_sides_of_a_conditional_branch() {
        // jz +1 (to the ret at offset 4), fallthrough nop at offset 2, nop, ret
        let bytes = [0x74, 0x01, 0x90, 0x90, 0xC3];
        let spans = recursive_descent(&bytes, 0, bytes.len());
        assert!(spans.iter().any(|s| matches!(s, Span::Instruction(i) if i.start_addr == 0)));
        assert!(spans.iter().any(|s| matches!(s, Span::Instruction(i) if i.start_addr == 2)));
        assert!(spans.iter().any(|s| matches!(s, Span::Instruction(i) if i.start_addr == 4)));
    }
}
