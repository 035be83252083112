//! `DisassemblyState` — the bookkeeping both disassembly drivers share
//! (spec.md §3, §4.4): which byte offsets have been successfully decoded,
//! the accumulated instruction/error spans, and the running
//! `max_text_width` used to align a listing.

use std::collections::BTreeMap;

use crate::instruction::DecodedInstruction;

pub const UNKNOWN_INSTRUCTION: &str = "UNKNOWN-INSTRUCTION";

/// One entry in the final disassembly listing: either a successfully
/// decoded instruction, or a run of bytes that failed to decode
/// (spec.md §4.4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Instruction(DecodedInstruction),
    Error { start: usize, end: usize },
}

impl Span {
    pub fn start(&self) -> usize {
        match self {
            Span::Instruction(i) => i.start_addr,
            Span::Error { start, .. } => *start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            Span::Instruction(i) => i.next_offset(),
            Span::Error { end, .. } => *end,
        }
    }
}

#[derive(Debug, Default)]
pub struct DisassemblyState {
    /// Byte offsets that have already been claimed by a successful decode
    /// (spec.md §4.4.1's non-overlap / no-redecode invariant).
    decoded: Vec<bool>,
    /// Spans in start-offset order, ready to render as a listing.
    spans: BTreeMap<usize, Span>,
    /// The current run of consecutive single-byte decode failures,
    /// coalesced into one `Span::Error` once a decode succeeds again.
    error_run: Option<(usize, usize)>,
    pub max_text_width: usize,
}

impl DisassemblyState {
    pub fn new(image_len: usize) -> Self {
        DisassemblyState {
            decoded: vec![false; image_len],
            spans: BTreeMap::new(),
            error_run: None,
            max_text_width: 0,
        }
    }

    pub fn is_decoded(&self, offset: usize) -> bool {
        self.decoded.get(offset).copied().unwrap_or(false)
    }

    /// Record a successful decode, unless any byte in its span was already
    /// claimed by an earlier decode (spec.md §4.4.1: first decode wins, a
    /// later pass over the same bytes is silently dropped).
    pub fn record_instruction(&mut self, inst: DecodedInstruction) {
        let (start, end) = (inst.start_addr, inst.next_offset());
        if (start..end).any(|i| self.is_decoded(i)) {
            return;
        }
        self.flush_error_run();
        for i in start..end {
            self.decoded[i] = true;
        }
        self.max_text_width = self.max_text_width.max(inst.text.len());
        self.spans.insert(start, Span::Instruction(inst));
    }

    /// Record a single-byte decode failure at `offset`, coalescing
    /// consecutive failures into one `UNKNOWN-INSTRUCTION` span (spec.md
    /// §4.4.3).
    pub fn record_error_byte(&mut self, offset: usize) {
        match &mut self.error_run {
            Some((_, end)) if *end == offset => *end = offset + 1,
            _ => {
                self.flush_error_run();
                self.error_run = Some((offset, offset + 1));
            }
        }
    }

    fn flush_error_run(&mut self) {
        if let Some((start, end)) = self.error_run.take() {
            self.spans.insert(start, Span::Error { start, end });
        }
    }

    /// Finalize bookkeeping (flush any trailing error run) and return the
    /// spans in address order.
    pub fn finish(mut self) -> Vec<Span> {
        self.flush_error_run();
        self.spans.into_values().collect()
    }
}
