//! Rendering ModR/M, SIB and displacement bytes into operand text
//! (spec.md §4.1).

use crate::modrm::{ModRm, Sib};
use crate::prefix::SegmentOverride;
use crate::registers::{REGISTERS16, REGISTERS32, REGISTERS64, REGISTERS8_NOREX, REGISTERS8_REX};
use crate::rex::Rex;

/// Sign-extend a little-endian displacement/immediate of `width` bytes
/// (1, 2 or 4) read from `bytes[..width]` (spec.md §4.1 "Displacement sign
/// decoding").
pub fn sign_extend(bytes: &[u8], width: usize) -> i64 {
    match width {
        1 => bytes[0] as i8 as i64,
        2 => i16::from_le_bytes([bytes[0], bytes[1]]) as i64,
        4 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64,
        8 => i64::from_le_bytes(bytes[..8].try_into().unwrap()),
        _ => unreachable!("displacement/immediate width must be 1, 2, 4 or 8"),
    }
}

/// Render a signed displacement as `" + 0xNN"` / `" - 0xNN"` (spec.md §4.1).
pub fn format_signed_disp(value: i64) -> String {
    if value < 0 {
        format!(" - {:#x}", -value)
    } else {
        format!(" + {:#x}", value)
    }
}

/// Render an unsigned 32-bit hex literal, zero-padded to 8 digits — used
/// for the disp32-as-base-address case (spec.md §8 scenario 4:
/// `[0x00000000 + rsp * 1]`).
pub fn format_disp32_literal(value: i32) -> String {
    format!("{:#010x}", value as u32)
}

/// An 8/16/32/64-bit general-purpose register bank selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GprWidth {
    W8,
    W16,
    W32,
    W64,
}

pub fn render_gpr(width: GprWidth, index: u8, has_rex: bool) -> String {
    match width {
        GprWidth::W8 => {
            if has_rex || index >= 8 {
                REGISTERS8_REX[index as usize].to_string()
            } else {
                REGISTERS8_NOREX[index as usize].to_string()
            }
        }
        GprWidth::W16 => REGISTERS16[index as usize].to_string(),
        GprWidth::W32 => REGISTERS32[index as usize].to_string(),
        GprWidth::W64 => REGISTERS64[index as usize].to_string(),
    }
}

/// Render a `mod=3` register-in-rm operand: same bank as the operand's
/// width, index `rm + (REX.B ? 8 : 0)` (spec.md §4.1).
///
/// `rex_present` must reflect whether a REX byte appeared in the stream at
/// all (not just whether any of its bits are set) — a bare `0x40` REX with
/// every bit zero still switches the 8-bit register bank from AH/BH/CH/DH
/// to SPL/BPL/SIL/DIL.
pub fn render_register_direct(width: GprWidth, modrm: ModRm, rex: Rex, rex_present: bool) -> String {
    let index = Rex::extend(rex.b, modrm.rm);
    render_gpr(width, index, rex_present)
}

/// Render a full memory operand for `mod<3`, including the SIB case,
/// RIP-relative case, and plain-base case (spec.md §4.1).
///
/// `disp8`/`disp32` are the raw little-endian bytes read from the stream,
/// present only when the corresponding `has_disp*` flag held.
#[allow(clippy::too_many_arguments)]
pub fn render_memory(
    modrm: ModRm,
    sib: Option<Sib>,
    rex: Rex,
    disp8: Option<&[u8]>,
    disp32: Option<&[u8]>,
    segment: Option<SegmentOverride>,
) -> String {
    let seg = segment.map(SegmentOverride::as_str).unwrap_or("");

    if modrm.has_sib() {
        let sib = sib.expect("ModR/M selected SIB but none was parsed");
        return format!("{seg}{}", render_sib(sib, modrm.mod_, rex, disp8, disp32));
    }

    if modrm.is_rip_relative() {
        let disp = disp32.map(|b| sign_extend(b, 4)).unwrap_or(0);
        return format!("{seg}[rip{}]", format_signed_disp(disp));
    }

    let base = render_gpr(GprWidth::W64, Rex::extend(rex.b, modrm.rm), true);
    let disp_str = match modrm.mod_ {
        1 => disp8.map(|b| format_signed_disp(sign_extend(b, 1))),
        2 => disp32.map(|b| format_signed_disp(sign_extend(b, 4))),
        _ => None,
    }
    .unwrap_or_default();
    format!("{seg}[{base}{disp_str}]")
}

/// Render the SIB-addressed operand (spec.md §4.1 "SIB rendering").
///
/// The `mod=0 ∧ base=5` case always shows the index term (including when
/// `index=4`) because the base slot is occupied by the disp32 literal
/// rather than a register — see spec.md §8 scenario 4 and DESIGN.md's
/// resolution of the apparent conflict with the general index-suppression
/// rule.
fn render_sib(sib: Sib, modrm_mod: u8, rex: Rex, disp8: Option<&[u8]>, disp32: Option<&[u8]>) -> String {
    let scale = sib.scale_factor();

    if sib.base == 5 && modrm_mod == 0 {
        let literal = disp32.map(|b| sign_extend(b, 4) as i32).unwrap_or(0);
        let base_str = format_disp32_literal(literal);
        let index = Rex::extend(rex.x, sib.index);
        let index_reg = render_gpr(GprWidth::W64, index, true);
        return format!("[{base_str} + {index_reg} * {scale}]");
    }

    let (base_str, disp_str) = match modrm_mod {
        1 => {
            let base = if rex.b { "r13" } else { "rbp" };
            let disp = disp8.map(|b| format_signed_disp(sign_extend(b, 1))).unwrap_or_default();
            (base.to_string(), disp)
        }
        2 => {
            let base = if rex.b { "r13" } else { "rbp" };
            let disp = disp32.map(|b| format_signed_disp(sign_extend(b, 4))).unwrap_or_default();
            (base.to_string(), disp)
        }
        _ => (render_gpr(GprWidth::W64, Rex::extend(rex.b, sib.base), true), String::new()),
    };

    if sib.index == 4 && !rex.x {
        format!("[{base_str}{disp_str}]")
    } else {
        let index_reg = render_gpr(GprWidth::W64, Rex::extend(rex.x, sib.index), true);
        format!("[{base_str} + {index_reg} * {scale}{disp_str}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_extend_flips_at_width_boundaries() {
        assert_eq!(sign_extend(&[0x7F], 1), 0x7F);
        assert_eq!(sign_extend(&[0x80], 1), -0x80);
        assert_eq!(sign_extend(&[0xFF, 0x7F], 2), 0x7FFF);
        assert_eq!(sign_extend(&[0x00, 0x80], 2), -0x8000);
        assert_eq!(sign_extend(&[0xFF, 0xFF, 0xFF, 0x7F], 4), 0x7FFF_FFFF);
        assert_eq!(sign_extend(&[0x00, 0x00, 0x00, 0x80], 4), -0x8000_0000);
    }

    #[test]
    fn formats_signed_displacement() {
        assert_eq!(format_signed_disp(0x10), " + 0x10");
        assert_eq!(format_signed_disp(-0x10), " - 0x10");
    }

    #[test]
    fn rip_relative_ignores_rex_b() {
        let modrm = ModRm::from_byte(0b00_000_101);
        let rex = Rex { b: true, ..Rex::default() };
        let text = render_memory(modrm, None, rex, None, Some(&[0x78, 0x56, 0x34, 0x12]), None);
        assert_eq!(text, "[rip + 0x12345678]");
    }

    #[test]
    fn sib_suppresses_index_when_index4_and_no_rex_x() {
        // base=rcx(1), index=4 (none), scale irrelevant, mod=0 (no disp)
        let modrm = ModRm::from_byte(0b00_000_100);
        let sib = Sib::from_byte(0b00_100_001);
        let text = render_memory(modrm, Some(sib), Rex::default(), None, None, None);
        assert_eq!(text, "[rcx]");
    }

    #[test]
    fn sib_index4_becomes_r12_with_rex_x() {
        let modrm = ModRm::from_byte(0b00_000_100);
        let sib = Sib::from_byte(0b00_100_001);
        let rex = Rex { x: true, ..Rex::default() };
        let text = render_memory(modrm, Some(sib), rex, None, None, None);
        assert_eq!(text, "[rcx + r12 * 1]");
    }

    #[test]
    fn sib_base5_mod0_shows_disp32_literal_and_index_term() {
        // spec.md §8 scenario 4: 01 04 25 00 00 00 00
        let modrm = ModRm::from_byte(0x04);
        let sib = Sib::from_byte(0x25);
        let text = render_memory(modrm, Some(sib), Rex::default(), None, Some(&[0, 0, 0, 0]), None);
        assert_eq!(text, "[0x00000000 + rsp * 1]");
    }

    #[test]
    fn sib_general_case_renders_base_plus_scaled_index() {
        // spec.md §8 scenario 5: REX.R=1, modrm=04, sib=91 -> base=rcx, index=rdx, scale=4
        let modrm = ModRm::from_byte(0x04);
        let sib = Sib::from_byte(0x91);
        let text = render_memory(modrm, Some(sib), Rex::default(), None, None, None);
        assert_eq!(text, "[rcx + rdx * 4]");
    }

    #[test]
    fn segment_override_prefixes_memory_operand() {
        let modrm = ModRm::from_byte(0b00_000_000);
        let text = render_memory(modrm, None, Rex::default(), None, None, Some(SegmentOverride::Fs));
        assert_eq!(text, "fs:[rax]");
    }
}
