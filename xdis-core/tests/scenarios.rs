//! End-to-end scenarios mirroring the worked byte-sequence examples that
//! motivated the opcode table and rendering rules, run through the public
//! `decode_one` entry point rather than any internal helper.

use xdis_core::{decode_one, DecodeError, Mnemonic};

#[test]
fn scenario_nop_and_ret_have_no_operands() {
    assert_eq!(decode_one(&[0x90], 0).unwrap().text, "nop");
    assert_eq!(decode_one(&[0xC3], 0).unwrap().text, "ret");
}

#[test]
fn scenario_mov_register_immediate_widths() {
    let imm32 = decode_one(&[0xB8, 0x44, 0x33, 0x22, 0x11], 0).unwrap();
    assert_eq!(imm32.text, "mov  eax 0x11223344");

    let imm64 = decode_one(&[0x48, 0xB8, 0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11], 0).unwrap();
    assert_eq!(imm64.text, "mov  rax 0x1122334455667788");
    assert_eq!(imm64.length, 10);
}

#[test]
fn scenario_sib_disp32_literal_base() {
    let inst = decode_one(&[0x01, 0x04, 0x25, 0x00, 0x00, 0x00, 0x00], 0).unwrap();
    assert_eq!(inst.text, "add  [0x00000000 + rsp * 1] eax");
}

#[test]
fn scenario_sib_with_rex_r_extended_register() {
    let inst = decode_one(&[0x44, 0x01, 0x04, 0x91], 0).unwrap();
    assert_eq!(inst.text, "add  [rcx + rdx * 4] r8d");
}

#[test]
fn scenario_conditional_and_unconditional_jump_targets() {
    let jz = decode_one(&[0x74, 0x02], 0).unwrap();
    assert_eq!(jz.mnemonic, Mnemonic::Jcc(4));
    assert_eq!(jz.branch_target, Some(4));
    assert!(jz.text.starts_with("jz "));
    assert!(jz.text.ends_with("; relative offset = 2"));

    let jmp = decode_one(&[0xEB, 0x04], 0).unwrap();
    assert_eq!(jmp.branch_target, Some(6));
}

#[test]
fn scenario_unknown_opcode_surfaces_as_opcode_lookup_error() {
    let err = decode_one(&[0x0F, 0xFF], 0).unwrap_err();
    match err {
        DecodeError::OpcodeLookup { offset, .. } => assert_eq!(offset, 0),
        other => panic!("expected OpcodeLookup, got {other:?}"),
    }
}

#[test]
fn scenario_endbr64_is_recognized_before_generic_prefix_scanning() {
    let inst = decode_one(&[0xF3, 0x0F, 0x1E, 0xFA], 0).unwrap();
    assert_eq!(inst.mnemonic, Mnemonic::Endbr64);
    assert_eq!(inst.length, 4);
}

#[test]
fn scenario_rip_relative_lea() {
    // lea rax, [rip + 0x10]
    let inst = decode_one(&[0x48, 0x8D, 0x05, 0x10, 0x00, 0x00, 0x00], 0).unwrap();
    assert_eq!(inst.text, "lea  rax [rip + 0x10]");
}
