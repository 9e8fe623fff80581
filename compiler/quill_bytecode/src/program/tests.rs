use pretty_assertions::assert_eq;

use super::*;

#[test]
fn strings_are_deduplicated() {
    let mut program = Program::new();
    assert_eq!(program.intern("a"), 0);
    assert_eq!(program.intern("b"), 1);
    assert_eq!(program.intern("a"), 0);
    assert_eq!(program.strings().len(), 2);
    assert_eq!(program.string(1), Some("b"));
    assert_eq!(program.string(9), None);
}

#[test]
fn operands_are_little_endian() {
    let mut program = Program::new();
    let at = program.emit_i32(Opcode::PushI4, 0x0102_0304);
    assert_eq!(at, 0);
    assert_eq!(program.code(), &[Opcode::PushI4 as u8, 4, 3, 2, 1]);
    assert_eq!(program.read_i32(1), Some(0x0102_0304));
}

#[test]
fn forward_branch_patch() {
    let mut program = Program::new();
    let jz = program.emit_branch(Opcode::Jz);
    program.emit(Opcode::PushNull);
    program.emit(Opcode::Pop);
    let target = program.len();
    program.patch_branch(jz, target);

    // target = start + 5 + offset
    assert_eq!(program.read_i32(jz + 1), Some(2));
}

#[test]
fn backward_branch_is_negative() {
    let mut program = Program::new();
    let top = program.len();
    program.emit(Opcode::PushI4_1);
    let jmp = program.emit_branch_to(Opcode::Jmp, top);
    assert_eq!(jmp, 1);
    assert_eq!(program.read_i32(jmp + 1), Some(-6));
    assert_eq!(branch_offset(jmp, top), -6);
}

#[test]
fn patch_u8_rewrites_the_operand() {
    let mut program = Program::new();
    let push_n = program.emit_u8(Opcode::PushN, 0);
    program.emit(Opcode::Brk);
    program.patch_u8(push_n, 7);
    assert_eq!(program.read_u8(push_n + 1), Some(7));
}

#[test]
fn reads_past_the_end_are_none() {
    let mut program = Program::new();
    program.emit_u8(Opcode::Call, 1);
    assert_eq!(program.read_u32(1), None);
    assert_eq!(program.read_u8(2), None);
}

#[test]
fn float_operands() {
    let mut program = Program::new();
    program.emit_f64(Opcode::PushFP8, 1.25);
    program.emit_f32(Opcode::PushFP4, -0.5);
    assert_eq!(program.read_f64(1), Some(1.25));
    assert_eq!(program.read_f32(10), Some(-0.5));
}

#[test]
fn restore_drops_appended_code_and_strings() {
    let mut program = Program::new();
    program.emit_str(Opcode::PushStr, "kept");
    let checkpoint = program.checkpoint();
    program.emit_str(Opcode::PushStr, "dropped");
    program.set_entry(5);
    program.restore(checkpoint);
    assert_eq!(program.len(), 5);
    assert_eq!(program.strings(), &["kept".to_owned()]);
    assert_eq!(program.entry(), 0);
}
