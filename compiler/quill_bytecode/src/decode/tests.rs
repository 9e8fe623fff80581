use pretty_assertions::assert_eq;

use super::*;

fn sample() -> Program {
    let mut program = Program::new();
    program.emit_u8(Opcode::PushN, 1);
    program.emit_str(Opcode::PushStr, "hi");
    let jz = program.emit_branch(Opcode::Jz);
    program.emit_i64(Opcode::PushI8, -9);
    let end = program.len();
    program.patch_branch(jz, end);
    program.emit(Opcode::Brk);
    program
}

#[test]
fn decodes_every_instruction() {
    let program = sample();
    let ops: Vec<Opcode> = program
        .instructions()
        .map(|i| i.unwrap().opcode)
        .collect();
    assert_eq!(
        ops,
        vec![
            Opcode::PushN,
            Opcode::PushStr,
            Opcode::Jz,
            Opcode::PushI8,
            Opcode::Brk
        ]
    );
    assert!(program.validate().is_ok());
}

#[test]
fn branch_target_is_absolute() {
    let program = sample();
    let jz = program
        .instructions()
        .map(Result::unwrap)
        .find(|i| i.opcode == Opcode::Jz)
        .unwrap();
    assert_eq!(jz.branch_target(), Some(jz.offset + 5 + 9));
}

#[test]
fn unknown_opcode_stops_decoding() {
    let mut program = Program::new();
    program.emit(Opcode::Nop);
    let mut bytes = program.code().to_vec();
    bytes.push(0xEE);
    let program = program_from(bytes);
    let items: Vec<_> = program.instructions().collect();
    assert_eq!(items.len(), 2);
    assert_eq!(
        items[1],
        Err(DecodeError::UnknownOpcode {
            offset: 1,
            byte: 0xEE
        })
    );
}

#[test]
fn truncated_operand_is_reported() {
    let program = program_from(vec![Opcode::PushI4 as u8, 1, 2]);
    assert_eq!(
        program.validate(),
        Err(DecodeError::Truncated {
            offset: 0,
            mnemonic: "PushI4"
        })
    );
}

#[test]
fn disassembly_lists_operands() {
    let listing = sample().disassemble();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("0x0000: 2e 01"));
    assert!(lines[0].ends_with("PushN 1"));
    assert!(lines[1].ends_with("PushStr 0 \"hi\""));
    assert!(lines[2].contains("Jz +9 -> 0x0015"));
    assert!(lines[3].ends_with("PushI8 -9"));
}

fn program_from(bytes: Vec<u8>) -> Program {
    Program::from_parts(bytes, Vec::new())
}
