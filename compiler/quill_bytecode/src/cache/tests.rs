use pretty_assertions::assert_eq;

use super::*;
use crate::opcode::Opcode;

#[test]
fn image_preserves_code_strings_and_entry() {
    let mut program = Program::new();
    program.emit_str(Opcode::PushGlobalVar, "print");
    program.emit(Opcode::Brk);
    program.set_entry(0);

    let bytes = program.to_image().unwrap();
    assert_eq!(Program::from_image(&bytes).unwrap(), program);
}

#[test]
fn wrong_version_is_rejected() {
    let mut bytes = Program::new().to_image().unwrap();
    bytes[0] = bytes[0].wrapping_add(1);
    assert!(matches!(
        Program::from_image(&bytes),
        Err(ProgramDecodeError::Version { .. })
    ));
}

#[test]
fn invalid_code_is_rejected() {
    let program = Program::from_parts(vec![0xEE], Vec::new());
    let bytes = program.to_image().unwrap();
    assert!(matches!(
        Program::from_image(&bytes),
        Err(ProgramDecodeError::InvalidCode(_))
    ));
}

#[test]
fn truncated_image_is_malformed() {
    let bytes = Program::new().to_image().unwrap();
    assert!(matches!(
        Program::from_image(&bytes[..bytes.len() - 1]),
        Err(ProgramDecodeError::Malformed(_))
    ));
}
