//! Instruction decoding and disassembly.

use std::fmt::{self, Write as _};

use thiserror::Error;

use crate::opcode::{Opcode, OperandKind};
use crate::program::Program;

/// A decoded operand.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Operand {
    None,
    Imm1(u8),
    Imm4(i32),
    UImm4(u32),
    Imm8(i64),
    F4(f32),
    F8(f64),
    Str(u32),
}

/// One decoded instruction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Instruction {
    pub offset: usize,
    pub opcode: Opcode,
    pub operand: Operand,
}

impl Instruction {
    pub const fn size(&self) -> usize {
        self.opcode.size()
    }

    /// Absolute target of a branch instruction.
    pub fn branch_target(&self) -> Option<usize> {
        match (self.opcode.is_branch(), self.operand) {
            (true, Operand::Imm4(offset)) => {
                let target = self.offset as i64 + self.size() as i64 + i64::from(offset);
                usize::try_from(target).ok()
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode 0x{byte:02x} at 0x{offset:04x}")]
    UnknownOpcode { offset: usize, byte: u8 },
    #[error("truncated operand for {mnemonic} at 0x{offset:04x}")]
    Truncated {
        offset: usize,
        mnemonic: &'static str,
    },
}

/// Iterator over the instructions of a program.
///
/// Stops after the first error.
pub struct Decoder<'a> {
    program: &'a Program,
    offset: usize,
    failed: bool,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(program: &'a Program, offset: usize) -> Self {
        Decoder {
            program,
            offset,
            failed: false,
        }
    }

    fn decode_at(&self, offset: usize) -> Result<Instruction, DecodeError> {
        let program = self.program;
        let byte = program.read_u8(offset).ok_or(DecodeError::Truncated {
            offset,
            mnemonic: "opcode",
        })?;
        let opcode = Opcode::from_byte(byte).ok_or(DecodeError::UnknownOpcode { offset, byte })?;
        let at = offset + 1;
        let operand = match opcode.operand() {
            OperandKind::None => Some(Operand::None),
            OperandKind::Imm1 => program.read_u8(at).map(Operand::Imm1),
            OperandKind::Imm4 => program.read_i32(at).map(Operand::Imm4),
            OperandKind::UImm4 => program.read_u32(at).map(Operand::UImm4),
            OperandKind::Imm8 => program.read_i64(at).map(Operand::Imm8),
            OperandKind::F4 => program.read_f32(at).map(Operand::F4),
            OperandKind::F8 => program.read_f64(at).map(Operand::F8),
            OperandKind::Str => program.read_u32(at).map(Operand::Str),
        };
        let operand = operand.ok_or(DecodeError::Truncated {
            offset,
            mnemonic: opcode.mnemonic(),
        })?;
        Ok(Instruction {
            offset,
            opcode,
            operand,
        })
    }
}

impl Iterator for Decoder<'_> {
    type Item = Result<Instruction, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.program.len() {
            return None;
        }
        match self.decode_at(self.offset) {
            Ok(instruction) => {
                self.offset += instruction.size();
                Some(Ok(instruction))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl Program {
    /// Check that the whole code buffer decodes.
    pub fn validate(&self) -> Result<(), DecodeError> {
        self.instructions().try_for_each(|i| i.map(|_| ()))
    }

    /// Human-readable listing, one instruction per line:
    ///
    /// ```text
    /// 0x0000: 2e 02           PushN 2
    /// 0x0002: 1f 00 00 00 00  PushStr 0 "hello"
    /// ```
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for item in self.instructions() {
            match item {
                Ok(instruction) => {
                    let _ = writeln!(out, "{}", Listing(self, &instruction));
                }
                Err(e) => {
                    let _ = writeln!(out, "; {e}");
                }
            }
        }
        out
    }
}

struct Listing<'a>(&'a Program, &'a Instruction);

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Listing(program, instruction) = *self;
        let start = instruction.offset;
        let bytes = &program.code()[start..start + instruction.size()];
        let mut hex = String::new();
        for (i, byte) in bytes.iter().enumerate() {
            if i > 0 {
                hex.push(' ');
            }
            let _ = write!(hex, "{byte:02x}");
        }
        write!(f, "0x{start:04x}: {hex:<26} {}", instruction.opcode.mnemonic())?;
        match instruction.operand {
            Operand::None => Ok(()),
            Operand::Imm4(offset) if instruction.opcode.is_branch() => {
                let target = instruction.branch_target().unwrap_or(0);
                write!(f, " {offset:+} -> 0x{target:04x}")
            }
            Operand::Imm1(v) => write!(f, " {v}"),
            Operand::Imm4(v) => write!(f, " {v}"),
            Operand::UImm4(v) if instruction.opcode == Opcode::PushFuncPtr => write!(f, " 0x{v:04x}"),
            Operand::UImm4(v) => write!(f, " {v}"),
            Operand::Imm8(v) => write!(f, " {v}"),
            Operand::F4(v) => write!(f, " {v:?}"),
            Operand::F8(v) => write!(f, " {v:?}"),
            Operand::Str(index) => match program.string(index) {
                Some(text) => write!(f, " {index} {text:?}"),
                None => write!(f, " {index} <missing>"),
            },
        }
    }
}

#[cfg(test)]
mod tests;
