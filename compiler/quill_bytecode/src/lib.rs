//! Quill Bytecode - the instruction set shared by the compiler and the VM.
//!
//! An instruction is one opcode byte followed by a fixed-width operand
//! whose kind is determined by the opcode. Operands are little-endian.
//!
//! Branch operands are signed offsets relative to the end of the branch
//! instruction: `target = start + 5 + offset`. `Program::patch_branch`
//! computes them, so nothing else needs to know the bias.

#[cfg(feature = "cache")]
mod cache;
mod decode;
mod opcode;
mod program;

#[cfg(feature = "cache")]
pub use cache::{ProgramDecodeError, FORMAT_VERSION};
pub use decode::{DecodeError, Decoder, Instruction, Operand};
pub use opcode::{Opcode, OperandKind};
pub use program::{branch_offset, Checkpoint, Program};
