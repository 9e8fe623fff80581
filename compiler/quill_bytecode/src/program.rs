//! The program image: code bytes plus a deduplicated string pool.

use crate::decode::Decoder;
use crate::opcode::Opcode;

/// Width of a branch instruction (opcode + `Imm4`).
const BRANCH_SIZE: usize = 5;

/// Relative offset a branch at `from` must encode to land on `target`.
pub fn branch_offset(from: usize, target: usize) -> i32 {
    (target as i64 - from as i64 - BRANCH_SIZE as i64) as i32
}

/// Saved end of a program, see `Program::checkpoint`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    code_len: usize,
    strings_len: usize,
    entry: u32,
}

/// A compiled instruction stream.
///
/// The compiler appends to it; the VM only reads it. `entry` is the
/// start of the most recently compiled top-level chunk, so a REPL can
/// keep appending while code addresses from earlier chunks stay valid.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    code: Vec<u8>,
    strings: Vec<String>,
    entry: u32,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a program from raw parts, e.g. a hand-written or
    /// loaded image. Nothing is validated here; see `validate`.
    pub fn from_parts(code: Vec<u8>, strings: Vec<String>) -> Self {
        Program {
            code,
            strings,
            entry: 0,
        }
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn entry(&self) -> u32 {
        self.entry
    }

    pub fn set_entry(&mut self, entry: u32) {
        self.entry = entry;
    }

    /// Current end of the code, i.e. where the next instruction goes.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn string(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }

    /// Pool index of `text`, adding it on first use.
    pub fn intern(&mut self, text: &str) -> u32 {
        if let Some(index) = self.strings.iter().position(|s| s == text) {
            return index as u32;
        }
        self.strings.push(text.to_owned());
        (self.strings.len() - 1) as u32
    }

    /// Remember the current end so a failed compilation can be undone.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            code_len: self.code.len(),
            strings_len: self.strings.len(),
            entry: self.entry,
        }
    }

    /// Drop everything appended since `checkpoint`.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.code.truncate(checkpoint.code_len);
        self.strings.truncate(checkpoint.strings_len);
        self.entry = checkpoint.entry;
    }

    // Emission. Each returns the start offset of the instruction.

    pub fn emit(&mut self, op: Opcode) -> usize {
        let start = self.code.len();
        self.code.push(op as u8);
        start
    }

    pub fn emit_u8(&mut self, op: Opcode, operand: u8) -> usize {
        let start = self.emit(op);
        self.code.push(operand);
        start
    }

    pub fn emit_i32(&mut self, op: Opcode, operand: i32) -> usize {
        let start = self.emit(op);
        self.code.extend_from_slice(&operand.to_le_bytes());
        start
    }

    pub fn emit_u32(&mut self, op: Opcode, operand: u32) -> usize {
        let start = self.emit(op);
        self.code.extend_from_slice(&operand.to_le_bytes());
        start
    }

    pub fn emit_i64(&mut self, op: Opcode, operand: i64) -> usize {
        let start = self.emit(op);
        self.code.extend_from_slice(&operand.to_le_bytes());
        start
    }

    pub fn emit_f32(&mut self, op: Opcode, operand: f32) -> usize {
        let start = self.emit(op);
        self.code.extend_from_slice(&operand.to_le_bytes());
        start
    }

    pub fn emit_f64(&mut self, op: Opcode, operand: f64) -> usize {
        let start = self.emit(op);
        self.code.extend_from_slice(&operand.to_le_bytes());
        start
    }

    pub fn emit_str(&mut self, op: Opcode, text: &str) -> usize {
        let index = self.intern(text);
        self.emit_u32(op, index)
    }

    /// Emit a forward branch with a zero offset, to be fixed by
    /// `patch_branch` once the target is known.
    pub fn emit_branch(&mut self, op: Opcode) -> usize {
        debug_assert!(op.is_branch());
        self.emit_i32(op, 0)
    }

    /// Emit a branch to an already-known target (back edges).
    pub fn emit_branch_to(&mut self, op: Opcode, target: usize) -> usize {
        let from = self.code.len();
        self.emit_i32(op, branch_offset(from, target))
    }

    /// Point the branch starting at `at` to `target`.
    pub fn patch_branch(&mut self, at: usize, target: usize) {
        self.write_operand(at, &branch_offset(at, target).to_le_bytes());
    }

    /// Overwrite the `Imm1` operand of the instruction at `at`.
    pub fn patch_u8(&mut self, at: usize, operand: u8) {
        self.write_operand(at, &[operand]);
    }

    fn write_operand(&mut self, at: usize, bytes: &[u8]) {
        let start = at + 1;
        self.code[start..start + bytes.len()].copy_from_slice(bytes);
    }

    // Fixed-width reads. `None` means the read runs past the end.

    pub fn read_u8(&self, at: usize) -> Option<u8> {
        self.code.get(at).copied()
    }

    fn read_array<const N: usize>(&self, at: usize) -> Option<[u8; N]> {
        self.code.get(at..at.checked_add(N)?)?.try_into().ok()
    }

    pub fn read_i32(&self, at: usize) -> Option<i32> {
        self.read_array(at).map(i32::from_le_bytes)
    }

    pub fn read_u32(&self, at: usize) -> Option<u32> {
        self.read_array(at).map(u32::from_le_bytes)
    }

    pub fn read_i64(&self, at: usize) -> Option<i64> {
        self.read_array(at).map(i64::from_le_bytes)
    }

    pub fn read_f32(&self, at: usize) -> Option<f32> {
        self.read_array(at).map(f32::from_le_bytes)
    }

    pub fn read_f64(&self, at: usize) -> Option<f64> {
        self.read_array(at).map(f64::from_le_bytes)
    }

    /// Decode instructions starting at offset 0.
    pub fn instructions(&self) -> Decoder<'_> {
        Decoder::new(self, 0)
    }

    /// Decode instructions starting at `start`.
    pub fn instructions_from(&self, start: usize) -> Decoder<'_> {
        Decoder::new(self, start)
    }
}

#[cfg(test)]
mod tests;
