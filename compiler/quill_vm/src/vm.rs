//! The dispatch loop.
//!
//! # Frame layout
//!
//! Calls build their frame directly on the value stack:
//!
//! ```text
//! [ arg_0 .. arg_n-1 ][ saved_bp ][ saved_bp2 ][ return_pc ][ local_0 .. ]
//!   ^ bp                                                      ^ bp2
//! ```
//!
//! The three linkage words are `Variant::ReturnLink` values, so a return
//! finds them at `bp2 - 3 .. bp2` and tears the frame down in O(1).
//! Top-level code runs in a frame with no arguments and no linkage; a
//! `Ret` there ends the run with its value.

use smallvec::SmallVec;

use quill_bytecode::{Opcode, Program};
use quill_value::errors;
use quill_value::{
    checked_index, evaluate_binary, evaluate_unary, to_i64, BinaryOp, Heap, UnaryOp, Variant,
};

use crate::context::{CallContext, Context};
use crate::errors::RunError;
use crate::stack::ValueStack;

/// Linkage words pushed by `Call`.
const LINKAGE: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmConfig {
    /// Evaluation stack size, in values.
    pub stack_capacity: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            stack_capacity: 16_384,
        }
    }
}

/// Run `program` from its entry point with the default configuration.
pub fn run(program: &Program, ctx: &mut Context) -> Result<Variant, RunError> {
    Vm::new(VmConfig::default()).run(program, ctx)
}

/// Host-side collection between runs: global roots only.
pub fn collect(ctx: &Context) -> usize {
    ctx.collect()
}

pub struct Vm {
    stack: ValueStack,
    /// Offset of the next instruction.
    pc: usize,
    /// Start of the current instruction, for error reports.
    start: usize,
    bp: usize,
    bp2: usize,
    /// Script call depth; 0 while running top-level code.
    depth: usize,
}

fn binary_op(op: Opcode) -> Option<BinaryOp> {
    Some(match op {
        Opcode::Add => BinaryOp::Add,
        Opcode::Sub => BinaryOp::Sub,
        Opcode::Mul => BinaryOp::Mul,
        Opcode::Div => BinaryOp::Div,
        Opcode::Band => BinaryOp::BitAnd,
        Opcode::Bor => BinaryOp::BitOr,
        Opcode::Xor => BinaryOp::BitXor,
        Opcode::And => BinaryOp::And,
        Opcode::Or => BinaryOp::Or,
        Opcode::Equ => BinaryOp::Eq,
        Opcode::Neq => BinaryOp::NotEq,
        Opcode::Gt => BinaryOp::Gt,
        Opcode::Ge => BinaryOp::GtEq,
        Opcode::Lt => BinaryOp::Lt,
        Opcode::Le => BinaryOp::LtEq,
        _ => return None,
    })
}

fn unary_op(op: Opcode) -> Option<UnaryOp> {
    Some(match op {
        Opcode::Neg => UnaryOp::Neg,
        Opcode::Not => UnaryOp::Not,
        Opcode::Bnot => UnaryOp::BitNot,
        Opcode::Inc => UnaryOp::Inc,
        Opcode::Dec => UnaryOp::Dec,
        _ => return None,
    })
}

fn link(value: Variant) -> Result<usize, RunError> {
    match value {
        Variant::ReturnLink(word) => Ok(word),
        other => Err(RunError::invalid(format!(
            "expected frame linkage, found {}",
            other.type_name()
        ))),
    }
}

fn get_index(heap: &mut Heap, object: Variant, index: Variant) -> Result<Variant, RunError> {
    match object {
        Variant::Array(handle) => {
            let index = checked_index(to_i64(heap, index)?)?;
            Ok(heap.array_mut(handle)?.get(index))
        }
        Variant::Object(handle) => {
            let key = heap.display(&index);
            Ok(heap.object(handle)?.get(&key))
        }
        other => Err(errors::cannot_index(other.type_name()).into()),
    }
}

fn set_index(heap: &mut Heap, object: Variant, index: Variant, value: Variant) -> Result<(), RunError> {
    match object {
        Variant::Array(handle) => {
            let index = checked_index(to_i64(heap, index)?)?;
            heap.array_mut(handle)?.set(index, value);
        }
        Variant::Object(handle) => {
            let key = heap.display(&index);
            heap.object_mut(handle)?.set(&key, value);
        }
        other => return Err(errors::cannot_index(other.type_name()).into()),
    }
    Ok(())
}

fn get_prop(heap: &Heap, object: Variant, name: &str) -> Result<Variant, RunError> {
    match object {
        Variant::Object(handle) => Ok(heap.object(handle)?.get(name)),
        Variant::Array(handle) if name == "size" || name == "length" => {
            Ok(Variant::Int64(heap.array(handle)?.len() as i64))
        }
        other => Err(errors::no_property(name, other.type_name()).into()),
    }
}

impl Vm {
    pub fn new(config: VmConfig) -> Self {
        Vm {
            stack: ValueStack::with_capacity(config.stack_capacity),
            pc: 0,
            start: 0,
            bp: 0,
            bp2: 0,
            depth: 0,
        }
    }

    pub fn stack(&self) -> &ValueStack {
        &self.stack
    }

    /// Run `program` from its entry point until `Brk`, a top-level
    /// `Ret`, or an error.
    #[tracing::instrument(level = "debug", skip_all, fields(entry = program.entry()))]
    pub fn run(&mut self, program: &Program, ctx: &mut Context) -> Result<Variant, RunError> {
        self.stack.clear();
        self.pc = program.entry() as usize;
        self.start = self.pc;
        self.bp = 0;
        self.bp2 = 0;
        self.depth = 0;

        let result = self.execute(program, ctx);
        match &result {
            Ok(value) => tracing::debug!(result = ?value, "run finished"),
            Err(e) => tracing::debug!(pc = self.start, error = %e, "run failed"),
        }
        result.map_err(|e| match e {
            RunError::InvalidProgram { message } => RunError::InvalidProgram {
                message: format!("{message} at 0x{:04x}", self.start),
            },
            other => other,
        })
    }

    // === Operand fetch ===

    fn truncated(&self, op: Opcode) -> RunError {
        RunError::invalid(format!("truncated operand for {}", op.mnemonic()))
    }

    fn fetch_u8(&mut self, program: &Program, op: Opcode) -> Result<u8, RunError> {
        let value = program.read_u8(self.pc).ok_or_else(|| self.truncated(op))?;
        self.pc += 1;
        Ok(value)
    }

    fn fetch_i32(&mut self, program: &Program, op: Opcode) -> Result<i32, RunError> {
        let value = program.read_i32(self.pc).ok_or_else(|| self.truncated(op))?;
        self.pc += 4;
        Ok(value)
    }

    fn fetch_u32(&mut self, program: &Program, op: Opcode) -> Result<u32, RunError> {
        let value = program.read_u32(self.pc).ok_or_else(|| self.truncated(op))?;
        self.pc += 4;
        Ok(value)
    }

    fn fetch_str<'p>(&mut self, program: &'p Program, op: Opcode) -> Result<&'p str, RunError> {
        let index = self.fetch_u32(program, op)?;
        program
            .string(index)
            .ok_or_else(|| RunError::invalid(format!("string index {index} out of range")))
    }

    fn jump(&mut self, offset: i32) -> Result<(), RunError> {
        // Offsets are relative to the end of the 5-byte branch.
        let target = self.pc as i64 + i64::from(offset);
        self.pc = usize::try_from(target)
            .map_err(|_| RunError::invalid(format!("branch to negative offset {target}")))?;
        Ok(())
    }

    // === Frames ===

    fn arg_count(&self) -> usize {
        if self.depth == 0 {
            0
        } else {
            self.bp2 - LINKAGE - self.bp
        }
    }

    fn call(&mut self, ctx: &mut Context, callee: Variant, argc: usize) -> Result<(), RunError> {
        let base = self
            .stack
            .len()
            .checked_sub(argc)
            .ok_or_else(|| RunError::invalid("call with fewer values than arguments"))?;
        match callee {
            Variant::CodeAddress(address) => {
                tracing::trace!(address, argc, depth = self.depth + 1, "call");
                self.stack.push(Variant::ReturnLink(self.bp))?;
                self.stack.push(Variant::ReturnLink(self.bp2))?;
                self.stack.push(Variant::ReturnLink(self.pc))?;
                self.bp = base;
                self.bp2 = self.stack.len();
                self.pc = address as usize;
                self.depth += 1;
                Ok(())
            }
            Variant::NativeFunction(id) => {
                let entry = ctx
                    .native(id)
                    .ok_or_else(|| RunError::invalid(format!("unknown native #{}", id.0)))?;
                let func = entry.func;
                tracing::trace!(native = %entry.name, argc, "native call");
                let args: SmallVec<[Variant; 8]> =
                    SmallVec::from_slice(&self.stack.as_slice()[base..]);
                let result = {
                    let mut call = CallContext::new(ctx, self.stack.as_slice());
                    func(&mut call, &args)?
                };
                self.stack.truncate(base);
                self.stack.push(result)
            }
            other => Err(errors::not_callable(other.type_name()).into()),
        }
    }

    /// Tear down the current frame. Returns the value when the run is over.
    fn ret(&mut self, value: Variant) -> Result<Option<Variant>, RunError> {
        if self.depth == 0 {
            return Ok(Some(value));
        }
        let links = self
            .bp2
            .checked_sub(LINKAGE)
            .ok_or_else(|| RunError::invalid("return without a frame"))?;
        let saved_bp = link(self.stack.get(links)?)?;
        let saved_bp2 = link(self.stack.get(links + 1)?)?;
        let return_pc = link(self.stack.get(links + 2)?)?;
        self.stack.truncate(self.bp);
        self.bp = saved_bp;
        self.bp2 = saved_bp2;
        self.pc = return_pc;
        self.depth -= 1;
        tracing::trace!(return_pc, depth = self.depth, "return");
        self.stack.push(value)?;
        Ok(None)
    }

    // === Dispatch ===

    fn execute(&mut self, program: &Program, ctx: &mut Context) -> Result<Variant, RunError> {
        loop {
            self.start = self.pc;
            let byte = program
                .read_u8(self.pc)
                .ok_or_else(|| RunError::invalid("ran past the end of the code"))?;
            let op = Opcode::from_byte(byte)
                .ok_or_else(|| RunError::invalid(format!("unknown opcode 0x{byte:02x}")))?;
            self.pc += 1;

            if let Some(bin) = binary_op(op) {
                let rhs = self.stack.pop()?;
                let lhs = self.stack.pop()?;
                let result = evaluate_binary(&mut ctx.heap(), bin, lhs, rhs)?;
                self.stack.push(result)?;
                continue;
            }
            if let Some(un) = unary_op(op) {
                let operand = self.stack.pop()?;
                let result = evaluate_unary(&mut ctx.heap(), un, operand)?;
                self.stack.push(result)?;
                continue;
            }

            match op {
                Opcode::Nop => {}

                // === Literals ===
                Opcode::PushNull => self.stack.push(Variant::Null)?,
                Opcode::PushI4_0 => self.stack.push(Variant::Int32(0))?,
                Opcode::PushI4_1 => self.stack.push(Variant::Int32(1))?,
                Opcode::PushI4 => {
                    let value = self.fetch_i32(program, op)?;
                    self.stack.push(Variant::Int32(value))?;
                }
                Opcode::PushI8 => {
                    let value = program.read_i64(self.pc).ok_or_else(|| self.truncated(op))?;
                    self.pc += 8;
                    self.stack.push(Variant::Int64(value))?;
                }
                Opcode::PushFP4 => {
                    let value = program.read_f32(self.pc).ok_or_else(|| self.truncated(op))?;
                    self.pc += 4;
                    self.stack.push(Variant::Float32(value))?;
                }
                Opcode::PushFP8 => {
                    let value = program.read_f64(self.pc).ok_or_else(|| self.truncated(op))?;
                    self.pc += 8;
                    self.stack.push(Variant::Float64(value))?;
                }
                Opcode::PushStr => {
                    let text = self.fetch_str(program, op)?;
                    let value = ctx.heap().alloc_string(text);
                    self.stack.push(value)?;
                }
                Opcode::PushFuncPtr => {
                    let address = self.fetch_u32(program, op)?;
                    self.stack.push(Variant::CodeAddress(address))?;
                }

                // === Slots ===
                Opcode::PushArg => {
                    let index = usize::from(self.fetch_u8(program, op)?);
                    let value = if index < self.arg_count() {
                        self.stack.get(self.bp + index)?
                    } else {
                        Variant::Null
                    };
                    self.stack.push(value)?;
                }
                Opcode::StoreArg => {
                    let index = usize::from(self.fetch_u8(program, op)?);
                    if index >= self.arg_count() {
                        return Err(errors::missing_argument(index).into());
                    }
                    let value = self.stack.peek(0)?;
                    self.stack.set(self.bp + index, value)?;
                }
                Opcode::PushLocalI1 | Opcode::PushLocalI4 => {
                    let index = if op == Opcode::PushLocalI1 {
                        usize::from(self.fetch_u8(program, op)?)
                    } else {
                        self.fetch_u32(program, op)? as usize
                    };
                    let value = self.stack.get(self.bp2 + index)?;
                    self.stack.push(value)?;
                }
                Opcode::StoreLocalI1 | Opcode::StoreLocalI4 => {
                    let index = if op == Opcode::StoreLocalI1 {
                        usize::from(self.fetch_u8(program, op)?)
                    } else {
                        self.fetch_u32(program, op)? as usize
                    };
                    let value = self.stack.peek(0)?;
                    self.stack.set(self.bp2 + index, value)?;
                }
                Opcode::PushN => {
                    let count = usize::from(self.fetch_u8(program, op)?);
                    self.stack.push_nulls(count)?;
                }

                // === Globals ===
                Opcode::PushGlobalVar => {
                    let name = self.fetch_str(program, op)?;
                    self.stack.push(ctx.lookup(name))?;
                }
                Opcode::StoreGlobalVar => {
                    let name = self.fetch_str(program, op)?;
                    let value = self.stack.peek(0)?;
                    ctx.set_global(name, value)?;
                }

                // === Objects ===
                Opcode::GetProp => {
                    let name = self.fetch_str(program, op)?;
                    let object = self.stack.pop()?;
                    let value = get_prop(&ctx.heap(), object, name)?;
                    self.stack.push(value)?;
                }
                Opcode::SetProp => {
                    let name = self.fetch_str(program, op)?;
                    let value = self.stack.pop()?;
                    match self.stack.pop()? {
                        Variant::Object(handle) => ctx.heap().object_mut(handle)?.set(name, value),
                        other => return Err(errors::cannot_set_property(name, other.type_name()).into()),
                    }
                    self.stack.push(value)?;
                }
                Opcode::GetIndex => {
                    let index = self.stack.pop()?;
                    let object = self.stack.pop()?;
                    let value = get_index(&mut ctx.heap(), object, index)?;
                    self.stack.push(value)?;
                }
                Opcode::SetIndex => {
                    let value = self.stack.pop()?;
                    let index = self.stack.pop()?;
                    let object = self.stack.pop()?;
                    set_index(&mut ctx.heap(), object, index, value)?;
                    self.stack.push(value)?;
                }

                // === Stack hygiene ===
                Opcode::Pop => {
                    self.stack.pop()?;
                }
                Opcode::Popn => {
                    let count = usize::from(self.fetch_u8(program, op)?);
                    self.stack.drop_top(count)?;
                }
                Opcode::Dup => {
                    let top = self.stack.peek(0)?;
                    self.stack.push(top)?;
                }
                Opcode::Dup2 => {
                    let below = self.stack.peek(1)?;
                    let top = self.stack.peek(0)?;
                    self.stack.push(below)?;
                    self.stack.push(top)?;
                }

                // === Control ===
                Opcode::Jmp => {
                    let offset = self.fetch_i32(program, op)?;
                    self.jump(offset)?;
                }
                Opcode::Jz | Opcode::Jnz => {
                    let offset = self.fetch_i32(program, op)?;
                    let truthy = self.stack.pop()?.truthy();
                    if truthy == (op == Opcode::Jnz) {
                        self.jump(offset)?;
                    }
                }

                // === Calls ===
                Opcode::Call => {
                    let argc = usize::from(self.fetch_u8(program, op)?);
                    let callee = self.stack.pop()?;
                    self.call(ctx, callee, argc)?;
                }
                Opcode::Ret => {
                    let value = self.stack.pop()?;
                    if let Some(result) = self.ret(value)? {
                        return Ok(result);
                    }
                }
                Opcode::RetNull => {
                    if let Some(result) = self.ret(Variant::Null)? {
                        return Ok(result);
                    }
                }

                // === Termination ===
                Opcode::Brk => return Ok(Variant::Null),
                Opcode::Err => return Err(RunError::DebugTrap { pc: self.start }),
                Opcode::Throw => {
                    let value = self.stack.pop()?;
                    return Err(errors::script_throw(ctx.display(&value)).into());
                }

                // Handled above.
                Opcode::Add
                | Opcode::Sub
                | Opcode::Mul
                | Opcode::Div
                | Opcode::Band
                | Opcode::Bor
                | Opcode::Xor
                | Opcode::And
                | Opcode::Or
                | Opcode::Equ
                | Opcode::Neq
                | Opcode::Gt
                | Opcode::Ge
                | Opcode::Lt
                | Opcode::Le
                | Opcode::Neg
                | Opcode::Not
                | Opcode::Bnot
                | Opcode::Inc
                | Opcode::Dec => {}
            }
        }
    }
}
