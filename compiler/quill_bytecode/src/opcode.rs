//! Opcode table.

/// Operand kinds, each with a fixed width.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperandKind {
    None,
    /// Unsigned byte.
    Imm1,
    /// Signed 32-bit.
    Imm4,
    /// Unsigned 32-bit.
    UImm4,
    /// Signed 64-bit.
    Imm8,
    F4,
    F8,
    /// `UImm4` index into the string pool.
    Str,
}

impl OperandKind {
    pub const fn width(self) -> usize {
        match self {
            OperandKind::None => 0,
            OperandKind::Imm1 => 1,
            OperandKind::Imm4 | OperandKind::UImm4 | OperandKind::F4 | OperandKind::Str => 4,
            OperandKind::Imm8 | OperandKind::F8 => 8,
        }
    }
}

macro_rules! opcodes {
    ($($(#[$doc:meta])* $name:ident = $byte:literal, $operand:ident;)*) => {
        /// A single-byte operation code.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $($(#[$doc])* $name = $byte,)*
        }

        impl Opcode {
            /// Every opcode, in byte order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$name,)*];

            pub const fn from_byte(byte: u8) -> Option<Opcode> {
                match byte {
                    $($byte => Some(Opcode::$name),)*
                    _ => None,
                }
            }

            pub const fn operand(self) -> OperandKind {
                match self {
                    $(Opcode::$name => OperandKind::$operand,)*
                }
            }

            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$name => stringify!($name),)*
                }
            }
        }
    };
}

opcodes! {
    Nop = 0x00, None;

    // Binary operators: pop rhs, pop lhs, push result.
    Add = 0x01, None;
    Sub = 0x02, None;
    Mul = 0x03, None;
    Div = 0x04, None;
    Band = 0x05, None;
    Bor = 0x06, None;
    Xor = 0x07, None;
    And = 0x08, None;
    Or = 0x09, None;
    Equ = 0x0A, None;
    Neq = 0x0B, None;
    Gt = 0x0C, None;
    Ge = 0x0D, None;
    Lt = 0x0E, None;
    Le = 0x0F, None;

    // Unary operators.
    Neg = 0x10, None;
    Not = 0x11, None;
    Bnot = 0x12, None;
    Inc = 0x13, None;
    Dec = 0x14, None;

    // Literals.
    PushNull = 0x18, None;
    PushI4_0 = 0x19, None;
    PushI4_1 = 0x1A, None;
    PushI4 = 0x1B, Imm4;
    PushI8 = 0x1C, Imm8;
    PushFP4 = 0x1D, F4;
    PushFP8 = 0x1E, F8;
    PushStr = 0x1F, Str;
    /// Push a `CodeAddress`.
    PushFuncPtr = 0x20, UImm4;

    // Frame slots.
    PushArg = 0x28, Imm1;
    StoreArg = 0x29, Imm1;
    PushLocalI1 = 0x2A, Imm1;
    PushLocalI4 = 0x2B, UImm4;
    StoreLocalI1 = 0x2C, Imm1;
    StoreLocalI4 = 0x2D, UImm4;
    /// Push `n` nulls to size a frame's locals.
    PushN = 0x2E, Imm1;

    // Globals.
    PushGlobalVar = 0x30, Str;
    StoreGlobalVar = 0x31, Str;

    // Objects and arrays.
    GetProp = 0x38, Str;
    SetProp = 0x39, Str;
    GetIndex = 0x3A, None;
    SetIndex = 0x3B, None;

    // Stack hygiene.
    Pop = 0x40, None;
    Popn = 0x41, Imm1;
    Dup = 0x42, None;
    /// Duplicate the top two values, keeping their order.
    Dup2 = 0x43, None;

    // Branches.
    Jmp = 0x48, Imm4;
    /// Pop; branch if falsy.
    Jz = 0x49, Imm4;
    /// Pop; branch if truthy.
    Jnz = 0x4A, Imm4;

    // Calls.
    Call = 0x50, Imm1;
    Ret = 0x51, None;
    RetNull = 0x52, None;

    // Termination.
    /// End of a top-level chunk.
    Brk = 0x58, None;
    /// Debug trap.
    Err = 0x59, None;
    Throw = 0x5A, None;
}

impl Opcode {
    /// Encoded size of the instruction, operand included.
    pub const fn size(self) -> usize {
        1 + self.operand().width()
    }

    pub const fn is_branch(self) -> bool {
        matches!(self, Opcode::Jmp | Opcode::Jz | Opcode::Jnz)
    }
}
