//! Bytecode instruction set
//!
//! Every opcode has exactly one operand-width signature, registered in
//! [`Opcode::definition`]. Encoding, decoding and disassembly all read that
//! table, so they can never disagree about instruction length.

/// Bytecode opcode
///
/// Explicit byte values, grouped by category.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // ===== Constants (0x01-0x0F) =====
    /// Push constant from pool [u16 index]
    Constant = 0x01,
    /// Push null
    Null = 0x02,
    /// Push true
    True = 0x03,
    /// Push false
    False = 0x04,

    // ===== Variables (0x10-0x1F) =====
    /// Push global [u16 index]
    GetGlobal = 0x10,
    /// Pop into global [u16 index]
    SetGlobal = 0x11,
    /// Push `stack[bp + index]` [u8 index]
    GetLocal = 0x12,
    /// Pop into `stack[bp + index]` [u8 index]
    SetLocal = 0x13,
    /// Push captured value of the running closure [u8 index]
    GetFree = 0x14,
    /// Push builtin function [u8 registry index]
    GetBuiltin = 0x15,
    /// Push the running closure itself
    CurrentClosure = 0x16,

    // ===== Arithmetic (0x20-0x2F) =====
    /// Pop b, pop a, push a + b
    Add = 0x20,
    /// Pop b, pop a, push a - b
    Sub = 0x21,
    /// Pop b, pop a, push a * b
    Mul = 0x22,
    /// Pop b, pop a, push a / b
    Div = 0x23,
    /// Pop a, push -a
    Negate = 0x24,

    // ===== Comparison (0x30-0x3F) =====
    /// Pop b, pop a, push a == b
    Equal = 0x30,
    /// Pop b, pop a, push a != b
    NotEqual = 0x31,
    /// Pop b, pop a, push a > b (`<` swaps its operands)
    GreaterThan = 0x32,

    // ===== Logical (0x40-0x4F) =====
    /// Pop a, push !truthy(a)
    Not = 0x40,

    // ===== Control flow (0x50-0x5F) =====
    /// Jump to absolute offset [u16 target]
    Jump = 0x50,
    /// Pop condition, jump if falsy [u16 target]
    JumpNotTruthy = 0x51,

    // ===== Functions (0x60-0x6F) =====
    /// Call the callee below the arguments [u8 arg_count]
    Call = 0x60,
    /// Pop return value, leave frame, push value
    ReturnValue = 0x61,
    /// Leave frame, push null
    Return = 0x62,
    /// Wrap function constant with captured values [u16 const_index, u8 free_count]
    Closure = 0x63,

    // ===== Arrays (0x70-0x7F) =====
    /// Pop n elements into a new array [u16 n]
    Array = 0x70,
    /// Pop index, pop target, push target[index]
    Index = 0x71,

    // ===== Stack manipulation (0x80-0x8F) =====
    /// Discard top of stack
    Pop = 0x80,
}

/// Name and operand widths of an opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition {
    pub name: &'static str,
    /// Byte width of each operand, in order (1 or 2)
    pub operand_widths: &'static [usize],
}

impl Definition {
    /// Total encoded length: opcode byte plus operands
    pub fn instruction_len(&self) -> usize {
        1 + self.operand_widths.iter().sum::<usize>()
    }
}

const fn def(name: &'static str, operand_widths: &'static [usize]) -> Definition {
    Definition {
        name,
        operand_widths,
    }
}

impl Opcode {
    /// Every opcode, in byte order
    pub const ALL: [Opcode; 29] = [
        Opcode::Constant,
        Opcode::Null,
        Opcode::True,
        Opcode::False,
        Opcode::GetGlobal,
        Opcode::SetGlobal,
        Opcode::GetLocal,
        Opcode::SetLocal,
        Opcode::GetFree,
        Opcode::GetBuiltin,
        Opcode::CurrentClosure,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Negate,
        Opcode::Equal,
        Opcode::NotEqual,
        Opcode::GreaterThan,
        Opcode::Not,
        Opcode::Jump,
        Opcode::JumpNotTruthy,
        Opcode::Call,
        Opcode::ReturnValue,
        Opcode::Return,
        Opcode::Closure,
        Opcode::Array,
        Opcode::Index,
        Opcode::Pop,
    ];

    /// The registered width signature for this opcode
    pub const fn definition(self) -> Definition {
        match self {
            Opcode::Constant => def("Constant", &[2]),
            Opcode::Null => def("Null", &[]),
            Opcode::True => def("True", &[]),
            Opcode::False => def("False", &[]),
            Opcode::GetGlobal => def("GetGlobal", &[2]),
            Opcode::SetGlobal => def("SetGlobal", &[2]),
            Opcode::GetLocal => def("GetLocal", &[1]),
            Opcode::SetLocal => def("SetLocal", &[1]),
            Opcode::GetFree => def("GetFree", &[1]),
            Opcode::GetBuiltin => def("GetBuiltin", &[1]),
            Opcode::CurrentClosure => def("CurrentClosure", &[]),
            Opcode::Add => def("Add", &[]),
            Opcode::Sub => def("Sub", &[]),
            Opcode::Mul => def("Mul", &[]),
            Opcode::Div => def("Div", &[]),
            Opcode::Negate => def("Negate", &[]),
            Opcode::Equal => def("Equal", &[]),
            Opcode::NotEqual => def("NotEqual", &[]),
            Opcode::GreaterThan => def("GreaterThan", &[]),
            Opcode::Not => def("Not", &[]),
            Opcode::Jump => def("Jump", &[2]),
            Opcode::JumpNotTruthy => def("JumpNotTruthy", &[2]),
            Opcode::Call => def("Call", &[1]),
            Opcode::ReturnValue => def("ReturnValue", &[]),
            Opcode::Return => def("Return", &[]),
            Opcode::Closure => def("Closure", &[2, 1]),
            Opcode::Array => def("Array", &[2]),
            Opcode::Index => def("Index", &[]),
            Opcode::Pop => def("Pop", &[]),
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| *op as u8 == byte)
            .ok_or(byte)
    }
}
