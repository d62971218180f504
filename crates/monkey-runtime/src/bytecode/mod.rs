//! Bytecode format shared by the compiler and the VM
//!
//! An instruction is one opcode byte followed by its operands, each 1 or 2
//! bytes wide and stored big-endian. Jump operands are absolute byte offsets
//! into the instruction stream of the function that contains them.

mod disasm;
mod opcode;

pub use disasm::{disassemble, disassemble_instructions};
pub use opcode::{Definition, Opcode};

use crate::value::Value;

/// Compiled program: top-level instructions plus the constant pool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    pub instructions: Vec<u8>,
    pub constants: Vec<Value>,
}

/// Failure decoding an instruction stream
///
/// Always a compiler bug or corrupt input; never recoverable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown opcode {byte:#04x} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },
    #[error("truncated {opcode:?} instruction at offset {offset}")]
    Truncated { opcode: Opcode, offset: usize },
}

/// Encode one instruction
///
/// Operands wider than their slot are truncated to the slot width; callers
/// bound-check before encoding.
pub fn make(op: Opcode, operands: &[usize]) -> Vec<u8> {
    let def = op.definition();
    let mut instruction = Vec::with_capacity(def.instruction_len());
    instruction.push(op as u8);

    for (operand, width) in operands.iter().zip(def.operand_widths) {
        match width {
            2 => instruction.extend_from_slice(&(*operand as u16).to_be_bytes()),
            _ => instruction.push(*operand as u8),
        }
    }

    instruction
}

/// Read a big-endian u16 at `offset`
pub fn read_u16(instructions: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([instructions[offset], instructions[offset + 1]])
}

/// Read a u8 at `offset`
pub fn read_u8(instructions: &[u8], offset: usize) -> u8 {
    instructions[offset]
}

/// Decode the operands that follow an opcode
///
/// `operands` starts right after the opcode byte. Returns the operand values
/// and how many bytes they occupied.
pub fn read_operands(def: &Definition, operands: &[u8]) -> (Vec<usize>, usize) {
    let mut values = Vec::with_capacity(def.operand_widths.len());
    let mut offset = 0;

    for width in def.operand_widths {
        match width {
            2 => values.push(read_u16(operands, offset) as usize),
            _ => values.push(read_u8(operands, offset) as usize),
        }
        offset += width;
    }

    (values, offset)
}

/// Decode the instruction at `offset`
///
/// Returns the opcode, its operands and the offset of the next instruction.
pub fn decode(
    instructions: &[u8],
    offset: usize,
) -> Result<(Opcode, Vec<usize>, usize), DecodeError> {
    let byte = instructions[offset];
    let opcode =
        Opcode::try_from(byte).map_err(|byte| DecodeError::UnknownOpcode { byte, offset })?;
    let def = opcode.definition();

    if offset + def.instruction_len() > instructions.len() {
        return Err(DecodeError::Truncated { opcode, offset });
    }

    let (operands, read) = read_operands(&def, &instructions[offset + 1..]);
    Ok((opcode, operands, offset + 1 + read))
}
