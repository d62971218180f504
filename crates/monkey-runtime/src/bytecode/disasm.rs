//! Bytecode disassembler
//!
//! Converts bytecode back to a human-readable listing. Used by tests to
//! check jump targets and by `monkey disasm` / the verbose REPL.

use super::{decode, Bytecode, DecodeError};
use crate::value::Value;
use std::fmt::{self, Write};

/// Disassemble a full program
///
/// # Format
/// ```text
/// === Constants ===
/// 0: 42
/// 1: compiled_function[add] params=2 locals=2
///     0000 GetLocal 0
///     0002 GetLocal 1
///     0004 Add
///     0005 ReturnValue
///
/// === Instructions ===
/// 0000 Constant 0
/// 0003 Pop
/// ```
pub fn disassemble(bytecode: &Bytecode) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail
    let _ = write_program(&mut output, bytecode);
    output
}

/// Disassemble a single instruction stream, one instruction per line
pub fn disassemble_instructions(instructions: &[u8]) -> String {
    let mut output = String::new();
    let _ = write_instructions(&mut output, instructions, "");
    output
}

fn write_program(out: &mut String, bytecode: &Bytecode) -> fmt::Result {
    if !bytecode.constants.is_empty() {
        writeln!(out, "=== Constants ===")?;
        for (idx, constant) in bytecode.constants.iter().enumerate() {
            match constant {
                Value::CompiledFunction(func) => {
                    writeln!(
                        out,
                        "{}: compiled_function[{}] params={} locals={}",
                        idx,
                        func.display_name(),
                        func.num_params,
                        func.num_locals
                    )?;
                    write_instructions(out, &func.instructions, "    ")?;
                }
                Value::String(s) => writeln!(out, "{}: {:?}", idx, s.as_ref())?,
                other => writeln!(out, "{}: {}", idx, other)?,
            }
        }
        writeln!(out)?;
    }

    writeln!(out, "=== Instructions ===")?;
    write_instructions(out, &bytecode.instructions, "")
}

fn write_instructions(out: &mut String, instructions: &[u8], indent: &str) -> fmt::Result {
    let mut offset = 0;
    while offset < instructions.len() {
        match decode(instructions, offset) {
            Ok((opcode, operands, next)) => {
                write!(out, "{}{:04} {}", indent, offset, opcode.definition().name)?;
                for operand in operands {
                    write!(out, " {}", operand)?;
                }
                writeln!(out)?;
                offset = next;
            }
            Err(err @ DecodeError::UnknownOpcode { .. }) => {
                writeln!(out, "{}{:04} <{}>", indent, offset, err)?;
                offset += 1;
            }
            Err(err @ DecodeError::Truncated { .. }) => {
                writeln!(out, "{}{:04} <{}>", indent, offset, err)?;
                break;
            }
        }
    }
    Ok(())
}
