//! Instruction dispatch for the VM
//!
//! Uses a static lookup table for O(1) opcode decoding instead of searching
//! the opcode list on every fetch.

use crate::bytecode::Opcode;

/// Static dispatch table mapping byte values to optional Opcodes.
/// Indexed by the raw u8 opcode byte.
static OPCODE_TABLE: [Option<Opcode>; 256] = {
    let mut table: [Option<Opcode>; 256] = [None; 256];
    let mut i = 0;
    while i < Opcode::ALL.len() {
        let op = Opcode::ALL[i];
        table[op as usize] = Some(op);
        i += 1;
    }
    table
};

/// Decode an opcode byte using the static lookup table.
/// Returns None for unregistered bytes.
#[inline(always)]
pub fn decode_opcode(byte: u8) -> Option<Opcode> {
    OPCODE_TABLE[byte as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_opcode_list() {
        for op in Opcode::ALL {
            assert_eq!(decode_opcode(op as u8), Some(op));
        }
        let registered = (0..=255u8).filter(|b| decode_opcode(*b).is_some()).count();
        assert_eq!(registered, Opcode::ALL.len());
    }
}
