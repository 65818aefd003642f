//! Helpers for extracting data from opcodes.

/// Combine two bytes from memory into a big-endian opcode.
#[inline(always)]
pub fn opcode_at(bytes: &[u8], cursor: usize) -> Option<u16> {
    let hi = *bytes.get(cursor)?;
    let lo = *bytes.get(cursor + 1)?;
    Some(u16::from_be_bytes([hi, lo]))
}

/// Extract the identifying nibble from the opcode.
#[inline(always)]
pub fn op_code(opcode: u16) -> u8 {
    ((opcode & 0xF000) >> 12) as u8
}

/// Extract operand NNN from the opcode.
#[inline(always)]
pub fn op_nnn(opcode: u16) -> u16 {
    opcode & 0x0FFF
}

/// Extract operand NN from the opcode.
#[inline(always)]
pub fn op_nn(opcode: u16) -> u8 {
    (opcode & 0x00FF) as u8
}

/// Extract operand VX from the opcode.
#[inline(always)]
pub fn op_x(opcode: u16) -> u8 {
    ((opcode & 0x0F00) >> 8) as u8
}

/// Extract operand VY from the opcode.
#[inline(always)]
pub fn op_y(opcode: u16) -> u8 {
    ((opcode & 0x00F0) >> 4) as u8
}

/// Extract operand N from the opcode.
#[inline(always)]
pub fn op_n(opcode: u16) -> u8 {
    (opcode & 0x000F) as u8
}

/// Extract operands VX and NN from the opcode.
#[inline(always)]
pub fn op_xnn(opcode: u16) -> (u8, u8) {
    (op_x(opcode), op_nn(opcode))
}

/// Extract operands VX, VY and N from the opcode.
#[inline(always)]
pub fn op_xyn(opcode: u16) -> (u8, u8, u8) {
    (op_x(opcode), op_y(opcode), op_n(opcode))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_operands() {
        let opcode = 0xD12F;
        assert_eq!(op_code(opcode), 0xD);
        assert_eq!(op_nnn(opcode), 0x12F);
        assert_eq!(op_xnn(opcode), (0x1, 0x2F));
        assert_eq!(op_xyn(opcode), (0x1, 0x2, 0xF));
    }

    #[test]
    fn test_opcode_at_end_of_buffer() {
        let bytes = [0x60, 0x05, 0xA0];
        assert_eq!(opcode_at(&bytes, 0), Some(0x6005));
        assert_eq!(opcode_at(&bytes, 2), None);
    }
}
