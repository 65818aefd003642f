//! Result and errors.
use std::fmt::{self, Display, Formatter};

use crate::constants::Address;

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug)]
pub enum Chip8Error {
    /// Opcode does not match any instruction in the set.
    UnsupportedOpcode { pc: Address, opcode: u16 },
    /// Subroutine call while all 16 stack slots are taken.
    StackOverflow { pc: Address, opcode: u16 },
    /// Return from subroutine with an empty call stack.
    StackUnderflow { pc: Address, opcode: u16 },
    /// Register operation that must not use VF as an operand.
    ReservedRegister { pc: Address, opcode: u16 },
    /// Program counter points past the last instruction that fits in memory.
    PcOutOfRange { pc: Address },
    /// Instruction reached for memory beyond the 4KB address space.
    AddressOutOfRange {
        pc: Address,
        opcode: u16,
        address: usize,
    },
    /// Attempt to load a bytecode program that can't fit in memory.
    ProgramTooLarge { size: usize, capacity: usize },
    Io(std::io::Error),
    Fmt(fmt::Error),
}

impl Chip8Error {
    /// Whether the error was raised by a running program, as opposed to the host.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedOpcode { .. }
                | Self::StackOverflow { .. }
                | Self::StackUnderflow { .. }
                | Self::ReservedRegister { .. }
                | Self::AddressOutOfRange { .. }
                | Self::PcOutOfRange { .. }
        )
    }
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedOpcode { pc, opcode } => {
                write!(f, "unsupported opcode {opcode:04X} at {pc:04X}")
            }
            Self::StackOverflow { pc, opcode } => {
                write!(f, "call stack overflow: {opcode:04X} at {pc:04X}")
            }
            Self::StackUnderflow { pc, opcode } => {
                write!(f, "call stack underflow: {opcode:04X} at {pc:04X}")
            }
            Self::ReservedRegister { pc, opcode } => {
                write!(f, "register VF is reserved: {opcode:04X} at {pc:04X}")
            }
            Self::PcOutOfRange { pc } => write!(f, "program counter {pc:04X} out of range"),
            Self::AddressOutOfRange {
                pc,
                opcode,
                address,
            } => write!(
                f,
                "address {address:04X} out of range: {opcode:04X} at {pc:04X}"
            ),
            Self::ProgramTooLarge { size, capacity } => write!(
                f,
                "program too large for VM memory: {size} bytes, capacity is {capacity}"
            ),
            Self::Io(err) => write!(f, "{}", err),
            Self::Fmt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Chip8Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Fmt(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Chip8Error {
    fn from(err: std::io::Error) -> Self {
        Chip8Error::Io(err)
    }
}

impl From<fmt::Error> for Chip8Error {
    fn from(err: fmt::Error) -> Self {
        Chip8Error::Fmt(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fault_message_has_location() {
        let err = Chip8Error::UnsupportedOpcode {
            pc: 0x204,
            opcode: 0x5001,
        };
        assert_eq!(err.to_string(), "unsupported opcode 5001 at 0204");
        assert!(err.is_fault());

        let err = Chip8Error::ProgramTooLarge {
            size: 4000,
            capacity: 3584,
        };
        assert!(!err.is_fault());
    }
}
