//! CPU faults.

use std::fmt;

/// Fault that stops the CPU until the next reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    /// The byte fetched as an opcode has no table entry.
    IllegalOpcode { opcode: u8, address: u16 },
}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalOpcode { opcode, address } => {
                write!(f, "illegal opcode ${opcode:02X} at ${address:04X}")
            }
        }
    }
}

impl std::error::Error for CpuError {}
