//! The per-cycle contract between state machines and the CPU core.
//!
//! A machine never touches the bus. Each advance hands back the access the
//! core must perform on the next cycle, and the core feeds the result into
//! the following advance. One `Step` is one bus cycle.

use crate::Registers;

/// What a state machine wants from the next bus cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Read the byte at this address.
    Read(u16),
    /// Write a byte.
    Write(u16, u8),
    /// The machine is finished; no access for it on the next cycle.
    Complete,
}

impl Step {
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Read(_))
    }

    /// The bus address this step drives, if any.
    #[must_use]
    pub const fn address(self) -> Option<u16> {
        match self {
            Self::Read(addr) | Self::Write(addr, _) => Some(addr),
            Self::Complete => None,
        }
    }
}

/// A resumable per-cycle machine.
///
/// `start` runs during the cycle that created the machine and returns the
/// first request. `advance` receives the byte that request moved over the
/// bus (the value read, or for a write the value written).
pub trait StateMachine {
    fn start(&mut self, regs: &mut Registers) -> Step;

    fn advance(&mut self, regs: &mut Registers, data: u8) -> Step;
}
