//! 6502 register file.

use crate::Status;
use crate::flags::{I, U};

/// Base of the hardware stack page.
pub const STACK_PAGE: u16 = 0x0100;

/// The processor state an instruction works on.
///
/// Owned by [`crate::Mos6502`]; state machines borrow it mutably for one
/// cycle at a time. All updates wrap at the register width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer (next free slot in $0100-$01FF).
    pub s: u8,
    /// Program counter.
    pub pc: u16,
    /// Processor status.
    pub p: Status,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Register state after a completed reset sequence with PC not yet
    /// loaded: S=$FD, I set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFD,
            pc: 0,
            p: Status(U | I),
        }
    }

    /// Return PC and advance it past the byte just fetched.
    pub fn fetch_pc(&mut self) -> u16 {
        let pc = self.pc;
        self.pc = self.pc.wrapping_add(1);
        pc
    }

    /// Slot for the next push; decrements S.
    pub fn push(&mut self) -> u16 {
        let addr = STACK_PAGE | u16::from(self.s);
        self.s = self.s.wrapping_sub(1);
        addr
    }

    /// Slot for the next pull; increments S first.
    pub fn pull(&mut self) -> u16 {
        self.s = self.s.wrapping_add(1);
        STACK_PAGE | u16::from(self.s)
    }

    /// Address S currently points at, without moving it.
    #[must_use]
    pub const fn stack_addr(&self) -> u16 {
        STACK_PAGE | (self.s as u16)
    }
}
