//! Addressing-mode state machines.
//!
//! Each mode resolves either an operand byte or an effective address over
//! one to five bus cycles. The instruction machine that owns the resolver is
//! its continuation: it receives `Resolution::Resolved` in the same cycle
//! the last byte arrives.

use crate::opcodes::AddressingMode;
use crate::{Registers, Step};

/// Outcome of one resolver cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Still resolving; perform this access next cycle.
    Pending(Step),
    /// Operand byte (when dereferencing) or effective address.
    Resolved(u16),
}

/// Kind of access the owning instruction makes at the effective address.
///
/// Indexed modes cannot know in advance whether the un-carried address is
/// right, so anything that writes always spends the fix-up cycle. Reads
/// only spend it when the index actually crossed a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    /// Stores and read-modify-write.
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Operand,
    OperandHigh,
    IndexDummy,
    PointerLow,
    PointerHigh,
    FixUp,
    Value,
}

/// Resolver for one addressing mode.
#[derive(Debug, Clone)]
pub struct Addressing {
    mode: AddressingMode,
    dereference: bool,
    access: Access,
    stage: Stage,
    address: u16,
    pointer: u8,
    low: u8,
}

impl Addressing {
    /// `dereference` resolves to the byte at the effective address instead
    /// of the address itself.
    #[must_use]
    pub fn new(mode: AddressingMode, dereference: bool, access: Access) -> Self {
        Self {
            mode,
            dereference,
            access,
            stage: Stage::Operand,
            address: 0,
            pointer: 0,
            low: 0,
        }
    }

    /// Resolves to the operand byte.
    #[must_use]
    pub fn read(mode: AddressingMode) -> Self {
        Self::new(mode, true, Access::Read)
    }

    /// Resolves to the effective address of a store or read-modify-write.
    #[must_use]
    pub fn write(mode: AddressingMode) -> Self {
        Self::new(mode, false, Access::Write)
    }

    /// Resolves to the effective address without touching it (jumps).
    #[must_use]
    pub fn address(mode: AddressingMode) -> Self {
        Self::new(mode, false, Access::Read)
    }

    #[must_use]
    pub fn mode(&self) -> AddressingMode {
        self.mode
    }

    /// First cycle: every mode with operands starts by fetching at PC.
    pub fn start(&mut self, regs: &mut Registers) -> Resolution {
        self.stage = Stage::Operand;
        match self.mode {
            AddressingMode::Implied | AddressingMode::Invalid => Resolution::Resolved(0),
            _ => Resolution::Pending(Step::Read(regs.pc)),
        }
    }

    /// Feed the byte from the previous access.
    pub fn resume(&mut self, regs: &mut Registers, data: u8) -> Resolution {
        use crate::opcodes::AddressingMode::{
            Absolute, AbsoluteX, AbsoluteY, Immediate, IndexedIndirectX, Indirect,
            IndirectIndexedY, Relative, ZeroPage, ZeroPageX, ZeroPageY,
        };

        match (self.mode, self.stage) {
            (_, Stage::Value) => Resolution::Resolved(u16::from(data)),
            // Dummy read at the un-carried address; `address` is already fixed.
            (_, Stage::FixUp) => self.effective(),

            (Immediate | Relative, Stage::Operand) => {
                regs.fetch_pc();
                Resolution::Resolved(u16::from(data))
            }

            (ZeroPage, Stage::Operand) => {
                regs.fetch_pc();
                self.address = u16::from(data);
                self.effective()
            }

            (Absolute | AbsoluteX | AbsoluteY | Indirect, Stage::Operand) => {
                regs.fetch_pc();
                self.low = data;
                self.stage = Stage::OperandHigh;
                Resolution::Pending(Step::Read(regs.pc))
            }
            (Absolute, Stage::OperandHigh) => {
                regs.fetch_pc();
                self.address = word(self.low, data);
                self.effective()
            }
            (AbsoluteX, Stage::OperandHigh) => {
                regs.fetch_pc();
                self.index(word(self.low, data), regs.x)
            }
            (AbsoluteY, Stage::OperandHigh) => {
                regs.fetch_pc();
                self.index(word(self.low, data), regs.y)
            }
            (Indirect, Stage::OperandHigh) => {
                regs.fetch_pc();
                self.address = word(self.low, data);
                self.stage = Stage::PointerLow;
                Resolution::Pending(Step::Read(self.address))
            }
            (Indirect, Stage::PointerLow) => {
                self.low = data;
                self.stage = Stage::PointerHigh;
                // The high byte never carries into the next page.
                let high = (self.address & 0xFF00) | (self.address.wrapping_add(1) & 0x00FF);
                Resolution::Pending(Step::Read(high))
            }
            (Indirect, Stage::PointerHigh) => Resolution::Resolved(word(self.low, data)),

            (ZeroPageX | ZeroPageY | IndexedIndirectX, Stage::Operand) => {
                regs.fetch_pc();
                self.pointer = data;
                self.stage = Stage::IndexDummy;
                Resolution::Pending(Step::Read(u16::from(self.pointer)))
            }
            (ZeroPageX, Stage::IndexDummy) => {
                self.address = u16::from(self.pointer.wrapping_add(regs.x));
                self.effective()
            }
            (ZeroPageY, Stage::IndexDummy) => {
                self.address = u16::from(self.pointer.wrapping_add(regs.y));
                self.effective()
            }
            (IndexedIndirectX, Stage::IndexDummy) => {
                self.pointer = self.pointer.wrapping_add(regs.x);
                self.stage = Stage::PointerLow;
                Resolution::Pending(Step::Read(u16::from(self.pointer)))
            }

            (IndirectIndexedY, Stage::Operand) => {
                regs.fetch_pc();
                self.pointer = data;
                self.stage = Stage::PointerLow;
                Resolution::Pending(Step::Read(u16::from(self.pointer)))
            }
            (IndexedIndirectX | IndirectIndexedY, Stage::PointerLow) => {
                self.low = data;
                self.stage = Stage::PointerHigh;
                Resolution::Pending(Step::Read(u16::from(self.pointer.wrapping_add(1))))
            }
            (IndexedIndirectX, Stage::PointerHigh) => {
                self.address = word(self.low, data);
                self.effective()
            }
            (IndirectIndexedY, Stage::PointerHigh) => self.index(word(self.low, data), regs.y),

            (mode, stage) => unreachable!("{mode:?} has no {stage:?} stage"),
        }
    }

    fn index(&mut self, base: u16, index: u8) -> Resolution {
        let target = base.wrapping_add(u16::from(index));
        let uncarried = (base & 0xFF00) | (target & 0x00FF);
        self.address = target;

        if uncarried != target || self.access == Access::Write {
            self.stage = Stage::FixUp;
            Resolution::Pending(Step::Read(uncarried))
        } else {
            self.effective()
        }
    }

    fn effective(&mut self) -> Resolution {
        if self.dereference {
            self.stage = Stage::Value;
            Resolution::Pending(Step::Read(self.address))
        } else {
            Resolution::Resolved(self.address)
        }
    }
}

const fn word(low: u8, high: u8) -> u16 {
    (low as u16) | ((high as u16) << 8)
}
