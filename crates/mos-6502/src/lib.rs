//! Cycle-accurate MOS 6502 CPU.
//!
//! Every instruction is a small state machine that asks for one bus access
//! per cycle. Addressing modes are machines too, composed into the
//! instruction that owns them, so each cycle of an instruction (dummy reads
//! and writes included) appears on the bus at the right time.
//!
//! The opcode table covers the documented instruction set plus the stable
//! undocumented opcodes. Anything else stops the CPU with
//! [`CpuError::IllegalOpcode`].

mod addressing;
mod cpu;
mod error;
pub mod flags;
mod instruction;
mod opcodes;
mod ops;
mod registers;
mod step;

pub use addressing::{Access, Addressing, Resolution};
pub use cpu::Mos6502;
pub use error::CpuError;
pub use flags::Status;
pub use instruction::{InterruptKind, Machine, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR};
pub use opcodes::{AddressingMode, Instruction, OPCODES, Operation, lookup};
pub use registers::{Registers, STACK_PAGE};
pub use step::{StateMachine, Step};
