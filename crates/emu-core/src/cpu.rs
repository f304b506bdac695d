//! CPU core trait.

use crate::Bus;

/// A CPU core.
///
/// CPUs execute instructions and access memory through a bus. The bus is
/// passed into `tick`, not owned, so it can be shared with other components
/// (video chip, I/O chip) that the host steps in between CPU cycles.
///
/// CPUs expose their internal state for observation and debugging.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Fault raised when the CPU cannot continue (e.g. an undecodable
    /// opcode).
    type Error: std::error::Error;

    /// Advance the CPU by exactly one bus cycle.
    ///
    /// At most one bus access happens per call.
    fn tick<B: Bus>(&mut self, bus: &mut B) -> Result<(), Self::Error>;

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU has stopped executing instructions.
    fn is_halted(&self) -> bool;

    /// Drive the maskable interrupt line. The line is level-sensitive.
    fn set_irq(&mut self, asserted: bool);

    /// Signal a non-maskable interrupt (edge).
    fn nmi(&mut self);

    /// Pull the reset line. In-flight instruction state is discarded.
    fn reset(&mut self);
}
