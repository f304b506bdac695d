//! Core traits and types for cycle-accurate emulation.
//!
//! A CPU advances one bus cycle per `tick()`. Every other chip on the bus
//! sees each access as it happens, which is what makes cross-chip timing
//! tricks observable.

mod bus;
mod cpu;
mod observable;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
