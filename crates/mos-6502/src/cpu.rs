//! 6502 CPU core.
//!
//! Each `tick()` performs exactly one bus access (or none, while RDY holds a
//! read cycle). The access is whatever the running state machine asked for
//! on the previous cycle; its result is fed straight back in.

use emu_core::{Bus, Cpu, Observable, Value};

use crate::error::CpuError;
use crate::flags::{C, D, I, N, V, Z};
use crate::instruction::{InterruptKind, Machine};
use crate::opcodes::lookup;
use crate::{Registers, StateMachine, Step};

/// Internal state tracking instruction execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Running the reset sequence.
    Boot,
    /// Next cycle fetches an opcode (or enters a pending interrupt).
    Fetch,
    /// Executing instruction cycles.
    Execute,
    /// Stopped on an illegal opcode until reset.
    Jammed,
}

/// The MOS 6502 CPU.
#[derive(Debug)]
pub struct Mos6502 {
    /// CPU registers.
    pub regs: Registers,

    state: State,

    /// Machine for the instruction, interrupt or reset in progress.
    machine: Option<Machine>,

    /// Access to perform on the next tick while in `Boot`/`Execute`.
    pending: Step,

    /// Last opcode fetched. Interrupt entry reports $00 (BRK).
    opcode: u8,

    /// Address the current instruction was fetched from.
    instruction_pc: u16,

    /// NMI edge detector - set by `nmi()`, consumed on entry.
    nmi_pending: bool,

    /// IRQ line level - true while asserted.
    irq_line: bool,

    /// RDY input. Low stalls read cycles.
    rdy: bool,

    /// Elapsed clock cycles, stalled ones included.
    total_cycles: u64,

    fault: Option<CpuError>,
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6502 {
    /// A CPU about to fetch at PC=0 with post-reset registers.
    ///
    /// No reset sequence is run; set `regs.pc` directly, or call
    /// [`Cpu::reset`] to boot through the reset vector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            state: State::Fetch,
            machine: None,
            pending: Step::Complete,
            opcode: 0,
            instruction_pc: 0,
            nmi_pending: false,
            irq_line: false,
            rdy: true,
            total_cycles: 0,
            fault: None,
        }
    }

    /// True between instructions: the next tick fetches an opcode.
    #[must_use]
    pub fn is_instruction_complete(&self) -> bool {
        self.state == State::Fetch
    }

    /// Drive the RDY input. While low, read cycles are stalled without a bus
    /// access; write cycles still happen.
    pub fn set_rdy(&mut self, ready: bool) {
        self.rdy = ready;
    }

    #[must_use]
    pub fn rdy(&self) -> bool {
        self.rdy
    }

    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.total_cycles
    }

    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Address of the opcode being executed.
    #[must_use]
    pub fn instruction_pc(&self) -> u16 {
        self.instruction_pc
    }

    /// Execute one CPU cycle.
    fn execute_cycle<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        if let Some(fault) = self.fault {
            return Err(fault);
        }

        if self.state == State::Fetch {
            self.poll_interrupts();
        }

        let step = match self.state {
            State::Fetch => Step::Read(self.regs.pc),
            State::Boot | State::Execute | State::Jammed => self.pending,
        };

        self.total_cycles += 1;
        if !self.rdy && step.is_read() {
            return Ok(());
        }

        let data = match step {
            Step::Read(addr) => bus.read(addr),
            Step::Write(addr, value) => {
                bus.write(addr, value);
                value
            }
            Step::Complete => return Ok(()),
        };

        if self.state == State::Fetch {
            return self.decode(data);
        }

        let next = match &mut self.machine {
            Some(machine) => machine.advance(&mut self.regs, data),
            None => Step::Complete,
        };
        self.set_pending(next);
        Ok(())
    }

    /// Enter a pending interrupt in place of the opcode fetch.
    /// NMI wins over IRQ; IRQ is masked by I.
    fn poll_interrupts(&mut self) {
        let kind = if self.nmi_pending {
            self.nmi_pending = false;
            InterruptKind::Nmi
        } else if self.irq_line && !self.regs.p.is_set(I) {
            InterruptKind::Irq
        } else {
            return;
        };

        self.opcode = 0x00;
        self.instruction_pc = self.regs.pc;
        self.begin(Machine::interrupt(kind), State::Execute);
    }

    fn decode(&mut self, opcode: u8) -> Result<(), CpuError> {
        self.opcode = opcode;
        self.instruction_pc = self.regs.fetch_pc();

        let Some(machine) = Machine::for_instruction(lookup(opcode)) else {
            let fault = CpuError::IllegalOpcode {
                opcode,
                address: self.instruction_pc,
            };
            self.fault = Some(fault);
            self.machine = None;
            self.state = State::Jammed;
            return Err(fault);
        };

        self.begin(machine, State::Execute);
        Ok(())
    }

    fn begin(&mut self, mut machine: Machine, state: State) {
        let step = machine.start(&mut self.regs);
        self.machine = Some(machine);
        self.state = state;
        self.set_pending(step);
    }

    fn set_pending(&mut self, step: Step) {
        self.pending = step;
        if step == Step::Complete {
            self.machine = None;
            self.state = State::Fetch;
        }
    }
}

// ============================================================================
// Trait implementations
// ============================================================================

impl Cpu for Mos6502 {
    type Registers = Registers;
    type Error = CpuError;

    fn tick<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        self.execute_cycle(bus)
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Self::Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.state == State::Jammed
    }

    fn set_irq(&mut self, asserted: bool) {
        self.irq_line = asserted;
    }

    fn nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Discard whatever is in flight and run the 7-cycle reset sequence.
    /// A, X and Y survive; the IRQ and RDY lines keep their levels.
    fn reset(&mut self) {
        self.fault = None;
        self.nmi_pending = false;
        self.instruction_pc = self.regs.pc;
        self.begin(Machine::boot(), State::Boot);
    }
}

impl Observable for Mos6502 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" | "sp" => Some(self.regs.s.into()),
            "p" | "status" => Some(self.regs.p.0.into()),
            "flags.c" | "c" => Some(self.regs.p.is_set(C).into()),
            "flags.z" | "z" => Some(self.regs.p.is_set(Z).into()),
            "flags.i" | "i" => Some(self.regs.p.is_set(I).into()),
            "flags.d" | "d" => Some(self.regs.p.is_set(D).into()),
            "flags.v" | "v" => Some(self.regs.p.is_set(V).into()),
            "flags.n" | "n" => Some(self.regs.p.is_set(N).into()),
            "cycle" => Some(Value::U64(self.total_cycles)),
            "opcode" => Some(self.opcode.into()),
            "instruction_pc" => Some(self.instruction_pc.into()),
            "halted" => Some(self.is_halted().into()),
            "rdy" => Some(self.rdy.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc",
            "a",
            "x",
            "y",
            "s",
            "p",
            "flags.c",
            "flags.z",
            "flags.i",
            "flags.d",
            "flags.v",
            "flags.n",
            "cycle",
            "opcode",
            "instruction_pc",
            "halted",
            "rdy",
        ]
    }
}
