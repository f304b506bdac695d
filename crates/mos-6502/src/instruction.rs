//! Instruction state machines.
//!
//! One machine per instruction shape. Operand-taking shapes own an
//! [`Addressing`] resolver and act as its continuation; control sequences
//! (stack, subroutine, interrupt, reset) run their own cycle counters.
//!
//! Cycle counts below include the opcode fetch, which the core performs
//! before a machine exists.

use crate::addressing::{Addressing, Resolution};
use crate::flags::I;
use crate::opcodes::{AddressingMode, Instruction, Operation};
use crate::ops::{self, ConditionFn, ImpliedFn, ModifyFn, ReadFn, StoreFn};
use crate::{Registers, Status, Step, StateMachine};

/// NMI vector.
pub const NMI_VECTOR: u16 = 0xFFFA;
/// Reset vector.
pub const RESET_VECTOR: u16 = 0xFFFC;
/// IRQ/BRK vector.
pub const IRQ_VECTOR: u16 = 0xFFFE;

const fn word(low: u8, high: u8) -> u16 {
    (low as u16) | ((high as u16) << 8)
}

// ============================================================================
// Operand-taking shapes
// ============================================================================

/// Implied or accumulator operation, 2 cycles.
///
/// The byte after the opcode is read and thrown away.
#[derive(Debug, Clone)]
pub struct Nullary {
    op: ImpliedFn,
}

impl Nullary {
    #[must_use]
    pub fn new(op: ImpliedFn) -> Self {
        Self { op }
    }
}

impl StateMachine for Nullary {
    fn start(&mut self, regs: &mut Registers) -> Step {
        Step::Read(regs.pc)
    }

    fn advance(&mut self, regs: &mut Registers, _data: u8) -> Step {
        (self.op)(regs);
        Step::Complete
    }
}

/// Operation on an operand byte: loads, ALU, compares, BIT, read no-ops.
#[derive(Debug, Clone)]
pub struct ReadOp {
    addressing: Addressing,
    op: ReadFn,
}

impl ReadOp {
    #[must_use]
    pub fn new(mode: AddressingMode, op: ReadFn) -> Self {
        Self {
            addressing: Addressing::read(mode),
            op,
        }
    }

    fn resolve(&mut self, regs: &mut Registers, resolution: Resolution) -> Step {
        match resolution {
            Resolution::Pending(step) => step,
            Resolution::Resolved(operand) => {
                (self.op)(regs, operand as u8);
                Step::Complete
            }
        }
    }
}

impl StateMachine for ReadOp {
    fn start(&mut self, regs: &mut Registers) -> Step {
        let resolution = self.addressing.start(regs);
        self.resolve(regs, resolution)
    }

    fn advance(&mut self, regs: &mut Registers, data: u8) -> Step {
        let resolution = self.addressing.resume(regs, data);
        self.resolve(regs, resolution)
    }
}

/// Store of a register-derived value.
#[derive(Debug, Clone)]
pub struct WriteOp {
    addressing: Addressing,
    value: StoreFn,
    stored: bool,
}

impl WriteOp {
    #[must_use]
    pub fn new(mode: AddressingMode, value: StoreFn) -> Self {
        Self {
            addressing: Addressing::write(mode),
            value,
            stored: false,
        }
    }

    fn resolve(&mut self, regs: &Registers, resolution: Resolution) -> Step {
        match resolution {
            Resolution::Pending(step) => step,
            Resolution::Resolved(address) => {
                self.stored = true;
                Step::Write(address, (self.value)(regs))
            }
        }
    }
}

impl StateMachine for WriteOp {
    fn start(&mut self, regs: &mut Registers) -> Step {
        let resolution = self.addressing.start(regs);
        self.resolve(regs, resolution)
    }

    fn advance(&mut self, regs: &mut Registers, data: u8) -> Step {
        if self.stored {
            return Step::Complete;
        }
        let resolution = self.addressing.resume(regs, data);
        self.resolve(regs, resolution)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModifyStage {
    Addressing,
    Read,
    DummyWrite,
    Write,
}

/// Read-modify-write on memory.
///
/// After the effective address is known: read it, write the unmodified
/// byte back (NMOS dummy write), then write the result. Peripherals see
/// both writes.
#[derive(Debug, Clone)]
pub struct ReadModifyWrite {
    addressing: Addressing,
    op: ModifyFn,
    stage: ModifyStage,
    address: u16,
    result: u8,
}

impl ReadModifyWrite {
    #[must_use]
    pub fn new(mode: AddressingMode, op: ModifyFn) -> Self {
        Self {
            addressing: Addressing::write(mode),
            op,
            stage: ModifyStage::Addressing,
            address: 0,
            result: 0,
        }
    }

    fn resolve(&mut self, resolution: Resolution) -> Step {
        match resolution {
            Resolution::Pending(step) => step,
            Resolution::Resolved(address) => {
                self.address = address;
                self.stage = ModifyStage::Read;
                Step::Read(address)
            }
        }
    }
}

impl StateMachine for ReadModifyWrite {
    fn start(&mut self, regs: &mut Registers) -> Step {
        self.stage = ModifyStage::Addressing;
        let resolution = self.addressing.start(regs);
        self.resolve(resolution)
    }

    fn advance(&mut self, regs: &mut Registers, data: u8) -> Step {
        match self.stage {
            ModifyStage::Addressing => {
                let resolution = self.addressing.resume(regs, data);
                self.resolve(resolution)
            }
            ModifyStage::Read => {
                self.result = (self.op)(regs, data);
                self.stage = ModifyStage::DummyWrite;
                Step::Write(self.address, data)
            }
            ModifyStage::DummyWrite => {
                self.stage = ModifyStage::Write;
                Step::Write(self.address, self.result)
            }
            ModifyStage::Write => Step::Complete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchStage {
    Offset,
    Taken,
    PageFix,
}

/// Conditional branch: 2 cycles not taken, 3 taken, 4 taken across a page.
#[derive(Debug, Clone)]
pub struct Branch {
    offset: Addressing,
    condition: ConditionFn,
    stage: BranchStage,
    target: u16,
}

impl Branch {
    #[must_use]
    pub fn new(condition: ConditionFn) -> Self {
        Self {
            offset: Addressing::read(AddressingMode::Relative),
            condition,
            stage: BranchStage::Offset,
            target: 0,
        }
    }

    fn resolve(&mut self, regs: &Registers, resolution: Resolution) -> Step {
        match resolution {
            Resolution::Pending(step) => step,
            Resolution::Resolved(offset) => {
                if !(self.condition)(regs) {
                    return Step::Complete;
                }
                self.target = regs.pc.wrapping_add_signed(i16::from(offset as u8 as i8));
                self.stage = BranchStage::Taken;
                Step::Read(regs.pc)
            }
        }
    }
}

impl StateMachine for Branch {
    fn start(&mut self, regs: &mut Registers) -> Step {
        self.stage = BranchStage::Offset;
        let resolution = self.offset.start(regs);
        self.resolve(regs, resolution)
    }

    fn advance(&mut self, regs: &mut Registers, data: u8) -> Step {
        match self.stage {
            BranchStage::Offset => {
                let resolution = self.offset.resume(regs, data);
                self.resolve(regs, resolution)
            }
            BranchStage::Taken => {
                let from = regs.pc;
                regs.pc = self.target;
                if (from ^ self.target) & 0xFF00 == 0 {
                    Step::Complete
                } else {
                    // Low byte already moved, high byte not yet fixed.
                    self.stage = BranchStage::PageFix;
                    Step::Read((from & 0xFF00) | (self.target & 0x00FF))
                }
            }
            BranchStage::PageFix => Step::Complete,
        }
    }
}

/// JMP absolute (3 cycles) and indirect (5 cycles).
#[derive(Debug, Clone)]
pub struct Jump {
    addressing: Addressing,
}

impl Jump {
    #[must_use]
    pub fn new(mode: AddressingMode) -> Self {
        Self {
            addressing: Addressing::address(mode),
        }
    }

    fn resolve(regs: &mut Registers, resolution: Resolution) -> Step {
        match resolution {
            Resolution::Pending(step) => step,
            Resolution::Resolved(target) => {
                regs.pc = target;
                Step::Complete
            }
        }
    }
}

impl StateMachine for Jump {
    fn start(&mut self, regs: &mut Registers) -> Step {
        let resolution = self.addressing.start(regs);
        Self::resolve(regs, resolution)
    }

    fn advance(&mut self, regs: &mut Registers, data: u8) -> Step {
        let resolution = self.addressing.resume(regs, data);
        Self::resolve(regs, resolution)
    }
}

// ============================================================================
// Stack and control sequences
// ============================================================================

/// JSR, 6 cycles. The target's high byte is fetched last, after the
/// return address (pointing at it) has been pushed.
#[derive(Debug, Clone, Default)]
pub struct Jsr {
    cycle: u8,
    low: u8,
}

impl StateMachine for Jsr {
    fn start(&mut self, regs: &mut Registers) -> Step {
        self.cycle = 1;
        Step::Read(regs.pc)
    }

    fn advance(&mut self, regs: &mut Registers, data: u8) -> Step {
        self.cycle += 1;
        match self.cycle {
            2 => {
                self.low = data;
                regs.fetch_pc();
                Step::Read(regs.stack_addr())
            }
            3 => Step::Write(regs.push(), (regs.pc >> 8) as u8),
            4 => Step::Write(regs.push(), regs.pc as u8),
            5 => Step::Read(regs.pc),
            _ => {
                regs.pc = word(self.low, data);
                Step::Complete
            }
        }
    }
}

/// RTS, 6 cycles.
#[derive(Debug, Clone, Default)]
pub struct Rts {
    cycle: u8,
    low: u8,
    address: u16,
}

impl StateMachine for Rts {
    fn start(&mut self, regs: &mut Registers) -> Step {
        self.cycle = 1;
        Step::Read(regs.pc)
    }

    fn advance(&mut self, regs: &mut Registers, data: u8) -> Step {
        self.cycle += 1;
        match self.cycle {
            2 => Step::Read(regs.stack_addr()),
            3 => Step::Read(regs.pull()),
            4 => {
                self.low = data;
                Step::Read(regs.pull())
            }
            5 => {
                self.address = word(self.low, data);
                Step::Read(self.address)
            }
            _ => {
                regs.pc = self.address.wrapping_add(1);
                Step::Complete
            }
        }
    }
}

/// RTI, 6 cycles.
#[derive(Debug, Clone, Default)]
pub struct Rti {
    cycle: u8,
    low: u8,
}

impl StateMachine for Rti {
    fn start(&mut self, regs: &mut Registers) -> Step {
        self.cycle = 1;
        Step::Read(regs.pc)
    }

    fn advance(&mut self, regs: &mut Registers, data: u8) -> Step {
        self.cycle += 1;
        match self.cycle {
            2 => Step::Read(regs.stack_addr()),
            3 => Step::Read(regs.pull()),
            4 => {
                regs.p = Status::from_byte(data);
                Step::Read(regs.pull())
            }
            5 => {
                self.low = data;
                Step::Read(regs.pull())
            }
            _ => {
                regs.pc = word(self.low, data);
                Step::Complete
            }
        }
    }
}

/// PHA/PHP, 3 cycles.
#[derive(Debug, Clone)]
pub struct Push {
    value: StoreFn,
    pushed: bool,
}

impl Push {
    #[must_use]
    pub fn new(value: StoreFn) -> Self {
        Self {
            value,
            pushed: false,
        }
    }
}

impl StateMachine for Push {
    fn start(&mut self, regs: &mut Registers) -> Step {
        self.pushed = false;
        Step::Read(regs.pc)
    }

    fn advance(&mut self, regs: &mut Registers, _data: u8) -> Step {
        if self.pushed {
            return Step::Complete;
        }
        self.pushed = true;
        let value = (self.value)(regs);
        Step::Write(regs.push(), value)
    }
}

/// PLA/PLP, 4 cycles.
#[derive(Debug, Clone)]
pub struct Pull {
    sink: ReadFn,
    cycle: u8,
}

impl Pull {
    #[must_use]
    pub fn new(sink: ReadFn) -> Self {
        Self { sink, cycle: 0 }
    }
}

impl StateMachine for Pull {
    fn start(&mut self, regs: &mut Registers) -> Step {
        self.cycle = 1;
        Step::Read(regs.pc)
    }

    fn advance(&mut self, regs: &mut Registers, data: u8) -> Step {
        self.cycle += 1;
        match self.cycle {
            2 => Step::Read(regs.stack_addr()),
            3 => Step::Read(regs.pull()),
            _ => {
                (self.sink)(regs, data);
                Step::Complete
            }
        }
    }
}

/// Source of an interrupt sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptKind {
    /// BRK instruction.
    Break,
    Irq,
    Nmi,
}

impl InterruptKind {
    #[must_use]
    pub const fn vector(self) -> u16 {
        match self {
            Self::Break | Self::Irq => IRQ_VECTOR,
            Self::Nmi => NMI_VECTOR,
        }
    }
}

/// BRK and hardware interrupt entry, 7 cycles.
///
/// IRQ/NMI replace the opcode fetch with a read at PC that leaves PC alone;
/// BRK skips its padding byte instead. Only BRK pushes status with B set.
#[derive(Debug, Clone)]
pub struct Interrupt {
    kind: InterruptKind,
    cycle: u8,
    low: u8,
}

impl Interrupt {
    #[must_use]
    pub fn new(kind: InterruptKind) -> Self {
        Self {
            kind,
            cycle: 0,
            low: 0,
        }
    }

    #[must_use]
    pub fn kind(&self) -> InterruptKind {
        self.kind
    }
}

impl StateMachine for Interrupt {
    fn start(&mut self, regs: &mut Registers) -> Step {
        // BRK's opcode fetch already happened.
        self.cycle = u8::from(self.kind == InterruptKind::Break);
        Step::Read(regs.pc)
    }

    fn advance(&mut self, regs: &mut Registers, data: u8) -> Step {
        self.cycle += 1;
        match self.cycle {
            1 => Step::Read(regs.pc),
            2 => {
                if self.kind == InterruptKind::Break {
                    regs.fetch_pc();
                }
                Step::Write(regs.push(), (regs.pc >> 8) as u8)
            }
            3 => Step::Write(regs.push(), regs.pc as u8),
            4 => {
                let status = regs.p.to_pushed(self.kind == InterruptKind::Break);
                Step::Write(regs.push(), status)
            }
            5 => {
                regs.p.set(I);
                Step::Read(self.kind.vector())
            }
            6 => {
                self.low = data;
                Step::Read(self.kind.vector().wrapping_add(1))
            }
            _ => {
                regs.pc = word(self.low, data);
                Step::Complete
            }
        }
    }
}

/// Reset sequence, 7 cycles.
///
/// Two reads at PC, three stack accesses that decrement S without writing,
/// then the reset vector. I is set; A, X, Y and D are left alone.
#[derive(Debug, Clone, Default)]
pub struct Boot {
    cycle: u8,
    low: u8,
}

impl StateMachine for Boot {
    fn start(&mut self, regs: &mut Registers) -> Step {
        self.cycle = 0;
        Step::Read(regs.pc)
    }

    fn advance(&mut self, regs: &mut Registers, data: u8) -> Step {
        self.cycle += 1;
        match self.cycle {
            1 => Step::Read(regs.pc),
            2..=4 => {
                let addr = regs.stack_addr();
                regs.s = regs.s.wrapping_sub(1);
                Step::Read(addr)
            }
            5 => {
                regs.p.set(I);
                Step::Read(RESET_VECTOR)
            }
            6 => {
                self.low = data;
                Step::Read(RESET_VECTOR.wrapping_add(1))
            }
            _ => {
                regs.pc = word(self.low, data);
                Step::Complete
            }
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Any machine the core can drive.
#[derive(Debug, Clone)]
pub enum Machine {
    Nullary(Nullary),
    Read(ReadOp),
    Write(WriteOp),
    Modify(ReadModifyWrite),
    Branch(Branch),
    Jump(Jump),
    Jsr(Jsr),
    Rts(Rts),
    Rti(Rti),
    Push(Push),
    Pull(Pull),
    Interrupt(Interrupt),
    Boot(Boot),
}

impl Machine {
    /// Build the machine for a decoded opcode. `None` for invalid entries.
    #[must_use]
    pub fn for_instruction(instruction: Instruction) -> Option<Self> {
        use Operation as Op;

        let mode = instruction.mode;
        let machine = match instruction.operation {
            Op::Adc => Self::read(mode, ops::adc),
            Op::And => Self::read(mode, ops::and),
            Op::Bit => Self::read(mode, ops::bit),
            Op::Cmp => Self::read(mode, ops::cmp),
            Op::Cpx => Self::read(mode, ops::cpx),
            Op::Cpy => Self::read(mode, ops::cpy),
            Op::Eor => Self::read(mode, ops::eor),
            Op::Lda => Self::read(mode, ops::lda),
            Op::Ldx => Self::read(mode, ops::ldx),
            Op::Ldy => Self::read(mode, ops::ldy),
            Op::Ora => Self::read(mode, ops::ora),
            Op::Sbc => Self::read(mode, ops::sbc),
            Op::Dop | Op::Top => Self::read(mode, ops::nop),
            Op::Alr => Self::read(mode, ops::alr),
            Op::Axs => Self::read(mode, ops::axs),
            Op::Lax => Self::read(mode, ops::lax),
            Op::Arr => Self::read(mode, ops::arr),
            Op::Lar => Self::read(mode, ops::lar),
            Op::Aac => Self::read(mode, ops::aac),
            Op::Atx => Self::read(mode, ops::atx),

            Op::Sta => Self::Write(WriteOp::new(mode, ops::sta)),
            Op::Stx => Self::Write(WriteOp::new(mode, ops::stx)),
            Op::Sty => Self::Write(WriteOp::new(mode, ops::sty)),
            Op::Aax => Self::Write(WriteOp::new(mode, ops::aax)),

            Op::Asl => Self::modify(mode, ops::asl, ops::asl_a),
            Op::Lsr => Self::modify(mode, ops::lsr, ops::lsr_a),
            Op::Rol => Self::modify(mode, ops::rol, ops::rol_a),
            Op::Ror => Self::modify(mode, ops::ror, ops::ror_a),
            Op::Inc => Self::Modify(ReadModifyWrite::new(mode, ops::inc)),
            Op::Dec => Self::Modify(ReadModifyWrite::new(mode, ops::dec)),
            Op::Dcp => Self::Modify(ReadModifyWrite::new(mode, ops::dcp)),
            Op::Isc => Self::Modify(ReadModifyWrite::new(mode, ops::isc)),
            Op::Slo => Self::Modify(ReadModifyWrite::new(mode, ops::slo)),

            Op::Bpl => Self::Branch(Branch::new(ops::bpl)),
            Op::Bmi => Self::Branch(Branch::new(ops::bmi)),
            Op::Bvc => Self::Branch(Branch::new(ops::bvc)),
            Op::Bvs => Self::Branch(Branch::new(ops::bvs)),
            Op::Bcc => Self::Branch(Branch::new(ops::bcc)),
            Op::Bcs => Self::Branch(Branch::new(ops::bcs)),
            Op::Bne => Self::Branch(Branch::new(ops::bne)),
            Op::Beq => Self::Branch(Branch::new(ops::beq)),

            Op::Clc => Self::nullary(ops::clc),
            Op::Cld => Self::nullary(ops::cld),
            Op::Cli => Self::nullary(ops::cli),
            Op::Clv => Self::nullary(ops::clv),
            Op::Sec => Self::nullary(ops::sec),
            Op::Sed => Self::nullary(ops::sed),
            Op::Sei => Self::nullary(ops::sei),
            Op::Tax => Self::nullary(ops::tax),
            Op::Tay => Self::nullary(ops::tay),
            Op::Tsx => Self::nullary(ops::tsx),
            Op::Txa => Self::nullary(ops::txa),
            Op::Txs => Self::nullary(ops::txs),
            Op::Tya => Self::nullary(ops::tya),
            Op::Dex => Self::nullary(ops::dex),
            Op::Dey => Self::nullary(ops::dey),
            Op::Inx => Self::nullary(ops::inx),
            Op::Iny => Self::nullary(ops::iny),
            Op::Nop => Self::nullary(ops::nop_implied),

            Op::Jmp => Self::Jump(Jump::new(mode)),
            Op::Jsr => Self::Jsr(Jsr::default()),
            Op::Rts => Self::Rts(Rts::default()),
            Op::Rti => Self::Rti(Rti::default()),
            Op::Brk => Self::Interrupt(Interrupt::new(InterruptKind::Break)),
            Op::Pha => Self::Push(Push::new(ops::sta)),
            Op::Php => Self::Push(Push::new(|regs| regs.p.to_pushed(true))),
            Op::Pla => Self::Pull(Pull::new(ops::lda)),
            Op::Plp => Self::Pull(Pull::new(|regs, value| regs.p = Status::from_byte(value))),

            Op::Invalid => return None,
        };
        Some(machine)
    }

    /// Hardware interrupt entry.
    #[must_use]
    pub fn interrupt(kind: InterruptKind) -> Self {
        Self::Interrupt(Interrupt::new(kind))
    }

    /// Reset sequence.
    #[must_use]
    pub fn boot() -> Self {
        Self::Boot(Boot::default())
    }

    fn read(mode: AddressingMode, op: ReadFn) -> Self {
        Self::Read(ReadOp::new(mode, op))
    }

    fn nullary(op: ImpliedFn) -> Self {
        Self::Nullary(Nullary::new(op))
    }

    /// Shifts and rotates work on A when the mode is implied.
    fn modify(mode: AddressingMode, op: ModifyFn, accumulator: ImpliedFn) -> Self {
        if mode == AddressingMode::Implied {
            Self::nullary(accumulator)
        } else {
            Self::Modify(ReadModifyWrite::new(mode, op))
        }
    }
}

impl StateMachine for Machine {
    fn start(&mut self, regs: &mut Registers) -> Step {
        match self {
            Self::Nullary(m) => m.start(regs),
            Self::Read(m) => m.start(regs),
            Self::Write(m) => m.start(regs),
            Self::Modify(m) => m.start(regs),
            Self::Branch(m) => m.start(regs),
            Self::Jump(m) => m.start(regs),
            Self::Jsr(m) => m.start(regs),
            Self::Rts(m) => m.start(regs),
            Self::Rti(m) => m.start(regs),
            Self::Push(m) => m.start(regs),
            Self::Pull(m) => m.start(regs),
            Self::Interrupt(m) => m.start(regs),
            Self::Boot(m) => m.start(regs),
        }
    }

    fn advance(&mut self, regs: &mut Registers, data: u8) -> Step {
        match self {
            Self::Nullary(m) => m.advance(regs, data),
            Self::Read(m) => m.advance(regs, data),
            Self::Write(m) => m.advance(regs, data),
            Self::Modify(m) => m.advance(regs, data),
            Self::Branch(m) => m.advance(regs, data),
            Self::Jump(m) => m.advance(regs, data),
            Self::Jsr(m) => m.advance(regs, data),
            Self::Rts(m) => m.advance(regs, data),
            Self::Rti(m) => m.advance(regs, data),
            Self::Push(m) => m.advance(regs, data),
            Self::Pull(m) => m.advance(regs, data),
            Self::Interrupt(m) => m.advance(regs, data),
            Self::Boot(m) => m.advance(regs, data),
        }
    }
}
