//! Instruction behaviour on a flat RAM bus.

use emu_core::{Bus, Cpu, SimpleBus};
use mos_6502::{CpuError, Mos6502, flags};

/// Run one complete instruction (fetch + execute cycles).
fn run_instruction(cpu: &mut Mos6502, bus: &mut SimpleBus) {
    try_instruction(cpu, bus).expect("instruction should decode");
}

/// Like `run_instruction`, but hands back a decode fault.
fn try_instruction(cpu: &mut Mos6502, bus: &mut SimpleBus) -> Result<(), CpuError> {
    // First tick fetches the opcode
    cpu.tick(bus)?;

    for _ in 0..20 {
        if cpu.is_instruction_complete() {
            return Ok(());
        }
        cpu.tick(bus)?;
    }
    panic!("Instruction did not complete within 20 cycles");
}

/// Load a program at $0200 and set PC there.
fn setup_program(bus: &mut SimpleBus, cpu: &mut Mos6502, program: &[u8]) {
    bus.load(0x0200, program);
    cpu.regs.pc = 0x0200;
}

/// BRK vector at $0300 and an empty stack.
fn setup_brk_vector(bus: &mut SimpleBus, cpu: &mut Mos6502) {
    bus.write(0xFFFE, 0x00);
    bus.write(0xFFFF, 0x03);
    cpu.regs.s = 0xFF;
}

// ============================================================================
// Stack
// ============================================================================

#[test]
fn test_stack_pha_pla() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    let program = [
        0xA9, 0x42, // LDA #$42
        0xA2, 0xFF, // LDX #$FF
        0x9A, // TXS
        0x48, // PHA
        0xA9, 0x00, // LDA #$00
        0x68, // PLA
    ];
    setup_program(&mut bus, &mut cpu, &program);

    for _ in 0..6 {
        run_instruction(&mut cpu, &mut bus);
    }

    assert_eq!(cpu.regs.a, 0x42, "PLA should restore A");
    assert_eq!(cpu.regs.s, 0xFF, "SP should be back to $FF after PLA");
    assert!(!cpu.regs.p.is_set(flags::Z), "PLA sets flags from the value");
}

#[test]
fn test_stack_php_plp() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    let program = [
        0xA2, 0xFF, // LDX #$FF
        0x9A, // TXS
        0x38, // SEC
        0x08, // PHP
        0x18, // CLC
        0x28, // PLP
    ];
    setup_program(&mut bus, &mut cpu, &program);

    for _ in 0..6 {
        run_instruction(&mut cpu, &mut bus);
    }

    assert!(cpu.regs.p.is_set(flags::C), "PLP should restore carry flag");
    assert_eq!(bus.peek(0x01FF) & 0x30, 0x30, "PHP pushes B and U");
    assert!(!cpu.regs.p.is_set(flags::B), "B never lands in P");
    assert_eq!(cpu.regs.s, 0xFF, "SP should be back to $FF");
}

// ============================================================================
// BRK / RTI
// ============================================================================

#[test]
fn test_brk_stack_layout() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    setup_brk_vector(&mut bus, &mut cpu);

    let program = [
        0x58, // CLI         @ $0200
        0x00, // BRK         @ $0201
        0xEA, // padding     @ $0202, skipped
    ];
    setup_program(&mut bus, &mut cpu, &program);

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);

    assert_eq!(cpu.pc(), 0x0300, "PC should be at BRK vector target");
    assert_eq!(cpu.regs.s, 0xFC, "three pushes from $FF");
    assert!(cpu.regs.p.is_set(flags::I), "BRK sets I");

    // Return address skips the padding byte.
    assert_eq!(bus.peek(0x01FF), 0x02);
    assert_eq!(bus.peek(0x01FE), 0x03);

    let pushed_p = bus.peek(0x01FD);
    assert_eq!(pushed_p & 0x30, 0x30, "Pushed P should have B and U set");
    assert_eq!(pushed_p & 0x04, 0x00, "Pushed P should not have I (CLI ran)");
}

#[test]
fn test_brk_then_rti_returns_past_padding() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    setup_brk_vector(&mut bus, &mut cpu);

    // Handler: RTI
    bus.write(0x0300, 0x40);

    let program = [
        0x38, // SEC
        0x58, // CLI
        0x00, // BRK
        0xEA, // padding
        0xA9, 0x42, // LDA #$42
    ];
    setup_program(&mut bus, &mut cpu, &program);

    for _ in 0..5 {
        run_instruction(&mut cpu, &mut bus);
    }

    assert_eq!(cpu.regs.a, 0x42, "execution resumes after the padding byte");
    assert!(cpu.regs.p.is_set(flags::C), "RTI restores carry");
    assert!(!cpu.regs.p.is_set(flags::I), "RTI restores I");
    assert_eq!(cpu.regs.s, 0xFF);
}

#[test]
fn test_brk_after_plp_of_zero() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    setup_brk_vector(&mut bus, &mut cpu);

    // Handler: PHP
    bus.write(0x0300, 0x08);

    let program = [
        0xA9, 0x00, // LDA #$00
        0x48, // PHA
        0xA9, 0x42, // LDA #$42
        0x28, // PLP: P = U only
        0x00, // BRK
        0xEA, // padding
    ];
    setup_program(&mut bus, &mut cpu, &program);

    for _ in 0..5 {
        run_instruction(&mut cpu, &mut bus);
    }
    // PHP in the handler
    run_instruction(&mut cpu, &mut bus);

    assert_eq!(cpu.regs.s, 0xFB, "BRK + PHP pushed four bytes");
    assert_eq!(bus.peek(0x01FD), 0x30, "BRK should push P with U+B ($30)");
    assert_eq!(bus.peek(0x01FC), 0x34, "handler sees I set, pushes with B");
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_jmp_indirect() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0x1000, 0x10);
    bus.write(0x1001, 0x02);

    let program = [
        0x6C, 0x00, 0x10, // JMP ($1000)
    ];
    setup_program(&mut bus, &mut cpu, &program);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc(), 0x0210, "JMP should have jumped to $0210");
}

#[test]
fn test_jmp_indirect_page_wrap_bug() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    // Pointer at $10FF: low byte from $10FF, high byte from $1000.
    bus.write(0x10FF, 0x34);
    bus.write(0x1000, 0x12);
    bus.write(0x1100, 0x99);

    setup_program(&mut bus, &mut cpu, &[0x6C, 0xFF, 0x10]);
    run_instruction(&mut cpu, &mut bus);

    assert_eq!(cpu.pc(), 0x1234);
}

#[test]
fn test_jsr_rts_sequence() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();
    cpu.regs.s = 0xFF;

    // Subroutine at $0220: LDA $4000; RTS
    bus.load(0x0220, &[0xAD, 0x00, 0x40, 0x60]);
    bus.write(0x4000, 0x42);

    let program = [
        0x20, 0x20, 0x02, // JSR $0220
        0xEA, // NOP @ $0203
    ];
    setup_program(&mut bus, &mut cpu, &program);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc(), 0x0220, "JSR should jump to subroutine");
    assert_eq!(bus.peek(0x01FF), 0x02);
    assert_eq!(bus.peek(0x01FE), 0x02, "JSR pushes the address of its last byte");

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0x42, "LDA in subroutine should load");

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc(), 0x0203, "RTS should return after JSR");
    assert_eq!(cpu.regs.s, 0xFF);
}

#[test]
fn test_branch_loop_counts_down() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    let program = [
        0xA2, 0x05, // LDX #$05
        0xCA, // DEX         @ $0202
        0xD0, 0xFD, // BNE $0202
        0xEA, // NOP
    ];
    setup_program(&mut bus, &mut cpu, &program);

    // LDX, then five DEX/BNE pairs
    for _ in 0..11 {
        run_instruction(&mut cpu, &mut bus);
    }

    assert_eq!(cpu.regs.x, 0);
    assert!(cpu.regs.p.is_set(flags::Z));
    assert_eq!(cpu.pc(), 0x0205);
}

#[test]
fn test_page_crossing_read() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0x1100, 0x42);
    bus.write(0x1000, 0x99);

    let program = [
        0xA2, 0x01, // LDX #$01
        0xBD, 0xFF, 0x10, // LDA $10FF,X
    ];
    setup_program(&mut bus, &mut cpu, &program);

    run_instruction(&mut cpu, &mut bus);
    let before = cpu.cycles();
    run_instruction(&mut cpu, &mut bus);

    assert_eq!(cpu.regs.a, 0x42, "LDA should have loaded from $1100");
    assert_eq!(cpu.cycles() - before, 5, "page cross costs one cycle");
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_adc_sets_overflow() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    let program = [
        0x18, // CLC
        0xA9, 0x50, // LDA #$50
        0x69, 0x50, // ADC #$50
    ];
    setup_program(&mut bus, &mut cpu, &program);

    for _ in 0..3 {
        run_instruction(&mut cpu, &mut bus);
    }

    assert_eq!(cpu.regs.a, 0xA0);
    assert!(cpu.regs.p.is_set(flags::V));
    assert!(cpu.regs.p.is_set(flags::N));
    assert!(!cpu.regs.p.is_set(flags::C));
}

#[test]
fn test_decimal_adc_and_sbc() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    let program = [
        0xF8, // SED
        0x18, // CLC
        0xA9, 0x58, // LDA #$58
        0x69, 0x46, // ADC #$46 -> $04, C=1
        0x38, // SEC
        0xE9, 0x05, // SBC #$05 -> $99, C=0
    ];
    setup_program(&mut bus, &mut cpu, &program);

    for _ in 0..4 {
        run_instruction(&mut cpu, &mut bus);
    }
    assert_eq!(cpu.regs.a, 0x04);
    assert!(cpu.regs.p.is_set(flags::C));

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0x99);
    assert!(!cpu.regs.p.is_set(flags::C));
}

#[test]
fn test_inc_absolute_x() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0x1235, 0xFF);

    let program = [
        0xA2, 0x01, // LDX #$01
        0xFE, 0x34, 0x12, // INC $1234,X
    ];
    setup_program(&mut bus, &mut cpu, &program);

    run_instruction(&mut cpu, &mut bus);
    let before = cpu.cycles();
    run_instruction(&mut cpu, &mut bus);

    assert_eq!(bus.peek(0x1235), 0x00);
    assert!(cpu.regs.p.is_set(flags::Z));
    assert_eq!(cpu.cycles() - before, 7);
}

// ============================================================================
// Undocumented opcodes
// ============================================================================

#[test]
fn test_undocumented_lax_zeropage() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0x0010, 0x42);

    // LAX $10
    setup_program(&mut bus, &mut cpu, &[0xA7, 0x10]);
    run_instruction(&mut cpu, &mut bus);

    assert_eq!(cpu.regs.a, 0x42, "LAX should load A");
    assert_eq!(cpu.regs.x, 0x42, "LAX should load X with same value");
    assert!(!cpu.regs.p.is_set(flags::Z));
    assert!(!cpu.regs.p.is_set(flags::N));
}

#[test]
fn test_undocumented_aax_zeropage() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0x0010, 0xFF);

    let program = [
        0xA9, 0x0F, // LDA #$0F
        0xA2, 0xF0, // LDX #$F0
        0x87, 0x10, // AAX $10
    ];
    setup_program(&mut bus, &mut cpu, &program);

    for _ in 0..3 {
        run_instruction(&mut cpu, &mut bus);
    }

    assert_eq!(bus.peek(0x0010), 0x00, "AAX should store A AND X");
}

#[test]
fn test_undocumented_slo_zeropage() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0x0010, 0x40);

    let program = [
        0xA9, 0x01, // LDA #$01
        0x07, 0x10, // SLO $10
    ];
    setup_program(&mut bus, &mut cpu, &program);

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);

    assert_eq!(bus.peek(0x0010), 0x80, "SLO should shift memory left");
    assert_eq!(cpu.regs.a, 0x81, "SLO should OR result with A");
    assert!(!cpu.regs.p.is_set(flags::C));
    assert!(cpu.regs.p.is_set(flags::N));
}

#[test]
fn test_undocumented_dcp_zeropage() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0x0010, 0x42);

    let program = [
        0xA9, 0x41, // LDA #$41
        0xC7, 0x10, // DCP $10
    ];
    setup_program(&mut bus, &mut cpu, &program);

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);

    assert_eq!(bus.peek(0x0010), 0x41, "DCP should decrement memory");
    assert!(cpu.regs.p.is_set(flags::Z), "Z should be set (A == M)");
    assert!(cpu.regs.p.is_set(flags::C), "C should be set (A >= M)");
}

#[test]
fn test_undocumented_isc_zeropage() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0x0010, 0x41);

    let program = [
        0x38, // SEC
        0xA9, 0x43, // LDA #$43
        0xE7, 0x10, // ISC $10
    ];
    setup_program(&mut bus, &mut cpu, &program);

    for _ in 0..3 {
        run_instruction(&mut cpu, &mut bus);
    }

    assert_eq!(bus.peek(0x0010), 0x42, "ISC should increment memory");
    assert_eq!(cpu.regs.a, 0x01, "ISC should subtract result from A");
    assert!(cpu.regs.p.is_set(flags::C));
}

#[test]
fn test_undocumented_aac_immediate() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    let program = [
        0xA9, 0x80, // LDA #$80
        0x0B, 0xFF, // AAC #$FF
    ];
    setup_program(&mut bus, &mut cpu, &program);

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);

    assert_eq!(cpu.regs.a, 0x80);
    assert!(cpu.regs.p.is_set(flags::N));
    assert!(cpu.regs.p.is_set(flags::C), "C should copy N");
}

#[test]
fn test_undocumented_alr_immediate() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    let program = [
        0xA9, 0xFF, // LDA #$FF
        0x4B, 0x0F, // ALR #$0F
    ];
    setup_program(&mut bus, &mut cpu, &program);

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);

    assert_eq!(cpu.regs.a, 0x07, "ALR should AND then LSR");
    assert!(cpu.regs.p.is_set(flags::C), "bit 0 of $0F");
    assert!(!cpu.regs.p.is_set(flags::N));
}

#[test]
fn test_undocumented_axs_immediate() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    let program = [
        0xA9, 0x0F, // LDA #$0F
        0xA2, 0xF0, // LDX #$F0
        0xCB, 0x00, // AXS #$00
    ];
    setup_program(&mut bus, &mut cpu, &program);

    for _ in 0..3 {
        run_instruction(&mut cpu, &mut bus);
    }

    assert_eq!(cpu.regs.x, 0x00, "AXS should compute (A AND X) - imm");
    assert!(cpu.regs.p.is_set(flags::Z));
    assert!(cpu.regs.p.is_set(flags::C), "no borrow");
}

#[test]
fn test_undocumented_lar_absolute_y() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    bus.write(0x1234, 0x3C);
    cpu.regs.s = 0xF0;

    // LAR $1234,Y with Y=0
    setup_program(&mut bus, &mut cpu, &[0xBB, 0x34, 0x12]);
    run_instruction(&mut cpu, &mut bus);

    assert_eq!(cpu.regs.a, 0x30);
    assert_eq!(cpu.regs.x, 0x30);
    assert_eq!(cpu.regs.s, 0x30);
}

#[test]
fn test_undocumented_nop_lengths() {
    // (program, bytes consumed, cycles)
    let cases: [(&[u8], u16, u64); 4] = [
        (&[0x1A], 1, 2),
        (&[0x80, 0xFF], 2, 2),
        (&[0x04, 0x10], 2, 3),
        (&[0x0C, 0x00, 0x10], 3, 4),
    ];

    for (program, size, cycles) in cases {
        let mut bus = SimpleBus::new();
        let mut cpu = Mos6502::new();
        setup_program(&mut bus, &mut cpu, program);
        run_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.pc(), 0x0200 + size, "opcode ${:02X}", program[0]);
        assert_eq!(cpu.cycles(), cycles, "opcode ${:02X}", program[0]);
        assert_eq!(cpu.regs.a, 0, "no-ops leave A alone");
    }
}

#[test]
fn test_illegal_opcode_faults() {
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::new();

    // $02 is a JAM opcode; $27 (RLA) is not decoded either.
    for opcode in [0x02_u8, 0x27] {
        setup_program(&mut bus, &mut cpu, &[opcode, 0xA9, 0x42]);
        cpu.reset();
        bus.write(0xFFFC, 0x00);
        bus.write(0xFFFD, 0x02);
        for _ in 0..7 {
            cpu.tick(&mut bus).expect("reset sequence");
        }

        let err = try_instruction(&mut cpu, &mut bus).expect_err("should fault");
        assert_eq!(
            err,
            CpuError::IllegalOpcode {
                opcode,
                address: 0x0200
            }
        );
        assert!(cpu.is_halted());

        let pc_before = cpu.pc();
        for _ in 0..10 {
            assert_eq!(cpu.tick(&mut bus), Err(err));
        }
        assert_eq!(cpu.pc(), pc_before, "a jammed CPU does not move");
        assert_ne!(cpu.regs.a, 0x42, "LDA should not have executed");
    }
}
