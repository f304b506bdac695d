//! Opcode decode table.
//!
//! Maps every opcode byte to an (operation, addressing mode) pair. The table
//! is assembled by a `const fn`, so an opcode assigned twice aborts
//! compilation instead of surfacing at runtime.

/// What an instruction does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    // Undocumented
    /// Two-byte no-op (reads its operand).
    Dop,
    /// Three-byte no-op (reads its operand).
    Top,
    /// AND then LSR A.
    Alr,
    /// X = (A & X) - operand, no borrow in.
    Axs,
    /// DEC then CMP.
    Dcp,
    /// Load A and X.
    Lax,
    /// AND then ROR A, with odd V/C.
    Arr,
    /// ASL then ORA.
    Slo,
    /// Store A & X.
    Aax,
    /// A = X = S = operand & S.
    Lar,
    /// INC then SBC.
    Isc,
    /// AND, carry from bit 7.
    Aac,
    /// A = X = A & operand.
    Atx,
    /// Opcode with no defined behaviour.
    Invalid,
}

impl Operation {
    /// Lower-case assembler mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Adc => "adc",
            Self::And => "and",
            Self::Asl => "asl",
            Self::Bcc => "bcc",
            Self::Bcs => "bcs",
            Self::Beq => "beq",
            Self::Bit => "bit",
            Self::Bmi => "bmi",
            Self::Bne => "bne",
            Self::Bpl => "bpl",
            Self::Brk => "brk",
            Self::Bvc => "bvc",
            Self::Bvs => "bvs",
            Self::Clc => "clc",
            Self::Cld => "cld",
            Self::Cli => "cli",
            Self::Clv => "clv",
            Self::Cmp => "cmp",
            Self::Cpx => "cpx",
            Self::Cpy => "cpy",
            Self::Dec => "dec",
            Self::Dex => "dex",
            Self::Dey => "dey",
            Self::Eor => "eor",
            Self::Inc => "inc",
            Self::Inx => "inx",
            Self::Iny => "iny",
            Self::Jmp => "jmp",
            Self::Jsr => "jsr",
            Self::Lda => "lda",
            Self::Ldx => "ldx",
            Self::Ldy => "ldy",
            Self::Lsr => "lsr",
            Self::Nop => "nop",
            Self::Ora => "ora",
            Self::Pha => "pha",
            Self::Php => "php",
            Self::Pla => "pla",
            Self::Plp => "plp",
            Self::Rol => "rol",
            Self::Ror => "ror",
            Self::Rti => "rti",
            Self::Rts => "rts",
            Self::Sbc => "sbc",
            Self::Sec => "sec",
            Self::Sed => "sed",
            Self::Sei => "sei",
            Self::Sta => "sta",
            Self::Stx => "stx",
            Self::Sty => "sty",
            Self::Tax => "tax",
            Self::Tay => "tay",
            Self::Tsx => "tsx",
            Self::Txa => "txa",
            Self::Txs => "txs",
            Self::Tya => "tya",
            Self::Dop => "dop",
            Self::Top => "top",
            Self::Alr => "alr",
            Self::Axs => "axs",
            Self::Dcp => "dcp",
            Self::Lax => "lax",
            Self::Arr => "arr",
            Self::Slo => "slo",
            Self::Aax => "aax",
            Self::Lar => "lar",
            Self::Isc => "isc",
            Self::Aac => "aac",
            Self::Atx => "atx",
            Self::Invalid => "???",
        }
    }
}

/// How an instruction finds its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// No operand, or the accumulator.
    Implied,
    Immediate,
    ZeroPage,
    Absolute,
    /// JMP ($nnnn).
    Indirect,
    /// Signed branch displacement.
    Relative,
    ZeroPageX,
    AbsoluteX,
    /// ($nn,X)
    IndexedIndirectX,
    ZeroPageY,
    AbsoluteY,
    /// ($nn),Y
    IndirectIndexedY,
    Invalid,
}

impl AddressingMode {
    /// Operand bytes following the opcode.
    #[must_use]
    pub const fn operand_bytes(self) -> u8 {
        match self {
            Self::Immediate
            | Self::ZeroPage
            | Self::ZeroPageX
            | Self::ZeroPageY
            | Self::IndexedIndirectX
            | Self::IndirectIndexedY
            | Self::Relative => 1,
            Self::Absolute | Self::AbsoluteX | Self::AbsoluteY | Self::Indirect => 2,
            Self::Implied | Self::Invalid => 0,
        }
    }
}

/// One decode table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub operation: Operation,
    pub mode: AddressingMode,
}

impl Instruction {
    pub const INVALID: Self = Self::new(Operation::Invalid, AddressingMode::Invalid);

    #[must_use]
    pub const fn new(operation: Operation, mode: AddressingMode) -> Self {
        Self { operation, mode }
    }

    /// Instruction length in bytes, opcode included.
    #[must_use]
    pub const fn size(self) -> u8 {
        1 + self.mode.operand_bytes()
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self.operation, Operation::Invalid)
    }
}

/// The full decode table.
pub static OPCODES: [Instruction; 256] = build_table();

/// Decode an opcode byte.
#[must_use]
pub fn lookup(opcode: u8) -> Instruction {
    OPCODES[opcode as usize]
}

const fn set(table: &mut [Instruction; 256], opcode: u8, operation: Operation, mode: AddressingMode) {
    assert!(
        !table[opcode as usize].is_valid(),
        "opcode assigned twice in decode table"
    );
    table[opcode as usize] = Instruction::new(operation, mode);
}

const fn build_table() -> [Instruction; 256] {
    use AddressingMode::{
        Absolute, AbsoluteX, AbsoluteY, Immediate, Implied, IndexedIndirectX, Indirect,
        IndirectIndexedY, Relative, ZeroPage, ZeroPageX, ZeroPageY,
    };
    use Operation::{
        Aac, Aax, Adc, Alr, And, Arr, Asl, Atx, Axs, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc,
        Bvs, Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dcp, Dec, Dex, Dey, Dop, Eor, Inc, Inx, Iny, Isc,
        Jmp, Jsr, Lar, Lax, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti, Rts,
        Sbc, Sec, Sed, Sei, Slo, Sta, Stx, Sty, Tax, Tay, Top, Tsx, Txa, Txs, Tya,
    };

    let mut t = [Instruction::INVALID; 256];

    // The ALU group decodes as aaabbb01: operation in bits 5-7, mode in 2-4.
    let group = [Ora, And, Eor, Adc, Sta, Lda, Cmp, Sbc];
    let modes = [
        IndexedIndirectX,
        ZeroPage,
        Immediate,
        Absolute,
        IndirectIndexedY,
        ZeroPageX,
        AbsoluteY,
        AbsoluteX,
    ];
    let mut i = 0;
    while i < group.len() {
        let mut j = 0;
        while j < modes.len() {
            // STA #imm does not exist (that slot is the $89 no-op).
            if !(matches!(group[i], Sta) && matches!(modes[j], Immediate)) {
                set(&mut t, ((i << 5) | (j << 2) | 1) as u8, group[i], modes[j]);
            }
            j += 1;
        }
        i += 1;
    }

    set(&mut t, 0x06, Asl, ZeroPage);
    set(&mut t, 0x0A, Asl, Implied);
    set(&mut t, 0x0E, Asl, Absolute);
    set(&mut t, 0x16, Asl, ZeroPageX);
    set(&mut t, 0x1E, Asl, AbsoluteX);

    set(&mut t, 0x26, Rol, ZeroPage);
    set(&mut t, 0x2A, Rol, Implied);
    set(&mut t, 0x2E, Rol, Absolute);
    set(&mut t, 0x36, Rol, ZeroPageX);
    set(&mut t, 0x3E, Rol, AbsoluteX);

    set(&mut t, 0x46, Lsr, ZeroPage);
    set(&mut t, 0x4A, Lsr, Implied);
    set(&mut t, 0x4E, Lsr, Absolute);
    set(&mut t, 0x56, Lsr, ZeroPageX);
    set(&mut t, 0x5E, Lsr, AbsoluteX);

    set(&mut t, 0x66, Ror, ZeroPage);
    set(&mut t, 0x6A, Ror, Implied);
    set(&mut t, 0x6E, Ror, Absolute);
    set(&mut t, 0x76, Ror, ZeroPageX);
    set(&mut t, 0x7E, Ror, AbsoluteX);

    set(&mut t, 0x86, Stx, ZeroPage);
    set(&mut t, 0x8E, Stx, Absolute);
    set(&mut t, 0x96, Stx, ZeroPageY);

    set(&mut t, 0xA2, Ldx, Immediate);
    set(&mut t, 0xA6, Ldx, ZeroPage);
    set(&mut t, 0xAE, Ldx, Absolute);
    set(&mut t, 0xB6, Ldx, ZeroPageY);
    set(&mut t, 0xBE, Ldx, AbsoluteY);

    set(&mut t, 0xC6, Dec, ZeroPage);
    set(&mut t, 0xCE, Dec, Absolute);
    set(&mut t, 0xD6, Dec, ZeroPageX);
    set(&mut t, 0xDE, Dec, AbsoluteX);

    set(&mut t, 0xE6, Inc, ZeroPage);
    set(&mut t, 0xEE, Inc, Absolute);
    set(&mut t, 0xF6, Inc, ZeroPageX);
    set(&mut t, 0xFE, Inc, AbsoluteX);

    set(&mut t, 0x24, Bit, ZeroPage);
    set(&mut t, 0x2C, Bit, Absolute);

    set(&mut t, 0x4C, Jmp, Absolute);
    set(&mut t, 0x6C, Jmp, Indirect);

    set(&mut t, 0x84, Sty, ZeroPage);
    set(&mut t, 0x8C, Sty, Absolute);
    set(&mut t, 0x94, Sty, ZeroPageX);

    set(&mut t, 0xA0, Ldy, Immediate);
    set(&mut t, 0xA4, Ldy, ZeroPage);
    set(&mut t, 0xAC, Ldy, Absolute);
    set(&mut t, 0xB4, Ldy, ZeroPageX);
    set(&mut t, 0xBC, Ldy, AbsoluteX);

    set(&mut t, 0xC0, Cpy, Immediate);
    set(&mut t, 0xC4, Cpy, ZeroPage);
    set(&mut t, 0xCC, Cpy, Absolute);

    set(&mut t, 0xE0, Cpx, Immediate);
    set(&mut t, 0xE4, Cpx, ZeroPage);
    set(&mut t, 0xEC, Cpx, Absolute);

    set(&mut t, 0x10, Bpl, Relative);
    set(&mut t, 0x30, Bmi, Relative);
    set(&mut t, 0x50, Bvc, Relative);
    set(&mut t, 0x70, Bvs, Relative);
    set(&mut t, 0x90, Bcc, Relative);
    set(&mut t, 0xB0, Bcs, Relative);
    set(&mut t, 0xD0, Bne, Relative);
    set(&mut t, 0xF0, Beq, Relative);

    set(&mut t, 0x00, Brk, Implied);
    // JSR fetches its target inline, so it is listed as absolute.
    set(&mut t, 0x20, Jsr, Absolute);
    set(&mut t, 0x40, Rti, Implied);
    set(&mut t, 0x60, Rts, Implied);
    set(&mut t, 0x08, Php, Implied);
    set(&mut t, 0x28, Plp, Implied);
    set(&mut t, 0x48, Pha, Implied);
    set(&mut t, 0x68, Pla, Implied);
    set(&mut t, 0x88, Dey, Implied);
    set(&mut t, 0xA8, Tay, Implied);
    set(&mut t, 0xC8, Iny, Implied);
    set(&mut t, 0xE8, Inx, Implied);
    set(&mut t, 0x18, Clc, Implied);
    set(&mut t, 0x38, Sec, Implied);
    set(&mut t, 0x58, Cli, Implied);
    set(&mut t, 0x78, Sei, Implied);
    set(&mut t, 0x98, Tya, Implied);
    set(&mut t, 0xB8, Clv, Implied);
    set(&mut t, 0xD8, Cld, Implied);
    set(&mut t, 0xF8, Sed, Implied);
    set(&mut t, 0x8A, Txa, Implied);
    set(&mut t, 0x9A, Txs, Implied);
    set(&mut t, 0xAA, Tax, Implied);
    set(&mut t, 0xBA, Tsx, Implied);
    set(&mut t, 0xCA, Dex, Implied);
    set(&mut t, 0xEA, Nop, Implied);

    // Undocumented
    set(&mut t, 0x1A, Nop, Implied);
    set(&mut t, 0x3A, Nop, Implied);
    set(&mut t, 0x5A, Nop, Implied);
    set(&mut t, 0x7A, Nop, Implied);
    set(&mut t, 0xDA, Nop, Implied);
    set(&mut t, 0xFA, Nop, Implied);

    set(&mut t, 0x04, Dop, ZeroPage);
    set(&mut t, 0x14, Dop, ZeroPageX);
    set(&mut t, 0x34, Dop, ZeroPageX);
    set(&mut t, 0x44, Dop, ZeroPage);
    set(&mut t, 0x54, Dop, ZeroPageX);
    set(&mut t, 0x64, Dop, ZeroPage);
    set(&mut t, 0x74, Dop, ZeroPageX);
    set(&mut t, 0x80, Dop, Immediate);
    set(&mut t, 0x82, Dop, Immediate);
    set(&mut t, 0x89, Dop, Immediate);
    set(&mut t, 0xC2, Dop, Immediate);
    set(&mut t, 0xD4, Dop, ZeroPageX);
    set(&mut t, 0xE2, Dop, Immediate);
    set(&mut t, 0xF4, Dop, ZeroPageX);

    set(&mut t, 0x0C, Top, Absolute);
    set(&mut t, 0x1C, Top, AbsoluteX);
    set(&mut t, 0x3C, Top, AbsoluteX);
    set(&mut t, 0x5C, Top, AbsoluteX);
    set(&mut t, 0x7C, Top, AbsoluteX);
    set(&mut t, 0xDC, Top, AbsoluteX);
    set(&mut t, 0xFC, Top, AbsoluteX);

    set(&mut t, 0xEB, Sbc, Immediate);

    set(&mut t, 0x4B, Alr, Immediate);

    set(&mut t, 0xCB, Axs, Immediate);

    set(&mut t, 0xC7, Dcp, ZeroPage);
    set(&mut t, 0xD7, Dcp, ZeroPageX);
    set(&mut t, 0xCF, Dcp, Absolute);
    set(&mut t, 0xDF, Dcp, AbsoluteX);
    set(&mut t, 0xDB, Dcp, AbsoluteY);
    set(&mut t, 0xC3, Dcp, IndexedIndirectX);
    set(&mut t, 0xD3, Dcp, IndirectIndexedY);

    set(&mut t, 0xA7, Lax, ZeroPage);
    set(&mut t, 0xB7, Lax, ZeroPageY);
    set(&mut t, 0xAF, Lax, Absolute);
    set(&mut t, 0xBF, Lax, AbsoluteY);
    set(&mut t, 0xA3, Lax, IndexedIndirectX);
    set(&mut t, 0xB3, Lax, IndirectIndexedY);

    set(&mut t, 0x6B, Arr, Immediate);

    set(&mut t, 0x07, Slo, ZeroPage);
    set(&mut t, 0x17, Slo, ZeroPageX);
    set(&mut t, 0x0F, Slo, Absolute);
    set(&mut t, 0x1F, Slo, AbsoluteX);
    set(&mut t, 0x1B, Slo, AbsoluteY);
    set(&mut t, 0x03, Slo, IndexedIndirectX);
    set(&mut t, 0x13, Slo, IndirectIndexedY);

    set(&mut t, 0x87, Aax, ZeroPage);
    set(&mut t, 0x97, Aax, ZeroPageY);
    set(&mut t, 0x83, Aax, IndexedIndirectX);
    set(&mut t, 0x8F, Aax, Absolute);

    set(&mut t, 0xBB, Lar, AbsoluteY);

    set(&mut t, 0xE7, Isc, ZeroPage);
    set(&mut t, 0xF7, Isc, ZeroPageX);
    set(&mut t, 0xEF, Isc, Absolute);
    set(&mut t, 0xFF, Isc, AbsoluteX);
    set(&mut t, 0xFB, Isc, AbsoluteY);
    set(&mut t, 0xE3, Isc, IndexedIndirectX);
    set(&mut t, 0xF3, Isc, IndirectIndexedY);

    set(&mut t, 0x0B, Aac, Immediate);
    set(&mut t, 0x2B, Aac, Immediate);

    set(&mut t, 0xAB, Atx, Immediate);

    t
}
