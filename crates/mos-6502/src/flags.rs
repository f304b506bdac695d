//! Processor status register (P).

/// Carry.
pub const C: u8 = 0x01;

/// Zero.
pub const Z: u8 = 0x02;

/// Interrupt disable - IRQ is ignored while set.
pub const I: u8 = 0x04;

/// Decimal mode for ADC/SBC.
pub const D: u8 = 0x08;

/// Break. Only exists in the byte pushed to the stack: set by BRK/PHP,
/// clear for IRQ/NMI.
pub const B: u8 = 0x10;

/// Unused - always reads as 1.
pub const U: u8 = 0x20;

/// Overflow.
pub const V: u8 = 0x40;

/// Negative (bit 7 of the result).
pub const N: u8 = 0x80;

/// Processor status register.
///
/// The internal copy never carries B; U is always set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    #[must_use]
    pub const fn new() -> Self {
        Self(U)
    }

    /// Status as restored by PLP/RTI: B is dropped, U forced.
    #[must_use]
    pub const fn from_byte(value: u8) -> Self {
        Self((value | U) & !B)
    }

    /// Byte pushed to the stack. `brk` selects the software (BRK/PHP) form.
    #[must_use]
    pub const fn to_pushed(self, brk: bool) -> u8 {
        if brk { self.0 | U | B } else { (self.0 | U) & !B }
    }

    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    pub fn clear(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// N from bit 7, Z from zero.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(N, value & 0x80 != 0);
        self.set_if(Z, value == 0);
    }
}
