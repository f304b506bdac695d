//! Operation semantics, independent of timing.
//!
//! Instruction machines decide *when* these run; the functions here only
//! decide what they do to the register file.

use crate::Registers;
use crate::flags::{C, D, I, N, V, Z};

/// Operation on a resolved operand byte.
pub type ReadFn = fn(&mut Registers, u8);
/// Operation that rewrites a memory byte.
pub type ModifyFn = fn(&mut Registers, u8) -> u8;
/// Operation with no operand.
pub type ImpliedFn = fn(&mut Registers);
/// Value a store puts on the bus.
pub type StoreFn = fn(&Registers) -> u8;
/// Branch condition.
pub type ConditionFn = fn(&Registers) -> bool;

// ============================================================================
// Loads and stores
// ============================================================================

pub fn lda(regs: &mut Registers, val: u8) {
    regs.a = val;
    regs.p.update_nz(val);
}

pub fn ldx(regs: &mut Registers, val: u8) {
    regs.x = val;
    regs.p.update_nz(val);
}

pub fn ldy(regs: &mut Registers, val: u8) {
    regs.y = val;
    regs.p.update_nz(val);
}

pub fn sta(regs: &Registers) -> u8 {
    regs.a
}

pub fn stx(regs: &Registers) -> u8 {
    regs.x
}

pub fn sty(regs: &Registers) -> u8 {
    regs.y
}

// ============================================================================
// Logic and arithmetic
// ============================================================================

pub fn ora(regs: &mut Registers, val: u8) {
    regs.a |= val;
    regs.p.update_nz(regs.a);
}

pub fn and(regs: &mut Registers, val: u8) {
    regs.a &= val;
    regs.p.update_nz(regs.a);
}

pub fn eor(regs: &mut Registers, val: u8) {
    regs.a ^= val;
    regs.p.update_nz(regs.a);
}

pub fn adc(regs: &mut Registers, val: u8) {
    if regs.p.is_set(D) {
        adc_decimal(regs, val);
    } else {
        adc_binary(regs, val);
    }
}

fn adc_binary(regs: &mut Registers, val: u8) {
    let a = regs.a;
    let sum = u16::from(a) + u16::from(val) + u16::from(regs.p.is_set(C));
    let result = sum as u8;

    regs.p.set_if(C, sum > 0xFF);
    regs.p.set_if(V, (a ^ result) & (val ^ result) & 0x80 != 0);
    regs.a = result;
    regs.p.update_nz(result);
}

fn adc_decimal(regs: &mut Registers, val: u8) {
    let a = regs.a;
    let carry = u8::from(regs.p.is_set(C));

    let mut lo = (a & 0x0F) + (val & 0x0F) + carry;
    if lo > 9 {
        lo += 6;
    }
    let mut hi = (a >> 4) + (val >> 4) + u8::from(lo > 0x0F);

    // NMOS: Z from the binary sum, N and V from the intermediate high nibble.
    let binary = a.wrapping_add(val).wrapping_add(carry);
    regs.p.set_if(Z, binary == 0);
    regs.p.set_if(N, hi & 0x08 != 0);
    let intermediate = (hi << 4) | (lo & 0x0F);
    regs.p
        .set_if(V, (a ^ intermediate) & !(a ^ val) & 0x80 != 0);

    if hi > 9 {
        hi += 6;
    }
    regs.p.set_if(C, hi > 0x0F);
    regs.a = (hi << 4) | (lo & 0x0F);
}

pub fn sbc(regs: &mut Registers, val: u8) {
    if regs.p.is_set(D) {
        sbc_decimal(regs, val);
    } else {
        adc_binary(regs, !val);
    }
}

fn sbc_decimal(regs: &mut Registers, val: u8) {
    let a = regs.a;
    let borrow = i16::from(!regs.p.is_set(C));

    // Flags come from the binary subtraction on NMOS.
    let binary = i16::from(a) - i16::from(val) - borrow;
    regs.p.set_if(C, binary >= 0);
    regs.p.set_if(Z, (binary as u8) == 0);
    regs.p.set_if(N, binary & 0x80 != 0);
    regs.p.set_if(
        V,
        (i16::from(a) ^ binary) & (i16::from(a) ^ i16::from(val)) & 0x80 != 0,
    );

    let mut lo = i16::from(a & 0x0F) - i16::from(val & 0x0F) - borrow;
    let mut hi = i16::from(a >> 4) - i16::from(val >> 4);
    if lo < 0 {
        lo -= 6;
        hi -= 1;
    }
    if hi < 0 {
        hi -= 6;
    }
    regs.a = ((hi << 4) as u8) | ((lo & 0x0F) as u8);
}

fn compare(regs: &mut Registers, register: u8, val: u8) {
    regs.p.set_if(C, register >= val);
    regs.p.update_nz(register.wrapping_sub(val));
}

pub fn cmp(regs: &mut Registers, val: u8) {
    compare(regs, regs.a, val);
}

pub fn cpx(regs: &mut Registers, val: u8) {
    compare(regs, regs.x, val);
}

pub fn cpy(regs: &mut Registers, val: u8) {
    compare(regs, regs.y, val);
}

pub fn bit(regs: &mut Registers, val: u8) {
    regs.p.set_if(Z, regs.a & val == 0);
    regs.p.set_if(N, val & 0x80 != 0);
    regs.p.set_if(V, val & 0x40 != 0);
}

pub fn nop(_regs: &mut Registers, _val: u8) {}

// ============================================================================
// Shifts, rotates, increments (memory and accumulator forms)
// ============================================================================

pub fn asl(regs: &mut Registers, val: u8) -> u8 {
    regs.p.set_if(C, val & 0x80 != 0);
    let result = val << 1;
    regs.p.update_nz(result);
    result
}

pub fn lsr(regs: &mut Registers, val: u8) -> u8 {
    regs.p.set_if(C, val & 0x01 != 0);
    let result = val >> 1;
    regs.p.update_nz(result);
    result
}

pub fn rol(regs: &mut Registers, val: u8) -> u8 {
    let carry = u8::from(regs.p.is_set(C));
    regs.p.set_if(C, val & 0x80 != 0);
    let result = (val << 1) | carry;
    regs.p.update_nz(result);
    result
}

pub fn ror(regs: &mut Registers, val: u8) -> u8 {
    let carry = if regs.p.is_set(C) { 0x80 } else { 0 };
    regs.p.set_if(C, val & 0x01 != 0);
    let result = (val >> 1) | carry;
    regs.p.update_nz(result);
    result
}

pub fn inc(regs: &mut Registers, val: u8) -> u8 {
    let result = val.wrapping_add(1);
    regs.p.update_nz(result);
    result
}

pub fn dec(regs: &mut Registers, val: u8) -> u8 {
    let result = val.wrapping_sub(1);
    regs.p.update_nz(result);
    result
}

pub fn asl_a(regs: &mut Registers) {
    regs.a = asl(regs, regs.a);
}

pub fn lsr_a(regs: &mut Registers) {
    regs.a = lsr(regs, regs.a);
}

pub fn rol_a(regs: &mut Registers) {
    regs.a = rol(regs, regs.a);
}

pub fn ror_a(regs: &mut Registers) {
    regs.a = ror(regs, regs.a);
}

// ============================================================================
// Implied
// ============================================================================

pub fn clc(regs: &mut Registers) {
    regs.p.clear(C);
}

pub fn sec(regs: &mut Registers) {
    regs.p.set(C);
}

pub fn cli(regs: &mut Registers) {
    regs.p.clear(I);
}

pub fn sei(regs: &mut Registers) {
    regs.p.set(I);
}

pub fn cld(regs: &mut Registers) {
    regs.p.clear(D);
}

pub fn sed(regs: &mut Registers) {
    regs.p.set(D);
}

pub fn clv(regs: &mut Registers) {
    regs.p.clear(V);
}

pub fn tax(regs: &mut Registers) {
    regs.x = regs.a;
    regs.p.update_nz(regs.x);
}

pub fn tay(regs: &mut Registers) {
    regs.y = regs.a;
    regs.p.update_nz(regs.y);
}

pub fn txa(regs: &mut Registers) {
    regs.a = regs.x;
    regs.p.update_nz(regs.a);
}

pub fn tya(regs: &mut Registers) {
    regs.a = regs.y;
    regs.p.update_nz(regs.a);
}

pub fn tsx(regs: &mut Registers) {
    regs.x = regs.s;
    regs.p.update_nz(regs.x);
}

/// No flags.
pub fn txs(regs: &mut Registers) {
    regs.s = regs.x;
}

pub fn inx(regs: &mut Registers) {
    regs.x = regs.x.wrapping_add(1);
    regs.p.update_nz(regs.x);
}

pub fn iny(regs: &mut Registers) {
    regs.y = regs.y.wrapping_add(1);
    regs.p.update_nz(regs.y);
}

pub fn dex(regs: &mut Registers) {
    regs.x = regs.x.wrapping_sub(1);
    regs.p.update_nz(regs.x);
}

pub fn dey(regs: &mut Registers) {
    regs.y = regs.y.wrapping_sub(1);
    regs.p.update_nz(regs.y);
}

pub fn nop_implied(_regs: &mut Registers) {}

// ============================================================================
// Branch conditions
// ============================================================================

pub fn bpl(regs: &Registers) -> bool {
    !regs.p.is_set(N)
}

pub fn bmi(regs: &Registers) -> bool {
    regs.p.is_set(N)
}

pub fn bvc(regs: &Registers) -> bool {
    !regs.p.is_set(V)
}

pub fn bvs(regs: &Registers) -> bool {
    regs.p.is_set(V)
}

pub fn bcc(regs: &Registers) -> bool {
    !regs.p.is_set(C)
}

pub fn bcs(regs: &Registers) -> bool {
    regs.p.is_set(C)
}

pub fn bne(regs: &Registers) -> bool {
    !regs.p.is_set(Z)
}

pub fn beq(regs: &Registers) -> bool {
    regs.p.is_set(Z)
}

// ============================================================================
// Undocumented
// ============================================================================

pub fn lax(regs: &mut Registers, val: u8) {
    regs.a = val;
    regs.x = val;
    regs.p.update_nz(val);
}

pub fn aax(regs: &Registers) -> u8 {
    regs.a & regs.x
}

pub fn alr(regs: &mut Registers, val: u8) {
    let anded = regs.a & val;
    regs.a = lsr(regs, anded);
}

pub fn axs(regs: &mut Registers, val: u8) {
    let anded = regs.a & regs.x;
    regs.p.set_if(C, anded >= val);
    regs.x = anded.wrapping_sub(val);
    regs.p.update_nz(regs.x);
}

pub fn aac(regs: &mut Registers, val: u8) {
    regs.a &= val;
    regs.p.update_nz(regs.a);
    regs.p.set_if(C, regs.a & 0x80 != 0);
}

/// Binary behaviour only; decimal-mode ARR is not modelled.
pub fn arr(regs: &mut Registers, val: u8) {
    let carry = if regs.p.is_set(C) { 0x80 } else { 0 };
    let result = ((regs.a & val) >> 1) | carry;
    regs.a = result;
    regs.p.update_nz(result);
    regs.p.set_if(C, result & 0x40 != 0);
    regs.p.set_if(V, ((result >> 6) ^ (result >> 5)) & 0x01 != 0);
}

pub fn lar(regs: &mut Registers, val: u8) {
    let result = val & regs.s;
    regs.a = result;
    regs.x = result;
    regs.s = result;
    regs.p.update_nz(result);
}

/// The "magic constant" variants seen on some chips are not modelled.
pub fn atx(regs: &mut Registers, val: u8) {
    let result = regs.a & val;
    regs.a = result;
    regs.x = result;
    regs.p.update_nz(result);
}

pub fn dcp(regs: &mut Registers, val: u8) -> u8 {
    let result = val.wrapping_sub(1);
    cmp(regs, result);
    result
}

pub fn isc(regs: &mut Registers, val: u8) -> u8 {
    let result = val.wrapping_add(1);
    sbc(regs, result);
    result
}

pub fn slo(regs: &mut Registers, val: u8) -> u8 {
    let result = asl(regs, val);
    ora(regs, result);
    result
}
