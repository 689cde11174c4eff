//! 256-bit word arithmetic used by the opcode handlers
//!
//! Unsigned operations wrap modulo 2^256. Signed operations treat words as
//! two's complement. Division and modulo by zero yield zero.

use emerald_primitives::U256;
use primitive_types::U512;

/// Convert to usize, saturating at `usize::MAX`
pub fn as_usize_saturated(value: U256) -> usize {
    if value > U256::from(usize::MAX) {
        usize::MAX
    } else {
        value.as_usize()
    }
}

/// Convert to u64, saturating at `u64::MAX`
pub fn as_u64_saturated(value: U256) -> u64 {
    if value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.low_u64()
    }
}

/// Convert to u64 when it fits
pub fn to_u64(value: U256) -> Option<u64> {
    if value > U256::from(u64::MAX) {
        None
    } else {
        Some(value.low_u64())
    }
}

/// Big-endian 32-byte encoding
pub fn to_be_bytes(value: U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    out
}

/// Number of bytes needed to represent the value
pub fn byte_len(value: U256) -> u64 {
    (value.bits() as u64 + 7) / 8
}

pub fn div(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        U256::zero()
    } else {
        a / b
    }
}

pub fn rem(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        U256::zero()
    } else {
        a % b
    }
}

/// Signed division (two's complement)
pub fn sdiv(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let a_neg = is_negative(a);
    let b_neg = is_negative(b);
    let quotient = abs(a) / abs(b);
    if a_neg != b_neg {
        negate(quotient)
    } else {
        quotient
    }
}

/// Signed modulo, result takes the sign of the dividend
pub fn smod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let remainder = abs(a) % abs(b);
    if is_negative(a) {
        negate(remainder)
    } else {
        remainder
    }
}

/// (a + b) % n without intermediate overflow
pub fn addmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    let sum = U512::from(a) + U512::from(b);
    narrow(sum % U512::from(n))
}

/// (a * b) % n without intermediate overflow
pub fn mulmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    narrow(a.full_mul(b) % U512::from(n))
}

/// base^exponent mod 2^256
pub fn exp(base: U256, exponent: U256) -> U256 {
    base.overflowing_pow(exponent).0
}

/// Sign-extend `x` from byte `b` (0 = least significant byte)
pub fn signextend(b: U256, x: U256) -> U256 {
    if b >= U256::from(31) {
        return x;
    }
    let sign_bit = b.low_u64() as usize * 8 + 7;
    let low_mask = (U256::one() << sign_bit) - U256::one();
    if x.bit(sign_bit) {
        x | !low_mask
    } else {
        x & low_mask
    }
}

/// Byte `i` of `x`, counting from the most significant byte
pub fn byte(i: U256, x: U256) -> U256 {
    if i >= U256::from(32) {
        return U256::zero();
    }
    U256::from(x.byte(31 - i.low_u64() as usize))
}

pub fn shl(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        return U256::zero();
    }
    value << shift.low_u64() as usize
}

/// Logical shift right
pub fn shr(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        return U256::zero();
    }
    value >> shift.low_u64() as usize
}

/// Arithmetic shift right (sign-preserving)
pub fn sar(shift: U256, value: U256) -> U256 {
    let negative = is_negative(value);
    if shift >= U256::from(256) {
        return if negative { U256::MAX } else { U256::zero() };
    }
    let shift = shift.low_u64() as usize;
    if shift == 0 {
        return value;
    }
    let shifted = value >> shift;
    if negative {
        shifted | (U256::MAX << (256 - shift))
    } else {
        shifted
    }
}

/// Signed less than
pub fn slt(a: U256, b: U256) -> bool {
    match (is_negative(a), is_negative(b)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

/// Signed greater than
pub fn sgt(a: U256, b: U256) -> bool {
    slt(b, a)
}

fn is_negative(v: U256) -> bool {
    v.bit(255)
}

/// Two's complement negation
fn negate(v: U256) -> U256 {
    (!v).overflowing_add(U256::one()).0
}

fn abs(v: U256) -> U256 {
    if is_negative(v) {
        negate(v)
    } else {
        v
    }
}

/// Results reduced modulo a 256-bit value always fit
fn narrow(v: U512) -> U256 {
    let mut bytes = [0u8; 64];
    v.to_big_endian(&mut bytes);
    U256::from_big_endian(&bytes[32..])
}
