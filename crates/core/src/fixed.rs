//! 18-decimal fixed-point arithmetic.
//!
//! Amounts are `u128` values scaled by [`UNIT`], matching the reward
//! token's precision. Proportional allocations use [`mul_div_round`],
//! which keeps a full 256-bit intermediate product so `score * pool`
//! never overflows, and rounds half-up at the smallest unit.

use crate::ArithmeticError;

/// One whole token: 10^18 smallest units.
pub const UNIT: u128 = 1_000_000_000_000_000_000;

const MASK64: u128 = 0xFFFF_FFFF_FFFF_FFFF;

/// Full 128x128 -> 256-bit multiply, returned as (hi, lo) limbs.
fn mul_wide(a: u128, b: u128) -> (u128, u128) {
    let (a_hi, a_lo) = (a >> 64, a & MASK64);
    let (b_hi, b_lo) = (b >> 64, b & MASK64);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let mid = (ll >> 64) + (lh & MASK64) + (hl & MASK64);
    let lo = (mid << 64) | (ll & MASK64);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// Restoring long division of a 256-bit value (hi, lo) by `d`.
///
/// Caller guarantees `hi < d`, so the quotient fits in 128 bits.
fn div_rem_wide(hi: u128, lo: u128, d: u128) -> (u128, u128) {
    let mut rem = hi;
    let mut quot = 0u128;
    for i in (0..128).rev() {
        // The shifted-out top bit of rem is tracked separately; if it is
        // set the 129-bit remainder is necessarily >= d.
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quot |= 1 << i;
        }
    }
    (quot, rem)
}

/// `a * b / d` with round-half-up at the smallest unit.
///
/// The intermediate product is computed in 256 bits. Fails with
/// `Overflow` only if the final quotient exceeds `u128`.
pub fn mul_div_round(a: u128, b: u128, d: u128) -> Result<u128, ArithmeticError> {
    if d == 0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    let (hi, lo) = mul_wide(a, b);
    let (quot, rem) = if hi == 0 {
        (lo / d, lo % d)
    } else {
        if hi >= d {
            return Err(ArithmeticError::Overflow);
        }
        div_rem_wide(hi, lo, d)
    };
    // Round half up: fraction of exactly one half rounds away from zero.
    if rem >= d.div_ceil(2) {
        quot.checked_add(1).ok_or(ArithmeticError::Overflow)
    } else {
        Ok(quot)
    }
}

/// Parse a non-negative decimal string ("130000", "0.9", "12.5") into
/// smallest units. At most 18 fractional digits are accepted.
pub fn parse_units(s: &str) -> Result<u128, ArithmeticError> {
    let s = s.trim();
    let invalid = || ArithmeticError::InvalidDecimal(s.to_string());

    if s.is_empty() || s.starts_with('-') || s.starts_with('+') {
        return Err(invalid());
    }

    let (whole, frac) = match s.split_once('.') {
        Some((_, "")) => return Err(invalid()),
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > 18 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: u128 = whole.parse().map_err(|_| ArithmeticError::Overflow)?;
    let mut frac_units: u128 = 0;
    if !frac.is_empty() {
        // Pad the fraction to 18 digits: "9" -> 900_000_000_000_000_000.
        let parsed: u128 = frac.parse().map_err(|_| ArithmeticError::Overflow)?;
        frac_units = parsed * 10u128.pow(18 - frac.len() as u32);
    }

    whole
        .checked_mul(UNIT)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or(ArithmeticError::Overflow)
}

/// Render smallest units as a canonical decimal string — no exponent
/// notation, trailing fractional zeros trimmed.
pub fn format_units(x: u128) -> String {
    let whole = x / UNIT;
    let frac = x % UNIT;
    if frac == 0 {
        whole.to_string()
    } else {
        let frac = format!("{frac:018}");
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }
}
