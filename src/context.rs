//! Fixed-precision context the rest of the crate normalizes every result
//! through. Modeled on IEEE-754 decimal128: a 34-digit coefficient and an
//! exponent bounded to roughly `[-6143, 6144]`. Neither bound is a
//! web-visible contract of any particular library; they're this
//! implementation's own choice, exercised by its tests.

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{Signed, Zero};

use crate::error::DecimalError;

pub const PRECISION: u32 = 34;
pub const EMAX: i64 = 6144;
pub const EMIN: i64 = -6143;

/// Rounds `coefficient` to `PRECISION` significant digits using
/// round-half-to-even, returning the (possibly shortened) coefficient and
/// the number of trailing digits that were dropped.
fn round_coefficient_half_even(coefficient: &BigInt, drop: u32) -> BigInt {
    if drop == 0 {
        return coefficient.clone();
    }
    let ten_pow = BigInt::from(10u32).pow(drop);
    let (quotient, remainder) = coefficient.div_rem(&ten_pow);
    let twice_remainder = &remainder * 2;
    let remainder_abs = twice_remainder.abs();
    let ten_pow_abs = ten_pow.abs();

    use std::cmp::Ordering;
    let round_up = match remainder_abs.cmp(&ten_pow_abs) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => quotient.is_odd(),
    };

    if round_up {
        if quotient.sign() == Sign::Minus {
            quotient - BigInt::from(1u32)
        } else {
            quotient + BigInt::from(1u32)
        }
    } else {
        quotient
    }
}

fn digit_count(n: &BigInt) -> u32 {
    if n.is_zero() {
        1
    } else {
        n.abs().to_str_radix(10).len() as u32
    }
}

/// Normalizes `(coefficient, exponent)` — where `value = coefficient *
/// 10^-exponent` in `bigdecimal`'s convention — to at most `PRECISION`
/// significant digits (rounding half-even) and checks the result's
/// magnitude against `EMIN`/`EMAX`.
pub fn normalize(coefficient: BigInt, exponent: i64) -> Result<BigDecimal, DecimalError> {
    if coefficient.is_zero() {
        return Ok(BigDecimal::new(BigInt::zero(), 0));
    }

    let mut coefficient = coefficient;
    let mut exponent = exponent;

    let digits = digit_count(&coefficient);
    if digits > PRECISION {
        let drop = digits - PRECISION;
        coefficient = round_coefficient_half_even(&coefficient, drop);
        exponent -= drop as i64;

        // rounding can carry a digit, e.g. 9.99...9 -> 10.00...0
        let new_digits = digit_count(&coefficient);
        if new_digits > PRECISION {
            coefficient = round_coefficient_half_even(&coefficient, 1);
            exponent -= 1;
        }
    }

    if coefficient.is_zero() {
        return Ok(BigDecimal::new(BigInt::zero(), 0));
    }

    // Adjusted exponent: the exponent the value would carry in scientific
    // notation (one digit before the decimal point), decimal128-style.
    let digits = digit_count(&coefficient) as i64;
    let adjusted_exponent = -exponent + digits - 1;
    if adjusted_exponent > EMAX {
        return Err(DecimalError::TooLarge);
    }
    if adjusted_exponent < EMIN {
        return Err(DecimalError::TooSmall);
    }

    Ok(BigDecimal::new(coefficient, exponent))
}

/// Formats `(coefficient, exponent)` as a plain (never scientific) decimal
/// string with no unnecessary trailing zeros, matching the literal grammar
/// DSMAL constants are written in.
pub fn to_plain_string(coefficient: &BigInt, exponent: i64) -> String {
    if coefficient.is_zero() {
        return "0".to_string();
    }

    let negative = coefficient.sign() == Sign::Minus;
    let digits = coefficient.abs().to_str_radix(10);

    let mut body = if exponent <= 0 {
        let zeros = (-exponent) as usize;
        format!("{}{}", digits, "0".repeat(zeros))
    } else {
        let scale = exponent as usize;
        if digits.len() <= scale {
            let zeros = scale - digits.len();
            format!("0.{}{}", "0".repeat(zeros), digits)
        } else {
            let point = digits.len() - scale;
            format!("{}.{}", &digits[..point], &digits[point..])
        }
    };

    if body.contains('.') {
        let trimmed = body.trim_end_matches('0').trim_end_matches('.');
        body = if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        };
    }

    if negative && body != "0" {
        format!("-{}", body)
    } else {
        body
    }
}
