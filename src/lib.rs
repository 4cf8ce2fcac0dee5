//! Arbitrary-precision decimal arithmetic for the Abysmal toolchain.
//!
//! [`Decimal`] wraps [`bigdecimal::BigDecimal`] behind a fixed working
//! context (34 significant digits, exponent bounds modeled on IEEE-754
//! decimal128) so every arithmetic operation in the compiler and the DSM
//! goes through the same rounding and overflow rules. NaN and infinities
//! have no representation here: they simply don't parse.

pub mod context;
pub mod error;

#[cfg(test)]
mod test;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

pub use error::DecimalError;

#[derive(Clone, Debug)]
pub struct Decimal(BigDecimal);

impl Decimal {
    pub fn zero() -> Decimal {
        Decimal(BigDecimal::from(0))
    }

    pub fn one() -> Decimal {
        Decimal(BigDecimal::from(1))
    }

    fn from_bigdecimal(value: BigDecimal) -> Result<Decimal, DecimalError> {
        let (coefficient, exponent) = value.as_bigint_and_exponent();
        Ok(Decimal(context::normalize(coefficient, exponent)?))
    }

    pub fn from_i64(value: i64) -> Decimal {
        Decimal(BigDecimal::from(value))
    }

    /// `value` must already be plain decimal text (optionally with an
    /// exponent); suffix handling (`%`, `k`, `M`, `B`, ...) is the lexer's
    /// job, not this crate's.
    pub fn parse(value: &str) -> Result<Decimal, DecimalError> {
        let parsed = BigDecimal::from_str(value.trim())
            .map_err(|_| DecimalError::Parse(value.to_string()))?;
        Decimal::from_bigdecimal(parsed)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Truthiness per the language: a decimal is truthy iff it is not zero.
    pub fn is_truthy(&self) -> bool {
        !self.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.sign() == num_bigint::Sign::Minus
    }

    pub fn is_integer(&self) -> bool {
        let (digits, exponent) = self.0.as_bigint_and_exponent();
        if exponent <= 0 {
            return true;
        }
        let ten_pow = BigInt::from(10u32).pow(exponent as u32);
        (&digits % &ten_pow).is_zero()
    }

    fn to_i64_if_integer(&self) -> Option<i64> {
        if !self.is_integer() {
            return None;
        }
        let (digits, exponent) = self.0.as_bigint_and_exponent();
        let value = if exponent <= 0 {
            digits * BigInt::from(10u32).pow((-exponent) as u32)
        } else {
            digits / BigInt::from(10u32).pow(exponent as u32)
        };
        value.to_i64()
    }

    fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    pub fn add(&self, other: &Decimal) -> Result<Decimal, DecimalError> {
        Decimal::from_bigdecimal(&self.0 + &other.0)
    }

    pub fn sub(&self, other: &Decimal) -> Result<Decimal, DecimalError> {
        Decimal::from_bigdecimal(&self.0 - &other.0)
    }

    pub fn mul(&self, other: &Decimal) -> Result<Decimal, DecimalError> {
        Decimal::from_bigdecimal(&self.0 * &other.0)
    }

    pub fn div(&self, other: &Decimal) -> Result<Decimal, DecimalError> {
        if other.is_zero() {
            return Err(DecimalError::DivisionByZero);
        }
        Decimal::from_bigdecimal(&self.0 / &other.0)
    }

    pub fn neg(&self) -> Result<Decimal, DecimalError> {
        Decimal::from_bigdecimal(-&self.0)
    }

    pub fn abs(&self) -> Result<Decimal, DecimalError> {
        Decimal::from_bigdecimal(self.0.abs())
    }

    pub fn ceil(&self) -> Result<Decimal, DecimalError> {
        self.round_to_integer_with(RoundingMode::Ceiling)
    }

    pub fn floor(&self) -> Result<Decimal, DecimalError> {
        self.round_to_integer_with(RoundingMode::Floor)
    }

    /// Round-half-to-even to zero fractional digits. Shared by the `Rd`
    /// opcode and the constant folder's `ROUND()`, so both paths round
    /// identically.
    pub fn round_to_integer(&self) -> Result<Decimal, DecimalError> {
        self.round_to_integer_with(RoundingMode::HalfEven)
    }

    fn round_to_integer_with(&self, mode: RoundingMode) -> Result<Decimal, DecimalError> {
        let rounded = self.0.with_scale_round(0, mode);
        Decimal::from_bigdecimal(rounded)
    }

    pub fn pow(&self, exponent: &Decimal) -> Result<Decimal, DecimalError> {
        if self.is_zero() {
            if exponent.is_negative() {
                return Err(DecimalError::IllegalPower);
            }
            if exponent.is_zero() {
                return Ok(Decimal::one());
            }
            return Ok(Decimal::zero());
        }

        if self.is_negative() && !exponent.is_integer() {
            return Err(DecimalError::IllegalPower);
        }

        if let Some(n) = exponent.to_i64_if_integer() {
            return self.pow_integer(n);
        }

        // Fractional exponent of a positive base: no closed-form exact
        // result exists in general, so this falls back to floating-point
        // evaluation and re-normalizes through the working context.
        let result = self.to_f64().powf(exponent.to_f64());
        if !result.is_finite() {
            return Err(DecimalError::IllegalPower);
        }
        Decimal::parse(&format!("{:e}", result))
    }

    fn pow_integer(&self, exponent: i64) -> Result<Decimal, DecimalError> {
        if exponent == 0 {
            return Ok(Decimal::one());
        }
        let negative = exponent < 0;
        let mut remaining = exponent.unsigned_abs();
        let mut base = self.clone();
        let mut accumulator = Decimal::one();

        while remaining > 0 {
            if remaining & 1 == 1 {
                accumulator = accumulator.mul(&base)?;
            }
            remaining >>= 1;
            if remaining > 0 {
                base = base.mul(&base)?;
            }
        }

        if negative {
            Decimal::one().div(&accumulator)
        } else {
            Ok(accumulator)
        }
    }

    pub fn min(&self, other: &Decimal) -> Decimal {
        if self.0 <= other.0 {
            self.clone()
        } else {
            other.clone()
        }
    }

    pub fn max(&self, other: &Decimal) -> Decimal {
        if self.0 >= other.0 {
            self.clone()
        } else {
            other.clone()
        }
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Decimal) -> bool {
        self.0 == other.0
    }
}
impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Decimal) -> Option<Ordering> {
        Some(self.0.cmp(&other.0))
    }
}
impl Ord for Decimal {
    fn cmp(&self, other: &Decimal) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (coefficient, exponent) = self.0.as_bigint_and_exponent();
        write!(f, "{}", context::to_plain_string(&coefficient, exponent))
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Decimal, DecimalError> {
        Decimal::parse(s)
    }
}
