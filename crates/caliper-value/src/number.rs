use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Pow, Zero};

/// Exponents beyond this are rejected rather than materialized.
const MAX_EXPONENT: i64 = 100_000;

/// Exact-rational number.
///
/// All numeric keyword semantics (`minimum`, `maximum`, `multipleOf`) and
/// number equality are defined over arbitrary-precision rationals, so `10`,
/// `1e1` and `1.0e1` are the same number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Number(BigRational);

impl Number {
    /// Parses JSON numeric text (`-12`, `0.5`, `6.02e23`, ...) exactly.
    pub fn parse(text: &str) -> Option<Number> {
        let (negative, rest) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (mantissa, exponent) = match rest.find(['e', 'E']) {
            Some(at) => (&rest[..at], rest[at + 1..].parse::<i64>().ok()?),
            None => (rest, 0i64),
        };
        if exponent.abs() > MAX_EXPONENT {
            return None;
        }
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let digits: String = [int_part, frac_part].concat();
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let unscaled = BigInt::parse_bytes(digits.as_bytes(), 10)?;
        let scale = exponent - frac_part.len() as i64;
        let mut value = if scale >= 0 {
            BigRational::from_integer(unscaled * pow10(scale as u32))
        } else {
            BigRational::new(unscaled, pow10(scale.unsigned_abs() as u32))
        };
        if negative {
            value = -value;
        }
        Some(Number(value))
    }

    pub fn from_i64(value: i64) -> Number {
        Number(BigRational::from_integer(BigInt::from(value)))
    }

    pub fn from_u64(value: u64) -> Number {
        Number(BigRational::from_integer(BigInt::from(value)))
    }

    /// Converts the exact binary value of a finite float.
    pub fn from_f64(value: f64) -> Option<Number> {
        BigRational::from_float(value).map(Number)
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    /// True when `self / divisor` is an integer. A zero divisor divides
    /// nothing.
    pub fn is_multiple_of(&self, divisor: &Number) -> bool {
        if divisor.0.is_zero() {
            return false;
        }
        (&self.0 / &divisor.0).is_integer()
    }

    pub fn as_ratio(&self) -> &BigRational {
        &self.0
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

fn pow10(exponent: u32) -> BigInt {
    BigInt::from(10u8).pow(exponent)
}
