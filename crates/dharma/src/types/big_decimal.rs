//! Arbitrary-precision decimal: a `BigInt` integer part plus a fractional
//! digit sequence (most-significant digit first — the opposite digit order
//! from `num_bigint::BigInt`'s own internal little-endian limbs, which stays
//! invisible since this type only ever manipulates its own `Vec<u8>`).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

use super::integer::Integer;

const DIVIDE_PRECISION_CAP: usize = 100;
const SQRT_MAX_ITERATIONS: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigDecimal {
    negative: bool,
    integer: BigInt,
    /// Fractional digits, most-significant first, no trailing zeros once
    /// normalized.
    frac: Vec<u8>,
}

impl BigDecimal {
    pub fn zero() -> Self {
        BigDecimal {
            negative: false,
            integer: BigInt::zero(),
            frac: Vec::new(),
        }
    }

    pub fn from_integer(v: &Integer) -> Self {
        let big = v.to_big();
        let negative = big.is_negative();
        BigDecimal {
            negative,
            integer: big.abs(),
            frac: Vec::new(),
        }
    }

    pub fn from_f64(v: f64) -> Self {
        // `{:.}` formats without an exponent, which `from_str` below expects.
        Self::from_str(&format!("{v}")).unwrap_or_else(|_| Self::zero())
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = match rest.split_once('.') {
            Some((i, f)) => (i, f),
            None => (rest, ""),
        };
        let int_part = if int_part.is_empty() { "0" } else { int_part };
        if !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let integer = BigInt::from_str(int_part).ok()?;
        let frac: Vec<u8> = frac_part.bytes().map(|b| b - b'0').collect();
        let mut value = BigDecimal {
            negative,
            integer,
            frac,
        };
        value.normalize();
        Some(value)
    }

    fn normalize(&mut self) {
        while matches!(self.frac.last(), Some(0)) {
            self.frac.pop();
        }
        if self.integer.is_zero() && self.frac.is_empty() {
            self.negative = false;
        }
    }

    pub fn is_zero(&self) -> bool {
        self.integer.is_zero() && self.frac.is_empty()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn abs(&self) -> Self {
        BigDecimal {
            negative: false,
            integer: self.integer.clone(),
            frac: self.frac.clone(),
        }
    }

    pub fn neg(&self) -> Self {
        let mut out = self.clone();
        if !out.is_zero() {
            out.negative = !out.negative;
        }
        out
    }

    fn frac_to_uint(frac: &[u8]) -> BigInt {
        if frac.is_empty() {
            return BigInt::zero();
        }
        let s: String = frac.iter().map(|d| (d + b'0') as char).collect();
        BigInt::from_str(&s).unwrap_or_else(|_| BigInt::zero())
    }

    fn uint_to_frac(v: &BigInt, len: usize) -> Vec<u8> {
        if len == 0 {
            return Vec::new();
        }
        let s = v.to_string();
        let mut digits = vec![0u8; len.saturating_sub(s.len())];
        digits.extend(s.bytes().map(|b| b - b'0'));
        digits.truncate(len);
        digits
    }

    fn pow10(exp: usize) -> BigInt {
        BigInt::from(10).pow(exp as u32)
    }

    /// Unsigned magnitude scaled by `10^len`, where `len` is at least this
    /// value's own fractional length (shorter fractions are padded with
    /// trailing, i.e. least-significant, zeros).
    fn to_scaled_unsigned(&self, len: usize) -> BigInt {
        debug_assert!(len >= self.frac.len());
        let mut frac = self.frac.clone();
        frac.resize(len, 0);
        &self.integer * Self::pow10(len) + Self::frac_to_uint(&frac)
    }

    fn to_scaled_signed(&self, len: usize) -> BigInt {
        let mag = self.to_scaled_unsigned(len);
        if self.negative { -mag } else { mag }
    }

    fn from_scaled_signed(signed: BigInt, len: usize) -> Self {
        let negative = signed.is_negative();
        let mag = signed.abs();
        let scale = Self::pow10(len);
        let integer = &mag / &scale;
        let frac_val = &mag % &scale;
        let frac = Self::uint_to_frac(&frac_val, len);
        let mut out = BigDecimal {
            negative,
            integer,
            frac,
        };
        out.normalize();
        out
    }

    fn common_len(a: &Self, b: &Self) -> usize {
        a.frac.len().max(b.frac.len())
    }

    pub fn add(a: &Self, b: &Self) -> Self {
        let len = Self::common_len(a, b);
        Self::from_scaled_signed(a.to_scaled_signed(len) + b.to_scaled_signed(len), len)
    }

    pub fn sub(a: &Self, b: &Self) -> Self {
        let len = Self::common_len(a, b);
        Self::from_scaled_signed(a.to_scaled_signed(len) - b.to_scaled_signed(len), len)
    }

    /// Multiplication simply concatenates the operands' fractional lengths;
    /// no common-scale padding is required.
    pub fn mul(a: &Self, b: &Self) -> Self {
        let a_mag = a.to_scaled_unsigned(a.frac.len());
        let b_mag = b.to_scaled_unsigned(b.frac.len());
        let len = a.frac.len() + b.frac.len();
        let negative = a.negative ^ b.negative;
        let mag = a_mag * b_mag;
        let scale = Self::pow10(len);
        let integer = &mag / &scale;
        let frac_val = &mag % &scale;
        let frac = Self::uint_to_frac(&frac_val, len);
        let mut out = BigDecimal {
            negative,
            integer,
            frac,
        };
        out.normalize();
        out
    }

    /// Long division against the scaled integers, producing further
    /// quotient digits until the remainder is zero or `DIVIDE_PRECISION_CAP`
    /// digits have been generated. Returns `None` when `b` is zero.
    pub fn div(a: &Self, b: &Self) -> Option<Self> {
        if b.is_zero() {
            return None;
        }
        let len = Self::common_len(a, b);
        let dividend = a.to_scaled_unsigned(len);
        let divisor = b.to_scaled_unsigned(len);
        let negative = a.negative ^ b.negative;
        let mut integer = &dividend / &divisor;
        let mut remainder = &dividend % &divisor;
        let mut frac = Vec::new();
        while !remainder.is_zero() && frac.len() < DIVIDE_PRECISION_CAP {
            remainder *= 10;
            let digit = &remainder / &divisor;
            frac.push(digit.to_u8().unwrap_or(0));
            remainder %= &divisor;
        }
        if integer.is_zero() {
            integer = BigInt::zero();
        }
        let mut out = BigDecimal {
            negative,
            integer,
            frac,
        };
        out.normalize();
        Some(out)
    }

    /// `a.abs() - b.abs() * trunc(a.abs() / b.abs())`, always non-negative —
    /// preserved faithfully from the source rather than carrying the
    /// dividend's sign (see `DESIGN.md`, Open Question 4).
    pub fn rem(a: &Self, b: &Self) -> Option<Self> {
        if b.is_zero() {
            return None;
        }
        let a_abs = a.abs();
        let b_abs = b.abs();
        let quotient = Self::div(&a_abs, &b_abs)?.truncate_fraction();
        let product = Self::mul(&b_abs, &quotient);
        Some(Self::sub(&a_abs, &product))
    }

    fn truncate_fraction(&self) -> Self {
        let mut out = self.clone();
        out.frac.clear();
        out.normalize();
        out
    }

    /// Truncates to at most `precision` fractional digits.
    pub fn truncate(&self, precision: usize) -> Self {
        let mut out = self.clone();
        if out.frac.len() > precision {
            out.frac.truncate(precision);
        }
        out.normalize();
        out
    }

    fn digit_count(&self) -> usize {
        if self.integer.is_zero() {
            0
        } else {
            self.integer.to_string().len()
        }
    }

    /// Newton's-method square root with the estimate and stopping rule
    /// described in SPEC_FULL §4.1. Returns `None` for a negative operand.
    pub fn sqrt(&self, precision: usize) -> Option<Self> {
        if self.negative {
            return None;
        }
        if self.is_zero() || *self == Self::parse("1").unwrap() {
            return Some(self.clone());
        }
        let digits = self.digit_count();
        let mut x = if digits > 1 {
            Self::from_integer(&Integer::from_big(BigInt::from(10).pow((digits / 2) as u32)))
        } else {
            Self::mul(
                self,
                &Self::from_integer(&Integer::from_big(
                    BigInt::from(10).pow((precision / 2) as u32),
                )),
            )
        };
        let epsilon = Self::epsilon(precision);
        for _ in 0..SQRT_MAX_ITERATIONS {
            let quotient = Self::div(self, &x)?;
            let next = Self::div(&Self::add(&x, &quotient), &Self::from_integer(&Integer::I32(2)))?;
            let diff = Self::sub(&x, &next).abs();
            x = next;
            if Self::cmp_magnitude(&diff, &epsilon) != Ordering::Greater {
                break;
            }
        }
        Some(x.truncate(precision))
    }

    fn epsilon(precision: usize) -> Self {
        if precision == 0 {
            return Self::parse("1").unwrap();
        }
        let mut frac = vec![0u8; precision - 1];
        frac.push(1);
        let mut out = BigDecimal {
            negative: false,
            integer: BigInt::zero(),
            frac,
        };
        out.normalize();
        out
    }

    fn cmp_magnitude(a: &Self, b: &Self) -> Ordering {
        let len = Self::common_len(a, b);
        a.to_scaled_unsigned(len).cmp(&b.to_scaled_unsigned(len))
    }

    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }

    pub fn to_integer(&self) -> Integer {
        let signed = if self.negative {
            -self.integer.clone()
        } else {
            self.integer.clone()
        };
        Integer::from_big(signed)
    }
}

impl PartialOrd for BigDecimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigDecimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = Self::common_len(self, other);
        self.to_scaled_signed(len).cmp(&other.to_scaled_signed(len))
    }
}

impl fmt::Display for BigDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "{}", self.integer)?;
        if !self.frac.is_empty() {
            write!(f, ".")?;
            for d in &self.frac {
                write!(f, "{d}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for BigDecimal {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bd(s: &str) -> BigDecimal {
        BigDecimal::parse(s).unwrap()
    }

    #[test]
    fn parse_and_display_round_trip() {
        assert_eq!(bd("3.14159").to_string(), "3.14159");
        assert_eq!(bd("-123.456").to_string(), "-123.456");
        assert_eq!(bd("1000").to_string(), "1000");
    }

    #[test]
    fn add_and_sub_pad_to_the_wider_fractional_length() {
        assert_eq!(BigDecimal::add(&bd("1.5"), &bd("1.25")).to_string(), "2.75");
        assert_eq!(BigDecimal::sub(&bd("1.5"), &bd("1.25")).to_string(), "0.25");
    }

    #[test]
    fn multiply_concatenates_fractional_lengths() {
        assert_eq!(BigDecimal::mul(&bd("1.5"), &bd("2.25")).to_string(), "3.375");
    }

    #[test]
    fn division_is_none_on_zero_divisor() {
        assert!(BigDecimal::div(&bd("1"), &bd("0")).is_none());
        assert!(BigDecimal::rem(&bd("1"), &bd("0")).is_none());
    }

    #[test]
    fn remainder_is_always_non_negative_regardless_of_dividend_sign() {
        // Preserved faithfully from the source rather than carrying the
        // dividend's sign (DESIGN.md, Open Question 4).
        assert_eq!(BigDecimal::rem(&bd("-7"), &bd("2")).unwrap().to_string(), "1");
        assert_eq!(BigDecimal::rem(&bd("7"), &bd("-2")).unwrap().to_string(), "1");
    }

    #[test]
    fn trailing_fractional_zeros_are_normalized_away() {
        assert_eq!(BigDecimal::add(&bd("1.5"), &bd("1.5")).to_string(), "3");
    }

    #[test]
    fn sqrt_of_a_perfect_square_is_exact() {
        let result = bd("4").sqrt(6).unwrap();
        assert_eq!(result.to_string(), "2");
    }

    #[test]
    fn sqrt_of_negative_is_none() {
        assert!(bd("-1").sqrt(6).is_none());
    }

    #[test]
    fn ordering_respects_sign_and_magnitude() {
        assert!(bd("-1.5") < bd("1.0"));
        assert!(bd("1.5") > bd("1.25"));
    }
}
