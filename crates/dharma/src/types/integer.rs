//! The three-tier fixed/wide/arbitrary-precision integer used by the `integer`
//! dynamic type. Every arithmetic op computes in the widest operand
//! representation and narrows the result to the smallest variant that holds
//! it, except multiplication, which does not renarrow once either operand is
//! already `Big` (see `DESIGN.md`, Open Question 5).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt as NumBigInt;
use num_integer::Integer as _;
use num_traits::{Signed, ToPrimitive, Zero};

pub type BigInt = NumBigInt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integer {
    I32(i32),
    I64(i64),
    Big(BigInt),
}

impl Integer {
    pub fn zero() -> Self {
        Integer::I32(0)
    }

    pub fn from_i32(v: i32) -> Self {
        Integer::I32(v)
    }

    pub fn from_bool(v: bool) -> Self {
        Integer::I32(i32::from(v))
    }

    /// Parses the narrowest tier that represents `s` exactly, trying `i32`
    /// then `i64` then `BigInt`. Used by the lexer when folding a numeric
    /// literal.
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(v) = i32::from_str(s) {
            return Some(Integer::I32(v));
        }
        if let Ok(v) = i64::from_str(s) {
            return Some(Integer::I64(v));
        }
        BigInt::from_str(s).ok().map(Self::narrow_big)
    }

    fn tier(&self) -> u8 {
        match self {
            Integer::I32(_) => 0,
            Integer::I64(_) => 1,
            Integer::Big(_) => 2,
        }
    }

    fn as_i128(&self) -> i128 {
        match self {
            Integer::I32(v) => i128::from(*v),
            Integer::I64(v) => i128::from(*v),
            Integer::Big(_) => unreachable!("as_i128 called on a Big tier value"),
        }
    }

    pub fn to_big(&self) -> BigInt {
        match self {
            Integer::I32(v) => BigInt::from(*v),
            Integer::I64(v) => BigInt::from(*v),
            Integer::Big(v) => v.clone(),
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Integer::I32(v) => f64::from(*v),
            Integer::I64(v) => *v as f64,
            Integer::Big(v) => v.to_f64().unwrap_or(f64::NAN),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Integer::I32(v) => *v == 0,
            Integer::I64(v) => *v == 0,
            Integer::Big(v) => v.is_zero(),
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Integer::I32(v) => *v < 0,
            Integer::I64(v) => *v < 0,
            Integer::Big(v) => v.is_negative(),
        }
    }

    fn narrow_i128(v: i128) -> Self {
        if let Ok(v) = i32::try_from(v) {
            Integer::I32(v)
        } else if let Ok(v) = i64::try_from(v) {
            Integer::I64(v)
        } else {
            Integer::Big(BigInt::from(v))
        }
    }

    /// Public narrowing entry point used by `BigDecimal` truncation to
    /// produce an `Integer` from an arbitrary-precision value.
    pub fn from_big(v: BigInt) -> Self {
        Self::narrow_big(v)
    }

    fn narrow_big(v: BigInt) -> Self {
        if let Some(v) = v.to_i32() {
            Integer::I32(v)
        } else if let Some(v) = v.to_i64() {
            Integer::I64(v)
        } else {
            Integer::Big(v)
        }
    }

    fn both_fixed_width(a: &Self, b: &Self) -> bool {
        a.tier() < 2 && b.tier() < 2
    }

    pub fn neg(&self) -> Self {
        match self {
            Integer::I32(v) => v
                .checked_neg()
                .map(Integer::I32)
                .unwrap_or_else(|| Integer::I64(-i64::from(*v))),
            Integer::I64(v) => v
                .checked_neg()
                .map(Integer::I64)
                .unwrap_or_else(|| Integer::Big(-BigInt::from(*v))),
            Integer::Big(v) => Self::narrow_big(-v),
        }
    }

    pub fn add(a: &Self, b: &Self) -> Self {
        if Self::both_fixed_width(a, b) {
            Self::narrow_i128(a.as_i128() + b.as_i128())
        } else {
            Self::narrow_big(a.to_big() + b.to_big())
        }
    }

    pub fn sub(a: &Self, b: &Self) -> Self {
        if Self::both_fixed_width(a, b) {
            Self::narrow_i128(a.as_i128() - b.as_i128())
        } else {
            Self::narrow_big(a.to_big() - b.to_big())
        }
    }

    /// Multiplication does not narrow back down once either operand is
    /// already `Big`; only a fixed-width * fixed-width product narrows.
    pub fn mul(a: &Self, b: &Self) -> Self {
        if Self::both_fixed_width(a, b) {
            Self::narrow_i128(a.as_i128() * b.as_i128())
        } else {
            Integer::Big(a.to_big() * b.to_big())
        }
    }

    /// Truncating division (toward zero). Returns `None` on division by zero.
    pub fn checked_div(a: &Self, b: &Self) -> Option<Self> {
        if b.is_zero() {
            return None;
        }
        if Self::both_fixed_width(a, b) {
            Some(Self::narrow_i128(a.as_i128() / b.as_i128()))
        } else {
            Some(Self::narrow_big(a.to_big() / b.to_big()))
        }
    }

    /// Remainder, sign of the dividend (Rust/`num-bigint` truncating
    /// semantics). Returns `None` on division by zero.
    pub fn checked_rem(a: &Self, b: &Self) -> Option<Self> {
        if b.is_zero() {
            return None;
        }
        if Self::both_fixed_width(a, b) {
            Some(Self::narrow_i128(a.as_i128() % b.as_i128()))
        } else {
            Some(Self::narrow_big(a.to_big() % b.to_big()))
        }
    }

    pub fn pow(&self, exp: u32) -> Self {
        let mut base = self.to_big();
        let mut exp = exp;
        let mut acc = BigInt::from(1);
        while exp > 0 {
            if exp & 1 == 1 {
                acc *= &base;
            }
            base = &base * &base;
            exp >>= 1;
        }
        Self::narrow_big(acc)
    }

    pub fn gcd(a: &Self, b: &Self) -> Self {
        Self::narrow_big(a.to_big().gcd(&b.to_big()))
    }

    pub fn lcm(a: &Self, b: &Self) -> Self {
        Self::narrow_big(a.to_big().lcm(&b.to_big()))
    }

    pub fn factorial(&self) -> Self {
        let n = self.to_big();
        let mut acc = BigInt::from(1);
        let mut i = BigInt::from(1);
        while i <= n {
            acc *= &i;
            i += 1;
        }
        Self::narrow_big(acc)
    }

    /// Integer square root, truncating. Panics is avoided by the caller
    /// checking `is_negative` first (a `RuntimeError` at the interpreter
    /// layer).
    pub fn isqrt(&self) -> Self {
        Self::narrow_big(self.to_big().sqrt())
    }
}

impl PartialOrd for Integer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Integer {
    fn cmp(&self, other: &Self) -> Ordering {
        if Self::both_fixed_width(self, other) {
            self.as_i128().cmp(&other.as_i128())
        } else {
            self.to_big().cmp(&other.to_big())
        }
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Integer::I32(v) => write!(f, "{v}"),
            Integer::I64(v) => write!(f, "{v}"),
            Integer::Big(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_narrows_back_down_to_i32_when_it_fits() {
        let sum = Integer::add(&Integer::I32(2), &Integer::I32(3));
        assert_eq!(sum, Integer::I32(5));
    }

    #[test]
    fn add_widens_to_i64_on_i32_overflow() {
        let sum = Integer::add(&Integer::I32(i32::MAX), &Integer::I32(1));
        assert_eq!(sum, Integer::I64(i64::from(i32::MAX) + 1));
    }

    #[test]
    fn multiply_does_not_renarrow_once_either_operand_is_big() {
        let big = Integer::Big(BigInt::from(10));
        let product = Integer::mul(&big, &Integer::I32(2));
        assert_eq!(product, Integer::Big(BigInt::from(20)), "multiply must stay Big even though 20 fits in an i32");
    }

    #[test]
    fn add_renarrows_even_from_big_operands() {
        let big = Integer::Big(BigInt::from(10));
        let sum = Integer::add(&big, &Integer::I32(2));
        assert_eq!(sum, Integer::I32(12), "add always narrows, unlike multiply");
    }

    #[test]
    fn division_truncates_toward_zero() {
        let result = Integer::checked_div(&Integer::I32(-7), &Integer::I32(2)).unwrap();
        assert_eq!(result, Integer::I32(-3));
    }

    #[test]
    fn division_by_zero_returns_none() {
        assert!(Integer::checked_div(&Integer::I32(1), &Integer::I32(0)).is_none());
        assert!(Integer::checked_rem(&Integer::I32(1), &Integer::I32(0)).is_none());
    }

    #[test]
    fn parse_picks_the_narrowest_tier_that_fits() {
        assert_eq!(Integer::parse("42"), Some(Integer::I32(42)));
        assert_eq!(Integer::parse("9999999999"), Some(Integer::I64(9_999_999_999)));
        assert!(matches!(Integer::parse("99999999999999999999999999"), Some(Integer::Big(_))));
    }

    #[test]
    fn ordering_works_across_mixed_tiers() {
        let small = Integer::I32(5);
        let huge = Integer::Big(BigInt::from(10).pow(30));
        assert!(small < huge);
    }
}
