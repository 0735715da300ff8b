//! Numeric tower used by the procedure library: exact integers, exact
//! rationals and floats.
//!
//! Exact arithmetic stays exact. Integer overflow is reported as an error
//! instead of silently degrading to a float, and a rational whose denominator
//! reduces to one is always returned as an [`Number::Integer`].

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("math domain error")]
    Domain,
    #[error("{0:e} is out of integer range")]
    OutOfRange(f64),
}

pub type ArithmeticResult<T> = Result<T, ArithmeticError>;

/// An exact fraction in lowest terms with a positive denominator greater than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    numer: i64,
    denom: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Rational(Rational),
    Float(f64),
}

fn gcd(a: u128, b: u128) -> u128 {
    let mut a = a;
    let mut b = b;
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a.max(1)
}

impl Rational {
    /// Builds the exact quotient `numer / denom`, reduced to lowest terms.
    pub fn reduce(numer: i128, denom: i128) -> ArithmeticResult<Number> {
        if denom == 0 {
            return Err(ArithmeticError::DivisionByZero);
        }
        let sign = if denom < 0 { -1 } else { 1 };
        let g = gcd(numer.unsigned_abs(), denom.unsigned_abs()) as i128;
        let numer = to_i64(sign * numer / g)?;
        let denom = to_i64(sign * denom / g)?;
        if denom == 1 {
            Ok(Number::Integer(numer))
        } else {
            Ok(Number::Rational(Rational { numer, denom }))
        }
    }

    pub fn to_f64(self) -> f64 {
        self.numer as f64 / self.denom as f64
    }

    fn floor(self) -> i64 {
        self.numer.div_euclid(self.denom)
    }

    fn ceil(self) -> i64 {
        // denom > 1, so the value is never integral and the floor is strictly below it
        self.floor() + 1
    }

    fn round_half_even(self) -> i64 {
        let floor = self.floor();
        let twice_remainder = 2 * self.numer.rem_euclid(self.denom) as i128;
        match twice_remainder.cmp(&(self.denom as i128)) {
            Ordering::Less => floor,
            Ordering::Greater => floor + 1,
            Ordering::Equal if floor % 2 == 0 => floor,
            Ordering::Equal => floor + 1,
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numer, self.denom)
    }
}

fn to_i64(n: i128) -> ArithmeticResult<i64> {
    i64::try_from(n).map_err(|_| ArithmeticError::Overflow)
}

fn float_to_integer(n: f64) -> ArithmeticResult<Number> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if n.is_finite() && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Ok(Number::Integer(n as i64))
    } else {
        Err(ArithmeticError::OutOfRange(n))
    }
}

impl Number {
    /// Numerator and denominator of an exact number, `None` for floats.
    fn as_fraction(&self) -> Option<(i128, i128)> {
        match self {
            Number::Integer(n) => Some((*n as i128, 1)),
            Number::Rational(r) => Some((r.numer as i128, r.denom as i128)),
            Number::Float(_) => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Integer(n) => *n as f64,
            Number::Rational(r) => r.to_f64(),
            Number::Float(n) => *n,
        }
    }

    // Applies an exact operation on fractions, or the float fallback when
    // either operand is inexact.
    fn combine(
        self,
        other: Number,
        exact: impl Fn((i128, i128), (i128, i128)) -> ArithmeticResult<Number>,
        inexact: impl Fn(f64, f64) -> ArithmeticResult<f64>,
    ) -> ArithmeticResult<Number> {
        match (self.as_fraction(), other.as_fraction()) {
            (Some(a), Some(b)) => exact(a, b),
            _ => inexact(self.to_f64(), other.to_f64()).map(Number::Float),
        }
    }

    pub fn add(self, other: Number) -> ArithmeticResult<Number> {
        if let (Number::Integer(a), Number::Integer(b)) = (self, other) {
            return a.checked_add(b).map(Number::Integer).ok_or(ArithmeticError::Overflow);
        }
        self.combine(
            other,
            |(an, ad), (bn, bd)| Rational::reduce(an * bd + bn * ad, ad * bd),
            |a, b| Ok(a + b),
        )
    }

    pub fn sub(self, other: Number) -> ArithmeticResult<Number> {
        if let (Number::Integer(a), Number::Integer(b)) = (self, other) {
            return a.checked_sub(b).map(Number::Integer).ok_or(ArithmeticError::Overflow);
        }
        self.combine(
            other,
            |(an, ad), (bn, bd)| Rational::reduce(an * bd - bn * ad, ad * bd),
            |a, b| Ok(a - b),
        )
    }

    pub fn mul(self, other: Number) -> ArithmeticResult<Number> {
        if let (Number::Integer(a), Number::Integer(b)) = (self, other) {
            return a.checked_mul(b).map(Number::Integer).ok_or(ArithmeticError::Overflow);
        }
        self.combine(
            other,
            |(an, ad), (bn, bd)| Rational::reduce(an * bn, ad * bd),
            |a, b| Ok(a * b),
        )
    }

    /// Exact operands give an exact quotient in lowest terms; anything else
    /// divides as floats.
    pub fn div(self, other: Number) -> ArithmeticResult<Number> {
        self.combine(
            other,
            |(an, ad), (bn, bd)| Rational::reduce(an * bd, ad * bn),
            |a, b| {
                if b == 0.0 {
                    Err(ArithmeticError::DivisionByZero)
                } else {
                    Ok(a / b)
                }
            },
        )
    }

    pub fn abs(self) -> ArithmeticResult<Number> {
        match self {
            Number::Integer(n) => n.checked_abs().map(Number::Integer).ok_or(ArithmeticError::Overflow),
            Number::Rational(r) => Rational::reduce((r.numer as i128).abs(), r.denom as i128),
            Number::Float(n) => Ok(Number::Float(n.abs())),
        }
    }

    pub fn sqrt(self) -> ArithmeticResult<Number> {
        let n = self.to_f64();
        if n < 0.0 {
            Err(ArithmeticError::Domain)
        } else {
            Ok(Number::Float(n.sqrt()))
        }
    }

    pub fn floor(self) -> ArithmeticResult<Number> {
        match self {
            Number::Integer(_) => Ok(self),
            Number::Rational(r) => Ok(Number::Integer(r.floor())),
            Number::Float(n) => float_to_integer(n.floor()),
        }
    }

    pub fn ceiling(self) -> ArithmeticResult<Number> {
        match self {
            Number::Integer(_) => Ok(self),
            Number::Rational(r) => Ok(Number::Integer(r.ceil())),
            Number::Float(n) => float_to_integer(n.ceil()),
        }
    }

    /// Rounds to the nearest integer, ties to even.
    pub fn round(self) -> ArithmeticResult<Number> {
        match self {
            Number::Integer(_) => Ok(self),
            Number::Rational(r) => Ok(Number::Integer(r.round_half_even())),
            Number::Float(n) => float_to_integer(n.round_ties_even()),
        }
    }

    /// Numeric ordering. Exact numbers compare exactly; a float on either side
    /// compares as f64. `None` only when a NaN is involved.
    pub fn compare(&self, other: &Number) -> Option<Ordering> {
        match (self.as_fraction(), other.as_fraction()) {
            (Some((an, ad)), Some((bn, bd))) => Some((an * bd).cmp(&(bn * ad))),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{}", n),
            Number::Rational(r) => write!(f, "{}", r),
            Number::Float(n) => write!(f, "{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Number {
        Number::Integer(n)
    }

    fn ratio(numer: i64, denom: i64) -> Number {
        Rational::reduce(numer as i128, denom as i128).expect("valid rational")
    }

    #[test]
    fn test_reduce_normalizes() {
        assert_eq!(ratio(2, 18).to_string(), "1/9");
        assert_eq!(ratio(3, -6).to_string(), "-1/2");
        assert_eq!(ratio(8, 4), int(2));
        assert_eq!(ratio(0, 5), int(0));
        assert_eq!(
            Rational::reduce(1, 0),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn test_exact_division() {
        assert_eq!(int(2).div(int(18)).unwrap().to_string(), "1/9");
        assert_eq!(int(10).div(int(5)).unwrap(), int(2));
        assert_eq!(ratio(1, 9).div(ratio(1, 3)).unwrap().to_string(), "1/3");
        assert_eq!(int(1).div(int(0)), Err(ArithmeticError::DivisionByZero));
    }

    #[test]
    fn test_inexact_division() {
        assert_eq!(Number::Float(8.8).div(Number::Float(2.2)).unwrap(), Number::Float(4.0));
        assert_eq!(int(1).div(Number::Float(4.0)).unwrap(), Number::Float(0.25));
        assert_eq!(
            Number::Float(1.0).div(int(0)),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn test_rational_arithmetic_stays_exact() {
        let third = ratio(1, 3);
        assert_eq!(third.add(third).unwrap().to_string(), "2/3");
        assert_eq!(third.add(ratio(2, 3)).unwrap(), int(1));
        assert_eq!(third.mul(int(3)).unwrap(), int(1));
        assert_eq!(int(1).sub(third).unwrap().to_string(), "2/3");
        assert_eq!(third.add(Number::Float(0.5)).unwrap(), Number::Float(1.0 / 3.0 + 0.5));
    }

    #[test]
    fn test_integer_overflow_is_an_error() {
        assert_eq!(int(i64::MAX).add(int(1)), Err(ArithmeticError::Overflow));
        assert_eq!(int(i64::MIN).abs(), Err(ArithmeticError::Overflow));
        assert_eq!(int(i64::MAX).mul(int(2)), Err(ArithmeticError::Overflow));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(ratio(1, 9).floor().unwrap(), int(0));
        assert_eq!(ratio(1, 9).ceiling().unwrap(), int(1));
        assert_eq!(ratio(-1, 9).floor().unwrap(), int(-1));
        assert_eq!(ratio(-1, 9).ceiling().unwrap(), int(0));
        assert_eq!(ratio(15, 4).round().unwrap(), int(4));
        assert_eq!(ratio(5, 2).round().unwrap(), int(2));
        assert_eq!(ratio(7, 2).round().unwrap(), int(4));
        assert_eq!(ratio(-5, 2).round().unwrap(), int(-2));
        assert_eq!(Number::Float(13.92).floor().unwrap(), int(13));
        assert_eq!(Number::Float(13.92).ceiling().unwrap(), int(14));
        assert_eq!(Number::Float(2.5).round().unwrap(), int(2));
        assert_eq!(int(7).round().unwrap(), int(7));
        assert!(matches!(
            Number::Float(f64::INFINITY).floor(),
            Err(ArithmeticError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_out_of_range_message_is_short() {
        let err = Number::Float(1e300).floor().unwrap_err();
        assert_eq!(err, ArithmeticError::OutOfRange(1e300));
        assert_eq!(err.to_string(), "1e300 is out of integer range");
        assert_eq!(
            Number::Float(f64::NAN).round().unwrap_err().to_string(),
            "NaN is out of integer range"
        );
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(int(16).sqrt().unwrap(), Number::Float(4.0));
        assert_eq!(ratio(1, 4).sqrt().unwrap(), Number::Float(0.5));
        assert_eq!(int(-1).sqrt(), Err(ArithmeticError::Domain));
    }

    #[test]
    fn test_compare_mixed() {
        assert_eq!(ratio(1, 3).compare(&int(0)), Some(Ordering::Greater));
        assert_eq!(ratio(1, 2).compare(&Number::Float(0.5)), Some(Ordering::Equal));
        assert_eq!(int(2).compare(&Number::Float(2.5)), Some(Ordering::Less));
        assert_eq!(ratio(2, 3).compare(&ratio(3, 4)), Some(Ordering::Less));
        assert_eq!(int(1).compare(&Number::Float(f64::NAN)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(int(-12).to_string(), "-12");
        assert_eq!(Number::Float(4.0).to_string(), "4");
        assert_eq!(Number::Float(13.92).to_string(), "13.92");
    }
}
