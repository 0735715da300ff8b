use crate::number::{ArithmeticError, Number};
use crate::token::Token;
use crate::types::Value;
use std::cmp::Ordering;
use std::fmt;

pub type PrimitiveResult = Result<Token, PrimitiveError>;

/// Builtins receive already evaluated arguments and return a classified token.
pub type PrimitiveFunc = fn(&[Value]) -> PrimitiveResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PrimitiveError {
    #[error("expects {expected} arguments, got {found}")]
    Arity { expected: Arity, found: usize },
    #[error("expects a number for argument {position}, got {found}")]
    WrongType { position: usize, found: &'static str },
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

// Checks the number of arguments
macro_rules! check_arity {
    ($args:expr, $expected:expr) => {
        if $args.len() != $expected {
            return Err(PrimitiveError::Arity {
                expected: Arity::Exactly($expected),
                found: $args.len(),
            });
        }
    };
    // Variant for minimum number of args
    ($args:expr, min $expected:expr) => {
        if $args.len() < $expected {
            return Err(PrimitiveError::Arity {
                expected: Arity::AtLeast($expected),
                found: $args.len(),
            });
        }
    };
}

// Extracts every argument as a number, or reports the first one that isn't
fn expect_numbers(args: &[Value]) -> Result<Vec<Number>, PrimitiveError> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            arg.as_token()
                .and_then(Token::as_number)
                .ok_or(PrimitiveError::WrongType {
                    position: i + 1,
                    found: arg.type_name(),
                })
        })
        .collect()
}

fn fold_numbers(
    args: &[Value],
    start: Number,
    func: fn(Number, Number) -> Result<Number, ArithmeticError>,
) -> PrimitiveResult {
    let numbers = expect_numbers(args)?;
    let mut iter = numbers.into_iter();
    // A single argument is returned as is
    let mut acc = iter.next().unwrap_or(start);
    for num in iter {
        acc = func(acc, num)?;
    }
    Ok(Token::from(acc))
}

fn binary_numbers(
    args: &[Value],
    func: fn(Number, Number) -> Result<Number, ArithmeticError>,
) -> PrimitiveResult {
    check_arity!(args, 2);
    let numbers = expect_numbers(args)?;
    Ok(Token::from(func(numbers[0], numbers[1])?))
}

fn unary_number(
    args: &[Value],
    func: fn(Number) -> Result<Number, ArithmeticError>,
) -> PrimitiveResult {
    check_arity!(args, 1);
    let numbers = expect_numbers(args)?;
    Ok(Token::from(func(numbers[0])?))
}

fn compare_numbers(args: &[Value], accept: fn(Ordering) -> bool) -> PrimitiveResult {
    check_arity!(args, 2);
    let numbers = expect_numbers(args)?;
    // NaN compares false under every operator
    let result = numbers[0].compare(&numbers[1]).is_some_and(accept);
    Ok(Token::from(result))
}

// Returns the extreme argument itself, so its exactness is kept
fn select_number(args: &[Value], replace_when: Ordering) -> PrimitiveResult {
    check_arity!(args, min 1);
    let numbers = expect_numbers(args)?;
    let mut best = numbers[0];
    for num in numbers.into_iter().skip(1) {
        if num.compare(&best) == Some(replace_when) {
            best = num;
        }
    }
    Ok(Token::from(best))
}

pub fn prim_add(args: &[Value]) -> PrimitiveResult {
    // (+) -> 0
    // (+ 1 2 3) -> 6
    fold_numbers(args, Number::Integer(0), Number::add)
}

pub fn prim_sub(args: &[Value]) -> PrimitiveResult {
    // (- x y) -> x - y
    binary_numbers(args, Number::sub)
}

pub fn prim_mul(args: &[Value]) -> PrimitiveResult {
    // (*) -> 1
    // (* 1 2 3) -> 6
    fold_numbers(args, Number::Integer(1), Number::mul)
}

pub fn prim_div(args: &[Value]) -> PrimitiveResult {
    // (/ 2 18) -> 1/9
    // (/ 8.8 2.2) -> 4
    binary_numbers(args, Number::div)
}

pub fn prim_equals(args: &[Value]) -> PrimitiveResult {
    compare_numbers(args, |ord| ord == Ordering::Equal)
}

pub fn prim_less_than(args: &[Value]) -> PrimitiveResult {
    compare_numbers(args, |ord| ord == Ordering::Less)
}

pub fn prim_less_than_or_equals(args: &[Value]) -> PrimitiveResult {
    compare_numbers(args, |ord| ord != Ordering::Greater)
}

pub fn prim_greater_than(args: &[Value]) -> PrimitiveResult {
    compare_numbers(args, |ord| ord == Ordering::Greater)
}

pub fn prim_greater_than_or_equals(args: &[Value]) -> PrimitiveResult {
    compare_numbers(args, |ord| ord != Ordering::Less)
}

pub fn prim_sqrt(args: &[Value]) -> PrimitiveResult {
    unary_number(args, Number::sqrt)
}

pub fn prim_floor(args: &[Value]) -> PrimitiveResult {
    unary_number(args, Number::floor)
}

pub fn prim_ceiling(args: &[Value]) -> PrimitiveResult {
    unary_number(args, Number::ceiling)
}

pub fn prim_round(args: &[Value]) -> PrimitiveResult {
    unary_number(args, Number::round)
}

pub fn prim_abs(args: &[Value]) -> PrimitiveResult {
    unary_number(args, Number::abs)
}

pub fn prim_max(args: &[Value]) -> PrimitiveResult {
    select_number(args, Ordering::Greater)
}

pub fn prim_min(args: &[Value]) -> PrimitiveResult {
    select_number(args, Ordering::Less)
}
