use core::{fmt, iter, ops};

/// A numeric literal or the result of arithmetic on one.
///
/// Integer arithmetic stays integral until it overflows or meets a float,
/// at which point the result is promoted to a float.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    /// Classifies an atom: integer first, then float. Non-finite spellings
    /// such as `inf` or `nan` are not numbers in snek.
    pub fn from_literal(literal: &str) -> Option<Self> {
        if let Ok(integer) = literal.parse::<i64>() {
            return Some(Self::Integer(integer));
        }

        match literal.parse::<f64>() {
            Ok(float) if float.is_finite() => Some(Self::Float(float)),
            _ => None,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(integer) => integer as f64,
            Self::Float(float) => float,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Self::Integer(integer) => integer == 0,
            Self::Float(float) => float == 0.0,
        }
    }

    /// Division that stays integral when it is exact. Returns `None` when
    /// the divisor is zero.
    pub fn checked_div(self, divisor: Self) -> Option<Self> {
        if divisor.is_zero() {
            return None;
        }

        Some(match (self, divisor) {
            (Self::Integer(a), Self::Integer(b)) => match (a.checked_rem(b), a.checked_div(b)) {
                (Some(0), Some(quotient)) => Self::Integer(quotient),
                _ => Self::Float(a as f64 / b as f64),
            },
            (a, b) => Self::Float(a.as_f64() / b.as_f64()),
        })
    }

    fn integral_or_float(
        self,
        other: Self,
        integral: impl Fn(i64, i64) -> Option<i64>,
        float: impl Fn(f64, f64) -> f64,
    ) -> Self {
        if let (Self::Integer(a), Self::Integer(b)) = (self, other) {
            if let Some(result) = integral(a, b) {
                return Self::Integer(result);
            }
        }
        Self::Float(float(self.as_f64(), other.as_f64()))
    }
}

impl ops::Add for Number {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.integral_or_float(other, i64::checked_add, |a, b| a + b)
    }
}

impl ops::Sub for Number {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.integral_or_float(other, i64::checked_sub, |a, b| a - b)
    }
}

impl ops::Mul for Number {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        self.integral_or_float(other, i64::checked_mul, |a, b| a * b)
    }
}

impl ops::Neg for Number {
    type Output = Self;

    fn neg(self) -> Self {
        match self {
            Self::Integer(integer) => integer
                .checked_neg()
                .map_or(Self::Float(-(integer as f64)), Self::Integer),
            Self::Float(float) => Self::Float(-float),
        }
    }
}

impl iter::Sum for Number {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::Integer(0), |a, b| a + b)
    }
}

impl iter::Product for Number {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::Integer(1), |a, b| a * b)
    }
}

// Integers and floats compare by numeric value, so `2 == 2.0`.
impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(integer) => write!(f, "{}", integer),
            Self::Float(float) => write!(f, "{:?}", float),
        }
    }
}
