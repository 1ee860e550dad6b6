//! Fixed-point amounts of money.
//!
//! Prices, totals and payment amounts are stored as `numeric(10,2)`. [`Money`] keeps them as an
//! integer number of cents so that values read from the database come back exactly as they were
//! written. On the GraphQL wire a [`Money`] is a JSON number, like the `Float` fields of a typical
//! shop API, but it also accepts decimal strings on input.

use async_graphql::{InputValueError, InputValueResult, Number, Scalar, ScalarType};
use snafu::Snafu;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// An amount of money with two decimal places.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

/// An amount of money could not be parsed or represented.
#[derive(Clone, Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("invalid amount of money {input:?}"))]
    Syntax { input: String },
    #[snafu(display("amount of money {input} is out of range"))]
    OutOfRange { input: String },
}

impl Money {
    pub const ZERO: Self = Self(0);

    /// An amount given as a whole number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// This amount as a whole number of cents.
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Round a floating point amount to the nearest cent.
    pub fn from_f64(x: f64) -> Result<Self, Error> {
        let cents = (x * 100.0).round();
        // i64::MAX is not exactly representable as f64; stay comfortably inside it.
        if !cents.is_finite() || cents.abs() >= 9.0e18 {
            return Err(Error::OutOfRange {
                input: x.to_string(),
            });
        }
        Ok(Self(cents as i64))
    }

    /// This amount as a floating point number.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = Error;

    /// Parse a decimal amount like `1299.99`, `-5` or `0.125`.
    ///
    /// Digits beyond the second decimal place are rounded half away from zero, the way a
    /// `numeric(_, 2)` column rounds its input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let syntax = || Error::Syntax { input: s.into() };
        let out_of_range = || Error::OutOfRange { input: s.into() };

        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if whole.is_empty() && frac.is_empty()
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(syntax());
        }

        let mut cents: i64 = 0;
        for digit in whole.bytes().chain(frac.bytes().chain("00".bytes()).take(2)) {
            cents = cents
                .checked_mul(10)
                .and_then(|c| c.checked_add(i64::from(digit - b'0')))
                .ok_or_else(out_of_range)?;
        }
        if frac.len() > 2 && frac.as_bytes()[2] >= b'5' {
            cents = cents.checked_add(1).ok_or_else(out_of_range)?;
        }
        Ok(Self(if negative { -cents } else { cents }))
    }
}

#[Scalar(name = "Money")]
impl ScalarType for Money {
    fn parse(value: async_graphql::Value) -> InputValueResult<Self> {
        match &value {
            async_graphql::Value::Number(n) => match n.as_i64() {
                Some(units) => units
                    .checked_mul(100)
                    .map(Self)
                    .ok_or_else(|| InputValueError::custom(format!("{n} is out of range"))),
                None => {
                    let x = n
                        .as_f64()
                        .ok_or_else(|| InputValueError::expected_type(value.clone()))?;
                    Self::from_f64(x).map_err(InputValueError::custom)
                }
            },
            async_graphql::Value::String(s) => s.parse().map_err(InputValueError::custom),
            _ => Err(InputValueError::expected_type(value)),
        }
    }

    fn is_valid(value: &async_graphql::Value) -> bool {
        matches!(
            value,
            async_graphql::Value::Number(_) | async_graphql::Value::String(_)
        )
    }

    fn to_value(&self) -> async_graphql::Value {
        Number::from_f64(self.to_f64())
            .map(async_graphql::Value::Number)
            .unwrap_or(async_graphql::Value::Null)
    }
}
