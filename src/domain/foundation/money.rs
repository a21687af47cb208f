//! Money value object.
//!
//! All amounts are held as integer minor units (kopecks, cents) so that
//! totals are exact. Conversion to decimal text only happens at the
//! gateway and HTTP boundaries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use super::ValidationError;

/// Minor units per major currency unit.
const MINOR_PER_MAJOR: i64 = 100;

/// Amount of money in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Money = Money(0);

    /// Creates an amount from minor units.
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Creates an amount from whole major units.
    pub const fn from_major(major: i64) -> Self {
        Self(major * MINOR_PER_MAJOR)
    }

    /// Returns the amount in minor units.
    pub fn minor(&self) -> i64 {
        self.0
    }

    /// Multiplies the amount by a quantity.
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * i64::from(quantity))
    }

    /// Returns `percent`% of the amount, rounded half-up to the minor unit.
    pub fn percent(&self, percent: i64) -> Self {
        let scaled = self.0 * percent;
        let rounded = if scaled >= 0 {
            (scaled + 50) / 100
        } else {
            (scaled - 50) / 100
        };
        Self(rounded)
    }

    /// Formats as a decimal string with two fraction digits ("380.00").
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = MINOR_PER_MAJOR as u64;
        format!("{}{}.{:02}", sign, abs / per, abs % per)
    }

    /// Parses a decimal string such as "380", "380.5" or "380.00".
    pub fn parse_decimal(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::invalid_format("amount", format!("'{}' is not a decimal amount", input));
        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() || fraction.len() > 2 {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };
        let minor = whole * MINOR_PER_MAJOR + fraction;
        Ok(Self(if negative { -minor } else { minor }))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}
