use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------       Money       -----------------------------------------------------------
/// A monetary amount in integer minor units (cents).
///
/// All amounts in the payment core are carried as `Money`. Providers that speak in major units (e.g. TWD, which has
/// no cents on the wire) convert at their own boundary.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a monetary amount: {0}")]
pub struct MoneyConversionError(pub String);

impl Money {
    /// One minor unit. This is the absolute tolerance used by the reconciliation amount check.
    pub const CENT: Money = Money(1);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parses a decimal price string ("102", "102.5", "102.50") into minor units.
    pub fn parse_decimal(price: &str) -> Result<Self, MoneyConversionError> {
        let invalid = || MoneyConversionError(format!("Invalid price value: {price}"));
        let trimmed = price.trim();
        // The sign comes from the string, not the parsed whole part: "-0.99" has a whole part of 0.
        let sign = if trimmed.starts_with('-') { -1 } else { 1 };
        let mut parts = trimmed.split('.');
        let whole_units = parts.next().ok_or_else(invalid)?.parse::<i64>().map_err(|_| invalid())?;
        let cents = match parts.next() {
            None => 0,
            Some(frac) if frac.len() <= 2 => {
                let c = frac.parse::<i64>().map_err(|_| invalid())?;
                if frac.len() == 1 {
                    c * 10
                } else {
                    c
                }
            },
            Some(_) => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        whole_units.checked_mul(100).and_then(|w| w.checked_add(sign * cents)).map(Self).ok_or_else(invalid)
    }

    /// Parses an integer major-unit amount ("102") into minor units. Amounts too large to carry as minor units are
    /// conversion errors; gateway input must never be able to panic the state machine.
    pub fn parse_major(amount: &str) -> Result<Self, MoneyConversionError> {
        let units = amount
            .trim()
            .parse::<i64>()
            .map_err(|e| MoneyConversionError(format!("Invalid major-unit amount: {amount}. {e}")))?;
        units
            .checked_mul(100)
            .map(Self)
            .ok_or_else(|| MoneyConversionError(format!("Major-unit amount is out of range: {amount}")))
    }

    /// The amount as a whole number of major units, truncating any cents.
    pub fn to_major_units(&self) -> i64 {
        self.0 / 100
    }
}

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}
