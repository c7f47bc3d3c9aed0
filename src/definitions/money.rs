//! Fixed-point monetary values and the rational rates applied to them.
//!
//! `Money` keeps six fractional digits, the resolution used across the
//! platform for prices, fees and profit-and-loss. Fee schedules that charge
//! a percentage of notional express their rates as exact [`Rational`]
//! multipliers rather than floats so that repeated accumulation stays exact.

use crate::definitions::Quantity;
use num_rational::Ratio;
use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

/// The number of fractional digits carried by every `Money` value.
pub const MONEY_SCALE: u32 = 6;

/// A monetary value with six fractional digits of precision.
///
/// All arithmetic re-normalizes to [`MONEY_SCALE`] digits, so two values
/// that print the same compare equal regardless of how they were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// The zero value.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// One dollar.
    pub const ONE: Money = Money(Decimal::ONE);

    /// One cent.
    pub const CENT: Money = Money(Decimal::from_parts(1, 0, 0, false, 2));

    /// The largest representable value, used as the offer price of a
    /// MARKET bid.
    pub const MAX: Money = Money(Decimal::MAX);

    /// Builds a `Money` from a decimal, rounding half-away-from-zero to
    /// six fractional digits.
    pub fn new(value: Decimal) -> Self {
        Money(value.round_dp_with_strategy(
            MONEY_SCALE,
            RoundingStrategy::MidpointAwayFromZero,
        ))
    }

    /// Builds a `Money` from a whole dollar amount.
    pub fn from_dollars(dollars: i64) -> Self {
        Money(Decimal::from(dollars))
    }

    /// Builds a `Money` from an integer count of cents.
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// The underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// The absolute value.
    pub fn abs(&self) -> Money {
        Money(self.0.abs())
    }

    /// Rounds up to `decimal_places` fractional digits, toward positive
    /// infinity.
    pub fn ceil(&self, decimal_places: u32) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(decimal_places, RoundingStrategy::ToPositiveInfinity),
        )
    }

    /// Whether the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Money::new(Decimal::from_str(s)?))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Mul<Quantity> for Money {
    type Output = Money;

    fn mul(self, rhs: Quantity) -> Money {
        Money::new(self.0 * Decimal::from(rhs))
    }
}

impl Mul<Money> for Quantity {
    type Output = Money;

    fn mul(self, rhs: Money) -> Money {
        rhs * self
    }
}

impl Div<Quantity> for Money {
    type Output = Money;

    fn div(self, rhs: Quantity) -> Money {
        Money::new(self.0 / Decimal::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Decimal::from_str(&text)
            .map(Money::new)
            .map_err(serde::de::Error::custom)
    }
}

/// An exact rational multiplier, used for percent-of-notional fee rates.
///
/// Serialized as a two-element `[numerator, denominator]` array so fee
/// configurations can state rates like `[3, 10000]` without rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational(Ratio<i64>);

impl Rational {
    /// The zero rate.
    pub const ZERO: Rational = Rational(Ratio::new_raw(0, 1));

    /// Builds a rational from a numerator and a non-zero denominator.
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Rational(Ratio::new(numerator, denominator))
    }

    /// The numerator in lowest terms.
    pub fn numerator(&self) -> i64 {
        *self.0.numer()
    }

    /// The denominator in lowest terms.
    pub fn denominator(&self) -> i64 {
        *self.0.denom()
    }
}

impl Default for Rational {
    fn default() -> Self {
        Rational::ZERO
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0.numer(), self.0.denom())
    }
}

impl Mul<Money> for Rational {
    type Output = Money;

    fn mul(self, rhs: Money) -> Money {
        let numerator = Decimal::from(*self.0.numer());
        let denominator = Decimal::from(*self.0.denom());
        Money::new(rhs.as_decimal() * numerator / denominator)
    }
}

impl Mul<Rational> for Money {
    type Output = Money;

    fn mul(self, rhs: Rational) -> Money {
        rhs * self
    }
}

impl ToPrimitive for Rational {
    fn to_i64(&self) -> Option<i64> {
        self.0.to_i64()
    }

    fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }

    fn to_f64(&self) -> Option<f64> {
        self.0.to_f64()
    }
}

impl Serialize for Rational {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        [*self.0.numer(), *self.0.denom()].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Rational {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let [numerator, denominator] = <[i64; 2]>::deserialize(deserializer)?;
        if denominator == 0 {
            return Err(serde::de::Error::custom("rational denominator is zero"));
        }
        Ok(Rational::new(numerator, denominator))
    }
}
