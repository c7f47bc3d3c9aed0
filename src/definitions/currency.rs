//! Currencies and exchange-rate conversion.

use crate::definitions::{Money, Rational};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An ISO 4217 alpha-3 currency code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyId([u8; 3]);

impl CurrencyId {
    /// United States dollar.
    pub const USD: CurrencyId = CurrencyId(*b"USD");
    /// Canadian dollar.
    pub const CAD: CurrencyId = CurrencyId(*b"CAD");
    /// Australian dollar.
    pub const AUD: CurrencyId = CurrencyId(*b"AUD");

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for CurrencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CurrencyId {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 {
            return Err(CurrencyError::InvalidCode(s.to_string()));
        }
        Ok(CurrencyId([bytes[0], bytes[1], bytes[2]]))
    }
}

impl Serialize for CurrencyId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CurrencyId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Currency lookup and conversion errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CurrencyError {
    /// Not a three letter code.
    #[error("invalid currency code: {0}")]
    InvalidCode(String),

    /// No rate is listed for the requested pair.
    #[error("no exchange rate from {from} to {to}")]
    MissingRate {
        /// Source currency.
        from: CurrencyId,
        /// Target currency.
        to: CurrencyId,
    },
}

/// The conversion rate between a pair of currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// The currency converted from.
    pub from: CurrencyId,
    /// The currency converted to.
    pub to: CurrencyId,
    /// The multiplier applied to amounts in `from` to express them in `to`.
    pub rate: Rational,
}

impl ExchangeRate {
    /// Builds an exchange rate.
    pub fn new(from: CurrencyId, to: CurrencyId, rate: Rational) -> Self {
        ExchangeRate { from, to, rate }
    }

    /// The inverse rate.
    pub fn invert(&self) -> ExchangeRate {
        ExchangeRate {
            from: self.to,
            to: self.from,
            rate: Rational::new(self.rate.denominator(), self.rate.numerator()),
        }
    }
}

/// A table of exchange rates.
///
/// Listing a rate also lists its inverse. Rates are replaced in place by
/// [`ExchangeRateTable::update`], so a conversion performed after an update
/// sees the new rate.
#[derive(Debug, Clone, Default)]
pub struct ExchangeRateTable {
    rates: HashMap<(CurrencyId, CurrencyId), Rational>,
}

impl ExchangeRateTable {
    /// An empty table.
    pub fn new() -> Self {
        ExchangeRateTable::default()
    }

    /// Builds a table from a list of rates.
    pub fn from_rates(rates: impl IntoIterator<Item = ExchangeRate>) -> Self {
        let mut table = ExchangeRateTable::new();
        for rate in rates {
            table.update(rate);
        }
        table
    }

    /// Adds or replaces a rate and its inverse.
    pub fn update(&mut self, rate: ExchangeRate) {
        self.rates.insert((rate.from, rate.to), rate.rate);
        let inverse = rate.invert();
        self.rates.insert((inverse.from, inverse.to), inverse.rate);
    }

    /// Converts `amount` from one currency to another.
    ///
    /// # Errors
    /// Returns [`CurrencyError::MissingRate`] when the pair is not listed.
    pub fn convert(
        &self,
        amount: Money,
        from: CurrencyId,
        to: CurrencyId,
    ) -> Result<Money, CurrencyError> {
        if from == to {
            return Ok(amount);
        }
        let rate = self
            .rates
            .get(&(from, to))
            .ok_or(CurrencyError::MissingRate { from, to })?;
        Ok(*rate * amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_identity_conversion_needs_no_rate() {
        let table = ExchangeRateTable::new();
        let amount = Money::new(dec!(25));
        assert_eq!(
            table.convert(amount, CurrencyId::CAD, CurrencyId::CAD),
            Ok(amount)
        );
    }

    #[test]
    fn test_conversion_and_inverse() {
        let table = ExchangeRateTable::from_rates([ExchangeRate::new(
            CurrencyId::USD,
            CurrencyId::CAD,
            Rational::new(5, 4),
        )]);
        assert_eq!(
            table.convert(Money::new(dec!(100)), CurrencyId::USD, CurrencyId::CAD),
            Ok(Money::new(dec!(125)))
        );
        assert_eq!(
            table.convert(Money::new(dec!(125)), CurrencyId::CAD, CurrencyId::USD),
            Ok(Money::new(dec!(100)))
        );
    }

    #[test]
    fn test_missing_rate_is_an_error() {
        let table = ExchangeRateTable::new();
        assert_eq!(
            table.convert(Money::ONE, CurrencyId::USD, CurrencyId::AUD),
            Err(CurrencyError::MissingRate {
                from: CurrencyId::USD,
                to: CurrencyId::AUD,
            })
        );
    }

    #[test]
    fn test_update_replaces_rate_in_place() {
        let mut table = ExchangeRateTable::from_rates([ExchangeRate::new(
            CurrencyId::USD,
            CurrencyId::CAD,
            Rational::new(5, 4),
        )]);
        table.update(ExchangeRate::new(
            CurrencyId::USD,
            CurrencyId::CAD,
            Rational::new(4, 3),
        ));
        assert_eq!(
            table.convert(Money::new(dec!(3)), CurrencyId::USD, CurrencyId::CAD),
            Ok(Money::new(dec!(4)))
        );
    }
}
