//! The shared domain model: money, quotes, securities, currencies,
//! destinations and accounts.

mod currency;
mod destination;
mod money;
mod quote;
mod security;

pub use currency::{CurrencyError, CurrencyId, ExchangeRate, ExchangeRateTable};
pub use destination::{Destination, DestinationDatabase, DestinationEntry, destinations};
pub use money::{MONEY_SCALE, Money, Rational};
pub use quote::{BboQuote, Quote, Side, offer_comparator};
pub use security::{
    CountryCode, MarketCode, MarketDatabase, MarketEntry, ParseSecurityError, Security,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A signed count of shares.
pub type Quantity = i64;

/// A trading account: the unit positions, orders and risk parameters are
/// keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    /// The account's unique identifier.
    pub id: u64,
    /// The account's name.
    pub name: String,
}

impl Account {
    /// Builds an account.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Account {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.name)
    }
}
