//! Market sides, quotes and the best-bid-and-offer record.

use crate::definitions::{Money, Quantity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The side of a quote or an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// A buy interest.
    Bid,
    /// A sell interest.
    Ask,
}

impl Side {
    /// The contra side.
    pub fn opposite(&self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "BID"),
            Side::Ask => write!(f, "ASK"),
        }
    }
}

/// Compares two prices by how attractive each is to `side`: a BID prefers
/// lower prices (a lower ask sorts above a higher ask), an ASK prefers
/// higher.
///
/// Returns `Greater` when `p1` is the more attractive price. Each side of
/// a book sorts ascending by this comparison, which puts the strongest
/// offer first, and the internal matcher states its price-cross and
/// no-trade-through guards with it.
pub fn offer_comparator(side: Side, p1: Money, p2: Money) -> Ordering {
    match side {
        Side::Bid => p2.cmp(&p1),
        Side::Ask => p1.cmp(&p2),
    }
}

/// A single side of the market: a price and the size available at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// The side this quote belongs to.
    pub side: Side,
    /// The quoted price.
    pub price: Money,
    /// The size available at `price`.
    pub size: Quantity,
}

impl Quote {
    /// Builds a quote.
    pub fn new(side: Side, price: Money, size: Quantity) -> Self {
        Quote { side, price, size }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} x {})", self.side, self.price, self.size)
    }
}

/// The best bid and ask across all markets for one security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BboQuote {
    /// The best bid.
    pub bid: Quote,
    /// The best ask.
    pub ask: Quote,
    /// The time of the observation.
    pub timestamp: DateTime<Utc>,
}

impl BboQuote {
    /// Builds a BBO quote. The bid quote must carry `Side::Bid` and the
    /// ask quote `Side::Ask`.
    pub fn new(bid: Quote, ask: Quote, timestamp: DateTime<Utc>) -> Self {
        debug_assert_eq!(bid.side, Side::Bid);
        debug_assert_eq!(ask.side, Side::Ask);
        BboQuote {
            bid,
            ask,
            timestamp,
        }
    }
}

impl fmt::Display for BboQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.bid, self.ask, self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn money(value: rust_decimal::Decimal) -> Money {
        Money::new(value)
    }

    #[test]
    fn test_bid_prefers_lower_prices() {
        assert_eq!(
            offer_comparator(Side::Bid, money(dec!(9.95)), money(dec!(10.00))),
            Ordering::Greater
        );
        assert_eq!(
            offer_comparator(Side::Bid, money(dec!(10.00)), money(dec!(10.00))),
            Ordering::Equal
        );
        assert_eq!(
            offer_comparator(Side::Bid, money(dec!(10.05)), money(dec!(10.00))),
            Ordering::Less
        );
    }

    #[test]
    fn test_ask_prefers_higher_prices() {
        assert_eq!(
            offer_comparator(Side::Ask, money(dec!(10.05)), money(dec!(10.00))),
            Ordering::Greater
        );
        assert_eq!(
            offer_comparator(Side::Ask, money(dec!(10.00)), money(dec!(10.05))),
            Ordering::Less
        );
    }

    #[test]
    fn test_book_ordering_puts_best_offer_first() {
        // Bids sorted ascending by the comparison put the highest bid
        // first; asks the lowest ask.
        let mut bids = vec![money(dec!(10.00)), money(dec!(10.05)), money(dec!(9.95))];
        bids.sort_by(|a, b| offer_comparator(Side::Bid, *a, *b));
        assert_eq!(
            bids,
            vec![money(dec!(10.05)), money(dec!(10.00)), money(dec!(9.95))]
        );
        let mut asks = vec![money(dec!(10.00)), money(dec!(10.05)), money(dec!(9.95))];
        asks.sort_by(|a, b| offer_comparator(Side::Ask, *a, *b));
        assert_eq!(
            asks,
            vec![money(dec!(9.95)), money(dec!(10.00)), money(dec!(10.05))]
        );
    }

    #[test]
    fn test_opposite_sides() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
    }
}
