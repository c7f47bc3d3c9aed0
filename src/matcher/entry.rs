//! Per-order and per-security state held by the internal matcher.

use crate::definitions::{BboQuote, Money, Quantity, Side, offer_comparator};
use crate::order::{OrderFields, OrderId, OrderInfo, OrderType, PrimitiveOrder};
use crate::queue::{FlagCondition, StateQueue};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering as AtomicOrdering};

/// The price an order offers for book ordering and crossing checks: the
/// limit price for LIMIT orders, the strongest possible price for MARKET
/// orders.
pub(crate) fn offer_price(fields: &OrderFields) -> Money {
    if fields.order_type == OrderType::Limit {
        return fields.price;
    }
    match fields.side {
        Side::Ask => Money::ZERO,
        Side::Bid => Money::MAX,
    }
}

/// One order being tracked by the matcher: the client-visible order, its
/// rotating downstream identity and the rendezvous state used to
/// serialize with the downstream driver.
pub(crate) struct OrderEntry {
    /// The submission as the client made it.
    pub info: OrderInfo,
    /// The client-visible order aggregate.
    pub order: Arc<PrimitiveOrder>,
    /// The current downstream order id; rotated when residue is
    /// re-submitted.
    pub driver_order_id: Mutex<Option<OrderId>>,
    /// Set until the first non-PENDING_NEW downstream report arrives.
    pub is_pending_new: AtomicBool,
    /// Set while an internal match rendezvous is in flight against this
    /// entry.
    pub is_matching: AtomicBool,
    /// Shares not yet filled downstream or matched internally.
    pub remaining_quantity: AtomicI64,
    /// Signals the downstream driver has acknowledged the current
    /// downstream order.
    pub is_live: FlagCondition,
    /// Signals the current downstream order reached a terminal state.
    pub is_terminal: FlagCondition,
}

impl OrderEntry {
    pub(crate) fn new(info: OrderInfo) -> Arc<Self> {
        let quantity = info.fields.quantity;
        let order = Arc::new(PrimitiveOrder::new(info.clone()));
        Arc::new(OrderEntry {
            info,
            order,
            driver_order_id: Mutex::new(None),
            is_pending_new: AtomicBool::new(true),
            is_matching: AtomicBool::new(false),
            remaining_quantity: AtomicI64::new(quantity),
            is_live: FlagCondition::new(),
            is_terminal: FlagCondition::new(),
        })
    }

    pub(crate) fn remaining(&self) -> Quantity {
        self.remaining_quantity.load(AtomicOrdering::SeqCst)
    }

    pub(crate) fn offer_price(&self) -> Money {
        offer_price(&self.info.fields)
    }
}

/// The two sides of one security's book. Mutated only from the matcher's
/// submission queue.
#[derive(Default)]
pub(crate) struct Books {
    pub bids: Vec<Arc<OrderEntry>>,
    pub asks: Vec<Arc<OrderEntry>>,
}

impl Books {
    /// The book an order of `side` rests on.
    pub(crate) fn own_side(&mut self, side: Side) -> &mut Vec<Arc<OrderEntry>> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// The book an order of `side` crosses against.
    pub(crate) fn contra_side(&mut self, side: Side) -> &mut Vec<Arc<OrderEntry>> {
        match side {
            Side::Bid => &mut self.asks,
            Side::Ask => &mut self.bids,
        }
    }

    /// Inserts `entry` into its side, keeping the ordering: strongest
    /// offer first, then older submission, then lower order id.
    pub(crate) fn insert(&mut self, entry: Arc<OrderEntry>) {
        let side = entry.info.fields.side;
        let book = self.own_side(side);
        let position = book.partition_point(|resting| {
            match offer_comparator(side, resting.offer_price(), entry.offer_price()) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => {
                    (resting.info.timestamp, resting.info.order_id)
                        <= (entry.info.timestamp, entry.info.order_id)
                }
            }
        });
        book.insert(position, entry);
    }
}

/// The lazily created per-security state: the book and the latched BBO
/// feed.
pub(crate) struct SecurityEntry {
    pub books: Mutex<Books>,
    pub bbo_quotes: Arc<StateQueue<BboQuote>>,
}

impl SecurityEntry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(SecurityEntry {
            books: Mutex::new(Books::default()),
            bbo_quotes: Arc::new(StateQueue::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{Account, CountryCode, CurrencyId, MarketCode, Security};
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn limit_entry(side: Side, price: Money, order_id: OrderId, at_second: i64) -> Arc<OrderEntry> {
        let fields = OrderFields::limit_order(
            Account::new(1, "trader"),
            Security::new("TST", MarketCode::XTSE, CountryCode::CA),
            CurrencyId::CAD,
            side,
            "TSX",
            100,
            price,
        );
        let timestamp = Utc.with_ymd_and_hms(2016, 4, 8, 14, 30, 0).unwrap()
            + Duration::seconds(at_second);
        OrderEntry::new(OrderInfo::new(fields, order_id, timestamp))
    }

    #[test]
    fn test_bids_sort_highest_first() {
        let mut books = Books::default();
        books.insert(limit_entry(Side::Bid, Money::new(dec!(10.00)), 1, 0));
        books.insert(limit_entry(Side::Bid, Money::new(dec!(10.05)), 2, 1));
        books.insert(limit_entry(Side::Bid, Money::new(dec!(9.95)), 3, 2));
        let prices: Vec<Money> = books.bids.iter().map(|e| e.offer_price()).collect();
        assert_eq!(
            prices,
            vec![
                Money::new(dec!(10.05)),
                Money::new(dec!(10.00)),
                Money::new(dec!(9.95))
            ]
        );
    }

    #[test]
    fn test_asks_sort_lowest_first() {
        let mut books = Books::default();
        books.insert(limit_entry(Side::Ask, Money::new(dec!(10.00)), 1, 0));
        books.insert(limit_entry(Side::Ask, Money::new(dec!(9.95)), 2, 1));
        let prices: Vec<Money> = books.asks.iter().map(|e| e.offer_price()).collect();
        assert_eq!(prices, vec![Money::new(dec!(9.95)), Money::new(dec!(10.00))]);
    }

    #[test]
    fn test_equal_prices_keep_time_priority() {
        let mut books = Books::default();
        books.insert(limit_entry(Side::Bid, Money::new(dec!(10.00)), 2, 5));
        books.insert(limit_entry(Side::Bid, Money::new(dec!(10.00)), 1, 0));
        let ids: Vec<OrderId> = books.bids.iter().map(|e| e.info.order_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_equal_times_break_by_order_id() {
        let mut books = Books::default();
        books.insert(limit_entry(Side::Ask, Money::new(dec!(10.00)), 9, 0));
        books.insert(limit_entry(Side::Ask, Money::new(dec!(10.00)), 4, 0));
        let ids: Vec<OrderId> = books.asks.iter().map(|e| e.info.order_id).collect();
        assert_eq!(ids, vec![4, 9]);
    }

    #[test]
    fn test_market_orders_offer_the_strongest_price() {
        let market_bid = OrderFields::market_order(
            Account::new(1, "trader"),
            Security::new("TST", MarketCode::XTSE, CountryCode::CA),
            CurrencyId::CAD,
            Side::Bid,
            "TSX",
            100,
        );
        assert_eq!(offer_price(&market_bid), Money::MAX);
        let mut market_ask = market_bid.clone();
        market_ask.side = Side::Ask;
        assert_eq!(offer_price(&market_ask), Money::ZERO);
    }
}
