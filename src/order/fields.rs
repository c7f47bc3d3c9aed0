//! Order types, time-in-force policies and the fields submitted with an
//! order.

use crate::definitions::{Account, CurrencyId, Destination, Money, Quantity, Security, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique order identifier.
pub type OrderId = u64;

/// The execution style of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Execute at no worse than a stated price.
    Limit,
    /// Execute immediately at the prevailing price.
    Market,
    /// A price pegged to a reference quote.
    Pegged,
    /// Becomes active when a stop price is reached.
    Stop,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Pegged => write!(f, "PEGGED"),
            OrderType::Stop => write!(f, "STOP"),
        }
    }
}

/// How long an order remains working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good for the trading day.
    Day,
    /// Good until canceled.
    Gtc,
    /// Immediate or cancel.
    Ioc,
    /// Good through the extended session.
    Gtx,
    /// Good until the stated time.
    Gtd(DateTime<Utc>),
    /// Market on close.
    Moc,
    /// At the opening auction.
    Opg,
    /// Fill or kill.
    Fok,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInForce::Day => write!(f, "DAY"),
            TimeInForce::Gtc => write!(f, "GTC"),
            TimeInForce::Ioc => write!(f, "IOC"),
            TimeInForce::Gtx => write!(f, "GTX"),
            TimeInForce::Gtd(expiry) => write!(f, "GTD({expiry})"),
            TimeInForce::Moc => write!(f, "MOC"),
            TimeInForce::Opg => write!(f, "OPG"),
            TimeInForce::Fok => write!(f, "FOK"),
        }
    }
}

/// A keyed free-form field attached to an order or a report, FIX style.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// The tag number.
    pub key: i32,
    /// The tag value.
    pub value: String,
}

impl Tag {
    /// Builds a tag.
    pub fn new(key: i32, value: impl Into<String>) -> Self {
        Tag {
            key,
            value: value.into(),
        }
    }
}

/// The fields a client supplies when placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFields {
    /// The account the order trades for.
    pub account: Account,
    /// The security being traded.
    pub security: Security,
    /// The currency the order is priced in.
    pub currency: CurrencyId,
    /// The execution style.
    pub order_type: OrderType,
    /// Buy or sell.
    pub side: Side,
    /// Where the order is routed.
    pub destination: Destination,
    /// The number of shares; always positive at submission.
    pub quantity: Quantity,
    /// The limit price; meaningful for LIMIT orders only and zero
    /// otherwise.
    pub price: Money,
    /// How long the order remains working.
    pub time_in_force: TimeInForce,
    /// Venue and platform specific extras.
    pub additional_tags: Vec<Tag>,
}

impl OrderFields {
    /// Builds the fields for a LIMIT order. `price` must be positive and
    /// `quantity` positive.
    #[allow(clippy::too_many_arguments)]
    pub fn limit_order(
        account: Account,
        security: Security,
        currency: CurrencyId,
        side: Side,
        destination: impl Into<Destination>,
        quantity: Quantity,
        price: Money,
    ) -> Self {
        debug_assert!(quantity > 0);
        debug_assert!(price > Money::ZERO);
        OrderFields {
            account,
            security,
            currency,
            order_type: OrderType::Limit,
            side,
            destination: destination.into(),
            quantity,
            price,
            time_in_force: TimeInForce::Day,
            additional_tags: Vec::new(),
        }
    }

    /// Builds the fields for a MARKET order. `quantity` must be positive.
    pub fn market_order(
        account: Account,
        security: Security,
        currency: CurrencyId,
        side: Side,
        destination: impl Into<Destination>,
        quantity: Quantity,
    ) -> Self {
        debug_assert!(quantity > 0);
        OrderFields {
            account,
            security,
            currency,
            order_type: OrderType::Market,
            side,
            destination: destination.into(),
            quantity,
            price: Money::ZERO,
            time_in_force: TimeInForce::Day,
            additional_tags: Vec::new(),
        }
    }

    /// Sets the time-in-force, builder style.
    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = time_in_force;
        self
    }

    /// Adds an additional tag, builder style.
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.additional_tags.push(tag);
        self
    }

    /// Whether an additional tag with the given key and value is present.
    pub fn has_field(&self, tag: &Tag) -> bool {
        self.additional_tags.contains(tag)
    }
}

/// Everything known about an order at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInfo {
    /// The submitted fields.
    pub fields: OrderFields,
    /// The account the submission was made through, which may differ from
    /// the trading account in `fields`.
    pub submission_account: Account,
    /// The order's unique identifier.
    pub order_id: OrderId,
    /// Whether the sale is a short sale.
    pub shorting_flag: bool,
    /// When the order was submitted.
    pub timestamp: DateTime<Utc>,
}

impl OrderInfo {
    /// Builds an `OrderInfo` whose submission account is the trading
    /// account.
    pub fn new(fields: OrderFields, order_id: OrderId, timestamp: DateTime<Utc>) -> Self {
        let submission_account = fields.account.clone();
        OrderInfo {
            fields,
            submission_account,
            order_id,
            shorting_flag: false,
            timestamp,
        }
    }
}
