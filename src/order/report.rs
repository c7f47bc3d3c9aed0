//! Order statuses and execution reports.

use crate::definitions::{Money, Quantity};
use crate::order::{OrderId, Tag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The FIX tag carrying human-readable report text, used for rejection
/// reasons.
pub const TEXT_TAG: i32 = 58;

/// The state of an order as reported by a venue or synthesized locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Submitted, not yet acknowledged.
    PendingNew,
    /// Acknowledged and working.
    New,
    /// Partially executed, remainder still working.
    PartiallyFilled,
    /// Fully executed.
    Filled,
    /// A cancel request is in flight.
    PendingCancel,
    /// Canceled.
    Canceled,
    /// Rejected at submission.
    Rejected,
    /// Expired by its time-in-force.
    Expired,
    /// Suspended by the venue.
    Suspended,
    /// Stopped by the venue.
    Stopped,
    /// Done for the trading day.
    DoneForDay,
}

impl OrderStatus {
    /// Whether this status ends the order's lifecycle. No report may
    /// follow a terminal one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Canceled
                | OrderStatus::Rejected
                | OrderStatus::Expired
                | OrderStatus::Filled
                | OrderStatus::DoneForDay
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OrderStatus::PendingNew => "PENDING_NEW",
            OrderStatus::New => "NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::PendingCancel => "PENDING_CANCEL",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Expired => "EXPIRED",
            OrderStatus::Suspended => "SUSPENDED",
            OrderStatus::Stopped => "STOPPED",
            OrderStatus::DoneForDay => "DONE_FOR_DAY",
        };
        write!(f, "{text}")
    }
}

/// One event in an order's report stream.
///
/// Reports for a given order are densely sequenced from zero and carry
/// non-decreasing timestamps. A timestamp equal to
/// [`DateTime::<Utc>::MIN_UTC`] means "unset"; administrative updates may
/// leave it unset and have the engine fill in the current time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// The order this report refers to.
    pub id: OrderId,
    /// The report's position in the order's stream.
    pub sequence: u64,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// The order's status after this event.
    pub status: OrderStatus,
    /// Shares executed by this event; zero for non-fill events.
    pub last_quantity: Quantity,
    /// The price of the execution, when `last_quantity` is non-zero.
    pub last_price: Money,
    /// The venue-reported liquidity tag for the execution.
    pub liquidity_flag: String,
    /// The market the execution printed on.
    pub last_market: String,
    /// Marketplace per-fill fee.
    pub execution_fee: Money,
    /// Clearing and regulatory processing fee.
    pub processing_fee: Money,
    /// The platform's commission.
    pub commission: Money,
    /// Venue and platform specific extras.
    pub additional_tags: Vec<Tag>,
}

impl ExecutionReport {
    /// The initial PENDING_NEW report every order starts with, at
    /// sequence zero.
    pub fn initial_report(id: OrderId, timestamp: DateTime<Utc>) -> Self {
        ExecutionReport {
            id,
            sequence: 0,
            timestamp,
            status: OrderStatus::PendingNew,
            last_quantity: 0,
            last_price: Money::ZERO,
            liquidity_flag: String::new(),
            last_market: String::new(),
            execution_fee: Money::ZERO,
            processing_fee: Money::ZERO,
            commission: Money::ZERO,
            additional_tags: Vec::new(),
        }
    }

    /// Clones `previous` into the next report in the stream: the fill
    /// fields (`last_quantity`, `last_price`, `liquidity_flag`) are
    /// zeroed, the sequence is bumped and the status and timestamp are
    /// replaced.
    pub fn build_updated_report(
        previous: &ExecutionReport,
        status: OrderStatus,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut report = previous.clone();
        report.sequence = previous.sequence + 1;
        report.timestamp = timestamp;
        report.status = status;
        report.last_quantity = 0;
        report.last_price = Money::ZERO;
        report.liquidity_flag = String::new();
        report
    }

    /// Whether the timestamp has been set.
    pub fn has_timestamp(&self) -> bool {
        self.timestamp != DateTime::<Utc>::MIN_UTC
    }

    /// Appends human-readable text (a rejection reason, for example) as an
    /// additional tag.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.additional_tags.push(Tag::new(TEXT_TAG, text));
        self
    }

    /// The human-readable text carried by this report, if any.
    pub fn text(&self) -> Option<&str> {
        self.additional_tags
            .iter()
            .find(|tag| tag.key == TEXT_TAG)
            .map(|tag| tag.value.as_str())
    }
}

impl Default for ExecutionReport {
    fn default() -> Self {
        let mut report = ExecutionReport::initial_report(0, DateTime::<Utc>::MIN_UTC);
        report.status = OrderStatus::New;
        report
    }
}
