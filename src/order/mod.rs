//! The order-execution domain: fields, reports, the order aggregate, the
//! driver seam and the submission checks.

mod board_lot;
mod driver;
mod fields;
mod primitive;
mod report;
mod snapshot;

pub use board_lot::{BoardLotCheck, ClosingPriceSource};
pub use driver::{
    CheckedOrderExecutionDriver, MarketDataClient, OrderExecutionDriver, OrderExecutionSession,
    OrderIdAllocator, OrderSubmissionCheck, SequentialOrderIds,
};
pub use fields::{OrderFields, OrderId, OrderInfo, OrderType, Tag, TimeInForce};
pub use primitive::{PrimitiveOrder, ReportHandle, ReportListener};
pub use report::{ExecutionReport, OrderStatus, TEXT_TAG};
pub use snapshot::{AccountOrderRecord, OrderSnapshotPackage, SnapshotError};

use thiserror::Error;

/// Errors raised at the order-submission surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// A submission check rejected the order. The reason is suitable for
    /// display and is copied onto the REJECTED report.
    #[error("{reason}")]
    SubmissionRejected {
        /// Why the order was rejected.
        reason: String,
    },

    /// The order's fields violate a structural invariant.
    #[error("invalid order fields: {reason}")]
    InvalidFields {
        /// Which invariant was violated.
        reason: String,
    },
}
