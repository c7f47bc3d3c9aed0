//! The order-execution driver seam and the submission-check wrapper.

use crate::definitions::{Account, BboQuote, Security};
use crate::order::{
    AccountOrderRecord, ExecutionReport, OrderError, OrderId, OrderInfo, OrderStatus,
    PrimitiveOrder,
};
use crate::queue::QueueWriter;
use crate::utils::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// The session an operation is performed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderExecutionSession {
    /// The account the session is authenticated as.
    pub account: Account,
}

impl OrderExecutionSession {
    /// Builds a session for an account.
    pub fn new(account: Account) -> Self {
        OrderExecutionSession { account }
    }
}

/// Drives order submissions to a venue, real or simulated.
///
/// `submit` never fails synchronously: rejections are reported through the
/// returned order's report stream, and the initial PENDING_NEW report is
/// observable before `submit` returns. `cancel` and `update` are
/// fire-and-forget; their effects are visible only through reports.
pub trait OrderExecutionDriver: Send + Sync {
    /// Submits an order, returning the observable order aggregate.
    fn submit(&self, info: OrderInfo) -> Arc<PrimitiveOrder>;

    /// Requests cancellation of a previously submitted order.
    fn cancel(&self, session: &OrderExecutionSession, order_id: OrderId);

    /// Applies an administrative update to a previously submitted order.
    fn update(
        &self,
        session: &OrderExecutionSession,
        order_id: OrderId,
        report: ExecutionReport,
    );

    /// Re-establishes an order from persisted state without re-publishing
    /// its history.
    fn recover(&self, record: &AccountOrderRecord) -> Arc<PrimitiveOrder>;
}

impl<D: OrderExecutionDriver + ?Sized> OrderExecutionDriver for Arc<D> {
    fn submit(&self, info: OrderInfo) -> Arc<PrimitiveOrder> {
        (**self).submit(info)
    }

    fn cancel(&self, session: &OrderExecutionSession, order_id: OrderId) {
        (**self).cancel(session, order_id);
    }

    fn update(
        &self,
        session: &OrderExecutionSession,
        order_id: OrderId,
        report: ExecutionReport,
    ) {
        (**self).update(session, order_id, report);
    }

    fn recover(&self, record: &AccountOrderRecord) -> Arc<PrimitiveOrder> {
        (**self).recover(record)
    }
}

/// Allocates unique order ids.
pub trait OrderIdAllocator: Send + Sync {
    /// The next unused order id.
    fn next_order_id(&self) -> OrderId;
}

/// A process-local sequential id allocator.
pub struct SequentialOrderIds {
    next: AtomicU64,
}

impl SequentialOrderIds {
    /// Starts allocating from `first`.
    pub fn starting_at(first: OrderId) -> Self {
        SequentialOrderIds {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialOrderIds {
    fn default() -> Self {
        SequentialOrderIds::starting_at(1)
    }
}

impl OrderIdAllocator for SequentialOrderIds {
    fn next_order_id(&self) -> OrderId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Subscribes consumers to real-time market data with an initial snapshot.
pub trait MarketDataClient: Send + Sync {
    /// Feeds `writer` the current BBO for `security` (when one is known)
    /// followed by every subsequent BBO, closing the writer when the feed
    /// ends.
    fn query_bbo_quotes(&self, security: &Security, writer: Arc<dyn QueueWriter<BboQuote>>);
}

/// A validation applied to an order before it reaches a driver.
pub trait OrderSubmissionCheck: Send + Sync {
    /// Accepts or rejects `info`. Rejection reasons are human readable and
    /// end up on the order's REJECTED report.
    fn check(&self, info: &OrderInfo) -> Result<(), OrderError>;
}

/// A driver layer that runs submission checks before forwarding.
///
/// A failed check never surfaces as an error to the caller: the order is
/// created locally, a terminal REJECTED report carrying the reason is
/// appended, and the order never reaches the wrapped driver.
pub struct CheckedOrderExecutionDriver<D> {
    driver: D,
    checks: Vec<Box<dyn OrderSubmissionCheck>>,
    clock: Arc<dyn Clock>,
}

impl<D: OrderExecutionDriver> CheckedOrderExecutionDriver<D> {
    /// Wraps `driver` with the given checks.
    pub fn new(driver: D, checks: Vec<Box<dyn OrderSubmissionCheck>>, clock: Arc<dyn Clock>) -> Self {
        CheckedOrderExecutionDriver {
            driver,
            checks,
            clock,
        }
    }

    /// The wrapped driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D: OrderExecutionDriver> OrderExecutionDriver for CheckedOrderExecutionDriver<D> {
    fn submit(&self, info: OrderInfo) -> Arc<PrimitiveOrder> {
        for check in &self.checks {
            if let Err(error) = check.check(&info) {
                warn!(
                    order_id = info.order_id,
                    security = %info.fields.security,
                    %error,
                    "order rejected by submission check"
                );
                let order = Arc::new(PrimitiveOrder::new(info));
                order.with(|_, handle| {
                    let rejection = ExecutionReport::build_updated_report(
                        handle.last().expect("initial report"),
                        OrderStatus::Rejected,
                        self.clock.now(),
                    )
                    .with_text(error.to_string());
                    handle.update(rejection);
                });
                return order;
            }
        }
        self.driver.submit(info)
    }

    fn cancel(&self, session: &OrderExecutionSession, order_id: OrderId) {
        self.driver.cancel(session, order_id);
    }

    fn update(
        &self,
        session: &OrderExecutionSession,
        order_id: OrderId,
        report: ExecutionReport,
    ) {
        self.driver.update(session, order_id, report);
    }

    fn recover(&self, record: &AccountOrderRecord) -> Arc<PrimitiveOrder> {
        self.driver.recover(record)
    }
}
