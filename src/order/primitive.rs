//! The owning order aggregate: one `OrderInfo` plus its report stream.

use crate::order::{ExecutionReport, OrderInfo, OrderStatus};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::error;

/// Report listener specification using Arc for shared ownership.
///
/// Listeners are invoked while the order's lock is held, so they must be
/// quick and must not call back into the order; enqueueing onto a task
/// queue or sending into a channel are the intended uses.
pub type ReportListener = Arc<dyn Fn(&ExecutionReport) + Send + Sync>;

struct OrderState {
    reports: Vec<ExecutionReport>,
    listeners: Vec<ReportListener>,
}

/// An order and its append-only report stream, guarded by a mutex.
///
/// Constructed with a sequence-zero PENDING_NEW report, so at least one
/// report is observable the moment the order exists. All report access
/// goes through [`PrimitiveOrder::with`], which holds the order's lock for
/// the scope of the closure; updates must carry strictly increasing
/// sequence numbers and no update may follow a terminal report.
pub struct PrimitiveOrder {
    info: OrderInfo,
    state: Mutex<OrderState>,
}

impl PrimitiveOrder {
    /// Builds an order with its initial PENDING_NEW report at the
    /// submission timestamp.
    pub fn new(info: OrderInfo) -> Self {
        let initial = ExecutionReport::initial_report(info.order_id, info.timestamp);
        PrimitiveOrder {
            info,
            state: Mutex::new(OrderState {
                reports: vec![initial],
                listeners: Vec::new(),
            }),
        }
    }

    /// Rebuilds an order from persisted state. The supplied reports are
    /// adopted as-is and are not re-published to anyone.
    pub fn from_reports(info: OrderInfo, reports: Vec<ExecutionReport>) -> Self {
        PrimitiveOrder {
            info,
            state: Mutex::new(OrderState {
                reports,
                listeners: Vec::new(),
            }),
        }
    }

    /// The order's submission record.
    pub fn info(&self) -> &OrderInfo {
        &self.info
    }

    /// Runs `f` under the order's lock with the current status and a
    /// handle for reading and appending reports.
    pub fn with<R>(&self, f: impl FnOnce(OrderStatus, &mut ReportHandle<'_>) -> R) -> R {
        let mut state = self.state.lock();
        let status = state
            .reports
            .last()
            .map(|report| report.status)
            .unwrap_or(OrderStatus::PendingNew);
        let mut handle = ReportHandle { state: &mut state };
        f(status, &mut handle)
    }

    /// The order's current status.
    pub fn status(&self) -> OrderStatus {
        self.with(|status, _| status)
    }

    /// Appends a single report outside of a larger critical section.
    pub fn update(&self, report: ExecutionReport) {
        self.with(|_, handle| handle.update(report));
    }

    /// Registers a listener, replaying the existing report stream to it
    /// first. Replay and registration are atomic with respect to updates,
    /// so no report is missed or delivered twice.
    pub fn monitor(&self, listener: ReportListener) {
        let mut state = self.state.lock();
        for report in &state.reports {
            listener(report);
        }
        state.listeners.push(listener);
    }

    /// Registers a listener that forwards every report into a std mpsc
    /// channel.
    pub fn monitor_with_std_channel(&self, sender: std::sync::mpsc::Sender<ExecutionReport>) {
        self.monitor(Arc::new(move |report: &ExecutionReport| {
            let _ = sender.send(report.clone());
        }));
    }

    /// Registers a listener that forwards every report into a tokio mpsc
    /// channel.
    pub fn monitor_with_tokio_channel(
        &self,
        sender: tokio::sync::mpsc::UnboundedSender<ExecutionReport>,
    ) {
        self.monitor(Arc::new(move |report: &ExecutionReport| {
            let _ = sender.send(report.clone());
        }));
    }
}

/// Read-and-append access to an order's reports inside
/// [`PrimitiveOrder::with`].
pub struct ReportHandle<'a> {
    state: &'a mut OrderState,
}

impl ReportHandle<'_> {
    /// The reports appended so far, in sequence order.
    pub fn reports(&self) -> &[ExecutionReport] {
        &self.state.reports
    }

    /// The most recent report.
    pub fn last(&self) -> Option<&ExecutionReport> {
        self.state.reports.last()
    }

    /// Appends a report and notifies listeners.
    ///
    /// An append after a terminal report, or one whose sequence is not
    /// strictly greater than the last, is a programming error: it asserts
    /// in debug builds and is logged and dropped in release builds.
    pub fn update(&mut self, report: ExecutionReport) {
        if let Some(last) = self.state.reports.last() {
            if last.status.is_terminal() {
                debug_assert!(
                    false,
                    "report after terminal status {} on order {}",
                    last.status, report.id
                );
                error!(
                    order_id = report.id,
                    status = %last.status,
                    "dropping report appended after terminal status"
                );
                return;
            }
            if report.sequence <= last.sequence {
                debug_assert!(
                    false,
                    "non-monotone sequence {} after {} on order {}",
                    report.sequence, last.sequence, report.id
                );
                error!(
                    order_id = report.id,
                    sequence = report.sequence,
                    last_sequence = last.sequence,
                    "dropping report with non-monotone sequence"
                );
                return;
            }
        }
        for listener in &self.state.listeners {
            listener(&report);
        }
        self.state.reports.push(report);
    }
}
