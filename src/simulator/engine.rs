//! Simulates order executions for a single security against its live BBO
//! stream.

use crate::definitions::{BboQuote, Money, Quantity, Security, Side};
use crate::order::{
    ExecutionReport, MarketDataClient, OrderId, OrderStatus, OrderType, PrimitiveOrder,
    TimeInForce,
};
use crate::queue::{CallbackWriter, StateQueue, TaskQueue};
use crate::utils::Clock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::trace;

/// The fill increment used by the simulator. Callers are expected to
/// submit quantities in whole board lots; any residue below one lot is
/// never filled here.
pub const BOARD_LOT: Quantity = 100;

/// Drives the state machines of every order submitted for one security.
///
/// All mutating operations, including BBO arrivals, run serially on the
/// engine's task queue. The BBO stream is consumed twice: into a latched
/// slot for synchronous price reads and into the queue for reactive
/// matching.
pub struct SecurityOrderSimulator {
    state: Arc<SimulatorState>,
    tasks: Arc<TaskQueue>,
}

struct SimulatorState {
    clock: Arc<dyn Clock>,
    bbo_quotes: Arc<StateQueue<BboQuote>>,
    orders: Mutex<HashMap<OrderId, Arc<PrimitiveOrder>>>,
}

impl SecurityOrderSimulator {
    /// Builds a simulator for `security`, subscribing to its BBO stream.
    pub fn new(
        market_data: &dyn MarketDataClient,
        security: &Security,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = Arc::new(SimulatorState {
            clock,
            bbo_quotes: Arc::new(StateQueue::new()),
            orders: Mutex::new(HashMap::new()),
        });
        let tasks = Arc::new(TaskQueue::new(&format!("simulator-{security}")));
        market_data.query_bbo_quotes(security, state.bbo_quotes.clone());
        let weak_state: Weak<SimulatorState> = Arc::downgrade(&state);
        let weak_tasks: Weak<TaskQueue> = Arc::downgrade(&tasks);
        market_data.query_bbo_quotes(
            security,
            Arc::new(CallbackWriter::new(move |quote: BboQuote| {
                let (Some(state), Some(tasks)) = (weak_state.upgrade(), weak_tasks.upgrade())
                else {
                    return;
                };
                tasks.push(move || state.on_bbo(quote));
            })),
        );
        SecurityOrderSimulator { state, tasks }
    }

    /// Submits an order for simulated execution: the order joins the live
    /// set, transitions PENDING_NEW to NEW at its submission timestamp and
    /// is matched against the latched BBO.
    pub fn submit(&self, order: &Arc<PrimitiveOrder>) {
        let state = Arc::clone(&self.state);
        let order = Arc::clone(order);
        self.tasks.push(move || state.submit(order));
    }

    /// Cancels an order: PENDING_CANCEL then CANCELED, back to back, both
    /// at the current time. A terminal or report-less order is left alone.
    pub fn cancel(&self, order: &Arc<PrimitiveOrder>) {
        let state = Arc::clone(&self.state);
        let order = Arc::clone(order);
        self.tasks.push(move || state.cancel(&order));
    }

    /// Applies an administrative update: the report is resequenced, given
    /// the current time if it carries none, and appended.
    pub fn update(&self, order: &Arc<PrimitiveOrder>, report: ExecutionReport) {
        let state = Arc::clone(&self.state);
        let order = Arc::clone(order);
        self.tasks.push(move || state.update(&order, report));
    }

    /// Re-inserts a recovered order and runs a matching pass. Idempotent.
    pub fn recover(&self, order: &Arc<PrimitiveOrder>) {
        let state = Arc::clone(&self.state);
        let order = Arc::clone(order);
        self.tasks.push(move || state.recover(order));
    }

    /// Blocks until every operation pushed so far has run. Test hook.
    pub fn flush(&self) {
        self.tasks.flush();
    }
}

impl SimulatorState {
    fn submit(&self, order: Arc<PrimitiveOrder>) {
        trace!(order_id = order.info().order_id, "simulator submit");
        self.orders
            .lock()
            .insert(order.info().order_id, Arc::clone(&order));
        order.with(|_, handle| {
            if let Some(last) = handle.last() {
                let acknowledged = ExecutionReport::build_updated_report(
                    last,
                    OrderStatus::New,
                    order.info().timestamp,
                );
                handle.update(acknowledged);
            }
        });
        self.update_order(&order);
    }

    fn cancel(&self, order: &PrimitiveOrder) {
        order.with(|status, handle| {
            if status.is_terminal() || handle.reports().is_empty() {
                return;
            }
            let now = self.clock.now();
            let pending = ExecutionReport::build_updated_report(
                handle.last().expect("reports not empty"),
                OrderStatus::PendingCancel,
                now,
            );
            handle.update(pending);
            let canceled = ExecutionReport::build_updated_report(
                handle.last().expect("reports not empty"),
                OrderStatus::Canceled,
                now,
            );
            handle.update(canceled);
        });
    }

    fn update(&self, order: &PrimitiveOrder, report: ExecutionReport) {
        order.with(|status, handle| {
            if status.is_terminal() {
                return;
            }
            let mut updated = report;
            updated.sequence = handle.last().map(|last| last.sequence + 1).unwrap_or(0);
            if !updated.has_timestamp() {
                updated.timestamp = self.clock.now();
            }
            handle.update(updated);
        });
    }

    fn recover(&self, order: Arc<PrimitiveOrder>) {
        self.orders
            .lock()
            .insert(order.info().order_id, Arc::clone(&order));
        self.update_order(&order);
    }

    /// Emits board-lot fills at `price` until the order's quantity is
    /// exhausted, PARTIALLY_FILLED for all but the last lot.
    fn fill_order(&self, order: &PrimitiveOrder, price: Money) -> OrderStatus {
        let lots = order.info().fields.quantity / BOARD_LOT;
        if lots == 0 {
            return order.status();
        }
        for i in 0..lots {
            order.with(|_, handle| {
                let status = if i + 1 < lots {
                    OrderStatus::PartiallyFilled
                } else {
                    OrderStatus::Filled
                };
                let mut fill = ExecutionReport::build_updated_report(
                    handle.last().expect("reports not empty"),
                    status,
                    self.clock.now(),
                );
                fill.last_quantity = BOARD_LOT;
                fill.last_price = price;
                handle.update(fill);
            });
        }
        OrderStatus::Filled
    }

    /// One matching pass over a single order against the latched BBO.
    fn update_order(&self, order: &PrimitiveOrder) -> OrderStatus {
        let status = order.status();
        let Ok(Some(bbo)) = self.bbo_quotes.try_top() else {
            return status;
        };
        if status == OrderStatus::PendingNew || status.is_terminal() {
            return status;
        }
        let fields = &order.info().fields;
        if fields.time_in_force == TimeInForce::Moc {
            return status;
        }
        if fields.order_type == OrderType::Market {
            let price = match fields.side {
                Side::Bid => bbo.ask.price,
                Side::Ask => bbo.bid.price,
            };
            return self.fill_order(order, price);
        }
        match fields.side {
            Side::Bid if bbo.ask.price <= fields.price => self.fill_order(order, bbo.ask.price),
            Side::Ask if bbo.bid.price >= fields.price => self.fill_order(order, bbo.bid.price),
            _ => status,
        }
    }

    fn on_bbo(&self, _quote: BboQuote) {
        let live: Vec<Arc<PrimitiveOrder>> = self.orders.lock().values().cloned().collect();
        for order in live {
            let status = self.update_order(&order);
            if status.is_terminal() {
                self.orders.lock().remove(&order.info().order_id);
            }
        }
    }
}
