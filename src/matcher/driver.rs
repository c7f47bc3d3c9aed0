//! An order-execution driver layer that crosses orders internally before
//! forwarding them downstream.

use crate::definitions::{Account, Quantity, Security, Side, offer_comparator};
use crate::matcher::entry::{OrderEntry, SecurityEntry, offer_price};
use crate::matcher::report_builder::MatchReportBuilder;
use crate::order::{
    AccountOrderRecord, ExecutionReport, MarketDataClient, OrderExecutionDriver,
    OrderExecutionSession, OrderFields, OrderId, OrderIdAllocator, OrderInfo, OrderStatus,
    OrderType, PrimitiveOrder, TimeInForce,
};
use crate::queue::{QueueError, TaskQueue};
use crate::utils::Clock;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::Ordering as AtomicOrdering;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{info, trace, warn};

/// The default bound on each `is_live` / `is_terminal` rendezvous wait.
pub const DEFAULT_MATCH_TIMEOUT: Duration = Duration::from_secs(1);

/// Maintains a per-security book of the orders routed through this
/// process and crosses new orders against resting contra-side orders
/// before passing the residue to the wrapped driver.
///
/// A synthesized crossing trade is only legal when the resting order is
/// priced no worse than the market's top of book, so internal matches
/// never trade through the public quote. The cancel round-trip that
/// reserves a resting order for a match tolerates the downstream filling
/// it first; such a race simply produces no internal match.
pub struct InternalMatchingOrderExecutionDriver<D: OrderExecutionDriver + 'static> {
    core: Arc<MatcherCore<D>>,
}

struct MatcherCore<D: OrderExecutionDriver + 'static> {
    weak_self: Weak<MatcherCore<D>>,
    report_builder: Box<dyn MatchReportBuilder>,
    market_data: Arc<dyn MarketDataClient>,
    clock: Arc<dyn Clock>,
    order_id_allocator: Arc<dyn OrderIdAllocator>,
    driver: D,
    root_session: OrderExecutionSession,
    /// client id -> current downstream id.
    order_ids: DashMap<OrderId, OrderId>,
    /// client id -> matcher entry, keeping entries alive for the weak
    /// report subscriptions.
    orders: DashMap<OrderId, Arc<OrderEntry>>,
    security_entries: Mutex<HashMap<Security, Arc<SecurityEntry>>>,
    submission_tasks: TaskQueue,
    report_tasks: TaskQueue,
    match_timeout: Duration,
}

impl<D: OrderExecutionDriver + 'static> InternalMatchingOrderExecutionDriver<D> {
    /// Builds the driver.
    ///
    /// `root_account` is the account internal-match bookkeeping operations
    /// (the cancel round-trip and residue re-submissions) run under.
    /// `match_timeout` bounds each rendezvous wait; a timeout aborts only
    /// the pairing being attempted.
    pub fn new(
        root_account: Account,
        report_builder: Box<dyn MatchReportBuilder>,
        market_data: Arc<dyn MarketDataClient>,
        clock: Arc<dyn Clock>,
        order_id_allocator: Arc<dyn OrderIdAllocator>,
        driver: D,
        match_timeout: Duration,
    ) -> Self {
        let core = Arc::new_cyclic(|weak_self| MatcherCore {
            weak_self: weak_self.clone(),
            report_builder,
            market_data,
            clock,
            order_id_allocator,
            driver,
            root_session: OrderExecutionSession::new(root_account),
            order_ids: DashMap::new(),
            orders: DashMap::new(),
            security_entries: Mutex::new(HashMap::new()),
            submission_tasks: TaskQueue::new("matcher-submissions"),
            report_tasks: TaskQueue::new("matcher-reports"),
            match_timeout,
        });
        InternalMatchingOrderExecutionDriver { core }
    }

    /// Blocks until both task queues have drained. Test hook.
    pub fn flush(&self) {
        self.core.submission_tasks.flush();
        self.core.report_tasks.flush();
    }
}

impl<D: OrderExecutionDriver + 'static> OrderExecutionDriver
    for InternalMatchingOrderExecutionDriver<D>
{
    fn submit(&self, info: OrderInfo) -> Arc<PrimitiveOrder> {
        let fields = &info.fields;
        let eligible_time_in_force = matches!(
            fields.time_in_force,
            TimeInForce::Day
                | TimeInForce::Gtc
                | TimeInForce::Ioc
                | TimeInForce::Gtx
                | TimeInForce::Gtd(_)
        );
        let eligible_type = matches!(fields.order_type, OrderType::Limit | OrderType::Market);
        if !eligible_time_in_force || !eligible_type || fields.quantity <= 0 {
            self.core.order_ids.insert(info.order_id, info.order_id);
            return self.core.driver.submit(info);
        }
        let entry = OrderEntry::new(info);
        self.core
            .orders
            .insert(entry.info.order_id, Arc::clone(&entry));
        let core = Arc::clone(&self.core);
        let submitted = Arc::clone(&entry);
        self.core
            .submission_tasks
            .push(move || core.submit_entry(submitted));
        Arc::clone(&entry.order)
    }

    fn cancel(&self, session: &OrderExecutionSession, order_id: OrderId) {
        let core = Arc::clone(&self.core);
        let session = session.clone();
        self.core.submission_tasks.push(move || {
            let driver_order_id = core.order_ids.get(&order_id).map(|entry| *entry.value());
            match driver_order_id {
                Some(driver_order_id) => core.driver.cancel(&session, driver_order_id),
                None => core.driver.cancel(&session, order_id),
            }
        });
    }

    fn update(
        &self,
        session: &OrderExecutionSession,
        order_id: OrderId,
        report: ExecutionReport,
    ) {
        let core = Arc::clone(&self.core);
        let session = session.clone();
        self.core.submission_tasks.push(move || {
            let driver_order_id = core.order_ids.get(&order_id).map(|entry| *entry.value());
            match driver_order_id {
                Some(driver_order_id) => {
                    let mut sanitized = report;
                    sanitized.id = driver_order_id;
                    core.driver.update(&session, driver_order_id, sanitized);
                }
                None => core.driver.update(&session, order_id, report),
            }
        });
    }

    fn recover(&self, record: &AccountOrderRecord) -> Arc<PrimitiveOrder> {
        let order = self.core.driver.recover(record);
        self.core
            .order_ids
            .insert(order.info().order_id, order.info().order_id);
        order
    }
}

impl<D: OrderExecutionDriver + 'static> MatcherCore<D> {
    fn security_entry(&self, security: &Security) -> Arc<SecurityEntry> {
        let mut entries = self.security_entries.lock();
        if let Some(entry) = entries.get(security) {
            return Arc::clone(entry);
        }
        info!(%security, "opening matching book");
        let entry = SecurityEntry::new();
        self.market_data
            .query_bbo_quotes(security, entry.bbo_quotes.clone());
        entries.insert(security.clone(), Arc::clone(&entry));
        entry
    }

    fn reject(&self, entry: &OrderEntry, reason: &str) {
        entry.order.with(|_, handle| {
            if let Some(last) = handle.last() {
                let rejection = ExecutionReport::build_updated_report(
                    last,
                    OrderStatus::Rejected,
                    self.clock.now(),
                )
                .with_text(reason);
                handle.update(rejection);
            }
        });
    }

    /// The submission algorithm: resolve the security, read the latched
    /// BBO, walk the contra book for legal internal matches, apply them,
    /// then book and forward the residue.
    fn submit_entry(&self, entry: Arc<OrderEntry>) {
        let fields = entry.info.fields.clone();
        let security_entry = self.security_entry(&fields.security);
        let bbo = match security_entry.bbo_quotes.try_top() {
            Ok(Some(bbo)) => bbo,
            Ok(None) => {
                self.reject(&entry, "No BBO quote available.");
                return;
            }
            Err(_) => {
                self.security_entries.lock().remove(&fields.security);
                self.reject(&entry, "No BBO quote available.");
                return;
            }
        };
        // An internal match may not trade through the public quote: the
        // resting order must be priced no worse than this threshold.
        let threshold = match fields.side {
            Side::Ask => bbo.bid.price,
            Side::Bid => bbo.ask.price,
        };
        let active_price = offer_price(&fields);
        let mut match_reports: Vec<ExecutionReport> = Vec::new();
        let mut remaining = fields.quantity;
        {
            let mut books = security_entry.books.lock();
            let contra = books.contra_side(fields.side);
            let mut index = 0;
            while index < contra.len() && remaining > 0 {
                let passive = Arc::clone(&contra[index]);
                let passive_price = passive.offer_price();
                let crosses = offer_comparator(fields.side, active_price, passive_price)
                    != Ordering::Greater;
                let inside_threshold =
                    offer_comparator(fields.side, passive_price, threshold) != Ordering::Less;
                if !crosses || !inside_threshold {
                    index += 1;
                    continue;
                }
                match self.internal_match(&entry, &passive, remaining) {
                    Ok((report, passive_remaining)) => {
                        if report.last_quantity != 0 {
                            remaining -= report.last_quantity;
                            match_reports.push(report);
                        }
                        if passive_remaining {
                            index += 1;
                        } else {
                            contra.remove(index);
                        }
                    }
                    Err(error) => {
                        warn!(
                            active = entry.info.order_id,
                            passive = passive.info.order_id,
                            %error,
                            "internal match aborted"
                        );
                        index += 1;
                    }
                }
            }
        }
        if !match_reports.is_empty() {
            entry.is_pending_new.store(false, AtomicOrdering::SeqCst);
            entry.order.with(|_, handle| {
                let Some(last) = handle.last() else {
                    return;
                };
                let acknowledged = ExecutionReport::build_updated_report(
                    last,
                    OrderStatus::New,
                    self.clock.now(),
                );
                let mut sequence = acknowledged.sequence;
                handle.update(acknowledged);
                for mut report in match_reports {
                    sequence += 1;
                    report.sequence = sequence;
                    report.timestamp = self.clock.now();
                    entry
                        .remaining_quantity
                        .fetch_sub(report.last_quantity, AtomicOrdering::SeqCst);
                    handle.update(report);
                }
            });
        }
        if remaining != 0 {
            security_entry.books.lock().insert(Arc::clone(&entry));
            let mut driver_fields = fields;
            driver_fields.quantity = remaining;
            self.submit_to_driver(entry.info.submission_account.clone(), driver_fields, &entry);
        }
    }

    /// Reserves the passive order through a cancel round-trip with the
    /// downstream driver, then synthesizes the mirrored match reports.
    ///
    /// Returns the active-side report (zero quantity when the downstream
    /// filled the passive first) and whether the passive order still has
    /// residue and stays on the book.
    fn internal_match(
        &self,
        active: &Arc<OrderEntry>,
        passive: &Arc<OrderEntry>,
        quantity: Quantity,
    ) -> Result<(ExecutionReport, bool), QueueError> {
        passive.is_matching.store(true, AtomicOrdering::SeqCst);
        if let Err(error) = passive.is_live.wait_for(self.match_timeout) {
            passive.is_matching.store(false, AtomicOrdering::SeqCst);
            return Err(error);
        }
        let driver_order_id = passive
            .driver_order_id
            .lock()
            .unwrap_or(passive.info.order_id);
        self.driver.cancel(&self.root_session, driver_order_id);
        if let Err(error) = passive.is_terminal.wait_for(self.match_timeout) {
            passive.is_matching.store(false, AtomicOrdering::SeqCst);
            return Err(error);
        }
        passive.is_matching.store(false, AtomicOrdering::SeqCst);
        passive.is_live.reset();
        passive.is_terminal.reset();
        let matched = quantity.min(passive.remaining());
        passive
            .remaining_quantity
            .fetch_sub(matched, AtomicOrdering::SeqCst);
        let passive_remaining = passive.remaining() != 0;
        let mut active_report = ExecutionReport {
            id: active.info.order_id,
            ..ExecutionReport::default()
        };
        if matched == 0 {
            // The downstream won the race and filled the passive order;
            // this pairing produces no internal match.
            return Ok((active_report, passive_remaining));
        }
        let price = passive.info.fields.price;
        let active_status = if matched == quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        let passive_status = if passive_remaining {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::Filled
        };
        active_report.status = active_status;
        active_report.last_quantity = matched;
        active_report.last_price = price;
        let mut passive_report = ExecutionReport {
            id: passive.info.order_id,
            status: passive_status,
            last_quantity: matched,
            last_price: price,
            ..ExecutionReport::default()
        };
        self.report_builder.build(
            &passive.info.fields,
            &active.info.fields,
            &mut passive_report,
            &mut active_report,
        );
        // The builder may only annotate.
        passive_report.status = passive_status;
        passive_report.last_quantity = matched;
        passive_report.last_price = price;
        active_report.status = active_status;
        active_report.last_quantity = matched;
        active_report.last_price = price;
        trace!(
            active = active.info.order_id,
            passive = passive.info.order_id,
            matched,
            %price,
            "internal match"
        );
        passive.order.with(|_, handle| {
            if let Some(last) = handle.last() {
                passive_report.timestamp = self.clock.now();
                passive_report.sequence = last.sequence + 1;
                handle.update(passive_report);
            }
        });
        if passive_remaining {
            let mut residue_fields = passive.info.fields.clone();
            residue_fields.quantity = passive.remaining();
            self.submit_to_driver(self.root_session.account.clone(), residue_fields, passive);
        }
        Ok((active_report, passive_remaining))
    }

    /// Submits (or re-submits) an entry's open quantity downstream,
    /// rotating its downstream id, and subscribes to the downstream
    /// order's reports.
    fn submit_to_driver(
        &self,
        submission_account: Account,
        fields: OrderFields,
        entry: &Arc<OrderEntry>,
    ) {
        let driver_order_id = if entry.driver_order_id.lock().is_none() {
            entry.info.order_id
        } else {
            self.order_id_allocator.next_order_id()
        };
        self.order_ids.insert(entry.info.order_id, driver_order_id);
        let driver_info = OrderInfo {
            fields,
            submission_account,
            order_id: driver_order_id,
            shorting_flag: entry.info.shorting_flag,
            timestamp: self.clock.now(),
        };
        let driver_order = self.driver.submit(driver_info);
        *entry.driver_order_id.lock() = Some(driver_order_id);
        let weak_core = self.weak_self.clone();
        let weak_entry = Arc::downgrade(entry);
        driver_order.monitor(Arc::new(move |report: &ExecutionReport| {
            let Some(core) = weak_core.upgrade() else {
                return;
            };
            let entry = weak_entry.clone();
            let report = report.clone();
            let handler = Arc::clone(&core);
            core.report_tasks
                .push(move || handler.on_execution_report(entry, report));
        }));
    }

    /// Handles one downstream report for an entry's current downstream
    /// order.
    fn on_execution_report(&self, weak_entry: Weak<OrderEntry>, report: ExecutionReport) {
        // PENDING_NEW is synthesized client-side; the downstream echo is
        // dropped.
        if report.status == OrderStatus::PendingNew {
            return;
        }
        let Some(entry) = weak_entry.upgrade() else {
            return;
        };
        entry.is_live.set();
        if entry.is_pending_new.load(AtomicOrdering::SeqCst) {
            entry.is_pending_new.store(false, AtomicOrdering::SeqCst);
        } else if report.status == OrderStatus::New {
            // The NEW of a rotated residue order; the client already has
            // its acknowledgement.
            return;
        }
        entry
            .remaining_quantity
            .fetch_sub(report.last_quantity, AtomicOrdering::SeqCst);
        if entry.is_matching.load(AtomicOrdering::SeqCst) {
            if report.status.is_terminal() && report.last_quantity == 0 {
                entry.is_terminal.set();
                return;
            }
            if report.status == OrderStatus::PendingCancel && report.last_quantity == 0 {
                // The echo of the matcher's own cancel.
                return;
            }
        }
        let mut forwarded = report.clone();
        forwarded.id = entry.info.order_id;
        entry.order.with(|_, handle| {
            if let Some(last) = handle.last() {
                forwarded.sequence = last.sequence + 1;
                handle.update(forwarded);
            }
        });
        if report.status.is_terminal() {
            entry.remaining_quantity.store(0, AtomicOrdering::SeqCst);
            entry.is_terminal.set();
        }
    }
}
