//! The per-account risk control loop.

use crate::definitions::{
    Account, BboQuote, CurrencyId, DestinationDatabase, ExchangeRate, ExchangeRateTable, Money,
    Quantity, Security, Side,
};
use crate::order::{
    ExecutionReport, OrderExecutionDriver, OrderFields, OrderId, OrderIdAllocator, OrderInfo,
    OrderType, PrimitiveOrder, Tag,
};
use crate::queue::TaskQueue;
use crate::risk::inventory::Inventory;
use crate::risk::portfolio::Portfolio;
use crate::risk::state::{RiskParameters, RiskState, RiskStateType};
use crate::utils::Clock;
use chrono::{DateTime, Utc};
use crossbeam::channel::{Sender, bounded, select, tick};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info, warn};

/// The tag stamped on orders the risk controller submits to flatten a
/// position.
pub const RISK_CLOSE_TAG: i32 = 8013;

/// How often the controller re-evaluates its accounts by default.
pub const DEFAULT_RISK_TICK: Duration = Duration::from_millis(100);

/// A published risk-state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskStateEntry {
    /// The account that transitioned.
    pub account: Account,
    /// The new state.
    pub state: RiskState,
}

/// A published inventory update.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryEntry {
    /// The account the inventory belongs to.
    pub account: Account,
    /// The traded security.
    pub security: Security,
    /// The inventory after the update.
    pub inventory: Inventory,
}

/// Risk-state listener specification using Arc for shared ownership.
pub type RiskStateListener = Arc<dyn Fn(&RiskStateEntry) + Send + Sync>;

/// Inventory listener specification using Arc for shared ownership.
pub type InventoryListener = Arc<dyn Fn(&InventoryEntry) + Send + Sync>;

struct OpenOrder {
    fields: OrderFields,
    remaining: Quantity,
}

struct AccountEntry {
    parameters: RiskParameters,
    portfolio: Portfolio,
    state: RiskState,
    peak: Money,
    admin_reenabled: bool,
    open_orders: HashMap<OrderId, OpenOrder>,
}

impl AccountEntry {
    fn new(parameters: RiskParameters) -> Self {
        AccountEntry {
            parameters,
            portfolio: Portfolio::new(),
            state: RiskState::none(),
            peak: Money::ZERO,
            admin_reenabled: false,
            open_orders: HashMap::new(),
        }
    }
}

/// Watches each managed account's portfolio against its risk parameters,
/// publishing state transitions and flattening positions when an account
/// enters CLOSE_ORDERS.
///
/// All inputs (executed reports, marks, parameter updates and the
/// periodic tick) funnel through one serialized task queue, so account
/// state has a single writer.
pub struct RiskController<D: OrderExecutionDriver + 'static> {
    core: Arc<RiskCore<D>>,
    ticker_stop: Sender<()>,
    ticker: Option<JoinHandle<()>>,
}

struct RiskCore<D: OrderExecutionDriver + 'static> {
    weak_self: Weak<RiskCore<D>>,
    driver: D,
    order_ids: Arc<dyn OrderIdAllocator>,
    destinations: DestinationDatabase,
    clock: Arc<dyn Clock>,
    rates: Mutex<ExchangeRateTable>,
    accounts: Mutex<HashMap<Account, AccountEntry>>,
    state_listeners: Mutex<Vec<RiskStateListener>>,
    inventory_listeners: Mutex<Vec<InventoryListener>>,
    tasks: TaskQueue,
}

impl<D: OrderExecutionDriver + 'static> RiskController<D> {
    /// Builds a controller that submits flattening orders through
    /// `driver` and re-evaluates every `tick_interval`.
    pub fn new(
        driver: D,
        order_ids: Arc<dyn OrderIdAllocator>,
        destinations: DestinationDatabase,
        rates: ExchangeRateTable,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
    ) -> Self {
        let core = Arc::new_cyclic(|weak_self| RiskCore {
            weak_self: weak_self.clone(),
            driver,
            order_ids,
            destinations,
            clock,
            rates: Mutex::new(rates),
            accounts: Mutex::new(HashMap::new()),
            state_listeners: Mutex::new(Vec::new()),
            inventory_listeners: Mutex::new(Vec::new()),
            tasks: TaskQueue::new("risk-controller"),
        });
        let (ticker_stop, stop_receiver) = bounded::<()>(1);
        let weak = Arc::downgrade(&core);
        let ticker = std::thread::Builder::new()
            .name("risk-ticker".to_string())
            .spawn(move || {
                let ticker = tick(tick_interval);
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            let Some(core) = weak.upgrade() else { break; };
                            let evaluating = Arc::clone(&core);
                            core.tasks.push(move || evaluating.evaluate_all());
                        }
                        recv(stop_receiver) -> _ => break,
                    }
                }
            })
            .expect("failed to spawn risk ticker");
        RiskController {
            core,
            ticker_stop,
            ticker: Some(ticker),
        }
    }

    /// Registers a listener for risk-state transitions. The
    /// administration service stores these.
    pub fn monitor_risk_states(&self, listener: RiskStateListener) {
        self.core.state_listeners.lock().push(listener);
    }

    /// Registers a listener for inventory updates.
    pub fn monitor_inventories(&self, listener: InventoryListener) {
        self.core.inventory_listeners.lock().push(listener);
    }

    /// Starts managing an account under the given parameters.
    pub fn add_account(&self, account: Account, parameters: RiskParameters) {
        let core = Arc::clone(&self.core);
        self.core.tasks.push(move || {
            info!(%account, "risk controller managing account");
            core.accounts
                .lock()
                .entry(account)
                .or_insert_with(|| AccountEntry::new(parameters));
        });
    }

    /// Replaces an account's parameters. Takes effect on the next
    /// evaluation tick; pushing ACTIVE while the account is restricted
    /// counts as an explicit admin re-enable.
    pub fn update_parameters(&self, account: Account, parameters: RiskParameters) {
        let core = Arc::clone(&self.core);
        self.core.tasks.push(move || {
            let mut accounts = core.accounts.lock();
            let entry = accounts
                .entry(account)
                .or_insert_with(|| AccountEntry::new(parameters.clone()));
            if parameters.allowed_state == RiskStateType::Active
                && matches!(
                    entry.state.state_type,
                    RiskStateType::CloseOrders | RiskStateType::Disabled
                )
            {
                entry.admin_reenabled = true;
            }
            entry.parameters = parameters;
        });
    }

    /// Replaces one exchange rate; the next evaluation sees it.
    pub fn update_rate(&self, rate: ExchangeRate) {
        self.core.rates.lock().update(rate);
    }

    /// Latches a BBO mark for every managed account's portfolio.
    pub fn update_mark(&self, security: Security, quote: BboQuote) {
        let core = Arc::clone(&self.core);
        self.core.tasks.push(move || {
            let mut accounts = core.accounts.lock();
            for entry in accounts.values_mut() {
                entry.portfolio.update_mark(security.clone(), quote);
            }
        });
    }

    /// Tracks an order for `account`: its worst-case notional counts
    /// against buying power and its fills flow into the portfolio.
    pub fn track_order(&self, account: Account, order: &Arc<PrimitiveOrder>) {
        self.core.track_order(account, order);
    }

    /// Forces a full evaluation without waiting for the tick. Test hook.
    pub fn evaluate_now(&self) {
        let core = Arc::clone(&self.core);
        self.core.tasks.push(move || core.evaluate_all());
    }

    /// Blocks until every input pushed so far has been processed. Test
    /// hook.
    pub fn flush(&self) {
        self.core.tasks.flush();
    }
}

impl<D: OrderExecutionDriver + 'static> Drop for RiskController<D> {
    fn drop(&mut self) {
        let _ = self.ticker_stop.send(());
        if let Some(ticker) = self.ticker.take() {
            let _ = ticker.join();
        }
    }
}

impl<D: OrderExecutionDriver + 'static> RiskCore<D> {
    fn track_order(&self, account: Account, order: &Arc<PrimitiveOrder>) {
        let fields = order.info().fields.clone();
        let order_id = order.info().order_id;
        {
            let registering = account.clone();
            let registered_fields = fields.clone();
            let Some(core) = self.weak_self.upgrade() else {
                return;
            };
            self.tasks.push(move || {
                let mut accounts = core.accounts.lock();
                if let Some(entry) = accounts.get_mut(&registering) {
                    entry.open_orders.insert(
                        order_id,
                        OpenOrder {
                            remaining: registered_fields.quantity,
                            fields: registered_fields,
                        },
                    );
                }
            });
        }
        let weak_core = self.weak_self.clone();
        order.monitor(Arc::new(move |report: &ExecutionReport| {
            let Some(core) = weak_core.upgrade() else {
                return;
            };
            let report = report.clone();
            let account = account.clone();
            let fields = fields.clone();
            let handler = Arc::clone(&core);
            core.tasks
                .push(move || handler.on_report(account, order_id, fields, report));
        }));
    }

    fn on_report(
        &self,
        account: Account,
        order_id: OrderId,
        fields: OrderFields,
        report: ExecutionReport,
    ) {
        let mut published: Option<InventoryEntry> = None;
        {
            let mut accounts = self.accounts.lock();
            let Some(entry) = accounts.get_mut(&account) else {
                return;
            };
            if report.last_quantity != 0 {
                entry.portfolio.update(&fields, &report);
                if let Some(open) = entry.open_orders.get_mut(&order_id) {
                    open.remaining -= report.last_quantity;
                }
                published = Some(InventoryEntry {
                    account: account.clone(),
                    security: fields.security.clone(),
                    inventory: entry.portfolio.inventory(&fields.security, fields.currency),
                });
            }
            if report.status.is_terminal() {
                entry.open_orders.remove(&order_id);
            }
        }
        if let Some(entry) = published {
            for listener in self.inventory_listeners.lock().iter() {
                listener(&entry);
            }
        }
    }

    fn evaluate_all(&self) {
        let now = self.clock.now();
        let rates = self.rates.lock().clone();
        let mut transitions: Vec<RiskStateEntry> = Vec::new();
        {
            let mut accounts = self.accounts.lock();
            for (account, entry) in accounts.iter_mut() {
                if let Some(state) = self.evaluate(account, entry, &rates, now) {
                    transitions.push(RiskStateEntry {
                        account: account.clone(),
                        state,
                    });
                }
            }
        }
        for transition in &transitions {
            info!(
                account = %transition.account,
                state = %transition.state,
                "risk state transition"
            );
            for listener in self.state_listeners.lock().iter() {
                listener(transition);
            }
        }
    }

    /// Evaluates one account, returning its new state when it changed.
    fn evaluate(
        &self,
        account: &Account,
        entry: &mut AccountEntry,
        rates: &ExchangeRateTable,
        now: DateTime<Utc>,
    ) -> Option<RiskState> {
        if entry.parameters.allowed_state == RiskStateType::Disabled {
            if entry.state.state_type != RiskStateType::Disabled {
                entry.state = RiskState::disabled();
                entry.admin_reenabled = false;
                return Some(entry.state);
            }
            return None;
        }
        let currency = entry.parameters.currency;
        let gross = match entry.portfolio.gross(rates, currency) {
            Ok(gross) => gross,
            Err(error) => {
                error!(%account, %error, "skipping risk evaluation");
                return None;
            }
        };
        let exceeded = match self.buying_power_exceeded(entry, rates, currency) {
            Ok(exceeded) => exceeded,
            Err(error) => {
                error!(%account, %error, "skipping risk evaluation");
                return None;
            }
        };
        let tripped = |entry: &AccountEntry| {
            gross < -entry.parameters.net_loss
                || entry.peak - gross > entry.parameters.loss_from_top
                || exceeded
        };
        match entry.state.state_type {
            RiskStateType::None | RiskStateType::Active => {
                entry.peak = entry.peak.max(gross);
                if tripped(entry) {
                    let expiry = now + entry.parameters.transition_time;
                    entry.state = RiskState::close_orders(expiry);
                    self.flatten(account, entry, now);
                    Some(entry.state)
                } else if entry.state.state_type == RiskStateType::None {
                    entry.state = RiskState::active();
                    entry.peak = gross;
                    Some(entry.state)
                } else {
                    None
                }
            }
            RiskStateType::CloseOrders => {
                if entry.admin_reenabled && !tripped(entry) {
                    entry.state = RiskState::active();
                    entry.admin_reenabled = false;
                    entry.peak = gross;
                    return Some(entry.state);
                }
                if entry.state.expiry.is_some_and(|expiry| now >= expiry) {
                    entry.state = RiskState::disabled();
                    entry.admin_reenabled = false;
                    return Some(entry.state);
                }
                None
            }
            RiskStateType::Disabled => {
                if entry.admin_reenabled && !tripped(entry) {
                    entry.state = RiskState::active();
                    entry.admin_reenabled = false;
                    entry.peak = gross;
                    return Some(entry.state);
                }
                None
            }
        }
    }

    /// Whether positions plus open orders, priced at worst-case
    /// execution, exceed the account's buying power.
    fn buying_power_exceeded(
        &self,
        entry: &AccountEntry,
        rates: &ExchangeRateTable,
        currency: CurrencyId,
    ) -> Result<bool, crate::definitions::CurrencyError> {
        if entry.parameters.buying_power == Money::ZERO {
            return Ok(false);
        }
        let mut notional = entry.portfolio.position_notional(rates, currency)?;
        for open in entry.open_orders.values() {
            if open.remaining <= 0 {
                continue;
            }
            let price = if open.fields.order_type == OrderType::Limit {
                open.fields.price
            } else {
                match (entry.portfolio.mark(&open.fields.security), open.fields.side) {
                    (Some(quote), Side::Bid) => quote.ask.price,
                    (Some(quote), Side::Ask) => quote.bid.price,
                    (None, _) => continue,
                }
            };
            notional += rates.convert(
                open.remaining * price,
                open.fields.currency,
                currency,
            )?;
        }
        Ok(notional > entry.parameters.buying_power)
    }

    /// Submits an opposite-side MARKET order for every non-flat position,
    /// routed to the market's preferred destination and tagged as a
    /// risk-driven close.
    fn flatten(&self, account: &Account, entry: &mut AccountEntry, now: DateTime<Utc>) {
        let positions: Vec<(Security, CurrencyId, Quantity)> = entry
            .portfolio
            .inventories()
            .filter(|(_, inventory)| inventory.position.quantity != 0)
            .map(|(key, inventory)| {
                (
                    key.security.clone(),
                    key.currency,
                    inventory.position.quantity,
                )
            })
            .collect();
        for (security, currency, quantity) in positions {
            let Some(destination) = self.destinations.preferred_destination(security.market)
            else {
                warn!(%security, "no destination to flatten position");
                continue;
            };
            let side = if quantity > 0 { Side::Ask } else { Side::Bid };
            let fields = OrderFields::market_order(
                account.clone(),
                security.clone(),
                currency,
                side,
                destination.clone(),
                quantity.abs(),
            )
            .with_tag(Tag::new(RISK_CLOSE_TAG, "Y"));
            let info = OrderInfo::new(fields.clone(), self.order_ids.next_order_id(), now);
            info!(%account, %security, quantity, "submitting flattening order");
            let order = self.driver.submit(info);
            let order_id = order.info().order_id;
            entry.open_orders.insert(
                order_id,
                OpenOrder {
                    remaining: fields.quantity,
                    fields: fields.clone(),
                },
            );
            let weak_core = self.weak_self.clone();
            let closing_account = account.clone();
            order.monitor(Arc::new(move |report: &ExecutionReport| {
                let Some(core) = weak_core.upgrade() else {
                    return;
                };
                let report = report.clone();
                let account = closing_account.clone();
                let fields = fields.clone();
                let handler = Arc::clone(&core);
                core.tasks
                    .push(move || handler.on_report(account, order_id, fields, report));
            }));
        }
    }
}
