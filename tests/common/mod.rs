//! Shared fixtures: a controllable market-data client and a mock
//! downstream driver.

#![allow(dead_code)]

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Once};
use tradecore_rs::definitions::{
    Account, BboQuote, CountryCode, CurrencyId, MarketCode, Money, Quantity, Quote, Security, Side,
};
use tradecore_rs::order::{
    AccountOrderRecord, ExecutionReport, MarketDataClient, OrderExecutionDriver,
    OrderExecutionSession, OrderFields, OrderId, OrderInfo, OrderStatus, PrimitiveOrder,
};
use tradecore_rs::queue::QueueWriter;

/// Installs a fmt subscriber honoring `RUST_LOG` so the subsystems'
/// `warn!`/`error!` output is visible when a test fails.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A market-data client whose quotes the test publishes by hand. New
/// subscriptions receive the latest quote as their snapshot.
#[derive(Default)]
pub struct TestMarketDataClient {
    feeds: Mutex<HashMap<Security, Feed>>,
}

#[derive(Default)]
struct Feed {
    latest: Option<BboQuote>,
    writers: Vec<Arc<dyn QueueWriter<BboQuote>>>,
}

impl TestMarketDataClient {
    pub fn new() -> Arc<Self> {
        init_tracing();
        Arc::new(TestMarketDataClient::default())
    }

    /// Publishes a quote to every subscriber and latches it as the
    /// snapshot for future subscribers.
    pub fn publish(&self, security: &Security, quote: BboQuote) {
        let mut feeds = self.feeds.lock();
        let feed = feeds.entry(security.clone()).or_default();
        feed.latest = Some(quote);
        for writer in &feed.writers {
            writer.push(quote);
        }
    }

    /// Closes every subscription for a security.
    pub fn close(&self, security: &Security) {
        if let Some(feed) = self.feeds.lock().get_mut(security) {
            for writer in feed.writers.drain(..) {
                writer.close();
            }
        }
    }
}

impl MarketDataClient for TestMarketDataClient {
    fn query_bbo_quotes(&self, security: &Security, writer: Arc<dyn QueueWriter<BboQuote>>) {
        let mut feeds = self.feeds.lock();
        let feed = feeds.entry(security.clone()).or_default();
        if let Some(quote) = feed.latest {
            writer.push(quote);
        }
        feed.writers.push(writer);
    }
}

/// What the mock driver does when asked to cancel an order.
#[derive(Debug, Clone, Copy)]
pub enum CancelBehavior {
    /// Acknowledge with a zero-quantity CANCELED report.
    Acknowledge,
    /// Race the cancel: fill the order's full open quantity at `price`
    /// before the cancel can take effect.
    FillFirst(Money),
    /// Swallow the cancel, acknowledging nothing.
    Ignore,
}

/// A downstream driver that records every operation and lets the test
/// script the reports.
pub struct MockOrderExecutionDriver {
    pub auto_accept: bool,
    pub cancel_behavior: Mutex<CancelBehavior>,
    orders: Mutex<HashMap<OrderId, Arc<PrimitiveOrder>>>,
    filled: Mutex<HashMap<OrderId, Quantity>>,
    pub submissions: Mutex<Vec<OrderInfo>>,
    pub cancels: Mutex<Vec<OrderId>>,
    pub updates: Mutex<Vec<(OrderId, ExecutionReport)>>,
}

impl MockOrderExecutionDriver {
    pub fn new(auto_accept: bool) -> Arc<Self> {
        init_tracing();
        Arc::new(MockOrderExecutionDriver {
            auto_accept,
            cancel_behavior: Mutex::new(CancelBehavior::Acknowledge),
            orders: Mutex::new(HashMap::new()),
            filled: Mutex::new(HashMap::new()),
            submissions: Mutex::new(Vec::new()),
            cancels: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
        })
    }

    pub fn set_cancel_behavior(&self, behavior: CancelBehavior) {
        *self.cancel_behavior.lock() = behavior;
    }

    pub fn order(&self, order_id: OrderId) -> Option<Arc<PrimitiveOrder>> {
        self.orders.lock().get(&order_id).cloned()
    }

    pub fn submission_quantities(&self) -> Vec<Quantity> {
        self.submissions
            .lock()
            .iter()
            .map(|info| info.fields.quantity)
            .collect()
    }

    fn append(&self, order: &PrimitiveOrder, status: OrderStatus, quantity: Quantity, price: Money) {
        order.with(|current, handle| {
            if current.is_terminal() {
                return;
            }
            if let Some(last) = handle.last() {
                let mut report =
                    ExecutionReport::build_updated_report(last, status, Utc::now());
                report.last_quantity = quantity;
                report.last_price = price;
                handle.update(report);
            }
        });
    }

    /// Acknowledges an order as NEW.
    pub fn accept(&self, order_id: OrderId) {
        if let Some(order) = self.order(order_id) {
            self.append(&order, OrderStatus::New, 0, Money::ZERO);
        }
    }

    /// Emits a fill on an order.
    pub fn fill(&self, order_id: OrderId, status: OrderStatus, quantity: Quantity, price: Money) {
        if let Some(order) = self.order(order_id) {
            self.append(&order, status, quantity, price);
            *self.filled.lock().entry(order_id).or_insert(0) += quantity;
        }
    }
}

impl OrderExecutionDriver for MockOrderExecutionDriver {
    fn submit(&self, info: OrderInfo) -> Arc<PrimitiveOrder> {
        let order = Arc::new(PrimitiveOrder::new(info.clone()));
        self.orders.lock().insert(info.order_id, Arc::clone(&order));
        self.submissions.lock().push(info);
        if self.auto_accept {
            self.append(&order, OrderStatus::New, 0, Money::ZERO);
        }
        order
    }

    fn cancel(&self, _session: &OrderExecutionSession, order_id: OrderId) {
        self.cancels.lock().push(order_id);
        let Some(order) = self.order(order_id) else {
            return;
        };
        let behavior = *self.cancel_behavior.lock();
        match behavior {
            CancelBehavior::Acknowledge => {
                self.append(&order, OrderStatus::Canceled, 0, Money::ZERO);
            }
            CancelBehavior::FillFirst(price) => {
                let open = order.info().fields.quantity
                    - self.filled.lock().get(&order_id).copied().unwrap_or(0);
                if open > 0 {
                    self.fill(order_id, OrderStatus::Filled, open, price);
                }
            }
            CancelBehavior::Ignore => {}
        }
    }

    fn update(
        &self,
        _session: &OrderExecutionSession,
        order_id: OrderId,
        report: ExecutionReport,
    ) {
        self.updates.lock().push((order_id, report));
    }

    fn recover(&self, record: &AccountOrderRecord) -> Arc<PrimitiveOrder> {
        let order = Arc::new(PrimitiveOrder::from_reports(
            record.info.clone(),
            record.reports.clone(),
        ));
        self.orders
            .lock()
            .insert(order.info().order_id, Arc::clone(&order));
        order
    }
}

pub fn trader() -> Account {
    Account::new(1, "trader")
}

pub fn tsx_security() -> Security {
    Security::new("TST", MarketCode::XTSE, CountryCode::CA)
}

pub fn nyse_security() -> Security {
    Security::new("TST", MarketCode::XNYS, CountryCode::US)
}

pub fn bbo(bid: Money, bid_size: Quantity, ask: Money, ask_size: Quantity) -> BboQuote {
    BboQuote::new(
        Quote::new(Side::Bid, bid, bid_size),
        Quote::new(Side::Ask, ask, ask_size),
        Utc::now(),
    )
}

/// Collects an order's reports as (status, last_quantity, last_price)
/// triples.
pub fn report_log(order: &PrimitiveOrder) -> Vec<(OrderStatus, Quantity, Money)> {
    order.with(|_, handle| {
        handle
            .reports()
            .iter()
            .map(|report| (report.status, report.last_quantity, report.last_price))
            .collect()
    })
}

/// Asserts the report sequence is dense from zero with non-decreasing
/// timestamps.
pub fn assert_well_formed_reports(order: &PrimitiveOrder) {
    order.with(|_, handle| {
        let reports = handle.reports();
        for (index, report) in reports.iter().enumerate() {
            assert_eq!(report.sequence, index as u64, "sequence must be dense");
        }
        for pair in reports.windows(2) {
            assert!(
                pair[0].timestamp <= pair[1].timestamp,
                "timestamps must be non-decreasing"
            );
        }
    });
}

pub fn limit_fields(
    security: Security,
    side: Side,
    quantity: Quantity,
    price: Money,
) -> OrderFields {
    OrderFields::limit_order(
        trader(),
        security,
        CurrencyId::CAD,
        side,
        "TSX",
        quantity,
        price,
    )
}
