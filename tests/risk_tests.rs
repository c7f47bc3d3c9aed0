//! End-to-end tests of the risk control loop.

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{MockOrderExecutionDriver, bbo, nyse_security, trader};
use tradecore_rs::prelude::Clock;
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tradecore_rs::definitions::{
    CurrencyId, DestinationDatabase, ExchangeRate, ExchangeRateTable, Money, Rational, Side,
    destinations,
};
use tradecore_rs::order::{
    ExecutionReport, OrderFields, OrderInfo, OrderStatus, PrimitiveOrder, SequentialOrderIds,
};
use tradecore_rs::risk::{
    RISK_CLOSE_TAG, RiskController, RiskParameters, RiskStateEntry, RiskStateType,
};
use tradecore_rs::utils::ManualClock;

struct Harness {
    downstream: Arc<MockOrderExecutionDriver>,
    controller: RiskController<Arc<MockOrderExecutionDriver>>,
    clock: Arc<ManualClock>,
    states: Arc<Mutex<Vec<RiskStateEntry>>>,
}

fn harness(rates: ExchangeRateTable) -> Harness {
    let downstream = MockOrderExecutionDriver::new(true);
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2016, 4, 8, 14, 30, 0).unwrap());
    let controller = RiskController::new(
        downstream.clone(),
        Arc::new(SequentialOrderIds::starting_at(9000)),
        DestinationDatabase::venues(),
        rates,
        clock.clone(),
        std::time::Duration::from_secs(3600),
    );
    let states = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&states);
    controller.monitor_risk_states(Arc::new(move |entry: &RiskStateEntry| {
        recorded.lock().push(entry.clone());
    }));
    Harness {
        downstream,
        controller,
        clock,
        states,
    }
}

fn parameters() -> RiskParameters {
    RiskParameters {
        currency: CurrencyId::USD,
        buying_power: Money::from_dollars(1_000_000),
        allowed_state: RiskStateType::Active,
        net_loss: Money::from_dollars(100_000),
        loss_from_top: Money::from_dollars(1_000),
        transition_time: Duration::seconds(60),
    }
}

/// Builds a filled buy of `quantity` shares at `price` and hands it to the
/// controller.
fn open_position(harness: &Harness, quantity: i64, price: Money) {
    let fields = OrderFields::limit_order(
        trader(),
        nyse_security(),
        CurrencyId::USD,
        Side::Bid,
        destinations::NYSE,
        quantity,
        price,
    );
    let order = Arc::new(PrimitiveOrder::new(OrderInfo::new(
        fields,
        100,
        harness.clock.now(),
    )));
    harness.controller.track_order(trader(), &order);
    order.with(|_, handle| {
        let acknowledged = ExecutionReport::build_updated_report(
            handle.last().expect("initial"),
            OrderStatus::New,
            harness.clock.now(),
        );
        handle.update(acknowledged);
        let mut fill = ExecutionReport::build_updated_report(
            handle.last().expect("acknowledged"),
            OrderStatus::Filled,
            harness.clock.now(),
        );
        fill.last_quantity = quantity;
        fill.last_price = price;
        handle.update(fill);
    });
}

fn mark(harness: &Harness, bid: Money) {
    harness.controller.update_mark(
        nyse_security(),
        bbo(bid, 1000, bid + Money::new(dec!(0.05)), 1000),
    );
}

fn evaluate(harness: &Harness) {
    harness.controller.evaluate_now();
    harness.controller.flush();
}

fn last_state(harness: &Harness) -> Option<RiskStateType> {
    harness.states.lock().last().map(|entry| entry.state.state_type)
}

#[test]
fn test_loss_from_top_trips_close_orders_then_disables() {
    let harness = harness(ExchangeRateTable::new());
    harness.controller.add_account(trader(), parameters());
    open_position(&harness, 100, Money::from_dollars(100));
    mark(&harness, Money::from_dollars(100));
    evaluate(&harness);
    assert_eq!(last_state(&harness), Some(RiskStateType::Active));

    // Gross walks 0, +500, +2000: still fine.
    mark(&harness, Money::from_dollars(105));
    evaluate(&harness);
    mark(&harness, Money::from_dollars(120));
    evaluate(&harness);
    assert_eq!(last_state(&harness), Some(RiskStateType::Active));

    // +800 is a $1200 drawdown from the $2000 peak.
    mark(&harness, Money::from_dollars(108));
    evaluate(&harness);
    assert_eq!(last_state(&harness), Some(RiskStateType::CloseOrders));
    let expiry = harness.states.lock().last().unwrap().state.expiry;
    assert_eq!(expiry, Some(harness.clock.now() + Duration::seconds(60)));

    // A flattening MARKET sell for the whole position went downstream,
    // tagged as a risk-driven close.
    let submissions = harness.downstream.submissions.lock().clone();
    let flattener = submissions.last().expect("flattening order");
    assert_eq!(flattener.fields.side, Side::Ask);
    assert_eq!(flattener.fields.quantity, 100);
    assert_eq!(flattener.fields.destination, destinations::NYSE);
    assert!(
        flattener
            .fields
            .additional_tags
            .iter()
            .any(|tag| tag.key == RISK_CLOSE_TAG)
    );

    // After the transition time the account disables.
    harness.clock.advance(Duration::seconds(61));
    evaluate(&harness);
    assert_eq!(last_state(&harness), Some(RiskStateType::Disabled));
}

#[test]
fn test_disabled_is_absorbing_until_admin_reenables() {
    let harness = harness(ExchangeRateTable::new());
    let mut params = parameters();
    params.transition_time = Duration::seconds(0);
    harness.controller.add_account(trader(), params.clone());
    open_position(&harness, 100, Money::from_dollars(100));
    mark(&harness, Money::from_dollars(100));
    evaluate(&harness);
    // Blow through net loss.
    mark(&harness, Money::from_dollars(50));
    params.net_loss = Money::from_dollars(1_000);
    harness.controller.update_parameters(trader(), params.clone());
    evaluate(&harness);
    assert_eq!(last_state(&harness), Some(RiskStateType::CloseOrders));
    evaluate(&harness);
    assert_eq!(last_state(&harness), Some(RiskStateType::Disabled));

    // Recovery of the portfolio alone does not re-enable.
    mark(&harness, Money::from_dollars(100));
    evaluate(&harness);
    evaluate(&harness);
    assert_eq!(last_state(&harness), Some(RiskStateType::Disabled));

    // An explicit admin push of ACTIVE parameters does.
    harness.controller.update_parameters(trader(), params);
    evaluate(&harness);
    assert_eq!(last_state(&harness), Some(RiskStateType::Active));
}

#[test]
fn test_admin_disable_is_immediate() {
    let harness = harness(ExchangeRateTable::new());
    harness.controller.add_account(trader(), parameters());
    evaluate(&harness);
    assert_eq!(last_state(&harness), Some(RiskStateType::Active));
    let mut params = parameters();
    params.allowed_state = RiskStateType::Disabled;
    harness.controller.update_parameters(trader(), params);
    evaluate(&harness);
    assert_eq!(last_state(&harness), Some(RiskStateType::Disabled));
    assert!(harness.downstream.submissions.lock().is_empty());
}

#[test]
fn test_net_loss_trips_close_orders() {
    let harness = harness(ExchangeRateTable::new());
    let mut params = parameters();
    params.net_loss = Money::from_dollars(400);
    params.loss_from_top = Money::from_dollars(100_000);
    harness.controller.add_account(trader(), params);
    open_position(&harness, 100, Money::from_dollars(100));
    mark(&harness, Money::from_dollars(100));
    evaluate(&harness);
    assert_eq!(last_state(&harness), Some(RiskStateType::Active));
    mark(&harness, Money::from_dollars(95));
    evaluate(&harness);
    assert_eq!(last_state(&harness), Some(RiskStateType::CloseOrders));
}

#[test]
fn test_buying_power_trips_close_orders() {
    let harness = harness(ExchangeRateTable::new());
    let mut params = parameters();
    params.buying_power = Money::from_dollars(5_000);
    harness.controller.add_account(trader(), params);
    open_position(&harness, 100, Money::from_dollars(100));
    mark(&harness, Money::from_dollars(100));
    evaluate(&harness);
    assert_eq!(last_state(&harness), Some(RiskStateType::CloseOrders));
}

#[test]
fn test_missing_exchange_rate_skips_the_account() {
    let harness = harness(ExchangeRateTable::new());
    let mut params = parameters();
    params.currency = CurrencyId::CAD;
    harness.controller.add_account(trader(), params);
    // The position is in USD; no USD/CAD rate is listed.
    open_position(&harness, 100, Money::from_dollars(100));
    mark(&harness, Money::from_dollars(100));
    evaluate(&harness);
    assert_eq!(last_state(&harness), None);

    // Once the rate arrives the account evaluates normally.
    harness.controller.update_rate(ExchangeRate::new(
        CurrencyId::USD,
        CurrencyId::CAD,
        Rational::new(5, 4),
    ));
    evaluate(&harness);
    assert_eq!(last_state(&harness), Some(RiskStateType::Active));
}

#[test]
fn test_inventory_updates_are_published() {
    let harness = harness(ExchangeRateTable::new());
    harness.controller.add_account(trader(), parameters());
    let inventories = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&inventories);
    harness
        .controller
        .monitor_inventories(Arc::new(move |entry: &tradecore_rs::risk::InventoryEntry| {
            recorded.lock().push(entry.clone());
        }));
    open_position(&harness, 100, Money::from_dollars(100));
    harness.controller.flush();
    let published = inventories.lock().clone();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].security, nyse_security());
    assert_eq!(published[0].inventory.position.quantity, 100);
    assert_eq!(
        published[0].inventory.position.cost_basis,
        Money::from_dollars(10_000)
    );
}
