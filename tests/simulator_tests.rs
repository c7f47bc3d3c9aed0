//! End-to-end tests of the simulated order-execution engine.

mod common;

use chrono::{Duration, TimeZone, Utc};
use tradecore_rs::prelude::Clock;
use common::{TestMarketDataClient, assert_well_formed_reports, bbo, report_log, trader, tsx_security};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tradecore_rs::definitions::{CountryCode, CurrencyId, MarketCode, Money, Security, Side};
use tradecore_rs::order::{
    AccountOrderRecord, BoardLotCheck, CheckedOrderExecutionDriver, ClosingPriceSource,
    ExecutionReport, MarketDataClient, OrderExecutionDriver, OrderExecutionSession, OrderFields,
    OrderInfo, OrderStatus,
};
use tradecore_rs::simulator::SimulationOrderExecutionDriver;
use tradecore_rs::utils::ManualClock;

fn clock() -> Arc<ManualClock> {
    ManualClock::new(Utc.with_ymd_and_hms(2016, 4, 8, 14, 30, 0).unwrap())
}

fn session() -> OrderExecutionSession {
    OrderExecutionSession::new(trader())
}

fn limit_fields(side: Side, quantity: i64, price: Money) -> OrderFields {
    OrderFields::limit_order(
        trader(),
        tsx_security(),
        CurrencyId::CAD,
        side,
        "TSX",
        quantity,
        price,
    )
}

#[test]
fn test_limit_bid_fills_when_ask_is_at_limit() {
    let market_data = TestMarketDataClient::new();
    let clock = clock();
    market_data.publish(
        &tsx_security(),
        bbo(Money::new(dec!(0.99)), 1000, Money::new(dec!(1.00)), 500),
    );
    let driver = SimulationOrderExecutionDriver::new(market_data.clone(), clock.clone());
    let fields = limit_fields(Side::Bid, 100, Money::new(dec!(1.00)));
    let order = driver.submit(OrderInfo::new(fields, 1, clock.now()));
    driver.flush();
    assert_eq!(
        report_log(&order),
        vec![
            (OrderStatus::PendingNew, 0, Money::ZERO),
            (OrderStatus::New, 0, Money::ZERO),
            (OrderStatus::Filled, 100, Money::new(dec!(1.00))),
        ]
    );
    assert_well_formed_reports(&order);
    // NEW preserves the submission timestamp.
    order.with(|_, handle| {
        assert_eq!(handle.reports()[1].timestamp, order.info().timestamp);
    });
}

#[test]
fn test_market_on_close_orders_do_not_fill() {
    let market_data = TestMarketDataClient::new();
    let clock = clock();
    market_data.publish(
        &tsx_security(),
        bbo(Money::new(dec!(1.00)), 100, Money::new(dec!(1.01)), 100),
    );
    let driver = SimulationOrderExecutionDriver::new(market_data.clone(), clock.clone());
    let fields = OrderFields::market_order(
        trader(),
        tsx_security(),
        CurrencyId::CAD,
        Side::Bid,
        "TSX",
        300,
    )
    .with_time_in_force(tradecore_rs::order::TimeInForce::Moc);
    let order = driver.submit(OrderInfo::new(fields, 2, clock.now()));
    driver.flush();
    assert_eq!(
        report_log(&order),
        vec![
            (OrderStatus::PendingNew, 0, Money::ZERO),
            (OrderStatus::New, 0, Money::ZERO),
        ]
    );
    assert_eq!(order.status(), OrderStatus::New);
}

#[test]
fn test_market_orders_fill_at_the_contra_top() {
    let market_data = TestMarketDataClient::new();
    let clock = clock();
    market_data.publish(
        &tsx_security(),
        bbo(Money::new(dec!(9.98)), 500, Money::new(dec!(10.02)), 500),
    );
    let driver = SimulationOrderExecutionDriver::new(market_data.clone(), clock.clone());
    let bid = driver.submit(OrderInfo::new(
        OrderFields::market_order(trader(), tsx_security(), CurrencyId::CAD, Side::Bid, "TSX", 100),
        3,
        clock.now(),
    ));
    let ask = driver.submit(OrderInfo::new(
        OrderFields::market_order(trader(), tsx_security(), CurrencyId::CAD, Side::Ask, "TSX", 100),
        4,
        clock.now(),
    ));
    driver.flush();
    assert_eq!(
        report_log(&bid).last(),
        Some(&(OrderStatus::Filled, 100, Money::new(dec!(10.02))))
    );
    assert_eq!(
        report_log(&ask).last(),
        Some(&(OrderStatus::Filled, 100, Money::new(dec!(9.98))))
    );
}

#[test]
fn test_multi_lot_fill_is_partials_then_filled() {
    let market_data = TestMarketDataClient::new();
    let clock = clock();
    market_data.publish(
        &tsx_security(),
        bbo(Money::new(dec!(0.99)), 1000, Money::new(dec!(1.00)), 1000),
    );
    let driver = SimulationOrderExecutionDriver::new(market_data.clone(), clock.clone());
    let order = driver.submit(OrderInfo::new(
        limit_fields(Side::Bid, 300, Money::new(dec!(1.00))),
        5,
        clock.now(),
    ));
    driver.flush();
    assert_eq!(
        report_log(&order)[2..],
        [
            (OrderStatus::PartiallyFilled, 100, Money::new(dec!(1.00))),
            (OrderStatus::PartiallyFilled, 100, Money::new(dec!(1.00))),
            (OrderStatus::Filled, 100, Money::new(dec!(1.00))),
        ]
    );
    assert_well_formed_reports(&order);
}

#[test]
fn test_order_waits_for_a_crossing_quote() {
    let market_data = TestMarketDataClient::new();
    let clock = clock();
    market_data.publish(
        &tsx_security(),
        bbo(Money::new(dec!(0.95)), 1000, Money::new(dec!(1.05)), 1000),
    );
    let driver = SimulationOrderExecutionDriver::new(market_data.clone(), clock.clone());
    let order = driver.submit(OrderInfo::new(
        limit_fields(Side::Bid, 100, Money::new(dec!(1.00))),
        6,
        clock.now(),
    ));
    driver.flush();
    assert_eq!(order.status(), OrderStatus::New);
    clock.advance(Duration::seconds(1));
    market_data.publish(
        &tsx_security(),
        bbo(Money::new(dec!(0.95)), 1000, Money::new(dec!(0.99)), 1000),
    );
    driver.flush();
    assert_eq!(
        report_log(&order).last(),
        Some(&(OrderStatus::Filled, 100, Money::new(dec!(0.99))))
    );
}

#[test]
fn test_no_quote_means_no_fills() {
    let market_data = TestMarketDataClient::new();
    let clock = clock();
    let driver = SimulationOrderExecutionDriver::new(market_data.clone(), clock.clone());
    let order = driver.submit(OrderInfo::new(
        limit_fields(Side::Bid, 100, Money::new(dec!(1.00))),
        7,
        clock.now(),
    ));
    driver.flush();
    assert_eq!(order.status(), OrderStatus::New);
}

#[test]
fn test_cancel_emits_pending_cancel_then_canceled() {
    let market_data = TestMarketDataClient::new();
    let clock = clock();
    market_data.publish(
        &tsx_security(),
        bbo(Money::new(dec!(0.95)), 1000, Money::new(dec!(1.05)), 1000),
    );
    let driver = SimulationOrderExecutionDriver::new(market_data.clone(), clock.clone());
    let order = driver.submit(OrderInfo::new(
        limit_fields(Side::Bid, 100, Money::new(dec!(1.00))),
        8,
        clock.now(),
    ));
    driver.flush();
    clock.advance(Duration::seconds(5));
    driver.cancel(&session(), 8);
    driver.flush();
    let statuses: Vec<OrderStatus> = report_log(&order).iter().map(|r| r.0).collect();
    assert_eq!(
        statuses,
        vec![
            OrderStatus::PendingNew,
            OrderStatus::New,
            OrderStatus::PendingCancel,
            OrderStatus::Canceled,
        ]
    );
    order.with(|_, handle| {
        let reports = handle.reports();
        assert_eq!(reports[2].timestamp, reports[3].timestamp);
        assert_eq!(reports[3].timestamp, clock.now());
    });
}

#[test]
fn test_cancel_of_terminal_order_is_a_no_op() {
    let market_data = TestMarketDataClient::new();
    let clock = clock();
    market_data.publish(
        &tsx_security(),
        bbo(Money::new(dec!(0.99)), 1000, Money::new(dec!(1.00)), 500),
    );
    let driver = SimulationOrderExecutionDriver::new(market_data.clone(), clock.clone());
    let order = driver.submit(OrderInfo::new(
        limit_fields(Side::Bid, 100, Money::new(dec!(1.00))),
        9,
        clock.now(),
    ));
    driver.flush();
    assert_eq!(order.status(), OrderStatus::Filled);
    driver.cancel(&session(), 9);
    driver.flush();
    assert_eq!(order.status(), OrderStatus::Filled);
    order.with(|_, handle| assert_eq!(handle.reports().len(), 3));
}

#[test]
fn test_administrative_update_resequences_and_timestamps() {
    let market_data = TestMarketDataClient::new();
    let clock = clock();
    market_data.publish(
        &tsx_security(),
        bbo(Money::new(dec!(0.95)), 1000, Money::new(dec!(1.05)), 1000),
    );
    let driver = SimulationOrderExecutionDriver::new(market_data.clone(), clock.clone());
    let order = driver.submit(OrderInfo::new(
        limit_fields(Side::Bid, 100, Money::new(dec!(1.00))),
        10,
        clock.now(),
    ));
    driver.flush();
    clock.advance(Duration::seconds(2));
    let mut suspension = ExecutionReport::default();
    suspension.id = 10;
    suspension.status = OrderStatus::Suspended;
    suspension.timestamp = chrono::DateTime::<Utc>::MIN_UTC;
    driver.update(&session(), 10, suspension);
    driver.flush();
    order.with(|status, handle| {
        assert_eq!(status, OrderStatus::Suspended);
        let last = handle.last().expect("has reports");
        assert_eq!(last.sequence, 2);
        assert_eq!(last.timestamp, clock.now());
    });
}

#[test]
fn test_recover_rehydrates_and_matches() {
    let market_data = TestMarketDataClient::new();
    let clock = clock();
    market_data.publish(
        &tsx_security(),
        bbo(Money::new(dec!(0.99)), 1000, Money::new(dec!(1.00)), 500),
    );
    let driver = SimulationOrderExecutionDriver::new(market_data.clone(), clock.clone());
    let fields = limit_fields(Side::Bid, 100, Money::new(dec!(1.00)));
    let timestamp = clock.now() - Duration::minutes(10);
    let info = OrderInfo::new(fields, 11, timestamp);
    let initial = ExecutionReport::initial_report(11, timestamp);
    let acknowledged =
        ExecutionReport::build_updated_report(&initial, OrderStatus::New, timestamp);
    let record = AccountOrderRecord {
        account: trader(),
        info,
        reports: vec![initial, acknowledged],
    };
    let order = driver.recover(&record);
    driver.flush();
    assert_eq!(
        report_log(&order).last(),
        Some(&(OrderStatus::Filled, 100, Money::new(dec!(1.00))))
    );
    assert_well_formed_reports(&order);
}

#[test]
fn test_board_lot_rejection_produces_a_single_rejected_report() {
    struct FixedClose(Money);

    impl ClosingPriceSource for FixedClose {
        fn previous_close(&self, _security: &Security) -> Option<Money> {
            Some(self.0)
        }
    }

    let market_data = TestMarketDataClient::new();
    let clock = clock();
    let simulation = Arc::new(SimulationOrderExecutionDriver::new(
        market_data.clone(),
        clock.clone(),
    ));
    let board_lot = BoardLotCheck::new(
        market_data.clone() as Arc<dyn MarketDataClient>,
        Arc::new(FixedClose(Money::new(dec!(0.05)))),
        clock.clone(),
    );
    let driver =
        CheckedOrderExecutionDriver::new(simulation, vec![Box::new(board_lot)], clock.clone());
    let venture = Security::new("TST", MarketCode::XTSX, CountryCode::CA);
    let fields = OrderFields::limit_order(
        trader(),
        venture,
        CurrencyId::CAD,
        Side::Bid,
        "TSX",
        700,
        Money::new(dec!(0.05)),
    );
    let order = driver.submit(OrderInfo::new(fields, 21, clock.now()));
    // Exactly one report beyond PENDING_NEW, and nothing reached the
    // simulator.
    let statuses: Vec<OrderStatus> = report_log(&order).iter().map(|r| r.0).collect();
    assert_eq!(statuses, vec![OrderStatus::PendingNew, OrderStatus::Rejected]);
    order.with(|_, handle| {
        let last = handle.last().expect("has reports");
        assert_eq!(last.sequence, 1);
        assert_eq!(last.text(), Some("Quantity must be a multiple of 1000."));
    });
    driver.driver().flush();
    assert_eq!(order.status(), OrderStatus::Rejected);
}

mod report_stream_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        /// Whatever the order size, the report stream stays dense from
        /// zero, every fill is a whole board lot, and a FILLED terminal
        /// accounts for the full lot-aligned quantity.
        #[test]
        fn prop_fill_streams_are_dense_and_account_for_quantity(lots in 1i64..20) {
            let market_data = TestMarketDataClient::new();
            let clock = clock();
            market_data.publish(
                &tsx_security(),
                bbo(Money::new(dec!(0.99)), 1000, Money::new(dec!(1.00)), 1000),
            );
            let driver = SimulationOrderExecutionDriver::new(market_data.clone(), clock.clone());
            let quantity = lots * 100;
            let order = driver.submit(OrderInfo::new(
                limit_fields(Side::Bid, quantity, Money::new(dec!(1.00))),
                1,
                clock.now(),
            ));
            driver.flush();
            assert_well_formed_reports(&order);
            order.with(|status, handle| {
                prop_assert_eq!(status, OrderStatus::Filled);
                let mut filled = 0;
                for report in handle.reports() {
                    prop_assert!(report.last_quantity >= 0);
                    if report.last_quantity > 0 {
                        prop_assert_eq!(report.last_quantity % 100, 0);
                        filled += report.last_quantity;
                    }
                }
                prop_assert_eq!(filled, quantity);
                Ok(())
            })?;
        }
    }
}

#[test]
fn test_sub_lot_residue_is_never_filled() {
    let market_data = TestMarketDataClient::new();
    let clock = clock();
    market_data.publish(
        &tsx_security(),
        bbo(Money::new(dec!(0.99)), 1000, Money::new(dec!(1.00)), 500),
    );
    let driver = SimulationOrderExecutionDriver::new(market_data.clone(), clock.clone());
    let order = driver.submit(OrderInfo::new(
        limit_fields(Side::Bid, 50, Money::new(dec!(1.00))),
        12,
        clock.now(),
    ));
    driver.flush();
    // Below one board lot nothing fills; the order stays live.
    assert_eq!(order.status(), OrderStatus::New);
}
