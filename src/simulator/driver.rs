//! An order-execution driver backed by per-security simulators.

use crate::definitions::Security;
use crate::order::{
    AccountOrderRecord, ExecutionReport, MarketDataClient, OrderExecutionDriver,
    OrderExecutionSession, OrderId, OrderInfo, PrimitiveOrder,
};
use crate::simulator::SecurityOrderSimulator;
use crate::utils::Clock;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Routes submissions to a lazily created [`SecurityOrderSimulator`] per
/// security. The standard downstream driver for simulated deployments.
pub struct SimulationOrderExecutionDriver {
    market_data: Arc<dyn MarketDataClient>,
    clock: Arc<dyn Clock>,
    simulators: DashMap<Security, Arc<SecurityOrderSimulator>>,
    orders: DashMap<OrderId, Arc<PrimitiveOrder>>,
}

impl SimulationOrderExecutionDriver {
    /// Builds a driver over the given market-data source and clock.
    pub fn new(market_data: Arc<dyn MarketDataClient>, clock: Arc<dyn Clock>) -> Self {
        SimulationOrderExecutionDriver {
            market_data,
            clock,
            simulators: DashMap::new(),
            orders: DashMap::new(),
        }
    }

    fn simulator(&self, security: &Security) -> Arc<SecurityOrderSimulator> {
        self.simulators
            .entry(security.clone())
            .or_insert_with(|| {
                info!(%security, "starting order simulator");
                Arc::new(SecurityOrderSimulator::new(
                    self.market_data.as_ref(),
                    security,
                    Arc::clone(&self.clock),
                ))
            })
            .clone()
    }

    /// Blocks until every simulator has drained its queue. Test hook.
    pub fn flush(&self) {
        let simulators: Vec<Arc<SecurityOrderSimulator>> = self
            .simulators
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for simulator in simulators {
            simulator.flush();
        }
    }
}

impl OrderExecutionDriver for SimulationOrderExecutionDriver {
    fn submit(&self, info: OrderInfo) -> Arc<PrimitiveOrder> {
        let security = info.fields.security.clone();
        let order = Arc::new(PrimitiveOrder::new(info));
        self.orders.insert(order.info().order_id, Arc::clone(&order));
        self.simulator(&security).submit(&order);
        order
    }

    fn cancel(&self, _session: &OrderExecutionSession, order_id: OrderId) {
        let Some(order) = self.orders.get(&order_id).map(|entry| entry.clone()) else {
            warn!(order_id, "cancel for unknown order");
            return;
        };
        self.simulator(&order.info().fields.security).cancel(&order);
    }

    fn update(
        &self,
        _session: &OrderExecutionSession,
        order_id: OrderId,
        report: ExecutionReport,
    ) {
        let Some(order) = self.orders.get(&order_id).map(|entry| entry.clone()) else {
            warn!(order_id, "update for unknown order");
            return;
        };
        self.simulator(&order.info().fields.security)
            .update(&order, report);
    }

    fn recover(&self, record: &AccountOrderRecord) -> Arc<PrimitiveOrder> {
        let order = Arc::new(PrimitiveOrder::from_reports(
            record.info.clone(),
            record.reports.clone(),
        ));
        self.orders.insert(order.info().order_id, Arc::clone(&order));
        self.simulator(&order.info().fields.security).recover(&order);
        order
    }
}
