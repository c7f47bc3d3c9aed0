//! # Trading Platform Core
//!
//! The core subsystems of an equities trading platform for North American
//! and Australian markets: order routing with internalization, simulated
//! execution, venue fee calculation and per-account risk control.
//!
//! ## Subsystems
//!
//! - **Domain model** ([`definitions`], [`order`]): fixed-point
//!   [`Money`](definitions::Money), securities, quotes, order fields,
//!   execution reports and the mutex-guarded
//!   [`PrimitiveOrder`](order::PrimitiveOrder) aggregate with its
//!   replay-then-stream report publisher.
//!
//! - **Simulated execution engine** ([`simulator`]): one
//!   [`SecurityOrderSimulator`](simulator::SecurityOrderSimulator) per
//!   security drives submitted orders through their state machines
//!   against a live best-bid-and-offer stream, filling in board lots.
//!
//! - **Internal matching driver** ([`matcher`]): an
//!   [`OrderExecutionDriver`](order::OrderExecutionDriver) layer that
//!   keeps per-security books of the orders routed through this process
//!   and crosses new orders against resting contra-side orders — never
//!   through the public quote — before forwarding the residue to the
//!   wrapped driver. The cancel round-trip that reserves a resting order
//!   tolerates the downstream filling it first.
//!
//! - **Fee pipeline** ([`fees`]): pure per-venue fee tables (AMEX, ARCA,
//!   BATS, BATY, EDGA, EDGX, NASDAQ, NYSE, NEOE, PURE) loaded from
//!   configuration, plus a consolidated US dispatcher that accumulates
//!   execution, processing and commission charges onto reports.
//!
//! - **Risk control loop** ([`risk`]): true-average bookkeeping, a
//!   marked-to-market multi-currency portfolio per account, and a
//!   controller that walks accounts ACTIVE → CLOSE_ORDERS → DISABLED,
//!   flattening positions on the way.
//!
//! ## Scheduling model
//!
//! Subsystem instances are internally single-threaded: every mutating
//! input runs to completion on a serialized [`queue::TaskQueue`]. The
//! matcher's submission queue additionally parks on bounded
//! [`queue::FlagCondition`] rendezvous while the downstream driver
//! acknowledges or cancels a resting order; a timeout aborts only the
//! match being attempted. Market data flows through single-slot
//! [`queue::StateQueue`]s that latch the most recent quote.

pub mod definitions;
pub mod fees;
pub mod matcher;
pub mod order;
pub mod prelude;
pub mod queue;
pub mod risk;
pub mod simulator;
pub mod utils;

pub use definitions::{BboQuote, Money, Quantity, Security, Side};
pub use matcher::InternalMatchingOrderExecutionDriver;
pub use order::{
    ExecutionReport, OrderExecutionDriver, OrderFields, OrderId, OrderInfo, OrderStatus,
    PrimitiveOrder,
};
pub use risk::{RiskController, RiskParameters, RiskState};
pub use simulator::{SecurityOrderSimulator, SimulationOrderExecutionDriver};
