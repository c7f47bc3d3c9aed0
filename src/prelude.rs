//! Prelude module that re-exports commonly used types and traits.
//!
//! ```rust
//! use tradecore_rs::prelude::*;
//! ```

// Domain model
pub use crate::definitions::{
    Account, BboQuote, CountryCode, CurrencyId, DestinationDatabase, ExchangeRate,
    ExchangeRateTable, MarketCode, MarketDatabase, Money, Quantity, Quote, Rational, Security,
    Side, destinations, offer_comparator,
};

// Orders and reports
pub use crate::order::{
    AccountOrderRecord, BoardLotCheck, CheckedOrderExecutionDriver, ExecutionReport,
    MarketDataClient, OrderExecutionDriver, OrderExecutionSession, OrderFields, OrderId,
    OrderIdAllocator, OrderInfo, OrderStatus, OrderType, PrimitiveOrder, SequentialOrderIds, Tag,
    TimeInForce,
};

// Execution drivers
pub use crate::matcher::{
    InternalMatchingOrderExecutionDriver, MatchReportBuilder, PassiveActiveReportBuilder,
};
pub use crate::simulator::{BOARD_LOT, SecurityOrderSimulator, SimulationOrderExecutionDriver};

// Fees
pub use crate::fees::{
    ConsolidatedUsFeeTable, LiquidityFlag, NeoeFeeTable, NyseFeeTable, PureFeeTable,
    calculate_consolidated_us_fee, calculate_neoe_fee, calculate_nyse_fee, calculate_pure_fee,
};

// Risk
pub use crate::risk::{
    Inventory, Portfolio, RiskController, RiskParameters, RiskState, RiskStateType,
    TrueAverageBookkeeper,
};

// Scheduling primitives
pub use crate::queue::{QueueError, QueueWriter, StateQueue, TaskQueue};

// Clocks
pub use crate::utils::{Clock, ManualClock, SystemClock};
