//! The internal-matching order-execution driver.

mod driver;
mod entry;
mod report_builder;

pub use driver::{DEFAULT_MATCH_TIMEOUT, InternalMatchingOrderExecutionDriver};
pub use report_builder::{MatchReportBuilder, PassiveActiveReportBuilder};
