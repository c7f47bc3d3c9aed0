//! The NYSE American (AMEX) fee table.

use crate::definitions::Money;
use crate::fees::common::{FlagFeeGrid, LiquidityFlag};
use crate::fees::config::FeeConfigError;
use crate::order::ExecutionReport;
use serde_json::Value;

/// Stores the table of fees used by AMEX. AMEX reports the NYSE-style
/// numeric liquidity tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmexFeeTable {
    grid: FlagFeeGrid,
}

impl AmexFeeTable {
    /// Parses the table from its configuration section.
    pub fn from_config(config: &Value) -> Result<Self, FeeConfigError> {
        Ok(AmexFeeTable {
            grid: FlagFeeGrid::from_config(config)?,
        })
    }
}

fn classify(flag: char) -> Option<LiquidityFlag> {
    match flag {
        '1' | '3' => Some(LiquidityFlag::Active),
        '2' => Some(LiquidityFlag::Passive),
        _ => None,
    }
}

/// Calculates the fee on a trade executed on AMEX.
pub fn calculate_amex_fee(fee_table: &AmexFeeTable, execution_report: &ExecutionReport) -> Money {
    fee_table.grid.fee("AMEX", execution_report, classify)
}
