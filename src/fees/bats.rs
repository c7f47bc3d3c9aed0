//! The BATS Exchange fee table.

use crate::definitions::Money;
use crate::fees::common::{FlagFeeGrid, LiquidityFlag};
use crate::fees::config::FeeConfigError;
use crate::order::ExecutionReport;
use serde_json::Value;

/// Stores the table of fees used by BATS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatsFeeTable {
    grid: FlagFeeGrid,
}

impl BatsFeeTable {
    /// Parses the table from its configuration section.
    pub fn from_config(config: &Value) -> Result<Self, FeeConfigError> {
        Ok(BatsFeeTable {
            grid: FlagFeeGrid::from_config(config)?,
        })
    }
}

fn classify(flag: char) -> Option<LiquidityFlag> {
    match flag {
        'R' => Some(LiquidityFlag::Active),
        'A' => Some(LiquidityFlag::Passive),
        _ => None,
    }
}

/// Calculates the fee on a trade executed on BATS.
pub fn calculate_bats_fee(fee_table: &BatsFeeTable, execution_report: &ExecutionReport) -> Money {
    fee_table.grid.fee("BATS", execution_report, classify)
}
