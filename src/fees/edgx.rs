//! The EDGX Exchange fee table.

use crate::definitions::Money;
use crate::fees::common::{FlagFeeGrid, LiquidityFlag};
use crate::fees::config::FeeConfigError;
use crate::order::ExecutionReport;
use serde_json::Value;

/// Stores the table of fees used by EDGX.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgxFeeTable {
    grid: FlagFeeGrid,
}

impl EdgxFeeTable {
    /// Parses the table from its configuration section.
    pub fn from_config(config: &Value) -> Result<Self, FeeConfigError> {
        Ok(EdgxFeeTable {
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

/// Calculates the fee on a trade executed on EDGX.
pub fn calculate_edgx_fee(fee_table: &EdgxFeeTable, execution_report: &ExecutionReport) -> Money {
    fee_table.grid.fee("EDGX", execution_report, classify)
}
