//! The EDGA Exchange fee table.

use crate::definitions::Money;
use crate::fees::common::{FlagFeeGrid, LiquidityFlag};
use crate::fees::config::FeeConfigError;
use crate::order::ExecutionReport;
use serde_json::Value;

/// Stores the table of fees used by EDGA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgaFeeTable {
    grid: FlagFeeGrid,
}

impl EdgaFeeTable {
    /// Parses the table from its configuration section.
    pub fn from_config(config: &Value) -> Result<Self, FeeConfigError> {
        Ok(EdgaFeeTable {
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

/// Calculates the fee on a trade executed on EDGA.
pub fn calculate_edga_fee(fee_table: &EdgaFeeTable, execution_report: &ExecutionReport) -> Money {
    fee_table.grid.fee("EDGA", execution_report, classify)
}
