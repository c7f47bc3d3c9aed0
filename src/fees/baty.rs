//! The BATS Y-Exchange fee table.

use crate::definitions::Money;
use crate::fees::common::{FlagFeeGrid, LiquidityFlag};
use crate::fees::config::FeeConfigError;
use crate::order::ExecutionReport;
use serde_json::Value;

/// Stores the table of fees used by BATY. The Y-Exchange runs an inverted
/// schedule, so the passive rate is typically the charge and the active
/// rate the rebate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatyFeeTable {
    grid: FlagFeeGrid,
}

impl BatyFeeTable {
    /// Parses the table from its configuration section.
    pub fn from_config(config: &Value) -> Result<Self, FeeConfigError> {
        Ok(BatyFeeTable {
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

/// Calculates the fee on a trade executed on BATY.
pub fn calculate_baty_fee(fee_table: &BatyFeeTable, execution_report: &ExecutionReport) -> Money {
    fee_table.grid.fee("BATY", execution_report, classify)
}
