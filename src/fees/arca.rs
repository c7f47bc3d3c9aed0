//! The NYSE Arca fee table.

use crate::definitions::{Money, Rational};
use crate::fees::common::{LIQUIDITY_FLAG_COUNT, LiquidityFlag, classify_flag, is_sub_dollar};
use crate::fees::config::{FeeConfigError, parse_money_grid, parse_rational_row};
use crate::order::{ExecutionReport, OrderFields, TimeInForce};
use serde_json::Value;

/// The category of an ARCA trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcaCategory {
    /// Continuous-session trade.
    Default = 0,
    /// Opening auction.
    OnOpen = 1,
    /// Closing auction.
    OnClose = 2,
}

/// The number of trade categories enumerated.
pub const ARCA_CATEGORY_COUNT: usize = 3;

/// Stores the table of fees used by ARCA. The auction category is taken
/// from the order's time-in-force, which is why the calculation needs the
/// order's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcaFeeTable {
    /// Per-share fees, indexed by category then liquidity flag.
    pub fee_table: [[Money; LIQUIDITY_FLAG_COUNT]; ARCA_CATEGORY_COUNT],
    /// Percent-of-notional rates for sub-dollar trades, by liquidity flag.
    pub sub_dollar_table: [Rational; LIQUIDITY_FLAG_COUNT],
}

impl ArcaFeeTable {
    /// Parses the table from its configuration section.
    pub fn from_config(config: &Value) -> Result<Self, FeeConfigError> {
        Ok(ArcaFeeTable {
            fee_table: parse_money_grid(
                config,
                "fee_table",
                ["default", "on_open", "on_close"],
                ["active", "passive"],
            )?,
            sub_dollar_table: parse_rational_row(
                config,
                "sub_dollar_table",
                ["active", "passive"],
            )?,
        })
    }
}

/// Looks up a per-share fee.
pub fn lookup_arca_fee(
    fee_table: &ArcaFeeTable,
    flag: LiquidityFlag,
    category: ArcaCategory,
) -> Money {
    fee_table.fee_table[category as usize][flag as usize]
}

/// Calculates the fee on a trade executed on ARCA.
pub fn calculate_arca_fee(
    fee_table: &ArcaFeeTable,
    order_fields: &OrderFields,
    execution_report: &ExecutionReport,
) -> Money {
    if execution_report.last_quantity == 0 {
        return Money::ZERO;
    }
    let category = match order_fields.time_in_force {
        TimeInForce::Opg => ArcaCategory::OnOpen,
        TimeInForce::Moc => ArcaCategory::OnClose,
        _ => ArcaCategory::Default,
    };
    let flag = classify_flag("ARCA", execution_report, |flag| match flag {
        'R' => Some(LiquidityFlag::Active),
        'A' => Some(LiquidityFlag::Passive),
        _ => None,
    });
    if is_sub_dollar(execution_report.last_price) {
        let rate = fee_table.sub_dollar_table[flag as usize];
        return rate * (execution_report.last_quantity * execution_report.last_price);
    }
    execution_report.last_quantity * lookup_arca_fee(fee_table, flag, category)
}
