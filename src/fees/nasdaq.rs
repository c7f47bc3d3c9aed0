//! The NASDAQ fee table.

use crate::definitions::{Money, Rational};
use crate::fees::common::{
    LIQUIDITY_FLAG_COUNT, LiquidityFlag, is_sub_dollar, unknown_liquidity_flag,
};
use crate::fees::config::{FeeConfigError, parse_money_grid, parse_rational_row};
use crate::order::ExecutionReport;
use serde_json::Value;

/// The category of a NASDAQ trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NasdaqCategory {
    /// Continuous-session trade.
    Default = 0,
    /// Opening cross.
    OnOpen = 1,
    /// Closing cross.
    OnClose = 2,
}

/// The number of trade categories enumerated.
pub const NASDAQ_CATEGORY_COUNT: usize = 3;

/// Stores the table of fees used by NASDAQ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NasdaqFeeTable {
    /// Per-share fees, indexed by category then liquidity flag.
    pub fee_table: [[Money; LIQUIDITY_FLAG_COUNT]; NASDAQ_CATEGORY_COUNT],
    /// Percent-of-notional rates for sub-dollar trades, by liquidity flag.
    pub sub_dollar_table: [Rational; LIQUIDITY_FLAG_COUNT],
}

impl NasdaqFeeTable {
    /// Parses the table from its configuration section.
    pub fn from_config(config: &Value) -> Result<Self, FeeConfigError> {
        Ok(NasdaqFeeTable {
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
pub fn lookup_nasdaq_fee(
    fee_table: &NasdaqFeeTable,
    flag: LiquidityFlag,
    category: NasdaqCategory,
) -> Money {
    fee_table.fee_table[category as usize][flag as usize]
}

/// Calculates the fee on a trade executed on NASDAQ. 'A' adds liquidity,
/// 'R' removes it, 'O' and 'C' print in the opening and closing crosses.
pub fn calculate_nasdaq_fee(
    fee_table: &NasdaqFeeTable,
    execution_report: &ExecutionReport,
) -> Money {
    if execution_report.last_quantity == 0 {
        return Money::ZERO;
    }
    let mut flag = LiquidityFlag::Active;
    let mut category = NasdaqCategory::Default;
    let mut characters = execution_report.liquidity_flag.chars();
    match (characters.next(), characters.next()) {
        (Some('A'), None) => flag = LiquidityFlag::Passive,
        (Some('R'), None) => flag = LiquidityFlag::Active,
        (Some('O'), None) => category = NasdaqCategory::OnOpen,
        (Some('C'), None) => category = NasdaqCategory::OnClose,
        _ => unknown_liquidity_flag("NASDAQ", &execution_report.liquidity_flag),
    }
    if is_sub_dollar(execution_report.last_price) {
        let rate = fee_table.sub_dollar_table[flag as usize];
        return rate * (execution_report.last_quantity * execution_report.last_price);
    }
    execution_report.last_quantity * lookup_nasdaq_fee(fee_table, flag, category)
}
