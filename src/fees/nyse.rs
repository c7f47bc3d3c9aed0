//! The New York Stock Exchange fee table.

use crate::definitions::{Money, Rational};
use crate::fees::common::{is_sub_dollar, unknown_liquidity_flag};
use crate::fees::config::{FeeConfigError, parse_money_grid, parse_rational_row};
use crate::order::{ExecutionReport, OrderFields, OrderType, Tag};
use serde_json::Value;

/// The type of a NYSE trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NyseType {
    /// Removed liquidity.
    Active = 0,
    /// Provided liquidity.
    Passive = 1,
}

/// The number of trade types enumerated.
pub const NYSE_TYPE_COUNT: usize = 2;

/// The category of a NYSE trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NyseCategory {
    /// Default category.
    Default = 0,
    /// Hidden order.
    Hidden = 1,
    /// Cross order.
    Cross = 2,
    /// On open.
    OnOpen = 3,
    /// On close.
    OnClose = 4,
    /// Retail order.
    Retail = 5,
}

/// The number of trade categories enumerated.
pub const NYSE_CATEGORY_COUNT: usize = 6;

/// Stores the table of fees used by NYSE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NyseFeeTable {
    /// Per-share fees, indexed by category then type.
    pub fee_table: [[Money; NYSE_TYPE_COUNT]; NYSE_CATEGORY_COUNT],
    /// Percent-of-notional rates for sub-dollar trades, by type.
    pub sub_dollar_table: [Rational; NYSE_TYPE_COUNT],
}

impl NyseFeeTable {
    /// Parses the table from its configuration section.
    pub fn from_config(config: &Value) -> Result<Self, FeeConfigError> {
        Ok(NyseFeeTable {
            fee_table: parse_money_grid(
                config,
                "fee_table",
                ["default", "hidden", "cross", "on_open", "on_close", "retail"],
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
pub fn lookup_nyse_fee(
    fee_table: &NyseFeeTable,
    trade_type: NyseType,
    category: NyseCategory,
) -> Money {
    fee_table.fee_table[category as usize][trade_type as usize]
}

/// Whether the order counts as a hidden liquidity provider: a pegged
/// order carrying the mid-point peg tag.
pub fn is_nyse_hidden_liquidity_provider(order_fields: &OrderFields) -> bool {
    order_fields.order_type == OrderType::Pegged && order_fields.has_field(&Tag::new(18, "M"))
}

/// Calculates the fee on a trade executed on NYSE.
pub fn calculate_nyse_fee(
    fee_table: &NyseFeeTable,
    order_fields: &OrderFields,
    execution_report: &ExecutionReport,
) -> Money {
    if execution_report.last_quantity == 0 {
        return Money::ZERO;
    }
    let is_hidden = is_nyse_hidden_liquidity_provider(order_fields);
    let mut trade_type = NyseType::Active;
    let mut category = NyseCategory::Default;
    let mut characters = execution_report.liquidity_flag.chars();
    match (characters.next(), characters.next()) {
        (Some('1'), None) => {
            trade_type = NyseType::Active;
            if is_hidden {
                category = NyseCategory::Hidden;
            }
        }
        (Some('2'), None) => {
            trade_type = NyseType::Passive;
            if is_hidden {
                category = NyseCategory::Hidden;
            }
        }
        (Some('3'), None) => {
            trade_type = NyseType::Active;
        }
        (Some('5'), None) => {
            trade_type = NyseType::Passive;
            category = NyseCategory::OnOpen;
        }
        (Some('6'), None) | (Some('7'), None) => {
            trade_type = NyseType::Active;
            category = NyseCategory::OnClose;
        }
        (Some('8'), None) => {
            trade_type = NyseType::Passive;
            category = NyseCategory::Retail;
        }
        (Some('9'), None) => {
            trade_type = NyseType::Active;
            category = NyseCategory::Retail;
        }
        _ => unknown_liquidity_flag("NYSE", &execution_report.liquidity_flag),
    }
    if is_sub_dollar(execution_report.last_price) {
        let rate = fee_table.sub_dollar_table[trade_type as usize];
        return rate * (execution_report.last_quantity * execution_report.last_price);
    }
    execution_report.last_quantity * lookup_nyse_fee(fee_table, trade_type, category)
}
