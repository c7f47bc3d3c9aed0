//! The Aequitas NEO Exchange fee table.

use crate::definitions::Money;
use crate::fees::common::{LIQUIDITY_FLAG_COUNT, LiquidityFlag, classify_flag, is_sub_dollar};
use crate::fees::config::{FeeConfigError, parse_money_grid};
use crate::order::{ExecutionReport, OrderFields};
use serde_json::Value;

/// The price class of a NEOE trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeoePriceClass {
    /// Price at or above one dollar.
    Default = 0,
    /// Price below one dollar.
    SubDollar = 1,
}

/// The number of price classes enumerated.
pub const NEOE_PRICE_CLASS_COUNT: usize = 2;

/// Stores the table of fees used by NEOE: one general table and one for
/// securities interlisted on a US exchange. Both classes charge per
/// share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeoeFeeTable {
    /// The general fee table, indexed by price class then liquidity flag.
    pub general_fee_table: [[Money; LIQUIDITY_FLAG_COUNT]; NEOE_PRICE_CLASS_COUNT],
    /// The interlisted fee table, indexed the same way.
    pub interlisted_fee_table: [[Money; LIQUIDITY_FLAG_COUNT]; NEOE_PRICE_CLASS_COUNT],
}

impl NeoeFeeTable {
    /// Parses the table from its configuration section.
    pub fn from_config(config: &Value) -> Result<Self, FeeConfigError> {
        Ok(NeoeFeeTable {
            general_fee_table: parse_money_grid(
                config,
                "general_fee_table",
                ["default", "sub_dollar"],
                ["active", "passive"],
            )?,
            interlisted_fee_table: parse_money_grid(
                config,
                "interlisted_fee_table",
                ["default", "sub_dollar"],
                ["active", "passive"],
            )?,
        })
    }
}

/// Looks up a fee on the general table.
pub fn lookup_neoe_general_fee(
    fee_table: &NeoeFeeTable,
    flag: LiquidityFlag,
    price_class: NeoePriceClass,
) -> Money {
    fee_table.general_fee_table[price_class as usize][flag as usize]
}

/// Looks up a fee on the interlisted table.
pub fn lookup_neoe_interlisted_fee(
    fee_table: &NeoeFeeTable,
    flag: LiquidityFlag,
    price_class: NeoePriceClass,
) -> Money {
    fee_table.interlisted_fee_table[price_class as usize][flag as usize]
}

/// Calculates the fee on a trade executed on NEOE.
pub fn calculate_neoe_fee(
    fee_table: &NeoeFeeTable,
    is_interlisted: bool,
    _order_fields: &OrderFields,
    execution_report: &ExecutionReport,
) -> Money {
    if execution_report.last_quantity == 0 {
        return Money::ZERO;
    }
    let flag = classify_flag("NEOE", execution_report, |flag| match flag {
        'A' => Some(LiquidityFlag::Active),
        'P' => Some(LiquidityFlag::Passive),
        _ => None,
    });
    let price_class = if is_sub_dollar(execution_report.last_price) {
        NeoePriceClass::SubDollar
    } else {
        NeoePriceClass::Default
    };
    let fee = if is_interlisted {
        lookup_neoe_interlisted_fee(fee_table, flag, price_class)
    } else {
        lookup_neoe_general_fee(fee_table, flag, price_class)
    };
    execution_report.last_quantity * fee
}
