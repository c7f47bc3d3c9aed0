//! The Pure Trading (Canadian ATS) fee table.

use crate::definitions::{MarketCode, MarketDatabase, Money, Security};
use crate::fees::common::{
    LIQUIDITY_FLAG_COUNT, LiquidityFlag, classify_flag, is_sub_dime, is_sub_dollar,
};
use crate::fees::config::{FeeConfigError, entry, parse_money, parse_money_grid};
use crate::order::ExecutionReport;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// The price class of a PURE trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurePriceClass {
    /// Price at or above one dollar on a designated security.
    Designated = 0,
    /// Price at or above one dollar.
    Default = 1,
    /// Price at or above ten cents and below one dollar.
    SubDollar = 2,
    /// Price below ten cents.
    SubDime = 3,
}

/// The number of price classes enumerated.
pub const PURE_PRICE_CLASS_COUNT: usize = 4;

/// Stores the table of fees used by Pure on TSX and TSX Venture listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PureFeeTable {
    /// The TSX listed fee table, indexed by price class then liquidity
    /// flag.
    pub tsx_listed_fee_table: [[Money; LIQUIDITY_FLAG_COUNT]; PURE_PRICE_CLASS_COUNT],
    /// The TSX Venture listed fee table, indexed the same way.
    pub tsx_venture_listed_fee_table: [[Money; LIQUIDITY_FLAG_COUNT]; PURE_PRICE_CLASS_COUNT],
    /// The flat per-share fee for odd lots, applied regardless of class.
    pub odd_lot: Money,
    /// The per-fill cap on TSX Venture sub-dime trades, applied
    /// symmetrically to fees and rebates.
    pub tsx_venture_sub_dime_cap: Money,
    /// The securities in Pure's designated program.
    pub designated_securities: HashSet<Security>,
}

const PRICE_CLASS_ROWS: [&str; PURE_PRICE_CLASS_COUNT] =
    ["designated", "default", "sub_dollar", "sub_dime"];

impl PureFeeTable {
    /// Parses the table from its configuration section. The designated
    /// securities are loaded from the file named by
    /// `designated_securities_path`, a document with a `symbols` list of
    /// security display names.
    pub fn from_config(
        config: &Value,
        market_database: &MarketDatabase,
    ) -> Result<Self, FeeConfigError> {
        let path = entry(config, "designated_securities_path", "")?
            .as_str()
            .ok_or_else(|| FeeConfigError::InvalidValue {
                path: "designated_securities_path".to_string(),
                message: "expected a file path".to_string(),
            })?
            .to_string();
        let listing = std::fs::read_to_string(&path)
            .map_err(|error| FeeConfigError::DesignatedSecurities(error.to_string()))?;
        let listing: Value = serde_json::from_str(&listing)
            .map_err(|error| FeeConfigError::DesignatedSecurities(error.to_string()))?;
        let symbols = listing
            .get("symbols")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                FeeConfigError::DesignatedSecurities("symbols list not found".to_string())
            })?;
        let mut designated_securities = HashSet::new();
        for symbol in symbols {
            let text = symbol.as_str().ok_or_else(|| {
                FeeConfigError::DesignatedSecurities("symbols must be strings".to_string())
            })?;
            let security = Security::parse(text, market_database)
                .map_err(|error| FeeConfigError::DesignatedSecurities(error.to_string()))?;
            designated_securities.insert(security);
        }
        Ok(PureFeeTable {
            tsx_listed_fee_table: parse_money_grid(
                config,
                "tsx_listed_fee_table",
                PRICE_CLASS_ROWS,
                ["active", "passive"],
            )?,
            tsx_venture_listed_fee_table: parse_money_grid(
                config,
                "tsx_venture_listed_fee_table",
                PRICE_CLASS_ROWS,
                ["active", "passive"],
            )?,
            odd_lot: parse_money(config, "odd_lot")?,
            tsx_venture_sub_dime_cap: parse_money(config, "tsx_venture_sub_dime_cap")?,
            designated_securities,
        })
    }
}

/// Looks up a fee on a TSX listed security.
pub fn lookup_pure_tsx_listed_fee(
    fee_table: &PureFeeTable,
    flag: LiquidityFlag,
    price_class: PurePriceClass,
) -> Money {
    fee_table.tsx_listed_fee_table[price_class as usize][flag as usize]
}

/// Looks up a fee on a TSX Venture listed security.
pub fn lookup_pure_tsx_venture_listed_fee(
    fee_table: &PureFeeTable,
    flag: LiquidityFlag,
    price_class: PurePriceClass,
) -> Money {
    fee_table.tsx_venture_listed_fee_table[price_class as usize][flag as usize]
}

/// Calculates the fee on a trade executed on PURE.
pub fn calculate_pure_fee(
    fee_table: &PureFeeTable,
    security: &Security,
    execution_report: &ExecutionReport,
) -> Money {
    if execution_report.last_quantity == 0 {
        return Money::ZERO;
    }
    if execution_report.last_quantity < 100 {
        return execution_report.last_quantity * fee_table.odd_lot;
    }
    let price_class = if is_sub_dime(execution_report.last_price) {
        PurePriceClass::SubDime
    } else if is_sub_dollar(execution_report.last_price) {
        PurePriceClass::SubDollar
    } else if fee_table.designated_securities.contains(security) {
        PurePriceClass::Designated
    } else {
        PurePriceClass::Default
    };
    let flag = classify_flag("PURE", execution_report, |flag| match flag {
        'A' => Some(LiquidityFlag::Active),
        'P' => Some(LiquidityFlag::Passive),
        _ => None,
    });
    let fee = if security.market == MarketCode::XTSE {
        lookup_pure_tsx_listed_fee(fee_table, flag, price_class)
    } else if security.market == MarketCode::XTSX {
        lookup_pure_tsx_venture_listed_fee(fee_table, flag, price_class)
    } else {
        warn!(market = %security.market, "unknown market [PURE]");
        lookup_pure_tsx_venture_listed_fee(fee_table, flag, price_class)
    };
    if price_class == PurePriceClass::SubDime && security.market == MarketCode::XTSX {
        let cap = fee_table.tsx_venture_sub_dime_cap;
        if fee >= Money::ZERO {
            return (execution_report.last_quantity * fee).min(cap);
        }
        return (execution_report.last_quantity * fee).max(-cap);
    }
    execution_report.last_quantity * fee
}
