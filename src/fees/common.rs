//! Machinery shared by the venue fee tables.

use crate::definitions::{Money, Rational};
use crate::fees::config::{FeeConfigError, parse_money_grid, parse_rational_row};
use crate::order::ExecutionReport;
use dashmap::DashSet;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::warn;

/// Whether a trade removed or provided liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiquidityFlag {
    /// The trade removed liquidity (taker).
    Active = 0,
    /// The trade provided liquidity (maker).
    Passive = 1,
}

/// The number of liquidity flags enumerated.
pub const LIQUIDITY_FLAG_COUNT: usize = 2;

/// A price at or above one dollar is in the default price class.
pub fn is_sub_dollar(price: Money) -> bool {
    price < Money::ONE
}

/// A price below ten cents is in the sub-dime price class.
pub fn is_sub_dime(price: Money) -> bool {
    price < 10 * Money::CENT
}

fn reported_flags() -> &'static DashSet<String> {
    static REPORTED: OnceLock<DashSet<String>> = OnceLock::new();
    REPORTED.get_or_init(DashSet::new)
}

/// Logs an unknown or empty liquidity flag once per (venue, flag) pair.
/// Callers then proceed with the ACTIVE default.
pub(crate) fn unknown_liquidity_flag(venue: &str, flag: &str) {
    if reported_flags().insert(format!("{venue}:{flag}")) {
        warn!(venue, flag, "unknown liquidity flag; defaulting to ACTIVE");
    }
}

/// Classifies a one-character liquidity flag with `classify`, defaulting
/// to ACTIVE (and logging once) for unknown or malformed flags.
pub(crate) fn classify_flag(
    venue: &str,
    report: &ExecutionReport,
    classify: impl Fn(char) -> Option<LiquidityFlag>,
) -> LiquidityFlag {
    let mut characters = report.liquidity_flag.chars();
    if let (Some(flag), None) = (characters.next(), characters.next()) {
        if let Some(classified) = classify(flag) {
            return classified;
        }
    }
    unknown_liquidity_flag(venue, &report.liquidity_flag);
    LiquidityFlag::Active
}

/// The common per-flag US fee shape: a per-share fee by liquidity flag for
/// dollar-and-up trades and a percent-of-notional rate below a dollar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlagFeeGrid {
    pub fee_table: [Money; LIQUIDITY_FLAG_COUNT],
    pub sub_dollar_table: [Rational; LIQUIDITY_FLAG_COUNT],
}

impl FlagFeeGrid {
    pub(crate) fn from_config(config: &Value) -> Result<Self, FeeConfigError> {
        let fee_table = parse_money_grid(config, "fee_table", ["default"], ["active", "passive"])?;
        let sub_dollar_table =
            parse_rational_row(config, "sub_dollar_table", ["active", "passive"])?;
        Ok(FlagFeeGrid {
            fee_table: fee_table[0],
            sub_dollar_table,
        })
    }

    /// The fee for `report`, classifying its liquidity flag with
    /// `classify`.
    pub(crate) fn fee(
        &self,
        venue: &str,
        report: &ExecutionReport,
        classify: impl Fn(char) -> Option<LiquidityFlag>,
    ) -> Money {
        if report.last_quantity == 0 {
            return Money::ZERO;
        }
        let flag = classify_flag(venue, report, classify);
        if is_sub_dollar(report.last_price) {
            let rate = self.sub_dollar_table[flag as usize];
            return rate * (report.last_quantity * report.last_price);
        }
        report.last_quantity * self.fee_table[flag as usize]
    }
}
