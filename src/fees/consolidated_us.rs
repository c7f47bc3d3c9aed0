//! The consolidated fee table for US markets.

use crate::definitions::{MarketCode, Money, Rational, Side, destinations};
use crate::fees::amex::{AmexFeeTable, calculate_amex_fee};
use crate::fees::arca::{ArcaFeeTable, calculate_arca_fee};
use crate::fees::bats::{BatsFeeTable, calculate_bats_fee};
use crate::fees::baty::{BatyFeeTable, calculate_baty_fee};
use crate::fees::config::{FeeConfigError, entry, parse_money, parse_rational};
use crate::fees::edga::{EdgaFeeTable, calculate_edga_fee};
use crate::fees::edgx::{EdgxFeeTable, calculate_edgx_fee};
use crate::fees::nasdaq::{NasdaqFeeTable, calculate_nasdaq_fee};
use crate::fees::nyse::{NyseFeeTable, calculate_nyse_fee};
use crate::order::{ExecutionReport, OrderFields};
use serde_json::Value;
use tracing::warn;

/// Consolidates all US market fees together: the venue tables plus the
/// regulatory, clearing and platform charges applied to every fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedUsFeeTable {
    /// The platform's own per-share charge.
    pub platform_fee: Money,
    /// The SEC rate on sell-side notional.
    pub sec_rate: Rational,
    /// The FINRA trading activity fee per share.
    pub taf_fee: Money,
    /// The NSCC rate on notional.
    pub nscc_rate: Rational,
    /// The clearing fee per share.
    pub clearing_fee: Money,
    /// Fee table used by AMEX.
    pub amex_fee_table: AmexFeeTable,
    /// Fee table used by ARCA.
    pub arca_fee_table: ArcaFeeTable,
    /// Fee table used by BATS.
    pub bats_fee_table: BatsFeeTable,
    /// Fee table used by BATY.
    pub baty_fee_table: BatyFeeTable,
    /// Fee table used by EDGA.
    pub edga_fee_table: EdgaFeeTable,
    /// Fee table used by EDGX.
    pub edgx_fee_table: EdgxFeeTable,
    /// Fee table used by NASDAQ.
    pub nasdaq_fee_table: NasdaqFeeTable,
    /// Fee table used by NYSE.
    pub nyse_fee_table: NyseFeeTable,
}

impl ConsolidatedUsFeeTable {
    /// Parses the consolidated table. Every venue section is required.
    pub fn from_config(config: &Value) -> Result<Self, FeeConfigError> {
        Ok(ConsolidatedUsFeeTable {
            platform_fee: parse_money(config, "platform_fee")?,
            sec_rate: parse_rational(config, "sec_rate")?,
            taf_fee: parse_money(config, "taf_fee")?,
            nscc_rate: parse_rational(config, "nscc_rate")?,
            clearing_fee: parse_money(config, "clearing_fee")?,
            amex_fee_table: AmexFeeTable::from_config(entry(config, "amex", "")?)?,
            arca_fee_table: ArcaFeeTable::from_config(entry(config, "arca", "")?)?,
            bats_fee_table: BatsFeeTable::from_config(entry(config, "bats", "")?)?,
            baty_fee_table: BatyFeeTable::from_config(entry(config, "baty", "")?)?,
            edga_fee_table: EdgaFeeTable::from_config(entry(config, "edga", "")?)?,
            edgx_fee_table: EdgxFeeTable::from_config(entry(config, "edgx", "")?)?,
            nasdaq_fee_table: NasdaqFeeTable::from_config(entry(config, "nasdaq", "")?)?,
            nyse_fee_table: NyseFeeTable::from_config(entry(config, "nyse", "")?)?,
        })
    }
}

fn market_for_destination(destination: &str) -> Option<MarketCode> {
    match destination {
        destinations::AMEX => Some(MarketCode::XASE),
        destinations::ARCA => Some(MarketCode::ARCX),
        destinations::BATS => Some(MarketCode::BATS),
        destinations::BATY => Some(MarketCode::BATY),
        destinations::EDGA => Some(MarketCode::EDGA),
        destinations::EDGX => Some(MarketCode::EDGX),
        destinations::NASDAQ => Some(MarketCode::XNAS),
        destinations::NYSE => Some(MarketCode::XNYS),
        _ => None,
    }
}

/// Calculates the fees on a trade executed on a US market, returning a
/// report whose `execution_fee`, `processing_fee` and `commission` have
/// been incremented. The additions accumulate onto whatever the incoming
/// report already carries.
pub fn calculate_consolidated_us_fee(
    fee_table: &ConsolidatedUsFeeTable,
    order_fields: &OrderFields,
    execution_report: &ExecutionReport,
) -> ExecutionReport {
    let mut fees_report = execution_report.clone();
    let last_market = market_for_destination(&order_fields.destination);
    fees_report.execution_fee += match last_market {
        Some(MarketCode::XASE) => calculate_amex_fee(&fee_table.amex_fee_table, execution_report),
        Some(MarketCode::ARCX) => {
            calculate_arca_fee(&fee_table.arca_fee_table, order_fields, execution_report)
        }
        Some(MarketCode::BATS) => calculate_bats_fee(&fee_table.bats_fee_table, execution_report),
        Some(MarketCode::BATY) => calculate_baty_fee(&fee_table.baty_fee_table, execution_report),
        Some(MarketCode::EDGA) => calculate_edga_fee(&fee_table.edga_fee_table, execution_report),
        Some(MarketCode::EDGX) => calculate_edgx_fee(&fee_table.edgx_fee_table, execution_report),
        Some(MarketCode::XNAS) => {
            calculate_nasdaq_fee(&fee_table.nasdaq_fee_table, execution_report)
        }
        Some(MarketCode::XNYS) => {
            calculate_nyse_fee(&fee_table.nyse_fee_table, order_fields, execution_report)
        }
        _ => {
            warn!(
                destination = %order_fields.destination,
                "unknown last market [US]"
            );
            Money::ZERO
        }
    };
    if fees_report.last_quantity != 0 {
        let notional = fees_report.last_quantity * fees_report.last_price;
        let mut processing_fee =
            fees_report.last_quantity * (fee_table.clearing_fee + fee_table.taf_fee);
        if order_fields.side == Side::Bid {
            processing_fee += fee_table.sec_rate * notional;
        }
        processing_fee += Money::CENT + fee_table.nscc_rate * notional;
        fees_report.processing_fee += processing_fee.ceil(3);
    }
    fees_report.commission += fees_report.last_quantity * fee_table.platform_fee;
    fees_report
}
