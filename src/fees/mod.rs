//! Per-venue fee tables and the consolidated US fee dispatcher.
//!
//! Every table is a pure value type loaded from a structured
//! configuration document; calculation is a pure function of the table,
//! the order's fields and one execution report. Zero-quantity reports are
//! always free, and unknown liquidity flags default to ACTIVE with a
//! one-time warning per venue and flag.

mod amex;
mod arca;
mod bats;
mod baty;
mod common;
mod config;
mod consolidated_us;
mod edga;
mod edgx;
mod nasdaq;
mod neoe;
mod nyse;
mod pure;

pub use amex::{AmexFeeTable, calculate_amex_fee};
pub use arca::{ARCA_CATEGORY_COUNT, ArcaCategory, ArcaFeeTable, calculate_arca_fee, lookup_arca_fee};
pub use bats::{BatsFeeTable, calculate_bats_fee};
pub use baty::{BatyFeeTable, calculate_baty_fee};
pub use common::{LIQUIDITY_FLAG_COUNT, LiquidityFlag, is_sub_dime, is_sub_dollar};
pub use config::FeeConfigError;
pub use consolidated_us::{ConsolidatedUsFeeTable, calculate_consolidated_us_fee};
pub use edga::{EdgaFeeTable, calculate_edga_fee};
pub use edgx::{EdgxFeeTable, calculate_edgx_fee};
pub use nasdaq::{
    NASDAQ_CATEGORY_COUNT, NasdaqCategory, NasdaqFeeTable, calculate_nasdaq_fee, lookup_nasdaq_fee,
};
pub use neoe::{
    NEOE_PRICE_CLASS_COUNT, NeoeFeeTable, NeoePriceClass, calculate_neoe_fee,
    lookup_neoe_general_fee, lookup_neoe_interlisted_fee,
};
pub use nyse::{
    NYSE_CATEGORY_COUNT, NYSE_TYPE_COUNT, NyseCategory, NyseFeeTable, NyseType, calculate_nyse_fee,
    is_nyse_hidden_liquidity_provider, lookup_nyse_fee,
};
pub use pure::{
    PURE_PRICE_CLASS_COUNT, PureFeeTable, PurePriceClass, calculate_pure_fee,
    lookup_pure_tsx_listed_fee, lookup_pure_tsx_venture_listed_fee,
};
