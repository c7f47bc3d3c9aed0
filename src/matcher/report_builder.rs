//! Annotation of internally matched execution reports.

use crate::order::{ExecutionReport, OrderFields};

/// Decorates the two mirrored reports of an internal match with
/// venue-specific liquidity flags and market tags.
///
/// Implementations may only annotate: the driver restores
/// `last_quantity`, `last_price` and `status` after the call, so a builder
/// cannot alter the economics of the match.
pub trait MatchReportBuilder: Send + Sync {
    /// Annotates the passive and active reports for a match between the
    /// two orders described by `passive_fields` and `active_fields`.
    fn build(
        &self,
        passive_fields: &OrderFields,
        active_fields: &OrderFields,
        passive_report: &mut ExecutionReport,
        active_report: &mut ExecutionReport,
    );
}

/// Stamps the resting side PASSIVE and the incoming side ACTIVE, with a
/// configurable market tag on both reports.
pub struct PassiveActiveReportBuilder {
    market: String,
}

impl PassiveActiveReportBuilder {
    /// Builds a report builder tagging matches with `market`.
    pub fn new(market: impl Into<String>) -> Self {
        PassiveActiveReportBuilder {
            market: market.into(),
        }
    }
}

impl MatchReportBuilder for PassiveActiveReportBuilder {
    fn build(
        &self,
        _passive_fields: &OrderFields,
        _active_fields: &OrderFields,
        passive_report: &mut ExecutionReport,
        active_report: &mut ExecutionReport,
    ) {
        passive_report.liquidity_flag = "P".to_string();
        active_report.liquidity_flag = "A".to_string();
        passive_report.last_market = self.market.clone();
        active_report.last_market = self.market.clone();
    }
}
