//! The board-lot submission check for Canadian listings.

use crate::definitions::{BboQuote, MarketCode, Money, Security};
use crate::order::driver::{MarketDataClient, OrderSubmissionCheck};
use crate::order::{OrderError, OrderInfo};
use crate::queue::StateQueue;
use crate::utils::Clock;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Supplies the most recent previous closing price for a security.
pub trait ClosingPriceSource: Send + Sync {
    /// The previous close, when one is known.
    fn previous_close(&self, security: &Security) -> Option<Money>;
}

#[derive(Clone, Copy)]
struct ClosingEntry {
    last_update: DateTime<Utc>,
    price: Money,
}

/// Validates that TSX and TSX-Venture orders are sized in board lots.
///
/// The required multiple depends on the security's current price: 1000
/// shares at or below ten cents, 500 below a dollar, 100 otherwise. The
/// price is the previous close when available (cached for an hour), else
/// the latched BBO bid.
pub struct BoardLotCheck {
    market_data: Arc<dyn MarketDataClient>,
    closes: Arc<dyn ClosingPriceSource>,
    clock: Arc<dyn Clock>,
    closing_entries: DashMap<Security, ClosingEntry>,
    bbo_quotes: DashMap<Security, Arc<StateQueue<BboQuote>>>,
}

impl BoardLotCheck {
    /// Builds the check.
    pub fn new(
        market_data: Arc<dyn MarketDataClient>,
        closes: Arc<dyn ClosingPriceSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        BoardLotCheck {
            market_data,
            closes,
            clock,
            closing_entries: DashMap::new(),
            bbo_quotes: DashMap::new(),
        }
    }

    fn load_price(&self, security: &Security) -> Result<Money, OrderError> {
        let now = self.clock.now();
        let closing_price = {
            let mut entry = self
                .closing_entries
                .entry(security.clone())
                .or_insert(ClosingEntry {
                    last_update: DateTime::<Utc>::MIN_UTC,
                    price: Money::ZERO,
                });
            if now - entry.last_update > Duration::hours(1) {
                entry.price = self.closes.previous_close(security).unwrap_or(Money::ZERO);
                entry.last_update = now;
            }
            entry.price
        };
        if closing_price != Money::ZERO {
            return Ok(closing_price);
        }
        let quotes = self
            .bbo_quotes
            .entry(security.clone())
            .or_insert_with(|| {
                let quotes = Arc::new(StateQueue::new());
                self.market_data
                    .query_bbo_quotes(security, quotes.clone());
                quotes
            })
            .clone();
        match quotes.top() {
            Ok(quote) => Ok(quote.bid.price),
            Err(_) => {
                self.bbo_quotes.remove(security);
                Err(OrderError::SubmissionRejected {
                    reason: "No BBO quote available.".to_string(),
                })
            }
        }
    }
}

impl OrderSubmissionCheck for BoardLotCheck {
    fn check(&self, info: &OrderInfo) -> Result<(), OrderError> {
        let security = &info.fields.security;
        if security.market != MarketCode::XTSE && security.market != MarketCode::XTSX {
            return Ok(());
        }
        let current_price = self.load_price(security)?;
        let multiple = if current_price <= 10 * Money::CENT {
            1000
        } else if current_price < Money::ONE {
            500
        } else {
            100
        };
        if info.fields.quantity % multiple != 0 {
            return Err(OrderError::SubmissionRejected {
                reason: format!("Quantity must be a multiple of {multiple}."),
            });
        }
        Ok(())
    }
}
