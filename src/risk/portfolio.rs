//! A marked-to-market view of an account's executed fills.

use crate::definitions::{
    BboQuote, CurrencyError, CurrencyId, ExchangeRateTable, Money, Security, Side,
};
use crate::order::{ExecutionReport, OrderFields};
use crate::risk::inventory::{Inventory, InventoryKey, TrueAverageBookkeeper};
use std::collections::HashMap;

/// An account's bookkept inventories plus the latest BBO mark for each
/// security, giving realized and unrealized profit and loss.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    bookkeeper: TrueAverageBookkeeper,
    marks: HashMap<Security, BboQuote>,
}

impl Portfolio {
    /// An empty portfolio.
    pub fn new() -> Self {
        Portfolio::default()
    }

    /// Records one execution report against the order's fields. Non-fill
    /// reports with no fees are ignored.
    pub fn update(&mut self, fields: &OrderFields, report: &ExecutionReport) {
        let fees = report.execution_fee + report.processing_fee + report.commission;
        if report.last_quantity == 0 && fees.is_zero() {
            return;
        }
        let quantity = match fields.side {
            Side::Bid => report.last_quantity,
            Side::Ask => -report.last_quantity,
        };
        let cost_basis = report.last_price * quantity;
        self.bookkeeper.record_transaction(
            &fields.security,
            fields.currency,
            quantity,
            cost_basis,
            fees,
        );
    }

    /// Latches the most recent BBO for a security, used to mark its
    /// position.
    pub fn update_mark(&mut self, security: Security, quote: BboQuote) {
        self.marks.insert(security, quote);
    }

    /// The mark for one position: the bid for longs, the ask for shorts.
    /// Falls back to the position's average price when no quote has been
    /// observed.
    pub fn mark_price(&self, security: &Security, currency: CurrencyId) -> Money {
        let inventory = self.bookkeeper.inventory(security, currency);
        match self.marks.get(security) {
            Some(quote) if inventory.position.quantity >= 0 => quote.bid.price,
            Some(quote) => quote.ask.price,
            None => inventory.position.average_price(),
        }
    }

    /// The unrealized profit and loss of one inventory at its mark.
    pub fn unrealized(&self, key: &InventoryKey) -> Money {
        let inventory = self.bookkeeper.inventory(&key.security, key.currency);
        if inventory.position.quantity == 0 {
            return Money::ZERO;
        }
        let mark = self.mark_price(&key.security, key.currency);
        inventory.position.quantity * mark - inventory.position.cost_basis
    }

    /// The account's gross: realized plus unrealized profit and loss less
    /// fees, converted into `currency`.
    ///
    /// # Errors
    /// Fails when an exchange rate needed for the conversion is missing;
    /// the caller skips this evaluation and leaves the account untouched.
    pub fn gross(
        &self,
        rates: &ExchangeRateTable,
        currency: CurrencyId,
    ) -> Result<Money, CurrencyError> {
        let mut gross = Money::ZERO;
        for (key, inventory) in self.bookkeeper.inventories() {
            let local =
                inventory.gross_profit_and_loss + self.unrealized(key) - inventory.fees;
            gross += rates.convert(local, key.currency, currency)?;
        }
        Ok(gross)
    }

    /// The notional value of every open position at its mark, converted
    /// into `currency`.
    pub fn position_notional(
        &self,
        rates: &ExchangeRateTable,
        currency: CurrencyId,
    ) -> Result<Money, CurrencyError> {
        let mut notional = Money::ZERO;
        for (key, inventory) in self.bookkeeper.inventories() {
            if inventory.position.quantity == 0 {
                continue;
            }
            let mark = self.mark_price(&key.security, key.currency);
            let local = inventory.position.quantity.abs() * mark;
            notional += rates.convert(local, key.currency, currency)?;
        }
        Ok(notional)
    }

    /// The latched BBO for a security, if one has been observed.
    pub fn mark(&self, security: &Security) -> Option<&BboQuote> {
        self.marks.get(security)
    }

    /// The bookkept inventory of one (security, currency) pair.
    pub fn inventory(&self, security: &Security, currency: CurrencyId) -> Inventory {
        self.bookkeeper.inventory(security, currency)
    }

    /// Iterates every bookkept inventory.
    pub fn inventories(&self) -> impl Iterator<Item = (&InventoryKey, &Inventory)> {
        self.bookkeeper.inventories()
    }
}
