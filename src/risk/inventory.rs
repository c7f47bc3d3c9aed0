//! Positions, inventories and true-average bookkeeping.

use crate::definitions::{CurrencyId, Money, Quantity, Security};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A signed position and its signed cost basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    /// The signed share count; positive long, negative short.
    pub quantity: Quantity,
    /// The signed cost of acquiring the position.
    pub cost_basis: Money,
}

impl Position {
    /// The average acquisition price, zero when flat.
    pub fn average_price(&self) -> Money {
        if self.quantity == 0 {
            return Money::ZERO;
        }
        (self.cost_basis / self.quantity).abs()
    }
}

/// Everything bookkept for one (security, currency) pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    /// The current position.
    pub position: Position,
    /// Realized profit and loss.
    pub gross_profit_and_loss: Money,
    /// Fees paid, accumulated unconditionally.
    pub fees: Money,
    /// Shares traded, accumulated unconditionally.
    pub volume: Quantity,
    /// Fills recorded, accumulated unconditionally.
    pub transaction_count: usize,
}

/// The key inventories are held under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryKey {
    /// The traded security.
    pub security: Security,
    /// The currency the security trades in.
    pub currency: CurrencyId,
}

/// Bookkeeps inventories with true-average accounting: profit and loss is
/// realized only by position-reducing trades, against the running average
/// cost; the residue of a through-flat trade establishes a new position
/// at the trade price.
#[derive(Debug, Clone, Default)]
pub struct TrueAverageBookkeeper {
    inventories: HashMap<InventoryKey, Inventory>,
    totals: HashMap<CurrencyId, Inventory>,
}

impl TrueAverageBookkeeper {
    /// An empty bookkeeper.
    pub fn new() -> Self {
        TrueAverageBookkeeper::default()
    }

    /// Records a fill of `quantity` signed shares (positive buys) whose
    /// signed total cost is `cost_basis`, paying `fees`.
    pub fn record_transaction(
        &mut self,
        security: &Security,
        currency: CurrencyId,
        quantity: Quantity,
        cost_basis: Money,
        fees: Money,
    ) {
        let key = InventoryKey {
            security: security.clone(),
            currency,
        };
        let entry = self.inventories.entry(key).or_default();
        let total = self.totals.entry(currency).or_default();
        entry.fees += fees;
        entry.volume += quantity.abs();
        entry.transaction_count += 1;
        total.fees += fees;
        total.volume += quantity.abs();
        total.transaction_count += 1;
        if quantity == 0 {
            return;
        }
        let price = (cost_basis / quantity).abs();
        let mut remaining_quantity = quantity.abs();
        let direction: Quantity = if quantity < 0 { -1 } else { 1 };
        total.gross_profit_and_loss -= entry.gross_profit_and_loss;
        total.position.quantity -= entry.position.quantity.abs();
        total.position.cost_basis -= entry.position.cost_basis.abs();
        let reduces = (entry.position.quantity > 0 && quantity < 0)
            || (entry.position.quantity < 0 && quantity > 0);
        if reduces {
            let average_price = entry.position.average_price();
            let reduction = remaining_quantity.min(entry.position.quantity.abs());
            let gross_delta = (-direction * reduction) * (price - average_price);
            let quantity_delta = direction * reduction;
            let cost_basis_delta = quantity_delta * average_price;
            entry.gross_profit_and_loss += gross_delta;
            entry.position.quantity += quantity_delta;
            entry.position.cost_basis += cost_basis_delta;
            remaining_quantity -= reduction;
            if remaining_quantity == 0 {
                total.gross_profit_and_loss += entry.gross_profit_and_loss;
                total.position.quantity += entry.position.quantity.abs();
                total.position.cost_basis += entry.position.cost_basis.abs();
                return;
            }
        }
        let quantity_delta = direction * remaining_quantity;
        let cost_basis_delta = quantity_delta * price;
        entry.position.quantity += quantity_delta;
        entry.position.cost_basis += cost_basis_delta;
        total.gross_profit_and_loss += entry.gross_profit_and_loss;
        total.position.quantity += entry.position.quantity.abs();
        total.position.cost_basis += entry.position.cost_basis.abs();
    }

    /// The inventory for a (security, currency) pair, empty when nothing
    /// has traded.
    pub fn inventory(&self, security: &Security, currency: CurrencyId) -> Inventory {
        self.inventories
            .get(&InventoryKey {
                security: security.clone(),
                currency,
            })
            .cloned()
            .unwrap_or_default()
    }

    /// The per-currency totals, empty when nothing has traded in the
    /// currency.
    pub fn total(&self, currency: CurrencyId) -> Inventory {
        self.totals.get(&currency).cloned().unwrap_or_default()
    }

    /// Iterates every inventory.
    pub fn inventories(&self) -> impl Iterator<Item = (&InventoryKey, &Inventory)> {
        self.inventories.iter()
    }

    /// Iterates the per-currency totals.
    pub fn totals(&self) -> impl Iterator<Item = (&CurrencyId, &Inventory)> {
        self.totals.iter()
    }
}
