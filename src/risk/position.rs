//! Per-symbol position and P&L bookkeeping.

use crate::types::{Price, Qty, Side, Symbol, TimestampNs};
use serde::{Deserialize, Serialize};

/// Net position in one symbol with weighted-average entry accounting.
///
/// `quantity` is signed: positive long, negative short. The weighted
/// average entry price applies only to fills that extend the current
/// direction; fills against the position realize P&L on the covered
/// quantity and, past flat, flip the position to the fill price. A flat
/// position always has a zero average entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub quantity: Qty,
    pub avg_entry: Price,
    /// Cumulative realized P&L in quote units.
    pub realized_pnl: f64,
    /// Mark-to-market P&L of the open quantity, in quote units.
    pub unrealized_pnl: f64,
    pub last_update: TimestampNs,
}

impl Position {
    #[must_use]
    pub fn flat(symbol: Symbol) -> Self {
        Self {
            symbol,
            quantity: Qty::ZERO,
            avg_entry: Price::ZERO,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            last_update: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Apply a fill and return the realized P&L delta in quote units.
    pub fn apply_fill(
        &mut self,
        side: Side,
        qty: Qty,
        price: Price,
        timestamp: TimestampNs,
    ) -> f64 {
        if !qty.is_positive() {
            return 0.0;
        }
        self.last_update = timestamp;

        let realized = match side {
            Side::Buy => self.apply_signed_fill(qty, price),
            Side::Sell => self.apply_signed_fill(-qty, price),
        };
        self.realized_pnl += realized;

        if self.quantity.is_zero() {
            self.avg_entry = Price::ZERO;
            self.unrealized_pnl = 0.0;
        }
        realized
    }

    // Positive `fill` buys, negative sells. Extends weighted-average in
    // the current direction, realizes on covers, flips on cross-through.
    fn apply_signed_fill(&mut self, fill: Qty, price: Price) -> f64 {
        let position = self.quantity;
        let same_direction = position.is_zero()
            || (position.is_positive() == fill.is_positive());

        if same_direction {
            let old_abs = position.abs();
            let new_abs = old_abs.saturating_add(fill.abs());
            if new_abs.is_positive() {
                let weighted = self.avg_entry.raw() as i128 * old_abs.raw() as i128
                    + price.raw() as i128 * fill.abs().raw() as i128;
                self.avg_entry = Price::from_raw((weighted / new_abs.raw() as i128) as i64);
            }
            self.quantity = self.quantity.saturating_add(fill);
            return 0.0;
        }

        let covered = fill.abs().min(position.abs());
        // Closing long: price - entry; closing short: entry - price.
        let per_unit = if position.is_positive() {
            price.to_f64() - self.avg_entry.to_f64()
        } else {
            self.avg_entry.to_f64() - price.to_f64()
        };
        let realized = per_unit * covered.to_f64();

        let excess = fill.abs().saturating_sub(covered);
        if excess.is_positive() {
            // Crossed through flat: the remainder opens in the fill's
            // direction at the fill price.
            self.quantity = if fill.is_positive() { excess } else { -excess };
            self.avg_entry = price;
        } else {
            self.quantity = self.quantity.saturating_add(fill);
        }
        realized
    }

    /// Recompute unrealized P&L against `mark`:
    /// `(mark - avg_entry) * quantity`, signed by direction.
    pub fn mark(&mut self, mark: Price, timestamp: TimestampNs) {
        self.last_update = timestamp;
        if self.quantity.is_zero() || !mark.is_positive() {
            self.unrealized_pnl = 0.0;
            return;
        }
        self.unrealized_pnl =
            (mark.to_f64() - self.avg_entry.to_f64()) * self.quantity.to_f64();
    }

    /// Realized plus current unrealized P&L.
    #[inline]
    #[must_use]
    pub fn total_pnl(&self) -> f64 {
        self.realized_pnl + self.unrealized_pnl
    }
}
