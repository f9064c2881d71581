//! Quoting strategies.
//!
//! A strategy turns the consolidated book, the current position, and a
//! market signal into a [`QuoteDecision`]. The three variants share one
//! integer quoting core and differ only in their inventory skew and, for
//! Avellaneda–Stoikov, the fair-value/spread model:
//!
//! - [`BasicQuoter`]: mid fair value, linear inventory skew.
//! - [`InventoryQuoter`]: EMA-smoothed position fed through a sigmoid
//!   skew, bounded in (-1, 1) and non-linear near the extremes.
//! - [`AsQuoter`]: Avellaneda–Stoikov reservation price and optimal
//!   spread over the remaining session horizon.
//!
//! Dispatch is a tagged enum resolved once at the pipeline boundary, not
//! per read.

mod avellaneda;
mod basic;
mod decision;
mod inventory;
mod quoting;

pub use avellaneda::{AsParams, AsQuoter};
pub use basic::BasicQuoter;
pub use decision::{MarketSignal, QuoteDecision, QuoteReason};
pub use inventory::InventoryQuoter;
pub use quoting::MarketMakerParams;

use crate::book::ConsolidatedBook;
use crate::types::{OrderId, Price, Qty, Side, TimestampNs};

/// A quoting strategy, dispatched by variant.
pub enum Quoter {
    Basic(BasicQuoter),
    InventoryAdjusted(InventoryQuoter),
    AvellanedaStoikov(AsQuoter),
}

impl Quoter {
    /// Produce a quote decision from the consolidated view.
    pub fn compute_quotes(
        &mut self,
        book: &ConsolidatedBook,
        position: Qty,
        signal: &MarketSignal,
        now: TimestampNs,
    ) -> QuoteDecision {
        match self {
            Quoter::Basic(q) => q.compute_quotes(book, position, signal, now),
            Quoter::InventoryAdjusted(q) => q.compute_quotes(book, position, signal, now),
            Quoter::AvellanedaStoikov(q) => q.compute_quotes(book, position, signal, now),
        }
    }

    /// Record that a quote order was accepted on `side`.
    pub fn note_quote_accepted(&mut self, side: Side, id: OrderId) {
        self.core_mut().note_quote_accepted(side, id);
    }

    /// Market trade observation hook.
    pub fn on_trade(&mut self, price: Price, qty: Qty) {
        self.core_mut().on_trade(price, qty);
    }

    /// Own-fill hook: updates the bought/sold tallies.
    pub fn on_fill(&mut self, id: OrderId, side: Side, qty: Qty, price: Price) {
        self.core_mut().on_fill(id, side, qty, price);
    }

    /// Cancel hook: clears the matching active quote side.
    pub fn on_cancel(&mut self, id: OrderId) {
        self.core_mut().on_cancel(id);
    }

    /// Reject hook: clears the matching active quote side.
    pub fn on_reject(&mut self, id: OrderId, reason: &str) {
        self.core_mut().on_reject(id, reason);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.core_mut().set_enabled(enabled);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.core().is_enabled()
    }

    /// Replace the shared market-making parameters.
    pub fn update_params(&mut self, params: MarketMakerParams) {
        self.core_mut().update_params(params);
    }

    /// Total quantity bought by this strategy's fills.
    #[must_use]
    pub fn total_bought(&self) -> Qty {
        self.core().total_bought()
    }

    /// Total quantity sold by this strategy's fills.
    #[must_use]
    pub fn total_sold(&self) -> Qty {
        self.core().total_sold()
    }

    fn core(&self) -> &quoting::QuoteCore {
        match self {
            Quoter::Basic(q) => q.core(),
            Quoter::InventoryAdjusted(q) => q.core(),
            Quoter::AvellanedaStoikov(q) => q.core(),
        }
    }

    fn core_mut(&mut self) -> &mut quoting::QuoteCore {
        match self {
            Quoter::Basic(q) => q.core_mut(),
            Quoter::InventoryAdjusted(q) => q.core_mut(),
            Quoter::AvellanedaStoikov(q) => q.core_mut(),
        }
    }
}
