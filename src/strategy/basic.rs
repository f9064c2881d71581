//! Basic market maker: mid fair value, linear inventory skew.

use super::decision::{MarketSignal, QuoteDecision, QuoteReason};
use super::quoting::{InventorySkew, MarketMakerParams, QuoteCore};
use crate::book::ConsolidatedBook;
use crate::types::{Qty, TimestampNs};

/// Symmetric quoter around the consolidated mid.
pub struct BasicQuoter {
    core: QuoteCore,
}

impl BasicQuoter {
    #[must_use]
    pub fn new(params: MarketMakerParams) -> Self {
        Self {
            core: QuoteCore::new(params),
        }
    }

    pub fn compute_quotes(
        &mut self,
        book: &ConsolidatedBook,
        position: Qty,
        signal: &MarketSignal,
        now: TimestampNs,
    ) -> QuoteDecision {
        if !self.core.is_enabled() {
            return QuoteDecision::no_quote(QuoteReason::Disabled);
        }
        let Some(nbbo) = book.nbbo() else {
            return QuoteDecision::no_quote(QuoteReason::InvalidBook);
        };
        if !nbbo.is_valid() {
            return QuoteDecision::no_quote(QuoteReason::InvalidBook);
        }

        let fair = nbbo.mid_price();
        let spread_bps = self.core.scaled_spread_bps(signal.volatility);
        self.core
            .decide(fair, spread_bps, InventorySkew::Linear, position, now)
    }

    pub(super) fn core(&self) -> &QuoteCore {
        &self.core
    }

    pub(super) fn core_mut(&mut self) -> &mut QuoteCore {
        &mut self.core
    }
}
