//! Inventory-adjusted market maker: EMA-smoothed position through a
//! sigmoid skew.

use super::decision::{MarketSignal, QuoteDecision, QuoteReason};
use super::quoting::{InventorySkew, MarketMakerParams, QuoteCore};
use crate::book::ConsolidatedBook;
use crate::types::{Qty, TimestampNs};

/// Quoter whose skew saturates smoothly as inventory approaches the
/// position bound, instead of growing linearly.
pub struct InventoryQuoter {
    core: QuoteCore,
    /// EMA decay applied to the raw position each evaluation.
    alpha: f64,
    position_ema: f64,
}

impl InventoryQuoter {
    #[must_use]
    pub fn new(params: MarketMakerParams, alpha: f64) -> Self {
        Self {
            core: QuoteCore::new(params),
            alpha: alpha.clamp(0.0, 1.0),
            position_ema: 0.0,
        }
    }

    /// Smoothed position the skew currently sees.
    #[must_use]
    pub fn position_ema(&self) -> f64 {
        self.position_ema
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

        self.position_ema =
            self.alpha * position.to_f64() + (1.0 - self.alpha) * self.position_ema;

        let skew = self.sigmoid_skew();
        let fair = nbbo.mid_price();
        let spread_bps = self.core.scaled_spread_bps(signal.volatility);
        self.core.decide(
            fair,
            spread_bps,
            InventorySkew::Precomputed(skew),
            position,
            now,
        )
    }

    /// `2 / (1 + e^(-3x)) - 1` over the normalized EMA: bounded in
    /// (-1, 1), steep near flat, saturating near the bounds.
    fn sigmoid_skew(&self) -> f64 {
        let max_position = self.core.params().max_position.to_f64();
        if max_position <= f64::EPSILON {
            return 0.0;
        }
        let x = self.position_ema / max_position;
        2.0 / (1.0 + (-3.0 * x).exp()) - 1.0
    }

    pub(super) fn core(&self) -> &QuoteCore {
        &self.core
    }

    pub(super) fn core_mut(&mut self) -> &mut QuoteCore {
        &mut self.core
    }
}
