//! Avellaneda–Stoikov market maker.
//!
//! Quotes around a reservation price that leans away from inventory,
//! with an optimal spread derived from risk aversion, volatility, order
//! arrival intensity, and the remaining session horizon.

use super::decision::{MarketSignal, QuoteDecision, QuoteReason};
use super::quoting::{InventorySkew, MarketMakerParams, QuoteCore};
use crate::book::ConsolidatedBook;
use crate::types::{Price, Qty, TimestampNs};
use serde::{Deserialize, Serialize};

/// Minimum remaining session fraction; keeps the spread from collapsing
/// to zero at the session close.
const MIN_SESSION_FRACTION: f64 = 0.01;

/// Avellaneda–Stoikov model parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsParams {
    /// Risk aversion `gamma`.
    pub gamma: f64,
    /// Per-session volatility `sigma`.
    pub sigma: f64,
    /// Order arrival intensity `k`.
    pub k: f64,
    /// Session horizon `T` in seconds.
    #[serde(alias = "T")]
    pub horizon_secs: f64,
}

impl Default for AsParams {
    fn default() -> Self {
        Self {
            gamma: 0.1,
            sigma: 0.02,
            k: 1.5,
            horizon_secs: 86_400.0,
        }
    }
}

/// Avellaneda–Stoikov quoter.
///
/// Inventory `q` is normalized by `max_position` so the reservation shift
/// `mid * q * gamma * sigma^2 * tau` stays in price units regardless of
/// the symbol's quantity scale.
pub struct AsQuoter {
    core: QuoteCore,
    model: AsParams,
    session_start_ns: TimestampNs,
}

impl AsQuoter {
    #[must_use]
    pub fn new(params: MarketMakerParams, model: AsParams, session_start_ns: TimestampNs) -> Self {
        Self {
            core: QuoteCore::new(params),
            model,
            session_start_ns,
        }
    }

    /// Restart the session horizon at `now`.
    pub fn start_session(&mut self, now: TimestampNs) {
        self.session_start_ns = now;
    }

    /// Replace the model parameters.
    pub fn update_model(&mut self, model: AsParams) {
        self.model = model;
    }

    #[must_use]
    pub fn model(&self) -> &AsParams {
        &self.model
    }

    /// Remaining session fraction `tau`, clamped to `[0.01, 1]`.
    #[must_use]
    pub fn session_fraction(&self, now: TimestampNs) -> f64 {
        if self.model.horizon_secs <= 0.0 {
            return MIN_SESSION_FRACTION;
        }
        let elapsed_secs =
            now.saturating_sub(self.session_start_ns) as f64 / 1_000_000_000.0;
        (1.0 - elapsed_secs / self.model.horizon_secs).clamp(MIN_SESSION_FRACTION, 1.0)
    }

    /// Reservation price `r = mid - mid * q * gamma * sigma^2 * tau`.
    #[must_use]
    pub fn reservation_price(&self, mid: Price, position: Qty, tau: f64) -> Price {
        let max_position = self.core.params().max_position.to_f64();
        if max_position <= f64::EPSILON {
            return mid;
        }
        let q = (position.to_f64() / max_position).clamp(-1.0, 1.0);
        let shift = mid.raw() as f64 * q * self.model.gamma * self.model.sigma.powi(2) * tau;
        Price::from_raw(mid.raw().saturating_sub(shift as i64))
    }

    /// Optimal half-spread in bps:
    /// `(gamma * sigma^2 * tau + (2 / gamma) * ln(1 + gamma / k)) * 10_000`,
    /// clamped to the configured spread band.
    #[must_use]
    pub fn optimal_half_spread_bps(&self, tau: f64) -> i64 {
        let params = self.core.params();
        let (gamma, sigma, k) = (self.model.gamma, self.model.sigma, self.model.k);
        if gamma <= 0.0 || k <= 0.0 {
            return params.min_spread_bps;
        }
        let risk_term = gamma * sigma * sigma * tau;
        let liquidity_term = (2.0 / gamma) * (1.0 + gamma / k).ln();
        let half_bps = ((risk_term + liquidity_term) * 10_000.0).round() as i64;
        half_bps.max(params.min_spread_bps).min(params.max_spread_bps)
    }

    pub fn compute_quotes(
        &mut self,
        book: &ConsolidatedBook,
        position: Qty,
        _signal: &MarketSignal,
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

        let mid = nbbo.mid_price();
        let tau = self.session_fraction(now);
        let reservation = self.reservation_price(mid, position, tau);
        let half_bps = self.optimal_half_spread_bps(tau);

        // The inventory lean lives in the reservation price, so the core
        // applies no additional skew; the doubled bps value reproduces
        // bid/ask = r -/+ half.
        self.core.decide(
            reservation,
            half_bps * 2,
            InventorySkew::Precomputed(0.0),
            position,
            now,
        )
    }

    pub(super) fn core(&self) -> &QuoteCore {
        &self.core
    }

    pub(super) fn core_mut(&mut self) -> &mut QuoteCore {
        &mut self.core
    }
}
