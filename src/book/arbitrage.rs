//! Cross-venue arbitrage detection over the consolidated book.

use super::consolidated::ConsolidatedBook;
use crate::types::{BPS_SCALE, Price, Qty, Symbol, TimestampNs, Venue};
use crate::utils::current_time_nanos;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A detected cross-venue dislocation: buy at `buy_venue`'s ask, sell at
/// `sell_venue`'s bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArbitrageOpportunity {
    pub symbol: Symbol,
    pub buy_venue: Venue,
    pub sell_venue: Venue,
    /// Ask price on the buy venue.
    pub buy_price: Price,
    /// Bid price on the sell venue.
    pub sell_price: Price,
    /// Executable size: the smaller of the two legs.
    pub quantity: Qty,
    /// `10_000 * (sell - buy) / buy`.
    pub profit_bps: i64,
    pub detected_at: TimestampNs,
    pub valid: bool,
}

/// Screening thresholds applied on top of raw detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageConfig {
    /// Minimum gross edge to act on.
    pub min_profit_bps: i64,
    /// Edge reserved for slippage; subtracted before the minimum check.
    pub max_slippage_bps: i64,
    pub min_quantity: Qty,
    pub max_quantity: Qty,
    /// Opportunities older than this are discarded unexecuted.
    pub max_opportunity_age_ns: u64,
    pub require_both_sides_liquid: bool,
    /// Each leg must post at least this fraction of the desired size.
    pub min_liquidity_ratio: f64,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            min_profit_bps: 10,
            max_slippage_bps: 2,
            min_quantity: Qty::from_f64(0.001),
            max_quantity: Qty::from_f64(1.0),
            max_opportunity_age_ns: 500_000_000,
            require_both_sides_liquid: true,
            min_liquidity_ratio: 0.5,
        }
    }
}

impl ConsolidatedBook {
    /// Whether any venue's ask sits below another venue's bid.
    #[must_use]
    pub fn has_arbitrage_opportunity(&self) -> bool {
        match self.nbbo() {
            // A crossed NBBO across two venues is exactly the arbitrage
            // condition; a single venue cannot cross itself.
            Some(nbbo) => {
                nbbo.best_bid > nbbo.best_ask && nbbo.bid_venue != nbbo.ask_venue
            }
            None => false,
        }
    }

    /// The single best dislocation across all venue pairs, by profit in
    /// basis points of the buy price. `None` when no pair crosses.
    #[must_use]
    pub fn find_arbitrage(&self) -> Option<ArbitrageOpportunity> {
        let venues = self.active_venues();
        let mut best: Option<ArbitrageOpportunity> = None;

        for &buy in &venues {
            let Some(buy_book) = self.existing_venue_book(buy) else {
                continue;
            };
            let (Some(ask), Some(ask_qty)) = (buy_book.best_ask(), buy_book.best_ask_qty())
            else {
                continue;
            };
            for &sell in &venues {
                if sell == buy {
                    continue;
                }
                let Some(sell_book) = self.existing_venue_book(sell) else {
                    continue;
                };
                let (Some(bid), Some(bid_qty)) =
                    (sell_book.best_bid(), sell_book.best_bid_qty())
                else {
                    continue;
                };
                if ask >= bid || !ask.is_positive() {
                    continue;
                }

                let profit_bps = (bid.raw() as i128 - ask.raw() as i128)
                    .saturating_mul(BPS_SCALE as i128)
                    .checked_div(ask.raw() as i128)
                    .unwrap_or(0) as i64;

                if best.as_ref().is_none_or(|b| profit_bps > b.profit_bps) {
                    best = Some(ArbitrageOpportunity {
                        symbol: self.symbol(),
                        buy_venue: buy,
                        sell_venue: sell,
                        buy_price: ask,
                        sell_price: bid,
                        quantity: ask_qty.min(bid_qty),
                        profit_bps,
                        detected_at: current_time_nanos(),
                        valid: true,
                    });
                }
            }
        }

        best
    }
}

/// Applies the configured screening rules to raw opportunities.
pub struct ArbitrageDetector {
    config: ArbitrageConfig,
}

impl ArbitrageDetector {
    #[must_use]
    pub fn new(config: ArbitrageConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ArbitrageConfig {
        &self.config
    }

    /// Find the best opportunity that survives every screening rule.
    #[must_use]
    pub fn find_actionable(
        &self,
        book: &ConsolidatedBook,
        now: TimestampNs,
    ) -> Option<ArbitrageOpportunity> {
        let mut opportunity = book.find_arbitrage()?;
        if !self.accepts(&opportunity, now) {
            return None;
        }
        opportunity.quantity = self.clamp_quantity(opportunity.quantity);
        debug!(
            "actionable arbitrage {}: buy {} @ {} sell {} @ {} ({} bps)",
            opportunity.symbol,
            opportunity.buy_venue,
            opportunity.buy_price,
            opportunity.sell_venue,
            opportunity.sell_price,
            opportunity.profit_bps
        );
        Some(opportunity)
    }

    /// Whether `opportunity` passes the profit, size, age, and liquidity
    /// screens at time `now`.
    #[must_use]
    pub fn accepts(&self, opportunity: &ArbitrageOpportunity, now: TimestampNs) -> bool {
        if !opportunity.valid {
            return false;
        }
        let net_bps = opportunity.profit_bps - self.config.max_slippage_bps;
        if net_bps < self.config.min_profit_bps {
            return false;
        }
        if self.is_expired(opportunity, now) {
            return false;
        }
        if opportunity.quantity < self.config.min_quantity {
            return false;
        }
        if self.config.require_both_sides_liquid {
            // Each leg must cover at least the configured fraction of the
            // size we would want to execute.
            let desired = self.config.max_quantity.to_f64();
            let floor = desired * self.config.min_liquidity_ratio;
            if opportunity.quantity.to_f64() < floor {
                return false;
            }
        }
        true
    }

    /// Whether `opportunity` is older than the configured maximum age.
    #[must_use]
    pub fn is_expired(&self, opportunity: &ArbitrageOpportunity, now: TimestampNs) -> bool {
        now.saturating_sub(opportunity.detected_at) > self.config.max_opportunity_age_ns
    }

    fn clamp_quantity(&self, quantity: Qty) -> Qty {
        quantity
            .min(self.config.max_quantity)
            .max(self.config.min_quantity)
    }
}
