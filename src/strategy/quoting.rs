//! Shared quoting core: spread, skew application, size shaping, and
//! hysteresis.

use super::decision::{QuoteDecision, QuoteReason};
use crate::types::{OrderId, Price, Qty, Side, TimestampNs};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Market-making parameters shared by every strategy variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketMakerParams {
    /// Quoted spread target before volatility scaling, in bps of fair.
    pub target_spread_bps: i64,
    pub min_spread_bps: i64,
    pub max_spread_bps: i64,
    /// Inventory skew aggressiveness `k`: a full-inventory skew shifts
    /// both quotes by `k` bps of fair value.
    pub inventory_skew_factor: i64,
    pub default_order_size: Qty,
    pub min_order_size: Qty,
    pub max_order_size: Qty,
    /// Position bound used to normalize inventory skew and shape sizes.
    pub max_position: Qty,
    /// Minimum lifetime of a quote pair before it may be replaced by a
    /// quote that moves less than one bp of fair value.
    pub min_quote_life_us: u64,
}

impl Default for MarketMakerParams {
    fn default() -> Self {
        Self {
            target_spread_bps: 10,
            min_spread_bps: 5,
            max_spread_bps: 50,
            inventory_skew_factor: 10,
            default_order_size: Qty::from_f64(0.1),
            min_order_size: Qty::from_f64(0.001),
            max_order_size: Qty::from_f64(1.0),
            max_position: Qty::from_f64(1.0),
            min_quote_life_us: 50_000,
        }
    }
}

/// How a variant supplies its inventory skew to the core.
pub(super) enum InventorySkew {
    /// `position / max_position`, computed in integer arithmetic.
    Linear,
    /// A pre-computed skew in `[-1, 1]` (EMA/sigmoid variants).
    Precomputed(f64),
}

/// State and arithmetic shared by all strategy variants.
///
/// The core owns enablement, the active quote ids, fill tallies, and the
/// hysteresis memory; variants provide fair value and skew.
pub(super) struct QuoteCore {
    params: MarketMakerParams,
    enabled: bool,
    last_bid: Price,
    last_ask: Price,
    last_quote_ns: TimestampNs,
    active_bid: Option<OrderId>,
    active_ask: Option<OrderId>,
    bought: Qty,
    sold: Qty,
}

impl QuoteCore {
    pub(super) fn new(params: MarketMakerParams) -> Self {
        Self {
            params,
            enabled: true,
            last_bid: Price::ZERO,
            last_ask: Price::ZERO,
            last_quote_ns: 0,
            active_bid: None,
            active_ask: None,
            bought: Qty::ZERO,
            sold: Qty::ZERO,
        }
    }

    pub(super) fn params(&self) -> &MarketMakerParams {
        &self.params
    }

    pub(super) fn update_params(&mut self, params: MarketMakerParams) {
        self.params = params;
    }

    pub(super) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(super) fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(super) fn total_bought(&self) -> Qty {
        self.bought
    }

    pub(super) fn total_sold(&self) -> Qty {
        self.sold
    }

    /// Volatility-scaled spread in bps, clamped to the configured band.
    pub(super) fn scaled_spread_bps(&self, volatility: f64) -> i64 {
        let scaled = (self.params.target_spread_bps as f64 * (1.0 + volatility.max(0.0))).round()
            as i64;
        scaled
            .max(self.params.min_spread_bps)
            .min(self.params.max_spread_bps)
    }

    /// Produce a two-sided quote around `fair`, applying the inventory
    /// skew, size shaping, and hysteresis.
    pub(super) fn decide(
        &mut self,
        fair: Price,
        spread_bps: i64,
        skew: InventorySkew,
        position: Qty,
        now: TimestampNs,
    ) -> QuoteDecision {
        if !self.enabled {
            return QuoteDecision::no_quote(QuoteReason::Disabled);
        }
        if !fair.is_positive() {
            return QuoteDecision::no_quote(QuoteReason::ZeroFairValue);
        }

        // half = fair * spread / 20_000
        let half = Price::from_raw((fair.raw() as i128 * spread_bps as i128 / 20_000) as i64);
        let shift = self.skew_shift(fair, skew, position);

        let bid = fair.saturating_sub(half).saturating_sub(shift);
        let ask = fair.saturating_add(half).saturating_sub(shift);
        if bid >= ask {
            return QuoteDecision::no_quote(QuoteReason::CrossedQuotes);
        }

        let bid_size = self.shaped_size(Side::Buy, position);
        let ask_size = self.shaped_size(Side::Sell, position);
        if bid_size.is_zero() && ask_size.is_zero() {
            return QuoteDecision::no_quote(QuoteReason::ZeroSizes);
        }

        if self.within_quote_life(now) && !self.moved_materially(fair, bid, ask) {
            trace!("suppressing quote churn at {} / {}", bid, ask);
            return QuoteDecision::no_quote(QuoteReason::PricesUnchanged);
        }

        self.last_bid = bid;
        self.last_ask = ask;
        self.last_quote_ns = now;
        debug!(
            "quote {} x {} | {} x {} (fair {}, spread {} bps)",
            bid, bid_size, ask, ask_size, fair, spread_bps
        );
        QuoteDecision::quote(bid, bid_size, ask, ask_size)
    }

    /// Price shift applied to both quotes: `skew * k * fair / 10_000`,
    /// positive skew (long inventory) pushes both quotes down.
    fn skew_shift(&self, fair: Price, skew: InventorySkew, position: Qty) -> Price {
        let k = self.params.inventory_skew_factor;
        let max_position = self.params.max_position;
        match skew {
            InventorySkew::Linear => {
                if max_position.is_zero() {
                    return Price::ZERO;
                }
                let clamped = position
                    .max(-max_position)
                    .min(max_position);
                Price::from_raw(
                    (fair.raw() as i128 * k as i128 * clamped.raw() as i128
                        / (10_000i128 * max_position.raw() as i128)) as i64,
                )
            }
            InventorySkew::Precomputed(value) => {
                let clamped = value.clamp(-1.0, 1.0);
                Price::from_raw(
                    (fair.raw() as f64 * k as f64 * clamped / 10_000.0) as i64,
                )
            }
        }
    }

    /// Base size, reduced when the side would extend an already-large
    /// position, then clamped into the configured band. A side shaped all
    /// the way to zero stays zero.
    fn shaped_size(&self, side: Side, position: Qty) -> Qty {
        let params = &self.params;
        let base = params.default_order_size;
        let max_position = params.max_position;
        if max_position.is_zero() {
            return base.min(params.max_order_size).max(params.min_order_size);
        }

        let scaled = match side {
            Side::Buy if position.is_positive() => {
                let headroom = max_position.saturating_sub(position).max(Qty::ZERO);
                Qty::from_raw(
                    (base.raw() as i128 * headroom.raw() as i128 / max_position.raw() as i128)
                        as i64,
                )
            }
            Side::Sell if position.is_negative() => {
                let headroom = max_position.saturating_add(position).max(Qty::ZERO);
                Qty::from_raw(
                    (base.raw() as i128 * headroom.raw() as i128 / max_position.raw() as i128)
                        as i64,
                )
            }
            _ => base,
        };

        if scaled.is_zero() {
            return Qty::ZERO;
        }
        scaled.min(params.max_order_size).max(params.min_order_size)
    }

    fn within_quote_life(&self, now: TimestampNs) -> bool {
        let life_ns = self.params.min_quote_life_us.saturating_mul(1_000);
        self.last_quote_ns != 0 && now.saturating_sub(self.last_quote_ns) < life_ns
    }

    /// Either side moved by at least one basis point of fair value.
    fn moved_materially(&self, fair: Price, bid: Price, ask: Price) -> bool {
        let threshold = fair.mul_bps(1);
        bid.saturating_sub(self.last_bid).abs() >= threshold
            || ask.saturating_sub(self.last_ask).abs() >= threshold
    }

    pub(super) fn note_quote_accepted(&mut self, side: Side, id: OrderId) {
        match side {
            Side::Buy => self.active_bid = Some(id),
            Side::Sell => self.active_ask = Some(id),
        }
    }

    pub(super) fn on_trade(&mut self, _price: Price, _qty: Qty) {}

    pub(super) fn on_fill(&mut self, id: OrderId, side: Side, qty: Qty, _price: Price) {
        match side {
            Side::Buy => self.bought = self.bought.saturating_add(qty),
            Side::Sell => self.sold = self.sold.saturating_add(qty),
        }
        // A filled quote is no longer working.
        if self.active_bid == Some(id) {
            self.active_bid = None;
        }
        if self.active_ask == Some(id) {
            self.active_ask = None;
        }
    }

    pub(super) fn on_cancel(&mut self, id: OrderId) {
        self.clear_active(id);
    }

    pub(super) fn on_reject(&mut self, id: OrderId, reason: &str) {
        debug!("quote {} rejected: {}", id, reason);
        self.clear_active(id);
    }

    fn clear_active(&mut self, id: OrderId) {
        if self.active_bid == Some(id) {
            self.active_bid = None;
        }
        if self.active_ask == Some(id) {
            self.active_ask = None;
        }
    }

    #[cfg(test)]
    pub(super) fn active_quotes(&self) -> (Option<OrderId>, Option<OrderId>) {
        (self.active_bid, self.active_ask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> QuoteCore {
        QuoteCore::new(MarketMakerParams::default())
    }

    #[test]
    fn spread_scaling_clamps_to_band() {
        let core = core();
        assert_eq!(core.scaled_spread_bps(0.0), 10);
        assert_eq!(core.scaled_spread_bps(1.0), 20);
        assert_eq!(core.scaled_spread_bps(100.0), 50);
        // Negative volatility never tightens below the floor.
        assert_eq!(core.scaled_spread_bps(-5.0), 10);
    }

    #[test]
    fn flat_position_quotes_symmetrically() {
        let mut core = core();
        let fair = Price::from_f64(10_000.5);
        let decision = core.decide(fair, 10, InventorySkew::Linear, Qty::ZERO, 1_000);

        assert!(decision.should_quote);
        let half = Price::from_f64(5.00025);
        assert_eq!(decision.bid_price, fair.saturating_sub(half));
        assert_eq!(decision.ask_price, fair.saturating_add(half));
        assert_eq!(decision.bid_size, Qty::from_f64(0.1));
        assert_eq!(decision.ask_size, Qty::from_f64(0.1));
    }

    #[test]
    fn long_inventory_shifts_quotes_down() {
        let mut core = core();
        let fair = Price::from_f64(10_000.0);
        let long = core.decide(
            fair,
            10,
            InventorySkew::Linear,
            Qty::from_f64(0.5),
            1_000,
        );

        let mut fresh = QuoteCore::new(MarketMakerParams::default());
        let flat = fresh.decide(fair, 10, InventorySkew::Linear, Qty::ZERO, 1_000);

        assert!(long.bid_price < flat.bid_price);
        assert!(long.ask_price < flat.ask_price);
    }

    #[test]
    fn buy_size_shrinks_with_long_position() {
        let core = core();
        let full = core.shaped_size(Side::Buy, Qty::ZERO);
        let half = core.shaped_size(Side::Buy, Qty::from_f64(0.5));
        let none = core.shaped_size(Side::Buy, Qty::from_f64(1.0));

        assert_eq!(full, Qty::from_f64(0.1));
        assert_eq!(half, Qty::from_f64(0.05));
        assert_eq!(none, Qty::ZERO);
        // Sells are unaffected by a long position.
        assert_eq!(core.shaped_size(Side::Sell, Qty::from_f64(0.5)), Qty::from_f64(0.1));
    }

    #[test]
    fn hysteresis_suppresses_identical_quotes() {
        let mut core = core();
        let fair = Price::from_f64(10_000.5);

        let first = core.decide(fair, 10, InventorySkew::Linear, Qty::ZERO, 1_000);
        assert!(first.should_quote);

        // Same book a microsecond later: inside min_quote_life, no move.
        let second = core.decide(fair, 10, InventorySkew::Linear, Qty::ZERO, 2_000);
        assert!(!second.should_quote);
        assert_eq!(second.reason, QuoteReason::PricesUnchanged);
        assert_eq!(second.reason.to_string(), "Prices unchanged");

        // After the quote life expires the same prices are re-quoted.
        let later_ns = 1_000 + 50_000 * 1_000 + 1;
        let third = core.decide(fair, 10, InventorySkew::Linear, Qty::ZERO, later_ns);
        assert!(third.should_quote);
    }

    #[test]
    fn material_move_requotes_within_quote_life() {
        let mut core = core();
        let fair = Price::from_f64(10_000.0);
        assert!(
            core.decide(fair, 10, InventorySkew::Linear, Qty::ZERO, 1_000)
                .should_quote
        );

        // Two bps move in fair value beats the one-bp threshold.
        let moved = Price::from_f64(10_002.0);
        let second = core.decide(moved, 10, InventorySkew::Linear, Qty::ZERO, 2_000);
        assert!(second.should_quote);
    }

    #[test]
    fn disabled_core_never_quotes() {
        let mut core = core();
        core.set_enabled(false);
        let decision = core.decide(
            Price::from_f64(10_000.0),
            10,
            InventorySkew::Linear,
            Qty::ZERO,
            1_000,
        );
        assert_eq!(decision.reason, QuoteReason::Disabled);
    }

    #[test]
    fn fill_and_cancel_hooks_clear_active_sides() {
        let mut core = core();
        core.note_quote_accepted(Side::Buy, 11);
        core.note_quote_accepted(Side::Sell, 12);
        assert_eq!(core.active_quotes(), (Some(11), Some(12)));

        core.on_fill(11, Side::Buy, Qty::from_f64(0.1), Price::from_f64(10_000.0));
        assert_eq!(core.active_quotes(), (None, Some(12)));
        assert_eq!(core.total_bought(), Qty::from_f64(0.1));

        core.on_cancel(12);
        assert_eq!(core.active_quotes(), (None, None));
    }
}
