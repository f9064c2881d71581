//! Per-venue order book: price-indexed bid/ask ladders for one symbol.

use super::cache::DepthCache;
use super::error::BookError;
use super::level::{BookLevel, PriceLevel};
use crate::types::{Order, OrderId, Price, Qty, Side, Symbol, Tick, TimestampNs, Venue};
use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Depth levels retained by the per-side cache.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy)]
struct OrderLocation {
    price: Price,
    side: Side,
    remaining: Qty,
}

/// One venue's order book for a single symbol.
///
/// Bids and asks are concurrent ordered maps keyed by raw price; the bid
/// side is read in reverse so both sides iterate best-first. A side map
/// and the order index stay consistent because all mutations come from
/// the venue's single feed thread; readers other than that thread go
/// through the consolidated book, never through raw references into the
/// maps.
pub struct VenueBook {
    symbol: Symbol,
    venue: Venue,
    /// Bid levels keyed by raw price, best = highest key.
    bids: SkipMap<i64, Arc<BookLevel>>,
    /// Ask levels keyed by raw price, best = lowest key.
    asks: SkipMap<i64, Arc<BookLevel>>,
    /// Order id → (price, side, remaining) for O(1) modify/cancel.
    orders: DashMap<OrderId, OrderLocation>,
    cache: DepthCache,
    last_update: AtomicU64,
    last_sequence: AtomicU64,
}

impl VenueBook {
    /// Create an empty book for `symbol` on `venue`.
    #[must_use]
    pub fn new(symbol: Symbol, venue: Venue) -> Self {
        Self {
            symbol,
            venue,
            bids: SkipMap::new(),
            asks: SkipMap::new(),
            orders: DashMap::new(),
            cache: DepthCache::new(),
            last_update: AtomicU64::new(0),
            last_sequence: AtomicU64::new(0),
        }
    }

    #[inline]
    #[must_use]
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    #[inline]
    #[must_use]
    pub fn venue(&self) -> Venue {
        self.venue
    }

    /// Local timestamp of the most recent applied update.
    #[inline]
    #[must_use]
    pub fn last_update(&self) -> TimestampNs {
        self.last_update.load(Ordering::Acquire)
    }

    /// Most recent venue feed sequence applied to this book.
    #[inline]
    #[must_use]
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence.load(Ordering::Acquire)
    }

    /// Replace the bid level at `price`; zero quantity removes it.
    pub fn update_bid(&self, price: Price, qty: Qty) {
        self.update_level(Side::Buy, price, qty);
    }

    /// Replace the ask level at `price`; zero quantity removes it.
    pub fn update_ask(&self, price: Price, qty: Qty) {
        self.update_level(Side::Sell, price, qty);
    }

    fn update_level(&self, side: Side, price: Price, qty: Qty) {
        if !price.is_positive() {
            return;
        }
        let map = self.side_map(side);
        if qty.is_zero() || qty.is_negative() {
            map.remove(&price.raw());
        } else {
            let entry = map.get_or_insert_with(price.raw(), || Arc::new(BookLevel::new(price)));
            // Feed updates carry no per-order detail; the aggregate
            // replaces the level with a nominal single-order count.
            entry.value().set(qty, 1);
        }
        trace!("level update {} {} {} {}", self.venue, side, price, qty);
        self.cache.invalidate();
    }

    /// Apply a top-of-book tick, dropping stale sequences.
    ///
    /// Returns `false` when the tick's sequence does not advance the
    /// book's last applied sequence, in which case nothing changes.
    pub fn apply_tick(&self, tick: &Tick) -> bool {
        let seq = self.last_sequence.load(Ordering::Acquire);
        if tick.sequence != 0 && tick.sequence <= seq {
            trace!(
                "dropping stale tick {} <= {} on {}",
                tick.sequence, seq, self.venue
            );
            return false;
        }

        self.update_bid(tick.bid_price, tick.bid_qty);
        self.update_ask(tick.ask_price, tick.ask_qty);
        self.last_sequence.store(tick.sequence, Ordering::Release);
        self.last_update.store(tick.local_ts, Ordering::Release);
        true
    }

    /// Clear both sides and repopulate from full depth arrays.
    ///
    /// The order index is cleared as well: a snapshot replaces everything
    /// the book knew.
    pub fn apply_snapshot(&self, bids: &[(Price, Qty)], asks: &[(Price, Qty)]) {
        while let Some(entry) = self.bids.front() {
            entry.remove();
        }
        while let Some(entry) = self.asks.front() {
            entry.remove();
        }
        self.orders.clear();

        for &(price, qty) in bids {
            self.update_bid(price, qty);
        }
        for &(price, qty) in asks {
            self.update_ask(price, qty);
        }
        self.cache.invalidate();
    }

    /// Track an individual resting order, adding its remaining quantity
    /// to the level at its price.
    ///
    /// # Errors
    /// [`BookError::DuplicateOrder`] when the id is already tracked,
    /// [`BookError::InvalidPrice`] / [`BookError::InvalidQuantity`] on
    /// non-positive price or quantity.
    pub fn add_order(&self, order: &Order) -> Result<(), BookError> {
        if !order.price.is_positive() {
            return Err(BookError::InvalidPrice(order.price));
        }
        let remaining = order.remaining();
        if !remaining.is_positive() {
            return Err(BookError::InvalidQuantity(remaining));
        }
        if self.orders.contains_key(&order.id) {
            return Err(BookError::DuplicateOrder(order.id));
        }

        let map = self.side_map(order.side);
        let entry = map.get_or_insert_with(order.price.raw(), || {
            Arc::new(BookLevel::new(order.price))
        });
        entry.value().add_order(remaining);

        self.orders.insert(
            order.id,
            OrderLocation {
                price: order.price,
                side: order.side,
                remaining,
            },
        );
        trace!(
            "add order {} {} {} {} on {}",
            order.id, order.side, order.price, remaining, self.venue
        );
        self.cache.invalidate();
        Ok(())
    }

    /// Change a tracked order's remaining quantity, adjusting its level
    /// by the delta. A new quantity of zero removes the order.
    ///
    /// # Errors
    /// [`BookError::OrderNotFound`] when the id is not tracked.
    pub fn modify_order(&self, id: OrderId, new_qty: Qty) -> Result<(), BookError> {
        if new_qty.is_negative() {
            return Err(BookError::InvalidQuantity(new_qty));
        }
        if new_qty.is_zero() {
            return self.remove_order(id);
        }

        let mut location = self.orders.get_mut(&id).ok_or(BookError::OrderNotFound(id))?;
        let delta = new_qty.saturating_sub(location.remaining);
        let map = self.side_map(location.side);
        if let Some(entry) = map.get(&location.price.raw()) {
            let total = entry.value().adjust(delta);
            if !total.is_positive() {
                map.remove(&location.price.raw());
            }
        }
        location.remaining = new_qty;
        drop(location);
        trace!("modify order {} -> {}", id, new_qty);
        self.cache.invalidate();
        Ok(())
    }

    /// Remove a tracked order, subtracting its remaining quantity from
    /// its level and evicting the level when it empties.
    ///
    /// # Errors
    /// [`BookError::OrderNotFound`] when the id is not tracked.
    pub fn remove_order(&self, id: OrderId) -> Result<(), BookError> {
        let (_, location) = self
            .orders
            .remove(&id)
            .ok_or(BookError::OrderNotFound(id))?;

        let map = self.side_map(location.side);
        if let Some(entry) = map.get(&location.price.raw()) {
            let total = entry.value().remove_order(location.remaining);
            if !total.is_positive() {
                map.remove(&location.price.raw());
            }
        }
        trace!("remove order {} on {}", id, self.venue);
        self.cache.invalidate();
        Ok(())
    }

    /// Best (highest) bid price.
    #[inline]
    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.back().map(|e| Price::from_raw(*e.key()))
    }

    /// Best (lowest) ask price.
    #[inline]
    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.front().map(|e| Price::from_raw(*e.key()))
    }

    /// Quantity resting at the best bid.
    #[inline]
    #[must_use]
    pub fn best_bid_qty(&self) -> Option<Qty> {
        self.bids.back().map(|e| e.value().total_qty())
    }

    /// Quantity resting at the best ask.
    #[inline]
    #[must_use]
    pub fn best_ask_qty(&self) -> Option<Qty> {
        self.asks.front().map(|e| e.value().total_qty())
    }

    /// Integer midpoint of the best bid and ask.
    ///
    /// Returns [`Price::ZERO`] while either side is empty.
    ///
    /// # Examples
    /// ```
    /// use marketmaker_rs::book::VenueBook;
    /// use marketmaker_rs::types::{Price, Qty, Symbol, Venue};
    ///
    /// let book = VenueBook::new(Symbol::new("BTCUSDT"), Venue::Binance);
    /// book.update_bid(Price::from_f64(10_000.0), Qty::from_f64(1.0));
    /// book.update_ask(Price::from_f64(10_001.0), Qty::from_f64(1.0));
    /// assert_eq!(book.mid_price(), Price::from_f64(10_000.5));
    /// ```
    #[must_use]
    pub fn mid_price(&self) -> Price {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid.midpoint(ask),
            _ => Price::ZERO,
        }
    }

    /// Absolute spread `ask - bid`, `None` while either side is empty.
    #[inline]
    #[must_use]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.saturating_sub(bid)),
            _ => None,
        }
    }

    /// Spread in integer basis points of the mid price:
    /// `10_000 * (ask - bid) / mid`.
    ///
    /// # Examples
    /// ```
    /// use marketmaker_rs::book::VenueBook;
    /// use marketmaker_rs::types::{Price, Qty, Symbol, Venue};
    ///
    /// let book = VenueBook::new(Symbol::new("BTCUSDT"), Venue::Binance);
    /// book.update_bid(Price::from_f64(9_995.0), Qty::from_f64(1.0));
    /// book.update_ask(Price::from_f64(10_005.0), Qty::from_f64(1.0));
    /// assert_eq!(book.spread_bps(), Some(10));
    /// ```
    #[must_use]
    pub fn spread_bps(&self) -> Option<i64> {
        let spread = self.spread()?;
        let mid = self.mid_price();
        if mid.is_zero() {
            return None;
        }
        Some(spread.as_bps_of(mid))
    }

    /// Cached bid level `index` levels from the top, `None` past depth.
    #[must_use]
    pub fn bid_level(&self, index: usize) -> Option<PriceLevel> {
        if index >= MAX_DEPTH {
            return None;
        }
        self.cache.bid_level(index, &self.bids, &self.asks)
    }

    /// Cached ask level `index` levels from the top, `None` past depth.
    #[must_use]
    pub fn ask_level(&self, index: usize) -> Option<PriceLevel> {
        if index >= MAX_DEPTH {
            return None;
        }
        self.cache.ask_level(index, &self.bids, &self.asks)
    }

    /// Volume-weighted average execution price for taking `quantity`
    /// against this book.
    ///
    /// Buying walks the asks from the best up, selling walks the bids
    /// from the best down, filling until `quantity` is consumed or the
    /// side is exhausted. The result is the weighted average over what
    /// filled; [`Price::ZERO`] when the side is empty or `quantity` is
    /// not positive.
    #[must_use]
    pub fn vwap(&self, side: Side, quantity: Qty) -> Price {
        if !quantity.is_positive() {
            return Price::ZERO;
        }

        let mut remaining = quantity.raw();
        let mut weighted: i128 = 0;
        let mut filled: i128 = 0;

        let map = match side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        };
        // Returns true once the requested quantity is consumed.
        let mut walk = |price_raw: i64, available: i64| -> bool {
            if available > 0 {
                let take = remaining.min(available);
                weighted += price_raw as i128 * take as i128;
                filled += take as i128;
                remaining -= take;
            }
            remaining <= 0
        };

        match side {
            Side::Buy => {
                for entry in map.iter() {
                    if walk(*entry.key(), entry.value().total_qty().raw()) {
                        break;
                    }
                }
            }
            Side::Sell => {
                for entry in map.iter().rev() {
                    if walk(*entry.key(), entry.value().total_qty().raw()) {
                        break;
                    }
                }
            }
        }

        if filled == 0 {
            return Price::ZERO;
        }
        Price::from_raw((weighted / filled) as i64)
    }

    /// Book imbalance over the top `depth` levels:
    /// `(bid_vol - ask_vol) / (bid_vol + ask_vol)`, in `[-1, 1]`.
    ///
    /// Zero when both sides are empty.
    #[must_use]
    pub fn imbalance(&self, depth: usize) -> f64 {
        let bid_vol: i128 = self
            .bids
            .iter()
            .rev()
            .take(depth)
            .map(|e| e.value().total_qty().raw() as i128)
            .sum();
        let ask_vol: i128 = self
            .asks
            .iter()
            .take(depth)
            .map(|e| e.value().total_qty().raw() as i128)
            .sum();

        let total = bid_vol + ask_vol;
        if total == 0 {
            return 0.0;
        }
        (bid_vol - ask_vol) as f64 / total as f64
    }

    /// Whether the best bid is at or through the best ask.
    #[inline]
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }

    /// A book is quotable only when both sides are populated and not
    /// crossed.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty() && !self.is_crossed()
    }

    /// Number of bid levels currently in the book.
    #[inline]
    #[must_use]
    pub fn bid_depth(&self) -> usize {
        self.bids.len()
    }

    /// Number of ask levels currently in the book.
    #[inline]
    #[must_use]
    pub fn ask_depth(&self) -> usize {
        self.asks.len()
    }

    /// Full-side dump in best-first order, used by snapshots and the
    /// consolidated rebuild.
    #[must_use]
    pub fn bid_levels(&self, max: usize) -> Vec<PriceLevel> {
        self.bids
            .iter()
            .rev()
            .take(max)
            .map(|e| e.value().to_price_level())
            .collect()
    }

    /// Full-side dump in best-first order, used by snapshots and the
    /// consolidated rebuild.
    #[must_use]
    pub fn ask_levels(&self, max: usize) -> Vec<PriceLevel> {
        self.asks
            .iter()
            .take(max)
            .map(|e| e.value().to_price_level())
            .collect()
    }

    fn side_map(&self, side: Side) -> &SkipMap<i64, Arc<BookLevel>> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }
}
