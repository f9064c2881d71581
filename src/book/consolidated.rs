//! Cross-venue consolidated book and NBBO.

use super::book::{MAX_DEPTH, VenueBook};
use crate::types::{MAX_VENUES, Price, Qty, Side, Symbol, Tick, TimestampNs, Venue};
use crate::utils::current_time_nanos;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::trace;

/// One venue's share of a consolidated level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VenueContribution {
    pub venue: Venue,
    pub quantity: Qty,
    pub last_update: TimestampNs,
}

/// A price level merged across venues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidatedLevel {
    pub price: Price,
    pub total_quantity: Qty,
    /// Per-venue contributions in registration order.
    pub contributions: Vec<VenueContribution>,
}

impl ConsolidatedLevel {
    fn new(price: Price) -> Self {
        Self {
            price,
            total_quantity: Qty::ZERO,
            contributions: Vec::new(),
        }
    }

    /// Add, replace, or (on zero quantity) remove a venue's contribution,
    /// keeping the level total consistent.
    pub fn merge(&mut self, venue: Venue, quantity: Qty, last_update: TimestampNs) {
        if let Some(existing) = self.contributions.iter_mut().find(|c| c.venue == venue) {
            self.total_quantity = self.total_quantity.saturating_sub(existing.quantity);
            if quantity.is_positive() {
                existing.quantity = quantity;
                existing.last_update = last_update;
                self.total_quantity = self.total_quantity.saturating_add(quantity);
            } else {
                self.contributions.retain(|c| c.venue != venue);
            }
        } else if quantity.is_positive() {
            self.contributions.push(VenueContribution {
                venue,
                quantity,
                last_update,
            });
            self.total_quantity = self.total_quantity.saturating_add(quantity);
        }
    }
}

/// National best bid and offer across all active venues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Nbbo {
    pub best_bid: Price,
    pub best_ask: Price,
    pub bid_qty: Qty,
    pub ask_qty: Qty,
    pub bid_venue: Venue,
    pub ask_venue: Venue,
    pub timestamp: TimestampNs,
}

impl Nbbo {
    /// Valid iff both sides exist and the market is not crossed.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.best_bid.is_positive()
            && self.best_ask.is_positive()
            && self.best_bid < self.best_ask
    }

    /// Midpoint of the NBBO, zero when either side is missing.
    #[inline]
    #[must_use]
    pub fn mid_price(&self) -> Price {
        if self.best_bid.is_zero() || self.best_ask.is_zero() {
            return Price::ZERO;
        }
        self.best_bid.midpoint(self.best_ask)
    }
}

#[derive(Default)]
struct ConsolidatedCache {
    bids: Vec<ConsolidatedLevel>,
    asks: Vec<ConsolidatedLevel>,
    nbbo: Option<Nbbo>,
}

/// Aggregated view over per-venue books, and the single point of truth for
/// strategy read access.
///
/// Venue books are created lazily, live for the process lifetime, and are
/// indexed by the dense venue id. Writers mutate their own venue's book
/// and mark the consolidated cache dirty; readers rebuild the cache on
/// demand under a short internal mutex. The rebuild merges at most
/// `MAX_VENUES x MAX_DEPTH` levels per side and is idempotent.
pub struct ConsolidatedBook {
    symbol: Symbol,
    books: [OnceLock<Arc<VenueBook>>; MAX_VENUES],
    /// Bit `i` set when venue index `i` has a registered book.
    active: AtomicU16,
    dirty: AtomicBool,
    cache: Mutex<ConsolidatedCache>,
}

impl ConsolidatedBook {
    /// Create an empty consolidated book for `symbol`.
    #[must_use]
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            books: std::array::from_fn(|_| OnceLock::new()),
            active: AtomicU16::new(0),
            dirty: AtomicBool::new(true),
            cache: Mutex::new(ConsolidatedCache::default()),
        }
    }

    #[inline]
    #[must_use]
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// The book for `venue`, created on first use.
    ///
    /// Returns `None` only for [`Venue::Unknown`], which never
    /// contributes liquidity.
    pub fn venue_book(&self, venue: Venue) -> Option<Arc<VenueBook>> {
        if !venue.is_known() {
            return None;
        }
        let slot = &self.books[venue.index()];
        let book = slot.get_or_init(|| {
            self.active
                .fetch_or(1u16 << venue.index(), Ordering::AcqRel);
            trace!("registered venue book {} for {}", venue, self.symbol);
            Arc::new(VenueBook::new(self.symbol, venue))
        });
        Some(Arc::clone(book))
    }

    /// The book for `venue` if one has been registered.
    #[must_use]
    pub fn existing_venue_book(&self, venue: Venue) -> Option<Arc<VenueBook>> {
        self.books[venue.index()].get().map(Arc::clone)
    }

    /// Route a tick to its venue book; marks the cache dirty when the
    /// tick was applied.
    pub fn apply_tick(&self, tick: &Tick) -> bool {
        let Some(book) = self.venue_book(tick.venue) else {
            return false;
        };
        let applied = book.apply_tick(tick);
        if applied {
            self.mark_dirty();
        }
        applied
    }

    /// Flag the consolidated cache stale after a direct venue-book write.
    #[inline]
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Venues with a registered book, in dense-index order.
    #[must_use]
    pub fn active_venues(&self) -> Vec<Venue> {
        let bitmap = self.active.load(Ordering::Acquire);
        (0..MAX_VENUES as u8)
            .filter(|i| bitmap & (1u16 << *i) != 0)
            .map(Venue::from_u8)
            .filter(|v| v.is_known())
            .collect()
    }

    /// Number of venues currently contributing.
    #[must_use]
    pub fn active_venue_count(&self) -> usize {
        self.active.load(Ordering::Acquire).count_ones() as usize
    }

    /// Current NBBO, `None` until at least one two-sided venue book
    /// exists.
    #[must_use]
    pub fn nbbo(&self) -> Option<Nbbo> {
        self.with_cache(|cache| cache.nbbo)
    }

    /// Consolidated bid level `index` levels from the top.
    #[must_use]
    pub fn consolidated_bid(&self, index: usize) -> Option<ConsolidatedLevel> {
        self.with_cache(|cache| cache.bids.get(index).cloned())
    }

    /// Consolidated ask level `index` levels from the top.
    #[must_use]
    pub fn consolidated_ask(&self, index: usize) -> Option<ConsolidatedLevel> {
        self.with_cache(|cache| cache.asks.get(index).cloned())
    }

    /// NBBO spread in basis points of the NBBO mid. Negative when venues
    /// cross each other, which is the arbitrage signal.
    #[must_use]
    pub fn cross_venue_spread_bps(&self) -> Option<i64> {
        let nbbo = self.nbbo()?;
        let mid = nbbo.mid_price();
        if mid.is_zero() {
            return None;
        }
        Some(nbbo.best_ask.saturating_sub(nbbo.best_bid).as_bps_of(mid))
    }

    /// Volume-weighted average price for `quantity` against the
    /// consolidated depth. [`Price::ZERO`] when no liquidity is posted.
    #[must_use]
    pub fn consolidated_vwap(&self, side: Side, quantity: Qty) -> Price {
        if !quantity.is_positive() {
            return Price::ZERO;
        }
        self.with_cache(|cache| {
            let levels = match side {
                Side::Buy => &cache.asks,
                Side::Sell => &cache.bids,
            };
            let mut remaining = quantity.raw();
            let mut weighted: i128 = 0;
            let mut filled: i128 = 0;
            for level in levels {
                if remaining <= 0 {
                    break;
                }
                let take = remaining.min(level.total_quantity.raw());
                if take <= 0 {
                    continue;
                }
                weighted += level.price.raw() as i128 * take as i128;
                filled += take as i128;
                remaining -= take;
            }
            if filled == 0 {
                Price::ZERO
            } else {
                Price::from_raw((weighted / filled) as i64)
            }
        })
    }

    /// Imbalance over the top `depth` consolidated levels, in `[-1, 1]`.
    #[must_use]
    pub fn total_imbalance(&self, depth: usize) -> f64 {
        self.with_cache(|cache| {
            let bid_vol: i128 = cache
                .bids
                .iter()
                .take(depth)
                .map(|l| l.total_quantity.raw() as i128)
                .sum();
            let ask_vol: i128 = cache
                .asks
                .iter()
                .take(depth)
                .map(|l| l.total_quantity.raw() as i128)
                .sum();
            let total = bid_vol + ask_vol;
            if total == 0 {
                0.0
            } else {
                (bid_vol - ask_vol) as f64 / total as f64
            }
        })
    }

    /// Per-venue top-of-book imbalance for every active venue.
    #[must_use]
    pub fn per_venue_imbalance(&self, depth: usize) -> Vec<(Venue, f64)> {
        self.active_venues()
            .into_iter()
            .filter_map(|venue| {
                let book = self.existing_venue_book(venue)?;
                Some((venue, book.imbalance(depth)))
            })
            .collect()
    }

    fn with_cache<R>(&self, read: impl FnOnce(&ConsolidatedCache) -> R) -> R {
        let mut cache = self.cache.lock().expect("consolidated cache poisoned");
        if self.dirty.swap(false, Ordering::AcqRel) {
            self.rebuild(&mut cache);
        }
        read(&cache)
    }

    /// Merge every active venue's depth into the consolidated sequence
    /// and derive the NBBO.
    fn rebuild(&self, cache: &mut ConsolidatedCache) {
        let mut bid_merge: BTreeMap<i64, ConsolidatedLevel> = BTreeMap::new();
        let mut ask_merge: BTreeMap<i64, ConsolidatedLevel> = BTreeMap::new();

        let mut nbbo_bid: Option<(Price, Qty, Venue)> = None;
        let mut nbbo_ask: Option<(Price, Qty, Venue)> = None;

        for venue in self.active_venues() {
            let Some(book) = self.existing_venue_book(venue) else {
                continue;
            };
            let updated = book.last_update();

            for level in book.bid_levels(MAX_DEPTH) {
                bid_merge
                    .entry(level.price.raw())
                    .or_insert_with(|| ConsolidatedLevel::new(level.price))
                    .merge(venue, level.total_quantity, updated);
            }
            for level in book.ask_levels(MAX_DEPTH) {
                ask_merge
                    .entry(level.price.raw())
                    .or_insert_with(|| ConsolidatedLevel::new(level.price))
                    .merge(venue, level.total_quantity, updated);
            }

            if let (Some(bid), Some(bid_qty)) = (book.best_bid(), book.best_bid_qty()) {
                if nbbo_bid.is_none_or(|(best, _, _)| bid > best) {
                    nbbo_bid = Some((bid, bid_qty, venue));
                }
            }
            if let (Some(ask), Some(ask_qty)) = (book.best_ask(), book.best_ask_qty()) {
                if nbbo_ask.is_none_or(|(best, _, _)| ask < best) {
                    nbbo_ask = Some((ask, ask_qty, venue));
                }
            }
        }

        cache.bids = bid_merge.into_values().rev().take(MAX_DEPTH).collect();
        cache.asks = ask_merge.into_values().take(MAX_DEPTH).collect();

        cache.nbbo = match (nbbo_bid, nbbo_ask) {
            (Some((bid, bid_qty, bid_venue)), Some((ask, ask_qty, ask_venue))) => Some(Nbbo {
                best_bid: bid,
                best_ask: ask,
                bid_qty,
                ask_qty,
                bid_venue,
                ask_venue,
                timestamp: current_time_nanos(),
            }),
            _ => None,
        };
    }
}
