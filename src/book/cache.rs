//! Lazily rebuilt top-of-book depth cache.

use super::book::MAX_DEPTH;
use super::level::PriceLevel;
use crossbeam_skiplist::SkipMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::level::BookLevel;

#[derive(Default)]
struct DepthLevels {
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
}

/// Cached top-`MAX_DEPTH` levels per side.
///
/// Every write to the book marks the cache dirty; the next depth read
/// rebuilds both sides from the skip maps under a short write lock.
/// Reads between writes are a lock-shared vector index.
pub(super) struct DepthCache {
    dirty: AtomicBool,
    levels: RwLock<DepthLevels>,
}

impl DepthCache {
    pub(super) fn new() -> Self {
        Self {
            dirty: AtomicBool::new(true),
            levels: RwLock::new(DepthLevels::default()),
        }
    }

    /// Mark the cached depth stale. Called on every book mutation.
    #[inline]
    pub(super) fn invalidate(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub(super) fn bid_level(
        &self,
        index: usize,
        bids: &SkipMap<i64, Arc<BookLevel>>,
        asks: &SkipMap<i64, Arc<BookLevel>>,
    ) -> Option<PriceLevel> {
        self.refresh_if_dirty(bids, asks);
        self.levels.read().ok()?.bids.get(index).copied()
    }

    pub(super) fn ask_level(
        &self,
        index: usize,
        bids: &SkipMap<i64, Arc<BookLevel>>,
        asks: &SkipMap<i64, Arc<BookLevel>>,
    ) -> Option<PriceLevel> {
        self.refresh_if_dirty(bids, asks);
        self.levels.read().ok()?.asks.get(index).copied()
    }

    fn refresh_if_dirty(
        &self,
        bids: &SkipMap<i64, Arc<BookLevel>>,
        asks: &SkipMap<i64, Arc<BookLevel>>,
    ) {
        if !self.dirty.load(Ordering::Acquire) {
            return;
        }
        let Ok(mut levels) = self.levels.write() else {
            return;
        };
        // Re-check under the lock so concurrent readers rebuild once.
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return;
        }

        levels.bids.clear();
        levels.asks.clear();
        for entry in bids.iter().rev().take(MAX_DEPTH) {
            levels.bids.push(entry.value().to_price_level());
        }
        for entry in asks.iter().take(MAX_DEPTH) {
            levels.asks.push(entry.value().to_price_level());
        }
    }
}
