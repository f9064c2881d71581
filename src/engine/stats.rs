//! Engine counters and gauges for monitoring.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hot-path counters. All relaxed: the numbers are for observability,
/// not coordination.
#[derive(Debug, Default)]
pub struct EngineStats {
    ticks_processed: AtomicU64,
    quotes_emitted: AtomicU64,
    quotes_suppressed: AtomicU64,
    orders_sent: AtomicU64,
    order_send_failures: AtomicU64,
    fills_processed: AtomicU64,
    queue_drops: AtomicU64,
    pool_exhaustions: AtomicU64,
    arbitrage_detected: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatsSnapshot {
    pub ticks_processed: u64,
    pub quotes_emitted: u64,
    pub quotes_suppressed: u64,
    pub orders_sent: u64,
    pub order_send_failures: u64,
    pub fills_processed: u64,
    pub queue_drops: u64,
    pub pool_exhaustions: u64,
    pub arbitrage_detected: u64,
}

impl EngineStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_processed(&self) {
        self.ticks_processed.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!("engine_ticks_processed").increment(1);
    }

    pub fn quote_emitted(&self) {
        self.quotes_emitted.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!("engine_quotes_emitted").increment(1);
    }

    pub fn quote_suppressed(&self) {
        self.quotes_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn order_sent(&self) {
        self.orders_sent.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!("engine_orders_sent").increment(1);
    }

    pub fn order_send_failed(&self) {
        self.order_send_failures.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!("engine_order_send_failures").increment(1);
    }

    pub fn fill_processed(&self) {
        self.fills_processed.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!("engine_fills_processed").increment(1);
    }

    pub fn queue_dropped(&self) {
        self.queue_drops.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!("engine_queue_drops").increment(1);
    }

    pub fn pool_exhausted(&self) {
        self.pool_exhaustions.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!("engine_pool_exhaustions").increment(1);
    }

    pub fn arbitrage_found(&self) {
        self.arbitrage_detected.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy every counter at once.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ticks_processed: self.ticks_processed.load(Ordering::Relaxed),
            quotes_emitted: self.quotes_emitted.load(Ordering::Relaxed),
            quotes_suppressed: self.quotes_suppressed.load(Ordering::Relaxed),
            orders_sent: self.orders_sent.load(Ordering::Relaxed),
            order_send_failures: self.order_send_failures.load(Ordering::Relaxed),
            fills_processed: self.fills_processed.load(Ordering::Relaxed),
            queue_drops: self.queue_drops.load(Ordering::Relaxed),
            pool_exhaustions: self.pool_exhaustions.load(Ordering::Relaxed),
            arbitrage_detected: self.arbitrage_detected.load(Ordering::Relaxed),
        }
    }
}
