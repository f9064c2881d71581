//! Price level records.

use crate::types::{Price, Qty};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// A read-side view of one price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Level price.
    pub price: Price,
    /// Total resting quantity at this price.
    pub total_quantity: Qty,
    /// Number of orders contributing to the level.
    pub order_count: u64,
}

/// Mutable level storage inside a book side.
///
/// The aggregate fields are atomic so the single writer can update a level
/// in place while concurrent readers snapshot it without tearing. A level
/// whose quantity reaches zero is evicted from the side map by the writer.
#[derive(Debug)]
pub(super) struct BookLevel {
    price: Price,
    total_qty: AtomicI64,
    order_count: AtomicU64,
}

impl BookLevel {
    pub(super) fn new(price: Price) -> Self {
        Self {
            price,
            total_qty: AtomicI64::new(0),
            order_count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(super) fn price(&self) -> Price {
        self.price
    }

    #[inline]
    pub(super) fn total_qty(&self) -> Qty {
        Qty::from_raw(self.total_qty.load(Ordering::Acquire))
    }

    #[inline]
    pub(super) fn order_count(&self) -> u64 {
        self.order_count.load(Ordering::Acquire)
    }

    /// Replace the aggregate, as a feed level update does.
    pub(super) fn set(&self, qty: Qty, orders: u64) {
        self.total_qty.store(qty.raw(), Ordering::Release);
        self.order_count.store(orders, Ordering::Release);
    }

    /// Adjust the aggregate by a signed delta; returns the new total.
    pub(super) fn adjust(&self, delta: Qty) -> Qty {
        let new = self.total_qty.fetch_add(delta.raw(), Ordering::AcqRel) + delta.raw();
        Qty::from_raw(new)
    }

    pub(super) fn add_order(&self, qty: Qty) {
        self.total_qty.fetch_add(qty.raw(), Ordering::AcqRel);
        self.order_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Remove one order's remaining quantity; returns the new total.
    pub(super) fn remove_order(&self, remaining: Qty) -> Qty {
        self.order_count.fetch_sub(1, Ordering::AcqRel);
        self.adjust(-remaining)
    }

    /// Snapshot the level for readers.
    #[inline]
    pub(super) fn to_price_level(&self) -> PriceLevel {
        PriceLevel {
            price: self.price,
            total_quantity: self.total_qty(),
            order_count: self.order_count(),
        }
    }
}
