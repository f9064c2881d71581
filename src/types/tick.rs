//! Normalized top-of-book market-data tick.

use super::{Price, Qty, SequenceNum, TimestampNs, Venue};
use serde::{Deserialize, Serialize};

/// Best bid/offer update from a single venue, cache-aligned for queue and
/// pool storage.
///
/// Ticks are produced by venue adapters already normalized to fixed-point
/// units. `sequence` is the venue's own monotonic feed sequence; the feed
/// ingress drops ticks that arrive out of order before they ever reach a
/// book.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[repr(C, align(64))]
pub struct Tick {
    /// Best bid price.
    pub bid_price: Price,
    /// Best ask price.
    pub ask_price: Price,
    /// Size resting at the best bid.
    pub bid_qty: Qty,
    /// Size resting at the best ask.
    pub ask_qty: Qty,
    /// Price of the most recent trade, zero if none yet.
    pub last_price: Price,
    /// Quantity of the most recent trade.
    pub last_qty: Qty,
    /// Venue-reported event time.
    pub exchange_ts: TimestampNs,
    /// Local receive time.
    pub local_ts: TimestampNs,
    /// Venue feed sequence number.
    pub sequence: SequenceNum,
    /// Originating venue.
    pub venue: Venue,
    #[serde(skip, default = "reserved_pad")]
    _reserved: [u8; 55],
}

fn reserved_pad() -> [u8; 55] {
    [0u8; 55]
}

impl Tick {
    /// Build a tick with last-trade fields zeroed.
    #[must_use]
    pub fn quote(
        venue: Venue,
        bid_price: Price,
        bid_qty: Qty,
        ask_price: Price,
        ask_qty: Qty,
        sequence: SequenceNum,
        exchange_ts: TimestampNs,
        local_ts: TimestampNs,
    ) -> Self {
        Self {
            bid_price,
            ask_price,
            bid_qty,
            ask_qty,
            last_price: Price::ZERO,
            last_qty: Qty::ZERO,
            exchange_ts,
            local_ts,
            sequence,
            venue,
            _reserved: [0u8; 55],
        }
    }

    /// Integer midpoint, zero when either side is missing.
    #[inline]
    #[must_use]
    pub fn mid_price(&self) -> Price {
        if self.bid_price.is_zero() || self.ask_price.is_zero() {
            return Price::ZERO;
        }
        self.bid_price.midpoint(self.ask_price)
    }

    /// Whether both sides are present and uncrossed.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.bid_price.is_positive()
            && self.ask_price.is_positive()
            && self.bid_price < self.ask_price
    }
}

impl Default for Tick {
    fn default() -> Self {
        Self::quote(
            Venue::Unknown,
            Price::ZERO,
            Qty::ZERO,
            Price::ZERO,
            Qty::ZERO,
            0,
            0,
            0,
        )
    }
}
