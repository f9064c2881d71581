//! Book snapshots with integrity checking, and single-pass enriched
//! metric capture.

use super::book::VenueBook;
use super::error::BookError;
use super::level::PriceLevel;
use crate::types::{Price, Qty, Side, Symbol, TimestampNs, Venue};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Format version used for checksum-enabled book snapshots.
pub const BOOK_SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Full-depth capture of one venue book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: Symbol,
    pub venue: Venue,
    /// Local timestamp of the book's last applied update.
    pub timestamp: TimestampNs,
    /// Bid levels, best first.
    pub bids: Vec<PriceLevel>,
    /// Ask levels, best first.
    pub asks: Vec<PriceLevel>,
}

impl BookSnapshot {
    /// Capture the current depth of `book`.
    #[must_use]
    pub fn capture(book: &VenueBook) -> Self {
        Self {
            symbol: book.symbol(),
            venue: book.venue(),
            timestamp: book.last_update(),
            bids: book.bid_levels(usize::MAX),
            asks: book.ask_levels(usize::MAX),
        }
    }

    /// Replace `book`'s contents with this snapshot.
    pub fn restore(&self, book: &VenueBook) {
        let bids: Vec<(Price, Qty)> = self
            .bids
            .iter()
            .map(|l| (l.price, l.total_quantity))
            .collect();
        let asks: Vec<(Price, Qty)> = self
            .asks
            .iter()
            .map(|l| (l.price, l.total_quantity))
            .collect();
        book.apply_snapshot(&bids, &asks);
    }
}

/// Wrapper that provides checksum validation for [`BookSnapshot`]
/// instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshotPackage {
    /// Version of the snapshot schema for forward compatibility.
    pub version: u32,
    /// Snapshot payload.
    pub snapshot: BookSnapshot,
    /// Hex-encoded SHA-256 of the serialized snapshot.
    pub checksum: String,
}

impl BookSnapshotPackage {
    /// Create a package, computing the checksum of the snapshot contents.
    pub fn new(snapshot: BookSnapshot) -> Result<Self, BookError> {
        let checksum = Self::compute_checksum(&snapshot)?;
        Ok(Self {
            version: BOOK_SNAPSHOT_FORMAT_VERSION,
            snapshot,
            checksum,
        })
    }

    /// Serialize the package to JSON.
    pub fn to_json(&self) -> Result<String, BookError> {
        serde_json::to_string(self).map_err(|error| BookError::SerializationError {
            message: error.to_string(),
        })
    }

    /// Deserialize a package from JSON. Call [`Self::validate`] before
    /// trusting the payload.
    pub fn from_json(data: &str) -> Result<Self, BookError> {
        serde_json::from_str(data).map_err(|error| BookError::DeserializationError {
            message: error.to_string(),
        })
    }

    /// Validate the format version and checksum.
    pub fn validate(&self) -> Result<(), BookError> {
        if self.version != BOOK_SNAPSHOT_FORMAT_VERSION {
            return Err(BookError::VersionMismatch {
                expected: BOOK_SNAPSHOT_FORMAT_VERSION,
                found: self.version,
            });
        }

        let computed = Self::compute_checksum(&self.snapshot)?;
        if computed != self.checksum {
            return Err(BookError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual: computed,
            });
        }

        Ok(())
    }

    /// Consume the package, returning the validated snapshot.
    pub fn into_snapshot(self) -> Result<BookSnapshot, BookError> {
        self.validate()?;
        Ok(self.snapshot)
    }

    fn compute_checksum(snapshot: &BookSnapshot) -> Result<String, BookError> {
        let payload =
            serde_json::to_vec(snapshot).map_err(|error| BookError::SerializationError {
                message: error.to_string(),
            })?;

        let mut hasher = Sha256::new();
        hasher.update(payload);
        Ok(hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>())
    }
}

bitflags! {
    /// Flags selecting which metrics an enriched snapshot calculates.
    ///
    /// Combine with bitwise OR to compute several metrics in one pass;
    /// unrequested metrics stay `None`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MetricFlags: u32 {
        /// Mid price of the best bid and ask.
        const MID_PRICE = 1 << 0;

        /// Spread in basis points of the mid.
        const SPREAD = 1 << 1;

        /// Total resting quantity on each side.
        const DEPTH = 1 << 2;

        /// Execution VWAP for the requested size on each side.
        const VWAP = 1 << 3;

        /// Book imbalance over the cached depth.
        const IMBALANCE = 1 << 4;

        /// All metrics.
        const ALL = Self::MID_PRICE.bits() | Self::SPREAD.bits()
                  | Self::DEPTH.bits() | Self::VWAP.bits() | Self::IMBALANCE.bits();
    }
}

/// A [`BookSnapshot`] bundled with pre-calculated metrics, so monitoring
/// consumers do not re-walk the depth.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedBookSnapshot {
    pub snapshot: BookSnapshot,
    pub mid_price: Option<Price>,
    pub spread_bps: Option<i64>,
    pub total_bid_qty: Option<Qty>,
    pub total_ask_qty: Option<Qty>,
    /// VWAP to buy `vwap_quantity` against the asks.
    pub vwap_buy: Option<Price>,
    /// VWAP to sell `vwap_quantity` against the bids.
    pub vwap_sell: Option<Price>,
    pub vwap_quantity: Qty,
    pub imbalance: Option<f64>,
}

impl EnrichedBookSnapshot {
    /// Capture `book` and the metrics selected by `flags` in one pass
    /// over the depth.
    #[must_use]
    pub fn capture(book: &VenueBook, flags: MetricFlags, vwap_quantity: Qty) -> Self {
        let snapshot = BookSnapshot::capture(book);

        let mid_price = flags
            .contains(MetricFlags::MID_PRICE)
            .then(|| book.mid_price());
        let spread_bps = if flags.contains(MetricFlags::SPREAD) {
            book.spread_bps()
        } else {
            None
        };

        let (total_bid_qty, total_ask_qty) = if flags.contains(MetricFlags::DEPTH) {
            let bid_total = snapshot
                .bids
                .iter()
                .fold(Qty::ZERO, |acc, l| acc.saturating_add(l.total_quantity));
            let ask_total = snapshot
                .asks
                .iter()
                .fold(Qty::ZERO, |acc, l| acc.saturating_add(l.total_quantity));
            (Some(bid_total), Some(ask_total))
        } else {
            (None, None)
        };

        let (vwap_buy, vwap_sell) = if flags.contains(MetricFlags::VWAP) {
            (
                Some(book.vwap(Side::Buy, vwap_quantity)),
                Some(book.vwap(Side::Sell, vwap_quantity)),
            )
        } else {
            (None, None)
        };

        let imbalance = flags
            .contains(MetricFlags::IMBALANCE)
            .then(|| book.imbalance(super::book::MAX_DEPTH));

        Self {
            snapshot,
            mid_price,
            spread_bps,
            total_bid_qty,
            total_ask_qty,
            vwap_buy,
            vwap_sell,
            vwap_quantity,
            imbalance,
        }
    }
}
