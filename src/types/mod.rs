//! Core domain types shared by every subsystem: fixed-point price and
//! quantity, venue and order identifiers, the inline symbol key, and the
//! cache-aligned `Order` and `Tick` records.

mod fixed;
mod order;
mod symbol;
mod tick;
mod venue;

pub use fixed::{BPS_SCALE, FIXED_SCALE, Price, Qty, notional};
pub use order::{Order, OrderStatus, OrderType, Side, TimeInForce};
pub use symbol::Symbol;
pub use tick::Tick;
pub use venue::{MAX_VENUES, Venue};

/// Unique order identifier assigned by the engine or a venue.
pub type OrderId = u64;

/// Unique trade identifier assigned by a venue.
pub type TradeId = u64;

/// Monotonic per-venue market-data sequence number.
pub type SequenceNum = u64;

/// Nanoseconds since the Unix epoch.
pub type TimestampNs = u64;
