//! The order record and its enumerations.

use super::{OrderId, Price, Qty, Symbol, TimestampNs, Venue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    /// The opposing side.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

/// Order pricing behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderType {
    /// Rest at the limit price.
    #[default]
    Limit = 0,
    /// Execute immediately at the best available price.
    Market = 1,
    /// Limit order that is rejected instead of taking liquidity.
    LimitMaker = 2,
    /// Immediate-or-cancel.
    Ioc = 3,
    /// Fill-or-kill.
    Fok = 4,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderType::Limit => "LIMIT",
            OrderType::Market => "MARKET",
            OrderType::LimitMaker => "LIMIT_MAKER",
            OrderType::Ioc => "IOC",
            OrderType::Fok => "FOK",
        };
        f.write_str(name)
    }
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderStatus {
    #[default]
    New = 0,
    PartiallyFilled = 1,
    Filled = 2,
    Canceled = 3,
    Rejected = 4,
    Expired = 5,
}

impl OrderStatus {
    /// Whether this status ends the order lifecycle.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Canceled
                | OrderStatus::Rejected
                | OrderStatus::Expired
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::New => "NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Expired => "EXPIRED",
        };
        f.write_str(name)
    }
}

/// Time-in-force policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TimeInForce {
    /// Good till canceled.
    #[default]
    Gtc = 0,
    /// Immediate or cancel.
    Ioc = 1,
    /// Fill or kill.
    Fok = 2,
    /// Good till crossing (post-only).
    Gtx = 3,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeInForce::Gtc => "GTC",
            TimeInForce::Ioc => "IOC",
            TimeInForce::Fok => "FOK",
            TimeInForce::Gtx => "GTX",
        };
        f.write_str(name)
    }
}

/// A single order, laid out as a cache-aligned 128-byte record.
///
/// The record is `#[repr(C, align(64))]` so arrays of orders never share a
/// cache line between adjacent entries and the field layout is stable for
/// pool storage. The trailing reserved bytes pad the struct to exactly two
/// cache lines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[repr(C, align(64))]
pub struct Order {
    /// Engine-assigned order identifier.
    pub id: OrderId,
    /// Client (venue-facing) identifier, zero until acknowledged.
    pub client_id: u64,
    /// Limit price; zero for market orders.
    pub price: Price,
    /// Total order quantity.
    pub quantity: Qty,
    /// Quantity filled so far.
    pub filled_qty: Qty,
    /// Creation time, nanoseconds since the epoch.
    pub timestamp: TimestampNs,
    /// Trading symbol.
    pub symbol: Symbol,
    /// Destination venue.
    pub venue: Venue,
    pub side: Side,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub time_in_force: TimeInForce,
    #[serde(skip, default = "reserved_pad")]
    _reserved: [u8; 59],
}

fn reserved_pad() -> [u8; 59] {
    [0u8; 59]
}

impl Order {
    /// Build a resting limit order in status `New`.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn limit(
        id: OrderId,
        symbol: Symbol,
        venue: Venue,
        side: Side,
        price: Price,
        quantity: Qty,
        time_in_force: TimeInForce,
        timestamp: TimestampNs,
    ) -> Self {
        Self {
            id,
            client_id: 0,
            price,
            quantity,
            filled_qty: Qty::ZERO,
            timestamp,
            symbol,
            venue,
            side,
            order_type: OrderType::Limit,
            status: OrderStatus::New,
            time_in_force,
            _reserved: [0u8; 59],
        }
    }

    /// Quantity still open: `quantity - filled_qty`.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> Qty {
        self.quantity.saturating_sub(self.filled_qty)
    }

    /// Whether the order is still working (`New` or `PartiallyFilled`).
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::New | OrderStatus::PartiallyFilled
        )
    }
}

impl Default for Order {
    fn default() -> Self {
        Self {
            id: 0,
            client_id: 0,
            price: Price::ZERO,
            quantity: Qty::ZERO,
            filled_qty: Qty::ZERO,
            timestamp: 0,
            symbol: Symbol::empty(),
            venue: Venue::Unknown,
            side: Side::Buy,
            order_type: OrderType::Limit,
            status: OrderStatus::New,
            time_in_force: TimeInForce::Gtc,
            _reserved: [0u8; 59],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        Order::limit(
            7,
            Symbol::new("BTCUSDT"),
            Venue::Binance,
            Side::Buy,
            Price::from_f64(10_000.0),
            Qty::from_f64(1.5),
            TimeInForce::Gtc,
            1_700_000_000_000_000_000,
        )
    }

    #[test]
    fn layout_is_two_cache_lines() {
        assert_eq!(std::mem::align_of::<Order>(), 64);
        assert_eq!(std::mem::size_of::<Order>(), 128);
    }

    #[test]
    fn remaining_and_active_track_fills() {
        let mut order = sample_order();
        assert_eq!(order.remaining(), Qty::from_f64(1.5));
        assert!(order.is_active());

        order.filled_qty = Qty::from_f64(0.5);
        order.status = OrderStatus::PartiallyFilled;
        assert_eq!(order.remaining(), Qty::from_f64(1.0));
        assert!(order.is_active());

        order.filled_qty = order.quantity;
        order.status = OrderStatus::Filled;
        assert_eq!(order.remaining(), Qty::ZERO);
        assert!(!order.is_active());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::PartiallyFilled.is_terminal());
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
    }

    #[test]
    fn side_display_and_opposite() {
        assert_eq!(Side::Buy.to_string(), "BUY");
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }
}
