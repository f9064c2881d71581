//! The contract between the engine and exchange adapters.

use crate::types::{Order, OrderId, Symbol, TimestampNs, Venue};

/// Capability set every venue adapter provides to the core.
///
/// Transport, signing, and wire formats live entirely behind this trait.
/// Adapters report what they observe by posting [`VenueEvent`]s through
/// the [`TickSender`] and event queue handed to them at registration;
/// they never call back into engine state.
///
/// [`VenueEvent`]: crate::engine::VenueEvent
/// [`TickSender`]: crate::engine::TickSender
pub trait VenueAdapter: Send + Sync {
    /// The venue this adapter speaks for.
    fn venue(&self) -> Venue;

    /// Establish connectivity. Returns `false` on failure; the engine
    /// does not retry.
    fn connect(&self) -> bool;

    fn disconnect(&self);

    fn is_connected(&self) -> bool;

    fn subscribe_ticker(&self, symbol: Symbol) -> bool;

    fn subscribe_orderbook(&self, symbol: Symbol, depth: usize) -> bool;

    fn subscribe_trades(&self, symbol: Symbol) -> bool;

    fn unsubscribe(&self, symbol: Symbol);

    /// Submit an order. Returns the venue-assigned id, or `0` on failure.
    fn send_order(&self, order: &Order) -> OrderId;

    fn cancel_order(&self, order_id: OrderId, symbol: Symbol) -> bool;

    fn cancel_all(&self, symbol: Symbol);

    /// Most recent measured round-trip latency.
    fn latency_ns(&self) -> TimestampNs;

    /// Venue server time.
    fn server_time(&self) -> TimestampNs;
}
