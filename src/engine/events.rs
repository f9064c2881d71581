//! Typed event messages.
//!
//! Venue adapters never mutate engine state directly: everything they
//! observe becomes a [`VenueEvent`] posted on the engine's event queue
//! and consumed in one place, which preserves the pipeline's
//! happens-before contract. [`EngineEvent`] is the outbound monitoring
//! stream.

use crate::book::ArbitrageOpportunity;
use crate::risk::RiskViolation;
use crate::types::{Order, OrderId, Price, Qty, Side, Symbol, Tick, TimestampNs, TradeId, Venue};
use serde::Serialize;
use uuid::Uuid;

/// One execution against an order the engine owns.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub venue: Venue,
    pub side: Side,
    pub quantity: Qty,
    pub price: Price,
    pub timestamp: TimestampNs,
}

/// Inbound event from a venue adapter.
#[derive(Debug, Clone)]
pub enum VenueEvent {
    /// Top-of-book update.
    Tick(Tick),
    /// Order state change (ack, cancel, reject, expiry).
    OrderUpdate(Order),
    /// Execution report.
    Fill(Fill),
    Connected(Venue),
    Disconnected(Venue),
    VenueError { venue: Venue, message: String },
}

/// Command from the strategy path to the order thread.
#[derive(Debug, Clone)]
pub enum OrderCommand {
    Place(Order),
    Cancel {
        order_id: OrderId,
        symbol: Symbol,
        venue: Venue,
    },
}

/// Outbound monitoring event.
#[derive(Debug, Clone, Serialize)]
pub enum EngineEvent {
    Started {
        session_id: Uuid,
    },
    Stopped {
        session_id: Uuid,
    },
    QuotePlaced {
        order_id: OrderId,
        side: Side,
        price: Price,
        size: Qty,
    },
    OrderRejected {
        order_id: OrderId,
        violation: Option<RiskViolation>,
        message: String,
    },
    KillSwitchEngaged {
        reason: String,
    },
    VenueConnected(Venue),
    VenueDisconnected(Venue),
    ArbitrageDetected(ArbitrageOpportunity),
}
