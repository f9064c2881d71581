//! Prelude module re-exporting the commonly used surface.
//!
//! Instead of importing each type individually:
//!
//! ```rust
//! use marketmaker_rs::prelude::*;
//! ```

// Domain types
pub use crate::types::{
    BPS_SCALE, FIXED_SCALE, MAX_VENUES, Order, OrderId, OrderStatus, OrderType, Price, Qty,
    SequenceNum, Side, Symbol, Tick, TimeInForce, TimestampNs, TradeId, Venue,
};

// Books
pub use crate::book::{
    ArbitrageConfig, ArbitrageDetector, ArbitrageOpportunity, BookError, BookSnapshot,
    BookSnapshotPackage, ConsolidatedBook, ConsolidatedLevel, EnrichedBookSnapshot, MAX_DEPTH,
    MetricFlags, Nbbo, PriceLevel, VenueBook, VenueContribution,
};

// Queues and pools
pub use crate::pool::{BumpArena, MemoryPool, ObjectPool, Pooled};
pub use crate::queue::{MpmcQueue, SpscQueue};

// Strategies
pub use crate::strategy::{
    AsParams, AsQuoter, BasicQuoter, InventoryQuoter, MarketMakerParams, MarketSignal,
    QuoteDecision, QuoteReason, Quoter,
};

// Risk
pub use crate::risk::{
    KillSwitch, KillSwitchListener, Position, RiskCheckResult, RiskGate, RiskLimits,
    RiskSnapshot, RiskSnapshotPackage, RiskViolation,
};

// Engine wiring
pub use crate::engine::{
    Engine, EngineConfig, EngineEvent, EngineStats, EventRouter, EventRouterStd,
    EventRouterTokio, Fill, OrderCommand, StrategyKind, TickSender, VenueAdapter, VenueEvent,
};

// Utility functions
pub use crate::utils::{current_time_millis, current_time_nanos};
