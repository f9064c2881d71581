//! Engine wiring: configuration, typed venue events, the adapter
//! contract, the feed → strategy → risk → order pipeline, and the
//! monitoring surface.

mod adapter;
mod config;
mod events;
mod pipeline;
mod router;
mod stats;

pub use adapter::VenueAdapter;
pub use config::{
    ConfigError, EngineConfig, QueueConfig, StrategyConfig, StrategyKind, TradingConfig,
};
pub use events::{EngineEvent, Fill, OrderCommand, VenueEvent};
pub use pipeline::{Engine, TickSender};
pub use router::{EngineEventListener, EventRouter, EventRouterStd, EventRouterTokio};
pub use stats::{EngineStats, StatsSnapshot};
