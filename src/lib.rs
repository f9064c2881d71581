//! # Multi-Venue Market-Making Engine
//!
//! A single-symbol cryptocurrency market-making engine with multi-venue
//! extensions. The crate is the hot trading path and its supporting data
//! structures; exchange transport, credential handling, and the CLI live
//! in the applications that embed it.
//!
//! ## Architecture
//!
//! Market data flows from venue adapter threads through lock-free rings
//! into per-venue order books; a consolidated book merges them into an
//! NBBO view; quoting strategies read that view plus the current position
//! and emit order intents; a centralized risk gate validates every intent
//! before it reaches a venue. Execution reports flow back on a symmetric
//! path and mutate position, P&L, and open-order state.
//!
//! Five subsystems carry the load:
//!
//! - [`queue`]: bounded SPSC and MPMC sequence-numbered ring queues with
//!   cache-line padding between producer and consumer state. A successful
//!   push happens-before the pop that observes it.
//! - [`pool`]: fixed-capacity allocators (a lock-free slot arena, an
//!   object pool with scope-bound return, and a bump arena for
//!   frame-scoped scratch) so the steady-state hot path never touches
//!   the heap.
//! - [`book`]: per-venue price-ladder books with a lazily rebuilt depth
//!   cache, plus the consolidated cross-venue book, NBBO derivation, and
//!   arbitrage detection.
//! - [`strategy`]: basic, inventory-adjusted, and Avellaneda–Stoikov
//!   quoters over a shared integer quoting core with minimum-quote-life
//!   hysteresis.
//! - [`risk`]: ordered pre-trade checks, position and P&L bookkeeping,
//!   drawdown watch, and the process-wide kill switch.
//!
//! [`engine`] wires them together: typed venue events, a serde
//! configuration surface, the trading threads, and a monitoring event
//! router in std and Tokio flavors.
//!
//! ## Numeric conventions
//!
//! Prices and quantities are fixed-point `i64` at scale `10^8`
//! ([`types::FIXED_SCALE`]); basis-point arithmetic uses integer scale
//! `10_000`. Floating point appears only at the boundaries: signal
//! inputs and monitoring readouts.
//!
//! ## Example
//!
//! ```
//! use marketmaker_rs::prelude::*;
//!
//! let book = ConsolidatedBook::new(Symbol::new("BTCUSDT"));
//! let tick = Tick::quote(
//!     Venue::Binance,
//!     Price::from_f64(10_000.0),
//!     Qty::from_f64(1.0),
//!     Price::from_f64(10_001.0),
//!     Qty::from_f64(1.0),
//!     1,
//!     0,
//!     0,
//! );
//! assert!(book.apply_tick(&tick));
//!
//! let mut quoter = Quoter::Basic(BasicQuoter::new(MarketMakerParams::default()));
//! let decision = quoter.compute_quotes(&book, Qty::ZERO, &MarketSignal::flat(), 1_000);
//! assert!(decision.should_quote);
//! assert!(decision.bid_price < decision.ask_price);
//! ```

pub mod book;
pub mod engine;
pub mod pool;
pub mod queue;
pub mod risk;
pub mod strategy;
pub mod types;

pub mod prelude;
mod utils;

pub use book::{ConsolidatedBook, Nbbo, VenueBook};
pub use engine::{Engine, EngineConfig, EngineEvent, VenueAdapter, VenueEvent};
pub use risk::{KillSwitch, RiskCheckResult, RiskGate, RiskViolation};
pub use strategy::{MarketSignal, QuoteDecision, Quoter};
pub use types::{Order, OrderId, Price, Qty, Side, Symbol, Tick, Venue};
pub use utils::{current_time_millis, current_time_nanos};
