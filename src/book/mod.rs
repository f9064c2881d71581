//! Per-venue and consolidated order books.
//!
//! [`VenueBook`] holds one venue's bid and ask ladders for a single
//! symbol. [`ConsolidatedBook`] aggregates the active venue books into a
//! merged depth view with an NBBO, and is the only read surface strategies
//! see. [`ArbitrageDetector`] screens the consolidated view for
//! cross-venue dislocations.

mod arbitrage;
mod book;
mod cache;
mod consolidated;
mod error;
mod level;
mod snapshot;

mod tests;

pub use arbitrage::{ArbitrageConfig, ArbitrageDetector, ArbitrageOpportunity};
pub use book::{MAX_DEPTH, VenueBook};
pub use consolidated::{ConsolidatedBook, ConsolidatedLevel, Nbbo, VenueContribution};
pub use error::BookError;
pub use level::PriceLevel;
pub use snapshot::{BookSnapshot, BookSnapshotPackage, EnrichedBookSnapshot, MetricFlags};
