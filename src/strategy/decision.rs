//! Quote decisions and the strategy input signal.

use crate::types::{Price, Qty};
use serde::Serialize;
use std::fmt;

/// Why a strategy did or did not quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuoteReason {
    /// Quotes produced.
    Quoting,
    /// Strategy is disabled.
    Disabled,
    /// Book is empty or crossed.
    InvalidBook,
    /// Fair value computed to zero.
    ZeroFairValue,
    /// Computed bid would meet or cross the computed ask.
    CrossedQuotes,
    /// Size shaping reduced both sides to zero.
    ZeroSizes,
    /// Hysteresis: inside the minimum quote life with no meaningful move.
    PricesUnchanged,
}

impl fmt::Display for QuoteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            QuoteReason::Quoting => "Quoting",
            QuoteReason::Disabled => "Strategy disabled",
            QuoteReason::InvalidBook => "Invalid book",
            QuoteReason::ZeroFairValue => "Zero fair value",
            QuoteReason::CrossedQuotes => "Prices would cross",
            QuoteReason::ZeroSizes => "Zero sizes",
            QuoteReason::PricesUnchanged => "Prices unchanged",
        };
        f.write_str(text)
    }
}

/// A strategy's output for one evaluation cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuoteDecision {
    pub should_quote: bool,
    pub bid_price: Price,
    pub bid_size: Qty,
    pub ask_price: Price,
    pub ask_size: Qty,
    pub reason: QuoteReason,
}

impl QuoteDecision {
    /// A suppressed quote with the given reason.
    #[must_use]
    pub const fn no_quote(reason: QuoteReason) -> Self {
        Self {
            should_quote: false,
            bid_price: Price::ZERO,
            bid_size: Qty::ZERO,
            ask_price: Price::ZERO,
            ask_size: Qty::ZERO,
            reason,
        }
    }

    /// A two-sided quote.
    #[must_use]
    pub const fn quote(bid_price: Price, bid_size: Qty, ask_price: Price, ask_size: Qty) -> Self {
        Self {
            should_quote: true,
            bid_price,
            bid_size,
            ask_price,
            ask_size,
            reason: QuoteReason::Quoting,
        }
    }
}

/// External signal inputs to quoting. The only floating-point values on
/// the strategy path.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketSignal {
    /// Dimensionless volatility estimate; scales the target spread as
    /// `(1 + volatility)`.
    pub volatility: f64,
}

impl MarketSignal {
    #[must_use]
    pub const fn flat() -> Self {
        Self { volatility: 0.0 }
    }
}
