//! Venue identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of venues addressable by a [`Venue`] tag. Dense arrays
/// indexed by [`Venue::index`] are sized with this constant.
pub const MAX_VENUES: usize = 16;

/// Compact 8-bit venue tag.
///
/// The enumeration is closed: adapters for venues not listed here map to
/// [`Venue::Unknown`], which never contributes to the consolidated book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Venue {
    /// Reserved tag for unrecognized venues.
    #[default]
    Unknown = 0,
    Binance = 1,
    Coinbase = 2,
    Kraken = 3,
    Okx = 4,
    Bybit = 5,
    Bitstamp = 6,
    Gemini = 7,
}

impl Venue {
    /// All known venues, excluding [`Venue::Unknown`].
    pub const KNOWN: [Venue; 7] = [
        Venue::Binance,
        Venue::Coinbase,
        Venue::Kraken,
        Venue::Okx,
        Venue::Bybit,
        Venue::Bitstamp,
        Venue::Gemini,
    ];

    /// Dense array index for this venue, always `< MAX_VENUES`.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Venue::Unknown)
    }

    /// Decode an 8-bit tag; values outside the enumeration map to
    /// [`Venue::Unknown`].
    #[must_use]
    pub const fn from_u8(tag: u8) -> Self {
        match tag {
            1 => Venue::Binance,
            2 => Venue::Coinbase,
            3 => Venue::Kraken,
            4 => Venue::Okx,
            5 => Venue::Bybit,
            6 => Venue::Bitstamp,
            7 => Venue::Gemini,
            _ => Venue::Unknown,
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Venue::Unknown => "UNKNOWN",
            Venue::Binance => "BINANCE",
            Venue::Coinbase => "COINBASE",
            Venue::Kraken => "KRAKEN",
            Venue::Okx => "OKX",
            Venue::Bybit => "BYBIT",
            Venue::Bitstamp => "BITSTAMP",
            Venue::Gemini => "GEMINI",
        };
        f.write_str(name)
    }
}
