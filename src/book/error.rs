//! Order book error types.

use crate::types::{OrderId, Price, Qty};
use std::fmt;

/// Errors that can occur within a book.
#[derive(Debug)]
#[non_exhaustive]
pub enum BookError {
    /// Order not found in the book's order index.
    OrderNotFound(OrderId),

    /// An order with this id is already tracked.
    DuplicateOrder(OrderId),

    /// Price must be positive for resting orders and level updates.
    InvalidPrice(Price),

    /// Quantity must be non-negative.
    InvalidQuantity(Qty),

    /// Error while serializing snapshot data.
    SerializationError {
        /// Underlying error message.
        message: String,
    },

    /// Error while deserializing snapshot data.
    DeserializationError {
        /// Underlying error message.
        message: String,
    },

    /// Snapshot integrity check failed.
    ChecksumMismatch {
        /// Expected checksum value.
        expected: String,
        /// Actual checksum value.
        actual: String,
    },

    /// Snapshot was produced by an incompatible format version.
    VersionMismatch {
        /// Version expected by this build.
        expected: u32,
        /// Version found in the package.
        found: u32,
    },
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::OrderNotFound(id) => write!(f, "order not found: {id}"),
            BookError::DuplicateOrder(id) => write!(f, "duplicate order id: {id}"),
            BookError::InvalidPrice(price) => write!(f, "invalid price: {price}"),
            BookError::InvalidQuantity(qty) => write!(f, "invalid quantity: {qty}"),
            BookError::SerializationError { message } => {
                write!(f, "serialization error: {message}")
            }
            BookError::DeserializationError { message } => {
                write!(f, "deserialization error: {message}")
            }
            BookError::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch: expected {expected}, but computed {actual}")
            }
            BookError::VersionMismatch { expected, found } => {
                write!(f, "snapshot version mismatch: expected {expected}, found {found}")
            }
        }
    }
}

impl std::error::Error for BookError {}
