//! Persisted risk state: positions and the day's peak equity.

use super::gate::RiskGate;
use crate::types::{Price, Qty, Symbol};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Format version for risk snapshot packages.
pub const RISK_SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Failures while saving or restoring risk state.
#[derive(Debug)]
#[non_exhaustive]
pub enum RiskSnapshotError {
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

impl fmt::Display for RiskSnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskSnapshotError::SerializationError { message } => {
                write!(f, "serialization error: {message}")
            }
            RiskSnapshotError::DeserializationError { message } => {
                write!(f, "deserialization error: {message}")
            }
            RiskSnapshotError::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch: expected {expected}, but computed {actual}")
            }
            RiskSnapshotError::VersionMismatch { expected, found } => {
                write!(f, "snapshot version mismatch: expected {expected}, found {found}")
            }
        }
    }
}

impl std::error::Error for RiskSnapshotError {}

/// One symbol's persisted position state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: Symbol,
    pub quantity: Qty,
    pub avg_entry: Price,
    pub realized_pnl: f64,
}

/// Restorable capture of the risk gate's session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub positions: Vec<PositionSnapshot>,
    pub day_peak_equity: f64,
}

impl RiskSnapshot {
    /// Capture the gate's positions and peak equity.
    #[must_use]
    pub fn capture(gate: &RiskGate) -> Self {
        Self {
            positions: gate.position_snapshots(),
            day_peak_equity: gate.peak_equity(),
        }
    }
}

/// Checksummed wrapper for [`RiskSnapshot`] persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSnapshotPackage {
    pub version: u32,
    pub snapshot: RiskSnapshot,
    /// Hex-encoded SHA-256 of the serialized snapshot.
    pub checksum: String,
}

impl RiskSnapshotPackage {
    /// Create a package, computing the checksum of the snapshot contents.
    pub fn new(snapshot: RiskSnapshot) -> Result<Self, RiskSnapshotError> {
        let checksum = Self::compute_checksum(&snapshot)?;
        Ok(Self {
            version: RISK_SNAPSHOT_FORMAT_VERSION,
            snapshot,
            checksum,
        })
    }

    pub fn to_json(&self) -> Result<String, RiskSnapshotError> {
        serde_json::to_string(self).map_err(|error| RiskSnapshotError::SerializationError {
            message: error.to_string(),
        })
    }

    pub fn from_json(data: &str) -> Result<Self, RiskSnapshotError> {
        serde_json::from_str(data).map_err(|error| RiskSnapshotError::DeserializationError {
            message: error.to_string(),
        })
    }

    /// Validate the format version and checksum.
    pub fn validate(&self) -> Result<(), RiskSnapshotError> {
        if self.version != RISK_SNAPSHOT_FORMAT_VERSION {
            return Err(RiskSnapshotError::VersionMismatch {
                expected: RISK_SNAPSHOT_FORMAT_VERSION,
                found: self.version,
            });
        }
        let computed = Self::compute_checksum(&self.snapshot)?;
        if computed != self.checksum {
            return Err(RiskSnapshotError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual: computed,
            });
        }
        Ok(())
    }

    /// Consume the package, returning the validated snapshot.
    pub fn into_snapshot(self) -> Result<RiskSnapshot, RiskSnapshotError> {
        self.validate()?;
        Ok(self.snapshot)
    }

    fn compute_checksum(snapshot: &RiskSnapshot) -> Result<String, RiskSnapshotError> {
        let payload =
            serde_json::to_vec(snapshot).map_err(|error| RiskSnapshotError::SerializationError {
                message: error.to_string(),
            })?;
        let mut hasher = Sha256::new();
        hasher.update(payload);
        Ok(hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>())
    }
}
