//! Centralized pre-trade risk gate and P&L bookkeeping.
//!
//! Every order intent passes through [`RiskGate::check_order`] before it
//! can reach a venue. The gate runs a fixed sequence of checks, keeps the
//! per-symbol position map, marks positions to market, and owns the
//! process-wide [`KillSwitch`]. Violations are structured verdicts, never
//! panics or errors: the hot path always gets an answer.

mod gate;
mod kill_switch;
mod position;
mod snapshot;

pub use gate::{RiskCheckResult, RiskGate, RiskLimits, RiskViolation};
pub use kill_switch::{KillSwitch, KillSwitchListener};
pub use position::Position;
pub use snapshot::{PositionSnapshot, RiskSnapshot, RiskSnapshotError, RiskSnapshotPackage};
