//! In-memory edit-chain state and reconciliation.

/// Slider adjustment state and chain reconciliation.
pub mod adjust;
/// Ordered edit chain with immutable snapshots.
pub mod chain;
