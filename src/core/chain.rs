use std::sync::Arc;

use crate::op::EditOp;

/// Immutable view of a chain at one point in time.
///
/// Every mutation produces a fresh snapshot; snapshots already handed to
/// callers are never touched, so "chain at request time" and "chain now"
/// can be compared safely.
pub type ChainSnapshot = Arc<[EditOp]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The operation does not enter the chain through `append`: adjustments
    /// merge through the reconciler and colorize dispatches immediately.
    NotChainable(EditOp),
    /// Rotations must be a multiple of 90 degrees.
    BadRotation(i32),
}

impl std::fmt::Display for ChainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainError::NotChainable(op) => write!(f, "operation `{op}` cannot be appended"),
            ChainError::BadRotation(degrees) => {
                write!(f, "rotation by {degrees} is not a multiple of 90")
            }
        }
    }
}

impl std::error::Error for ChainError {}

/// Ordered sequence of edit operations for one editing session.
///
/// The server interprets the sequence as applied left-to-right to the
/// original source image, never to an edited derivative, so the full chain
/// is resent on every change.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EditChain {
    ops: Vec<EditOp>,
}

impl EditChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a discrete operation and returns the new snapshot.
    ///
    /// Repeated rotates and mirrors accumulate; nothing is merged or
    /// deduplicated here.
    pub fn append(&mut self, op: EditOp) -> Result<ChainSnapshot, ChainError> {
        if !op.is_chainable() {
            return Err(ChainError::NotChainable(op));
        }
        if let EditOp::Rotate { degrees } = op {
            if degrees % 90 != 0 {
                return Err(ChainError::BadRotation(degrees));
            }
        }
        self.ops.push(op);
        Ok(self.snapshot())
    }

    /// Removes every entry. Used by revert and rebaseline.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Live ordered sequence.
    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Immutable copy of the current chain.
    pub fn snapshot(&self) -> ChainSnapshot {
        Arc::from(self.ops.as_slice())
    }

    /// Replaces the whole sequence. Reconciliation rebuilds the chain as a
    /// unit so ordering stays deterministic.
    pub(crate) fn replace(&mut self, ops: Vec<EditOp>) -> ChainSnapshot {
        self.ops = ops;
        self.snapshot()
    }
}
