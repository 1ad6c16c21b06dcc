use hashbrown::HashMap;

use crate::{
    core::chain::{ChainSnapshot, EditChain},
    op::{EditOp, ADJUST_RANGE},
    types::AdjustKind,
};

/// Current slider values for one session.
///
/// Only non-zero values are stored; setting a kind back to its neutral
/// value (0) removes it entirely, so "all sliders neutral" and "no
/// adjustments at all" are the same state.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Adjustments {
    values: HashMap<AdjustKind, i16>,
}

impl Adjustments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one slider, clamping to `[-ADJUST_RANGE, ADJUST_RANGE]`.
    pub fn set(&mut self, kind: AdjustKind, value: i16) {
        let value = value.clamp(-ADJUST_RANGE, ADJUST_RANGE);
        if value == 0 {
            self.values.remove(&kind);
        } else {
            self.values.insert(kind, value);
        }
    }

    /// Current value for a kind; 0 when unset.
    pub fn get(&self, kind: AdjustKind) -> i16 {
        self.values.get(&kind).copied().unwrap_or(0)
    }

    /// True when every slider sits at its neutral value.
    pub fn is_neutral(&self) -> bool {
        self.values.is_empty()
    }

    /// Resets every slider to neutral.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Merges this adjustment state into the chain.
    ///
    /// Existing `Adjust` entries of any kind are dropped, all other entries
    /// keep their relative order, then exactly one entry per non-zero kind
    /// is appended in [`AdjustKind::ORDER`]. Reconciling twice from the
    /// same state yields an identical chain.
    pub fn reconcile(&self, chain: &mut EditChain) -> ChainSnapshot {
        let mut ops: Vec<EditOp> = chain
            .ops()
            .iter()
            .copied()
            .filter(|op| !op.is_adjust())
            .collect();

        for kind in AdjustKind::ORDER {
            let value = self.get(kind);
            if value != 0 {
                ops.push(EditOp::Adjust { kind, value });
            }
        }

        chain.replace(ops)
    }
}
