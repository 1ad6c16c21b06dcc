use tokio::time::{Duration, Instant};

use crate::core::chain::ChainSnapshot;

/// Trailing-debounce bookkeeping for adjustment-driven previews.
///
/// Slider drags arrive at UI event frequency; only the last chain seen
/// within the quiet window is worth a network call. The coordinator loop
/// selects on [`deadline`](Self::deadline) while
/// [`is_armed`](Self::is_armed), so an armed scheduler fires exactly once
/// unless a newer mutation re-arms or cancels it first.
#[derive(Debug)]
pub struct PreviewScheduler {
    quiet: Duration,
    pending: Option<ChainSnapshot>,
    deadline: Instant,
}

impl PreviewScheduler {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            deadline: Instant::now(),
        }
    }

    /// Stores the chain to dispatch and restarts the quiet window.
    /// Replaces any previously armed chain.
    pub fn arm(&mut self, chain: ChainSnapshot) {
        self.pending = Some(chain);
        self.deadline = Instant::now() + self.quiet;
    }

    /// Discards the armed chain, if any. Discrete dispatches and revert
    /// cancel here; in-flight requests are neutralized by the epoch check
    /// instead.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Instant at which the armed chain becomes due. Meaningless while not
    /// armed; guard the select arm with [`is_armed`](Self::is_armed).
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Takes the due chain for dispatch.
    pub fn fire(&mut self) -> Option<ChainSnapshot> {
        self.pending.take()
    }
}
