//! Per-image editing session state.
//!
//! The session is the single owner of the chain, the slider values, the
//! preview reference, and the request epoch. All mutation goes through
//! methods here; the runtime loop in [`crate::runtime`] is its only caller
//! once spawned.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::{
    core::{
        adjust::Adjustments,
        chain::{ChainError, ChainSnapshot, EditChain},
    },
    image::{ArtifactRef, ImageRecord},
    op::EditOp,
    types::{AdjustKind, DisplayStamp, ImageId, RequestEpoch},
};

/// Dirty-state machine for one session.
///
/// Failures never transition state; errors are transient notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EditState {
    /// No pending edits; the original is displayed.
    Clean,
    /// Edits exist and a preview request is debounced or in flight.
    DirtyPending,
    /// Edits exist and the last successful response matches the current
    /// epoch.
    DirtyRendered,
}

/// Read-only copy of session state for callers outside the runtime loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    /// Source image identity.
    pub image_id: ImageId,
    /// Current dirty state.
    pub state: EditState,
    /// Current chain contents.
    pub chain: Vec<EditOp>,
    /// Latest rendered preview, if any.
    pub preview: Option<ArtifactRef>,
    /// Cache-busted URI of whatever should be displayed right now.
    pub displayed: Option<String>,
    /// Current request epoch.
    pub epoch: RequestEpoch,
}

/// Exclusive-ownership editing session for one image.
#[derive(Debug)]
pub struct EditSession {
    image_id: ImageId,
    baseline: Option<ImageRecord>,
    chain: EditChain,
    adjustments: Adjustments,
    preview: Option<ArtifactRef>,
    epoch: RequestEpoch,
    display_stamp: DisplayStamp,
    state: EditState,
}

impl EditSession {
    /// Creates a session with an empty chain against a not-yet-fetched
    /// baseline.
    pub fn new(image_id: ImageId) -> Self {
        Self {
            image_id,
            baseline: None,
            chain: EditChain::new(),
            adjustments: Adjustments::new(),
            preview: None,
            epoch: 0,
            display_stamp: now_ms(),
            state: EditState::Clean,
        }
    }

    pub fn image_id(&self) -> ImageId {
        self.image_id
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn chain(&self) -> &EditChain {
        &self.chain
    }

    pub fn adjustments(&self) -> &Adjustments {
        &self.adjustments
    }

    pub fn preview(&self) -> Option<&ArtifactRef> {
        self.preview.as_ref()
    }

    pub fn current_epoch(&self) -> RequestEpoch {
        self.epoch
    }

    /// Appends a discrete operation and marks the session pending.
    pub fn apply_discrete(&mut self, op: EditOp) -> Result<ChainSnapshot, ChainError> {
        let snapshot = self.chain.append(op)?;
        self.state = EditState::DirtyPending;
        Ok(snapshot)
    }

    /// Updates one slider, reconciles the chain, and marks the session
    /// pending.
    pub fn set_adjustment(&mut self, kind: AdjustKind, value: i16) -> ChainSnapshot {
        self.adjustments.set(kind, value);
        let snapshot = self.adjustments.reconcile(&mut self.chain);
        self.state = EditState::DirtyPending;
        snapshot
    }

    /// Marks the session pending without touching the chain. Used by the
    /// immediate colorize path.
    pub fn mark_pending(&mut self) {
        self.state = EditState::DirtyPending;
    }

    /// Reserves the epoch for a request about to be dispatched.
    pub fn begin_request(&mut self) -> RequestEpoch {
        self.epoch += 1;
        self.epoch
    }

    /// Installs a preview response. Returns `false` (and changes nothing)
    /// when the captured epoch has been superseded by a later dispatch.
    pub fn accept_preview(&mut self, epoch: RequestEpoch, artifact: ArtifactRef) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.preview = Some(artifact);
        self.bump_stamp();
        self.state = EditState::DirtyRendered;
        true
    }

    /// Replaces the baseline record, e.g. after the initial fetch or a
    /// post-save refresh.
    pub fn set_baseline(&mut self, record: ImageRecord) {
        self.baseline = Some(record);
        self.bump_stamp();
    }

    /// Drops all pending edit state and returns to `Clean`. The caller
    /// re-fetches the baseline separately.
    ///
    /// The epoch advances so that a preview still in flight for the old
    /// chain arrives stale instead of landing on the fresh session.
    pub fn reset(&mut self) {
        self.chain.clear();
        self.adjustments.clear();
        self.preview = None;
        self.state = EditState::Clean;
        self.epoch += 1;
        self.bump_stamp();
    }

    /// Cache-busted URI of the artifact to display: the preview when one
    /// exists, otherwise the baseline.
    pub fn displayed_uri(&self) -> Option<String> {
        if let Some(preview) = &self.preview {
            return Some(preview.display_uri(self.display_stamp));
        }
        self.baseline
            .as_ref()
            .map(|record| ArtifactRef::new(record.image.clone()).display_uri(self.display_stamp))
    }

    /// Read-only copy for the runtime's query commands.
    pub fn view(&self) -> SessionView {
        SessionView {
            image_id: self.image_id,
            state: self.state,
            chain: self.chain.ops().to_vec(),
            preview: self.preview.clone(),
            displayed: self.displayed_uri(),
            epoch: self.epoch,
        }
    }

    fn bump_stamp(&mut self) {
        // The preview artifact keeps its logical name across renders, so
        // the stamp must advance even when the wall clock does not.
        self.display_stamp = now_ms().max(self.display_stamp + 1);
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
