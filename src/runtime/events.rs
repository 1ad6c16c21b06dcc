//! Coordinator event stream payloads.
//!
//! Commands answer their caller through a oneshot; events exist for the
//! screen observing the session. Asynchronous failures (a preview that
//! fails after its command already returned) surface as a single
//! [`EditorEvent::Notice`] with a short human-readable message — network
//! errors and server rejections are only distinguished in logs.

use crate::{
    image::ArtifactRef,
    types::{ImageId, RequestEpoch},
};

/// Events emitted from the single-writer coordinator loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// A preview response matching the current epoch replaced the
    /// displayed artifact.
    PreviewUpdated {
        /// Epoch of the accepted response.
        epoch: RequestEpoch,
        /// The new preview artifact.
        artifact: ArtifactRef,
    },
    /// A user-facing notice for an asynchronous failure.
    Notice {
        /// Short human-readable message.
        message: String,
    },
    /// The chain was committed over the source image.
    Saved {
        /// Image that was replaced.
        id: ImageId,
    },
    /// A copy was persisted under a new identity.
    CopySaved {
        /// Identity of the new image.
        new_id: ImageId,
    },
    /// All pending edits were discarded.
    Reverted {
        /// Session image.
        id: ImageId,
    },
    /// Deletion was requested; confirmation UI should open.
    DeleteRequested {
        /// Session image.
        id: ImageId,
    },
    /// The image is gone and the session has ended.
    Deleted {
        /// Deleted image.
        id: ImageId,
    },
    /// A sticker was persisted to the gallery.
    StickerSaved {
        /// Source image the sticker was cut from.
        id: ImageId,
    },
}
