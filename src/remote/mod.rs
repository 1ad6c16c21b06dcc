//! Remote image-service collaborators.
//!
//! The coordinator only ever talks to the backend through [`ImageBackend`];
//! wire formats live in [`wire`] and the reqwest transport in [`http`].

/// HTTP transport against the gallery REST API.
pub mod http;
/// JSON request/response bodies.
pub mod wire;

use async_trait::async_trait;

use crate::{
    image::{ArtifactRef, ImageRecord},
    op::EditOp,
    types::ImageId,
};

/// Failure talking to the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Transport-level failure; the request may never have reached the
    /// server.
    Network(String),
    /// The server answered with a non-success status.
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body text, for logging only.
        message: String,
    },
}

impl RemoteError {
    /// True when the server reported the resource missing. Delete treats
    /// this as success: already gone and deleted now look the same to the
    /// user.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::Rejected { status: 404, .. })
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Network(msg) => write!(f, "network failure: {msg}"),
            RemoteError::Rejected { status, message } => {
                write!(f, "rejected by server (status {status}): {message}")
            }
        }
    }
}

impl std::error::Error for RemoteError {}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Operations the editing core consumes from the image service.
///
/// `preview_chain` must treat the chain as the full operation list applied
/// to the original source image, never incrementally to a prior preview.
#[async_trait]
pub trait ImageBackend: Send + Sync + 'static {
    /// Source of truth for the baseline artifact.
    async fn fetch_image(&self, id: ImageId) -> RemoteResult<ImageRecord>;

    /// Renders the full chain against the original; returns the preview
    /// artifact.
    async fn preview_chain(&self, id: ImageId, chain: &[EditOp]) -> RemoteResult<ArtifactRef>;

    /// Promotes the most recent preview to be the persisted image.
    async fn commit_replace(&self, id: ImageId) -> RemoteResult<()>;

    /// Persists original-plus-chain as a new image; returns its identity.
    async fn create_copy(&self, id: ImageId) -> RemoteResult<ImageId>;

    /// One-shot server-side colorization of the current state.
    async fn colorize(&self, id: ImageId) -> RemoteResult<ArtifactRef>;

    /// Renders a sticker candidate without persisting it.
    async fn preview_sticker(&self, id: ImageId) -> RemoteResult<ArtifactRef>;

    /// Persists a sticker cut from the image.
    async fn create_sticker(&self, id: ImageId) -> RemoteResult<ArtifactRef>;

    /// Deletes (recycles) the image. Callers treat 404 as success.
    async fn delete_image(&self, id: ImageId) -> RemoteResult<()>;

    /// Kicks off downstream face reclustering. Fire-and-forget; outcome is
    /// never surfaced to the user.
    async fn trigger_recluster(&self) -> RemoteResult<()>;
}
