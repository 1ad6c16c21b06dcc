//! Image metadata and rendered-artifact references.

use serde::{Deserialize, Serialize};

use crate::types::{DisplayStamp, ImageId};

/// Baseline image metadata as served by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Stable image identifier.
    pub id: ImageId,
    /// URL of the persisted source image.
    pub image: String,
    /// Upload timestamp, backend formatting.
    #[serde(default)]
    pub uploaded_at: Option<String>,
    /// Classifier labels attached at upload time.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Soft-delete marker (image sits in the recycle bin).
    #[serde(default)]
    pub is_deleted: bool,
}

/// Reference to a rendered artifact (preview, sticker).
///
/// The server rewrites previews in place under the same logical name, so a
/// display URI must carry a cache-busting stamp to never show a stale
/// render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// URL of the rendered artifact.
    pub url: String,
}

impl ArtifactRef {
    /// Wraps a raw artifact URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Cache-busted URI for display.
    pub fn display_uri(&self, stamp: DisplayStamp) -> String {
        format!("{}?t={stamp}", self.url)
    }
}
