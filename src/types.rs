//! Shared primitive IDs and adjustment enums.

use serde::{Deserialize, Serialize};

/// Stable identifier of a source image, immutable for a session.
pub type ImageId = u64;
/// Monotonic preview-request epoch. Incremented before every dispatch;
/// a completion whose captured epoch no longer matches is stale.
pub type RequestEpoch = u64;
/// Strictly increasing cache-busting stamp appended to displayed URIs.
pub type DisplayStamp = u64;

/// Continuous slider adjustment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustKind {
    /// Overall lightness.
    Brightness,
    /// Tonal separation.
    Contrast,
    /// Color intensity.
    Saturation,
    /// Edge emphasis.
    Sharpness,
}

impl AdjustKind {
    /// Canonical reconciliation order. Reconciling the same adjustment
    /// state must always yield an identical chain, so re-appended entries
    /// follow this fixed order.
    pub const ORDER: [AdjustKind; 4] = [
        AdjustKind::Brightness,
        AdjustKind::Contrast,
        AdjustKind::Saturation,
        AdjustKind::Sharpness,
    ];

    /// Wire-token prefix for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            AdjustKind::Brightness => "brightness",
            AdjustKind::Contrast => "contrast",
            AdjustKind::Saturation => "saturation",
            AdjustKind::Sharpness => "sharpness",
        }
    }

    /// Parses a wire-token prefix.
    pub fn parse_token(s: &str) -> Option<Self> {
        match s {
            "brightness" => Some(AdjustKind::Brightness),
            "contrast" => Some(AdjustKind::Contrast),
            "saturation" => Some(AdjustKind::Saturation),
            "sharpness" => Some(AdjustKind::Sharpness),
            _ => None,
        }
    }
}

impl std::fmt::Display for AdjustKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
