//! Edit operation model and wire-token encoding.
//!
//! The backend consumes a chain as a flat list of string tokens
//! (`"rotate:90"`, `"mirror"`, `"brightness:30"`) applied left-to-right to
//! the original source image, so [`EditOp`] serializes as its token rather
//! than a tagged object.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::AdjustKind;

/// Inclusive bound for adjustment slider values.
pub const ADJUST_RANGE: i16 = 100;

/// A single edit instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    /// Clockwise rotation by a multiple of 90 degrees.
    Rotate {
        /// Degrees, always a multiple of 90.
        degrees: i32,
    },
    /// Horizontal flip.
    Mirror,
    /// Continuous slider adjustment. At most one entry per kind may exist
    /// in a chain; entering one goes through the reconciler, never through
    /// plain append.
    Adjust {
        /// Adjustment category.
        kind: AdjustKind,
        /// Value in `[-ADJUST_RANGE, ADJUST_RANGE]`; never 0 inside a chain.
        value: i16,
    },
    /// One-shot colorization. Applied immediately server-side through its
    /// own endpoint; never part of the debounced chain.
    Colorize,
}

impl EditOp {
    /// True for operations that are appended to the chain verbatim.
    /// Adjustments merge through the reconciler and colorize bypasses the
    /// chain entirely.
    pub fn is_chainable(self) -> bool {
        matches!(self, EditOp::Rotate { .. } | EditOp::Mirror)
    }

    /// True for `Adjust` entries of any kind.
    pub fn is_adjust(self) -> bool {
        matches!(self, EditOp::Adjust { .. })
    }
}

impl std::fmt::Display for EditOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditOp::Rotate { degrees } => write!(f, "rotate:{degrees}"),
            EditOp::Mirror => f.write_str("mirror"),
            EditOp::Adjust { kind, value } => write!(f, "{kind}:{value}"),
            EditOp::Colorize => f.write_str("colorize"),
        }
    }
}

/// Failure to parse a wire token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOpError {
    token: String,
}

impl std::fmt::Display for ParseOpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized edit token `{}`", self.token)
    }
}

impl std::error::Error for ParseOpError {}

impl std::str::FromStr for EditOp {
    type Err = ParseOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseOpError {
            token: s.to_string(),
        };

        match s {
            "mirror" => return Ok(EditOp::Mirror),
            "colorize" => return Ok(EditOp::Colorize),
            _ => {}
        }

        let (head, tail) = s.split_once(':').ok_or_else(err)?;
        if head == "rotate" {
            let degrees: i32 = tail.parse().map_err(|_| err())?;
            if degrees % 90 != 0 {
                return Err(err());
            }
            return Ok(EditOp::Rotate { degrees });
        }

        let kind = AdjustKind::parse_token(head).ok_or_else(err)?;
        let value: i16 = tail.parse().map_err(|_| err())?;
        if value == 0 || value.abs() > ADJUST_RANGE {
            return Err(err());
        }
        Ok(EditOp::Adjust { kind, value })
    }
}

impl Serialize for EditOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EditOp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}
