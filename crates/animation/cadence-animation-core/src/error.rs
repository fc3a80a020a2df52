//! Error taxonomy for sequencing and playback.
//!
//! Everything here is a programmer/configuration error surfaced at build or
//! play time. Stale targets and rejected one-shots are soft failures and never
//! reach this type; they are logged at the call boundary instead.

use cadence_api_core::{ValueError, ValueKind, ValueOp};
use serde::{Deserialize, Serialize};

/// Result alias used across the crate.
pub type Result<T> = core::result::Result<T, AnimationError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimationError {
    /// A track with no keyframes or a sequence with no blocks
    #[error("Empty animation: {what}")]
    EmptyAnimation { what: String },

    /// The property cannot be driven on this target
    #[error("Property '{property}' is not compatible with the target")]
    IncompatibleProperty { property: String },

    /// Neither an explicit nor a default target was available
    #[error("No target to play against")]
    NoTarget,

    /// Percentage keyframes need a positive total duration
    #[error("Invalid duration {duration} for '{what}'")]
    InvalidDuration { what: String, duration: f32 },

    /// Easing name not implemented
    #[error("Unsupported easing: {name}")]
    UnsupportedEasing { name: String },

    /// Value arithmetic outside the supported set
    #[error("Unsupported value kinds for {op}: {left:?} and {right:?}")]
    UnsupportedValueKind {
        op: ValueOp,
        left: ValueKind,
        right: ValueKind,
    },

    /// Template lookup failed
    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    /// Nested sub-sequences must loop a finite number of times
    #[error("Nested sequence '{name}' has an infinite loop count")]
    NestedInfiniteLoop { name: String },

    /// Stored sequence JSON could not be converted
    #[error("Stored sequence error: {reason}")]
    Stored { reason: String },
}

impl AnimationError {
    pub fn empty(what: impl Into<String>) -> Self {
        Self::EmptyAnimation { what: what.into() }
    }

    pub fn stored(reason: impl Into<String>) -> Self {
        Self::Stored {
            reason: reason.into(),
        }
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::EmptyAnimation { .. }
            | Self::InvalidDuration { .. }
            | Self::NestedInfiniteLoop { .. } => "definition",
            Self::IncompatibleProperty { .. } | Self::NoTarget => "target",
            Self::UnsupportedEasing { .. } | Self::UnsupportedValueKind { .. } => "unsupported",
            Self::TemplateNotFound { .. } => "template",
            Self::Stored { .. } => "serialization",
        }
    }
}

impl From<ValueError> for AnimationError {
    fn from(err: ValueError) -> Self {
        match err {
            ValueError::UnsupportedKind { op, left, right } => {
                Self::UnsupportedValueKind { op, left, right }
            }
        }
    }
}

impl From<serde_json::Error> for AnimationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Stored {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_errors_convert_into_taxonomy() {
        let err: AnimationError = ValueError::UnsupportedKind {
            op: ValueOp::Lerp,
            left: ValueKind::Bool,
            right: ValueKind::Bool,
        }
        .into();
        assert!(matches!(err, AnimationError::UnsupportedValueKind { .. }));
        assert_eq!(err.category(), "unsupported");
    }

    #[test]
    fn categories() {
        assert_eq!(AnimationError::NoTarget.category(), "target");
        assert_eq!(AnimationError::empty("track").category(), "definition");
        assert_eq!(
            AnimationError::TemplateNotFound { name: "x".into() }.category(),
            "template"
        );
    }

    #[test]
    fn serialization_roundtrip() {
        let error = AnimationError::stored("bad");
        let serialized = serde_json::to_string(&error).unwrap();
        let deserialized: AnimationError = serde_json::from_str(&serialized).unwrap();
        assert_eq!(error, deserialized);
    }
}
