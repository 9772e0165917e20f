//! Version and version-range parsing errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Malformed version text, from package metadata or the command line
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum VersionError {
    #[error("invalid version range `{input}`")]
    InvalidConstraint { input: String },

    #[error("invalid version: {message}")]
    ParseError { message: String },
}

impl UserFacingError for VersionError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidConstraint { .. } => Some(
                "Write ranges as comma-joined comparisons such as `>=1.2,<2` or `~=1.4.0`.",
            ),
            Self::ParseError { .. } => Some("Versions are dotted numbers such as 1, 1.2 or 1.2.3."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::InvalidConstraint { .. } => "version.invalid_range",
            Self::ParseError { .. } => "version.invalid_version",
        })
    }
}
