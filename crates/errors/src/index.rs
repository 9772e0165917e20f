//! Package index error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum IndexError {
    #[error("package entry has an empty name")]
    EmptyPackageName,

    #[error("{package}-{version} references undeclared flag `{flag}`")]
    UndeclaredFlag {
        package: String,
        version: String,
        flag: String,
    },

    #[error("invalid package record {package}: {message}")]
    InvalidRecord { package: String, message: String },

    #[error("index parse error: {message}")]
    ParseError { message: String },
}

impl UserFacingError for IndexError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::UndeclaredFlag { .. } => {
                Some("Declare every flag in the package's flag table before using it in a condition.")
            }
            Self::ParseError { .. } => Some("Check that the metadata file is valid JSON."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::EmptyPackageName => "index.empty_package_name",
            Self::UndeclaredFlag { .. } => "index.undeclared_flag",
            Self::InvalidRecord { .. } => "index.invalid_record",
            Self::ParseError { .. } => "index.parse_error",
        };
        Some(code)
    }
}
