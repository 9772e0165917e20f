//! Dependency resolution error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ResolverError {
    /// Every alternative was exhausted. `conflicts` names the decisions
    /// involved, `trace` holds one rendered line per conflicting choice.
    #[error("could not resolve dependencies: conflict between {}", .conflicts.join(", "))]
    Unsatisfiable {
        conflicts: Vec<String>,
        trace: Vec<String>,
    },

    #[error("unknown target package: {name}")]
    UnknownTarget { name: String },

    #[error("backjump limit reached after {limit} backjumps")]
    BackjumpLimitReached { limit: u64 },

    #[error("invalid constraint `{input}`: {message}")]
    InvalidConstraint { input: String, message: String },

    #[error("internal invariant violated: {message}")]
    InvariantViolation { message: String },
}

impl UserFacingError for ResolverError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::Unsatisfiable { trace, .. } if !trace.is_empty() => {
                Cow::Owned(format!("{self}\n  {}", trace.join("\n  ")))
            }
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Unsatisfiable { .. } => {
                Some("Relax one of the conflicting constraints or allow other versions.")
            }
            Self::UnknownTarget { .. } => Some("Check the package name against the index."),
            Self::BackjumpLimitReached { .. } => {
                Some("Raise `solver.max_backjumps` or add constraints to narrow the search.")
            }
            Self::InvalidConstraint { .. } => Some(
                "Use `name>=1.0,<2.0`, `name installed`, `name source`, `name +flag`, `name -flag`, `name test` or `name bench`.",
            ),
            Self::InvariantViolation { .. } => Some("This is a solver bug; please report it."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Unsatisfiable { .. } => "resolver.unsatisfiable",
            Self::UnknownTarget { .. } => "resolver.unknown_target",
            Self::BackjumpLimitReached { .. } => "resolver.backjump_limit",
            Self::InvalidConstraint { .. } => "resolver.invalid_constraint",
            Self::InvariantViolation { .. } => "resolver.invariant_violation",
        };
        Some(code)
    }
}
