#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Dependency resolution for sprout
//!
//! This crate searches a lazily built choice tree over package instances,
//! flags and optional stanzas. Failed subtrees report the decisions that
//! caused them, so the search can jump back past choices that cannot help.
//! A satisfying assignment is turned into an install plan in dependency
//! order.

mod conflict;
mod constraint;
mod explore;
mod plan;
mod preference;
mod resolver;
mod state;
mod tree;
mod validate;

pub use conflict::{
    Conflict, ConflictExplanation, ConflictKind, ConflictSet, Failure, SearchStats, Var,
};
pub use constraint::{ConstraintKind, UserConstraint};
pub use plan::{InstallPlan, PlanEntry};
pub use preference::{from_kind, PreferInstalled, PreferNewest, Preference};
pub use resolver::{Resolution, ResolveRequest, Resolver};
pub use state::SearchState;
