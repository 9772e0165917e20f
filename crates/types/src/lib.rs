#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the sprout dependency solver
//!
//! This crate provides the vocabulary shared by the index and the resolver:
//! package names and instances, per-instance metadata, conditional
//! dependency trees, qualified names and version specifications.

pub mod flagged;
pub mod package;
pub mod qualified;
pub mod version;

// Re-export commonly used types
pub use flagged::{DepKind, DepRequirement, Dependency, FlaggedDep, FlaggedDeps};
pub use package::{
    Component, DisqualifyReason, Environment, FlagInfo, FlagName, Instance, IsBuildable,
    Location, OptionalStanza, PInfo, PackageName, PackageSpec, UnitId,
};
pub use qualified::{Qpn, Qualifier};
pub use semver::Version;
pub use version::{parse_version, VersionConstraint, VersionSpec};
