#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package index for the sprout solver
//!
//! This crate owns the read-only table of every known package instance,
//! the conversion of raw metadata records into that table, and the
//! qualification options derived from it.

mod convert;
mod index;
mod models;
mod qualify;

pub use convert::convert;
pub use index::{Index, IndexEntry, InstanceTable};
pub use models::{FixedDepend, RawComponent, RawPackage, Universe};
pub use qualify::{derive_qualify_options, qualify_dependency, QualifyOptions};
