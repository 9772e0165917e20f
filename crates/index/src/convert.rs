//! Conversion of raw metadata records into index entries

use crate::index::{Index, IndexEntry};
use crate::models::{RawPackage, Universe};
use sprout_errors::{Error, IndexError};
use sprout_types::{
    parse_version, Dependency, DisqualifyReason, Environment, FlaggedDep, Instance, IsBuildable,
    Location, PInfo, UnitId,
};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};

/// Convert raw records into index entries for an environment
///
/// Component buildability is evaluated against `env`. Records the metadata
/// source excludes, and installed units that are unusable or were built
/// against units no longer present, are kept but disqualified.
///
/// # Errors
///
/// Returns an error if a record has an unparseable version, or is a source
/// record carrying fixed dependencies on installed units.
pub fn convert(records: &[RawPackage], env: &Environment) -> Result<Vec<IndexEntry>, Error> {
    let installed: HashSet<&UnitId> = records.iter().filter_map(|r| r.installed.as_ref()).collect();

    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let version = parse_version(&record.version).map_err(|e| IndexError::InvalidRecord {
            package: record.name.to_string(),
            message: e.to_string(),
        })?;
        if record.installed.is_none() && !record.fixed_depends.is_empty() {
            return Err(IndexError::InvalidRecord {
                package: record.name.to_string(),
                message: "fixed dependencies are only valid on installed units".to_string(),
            }
            .into());
        }
        let instance = Instance {
            version,
            location: record
                .installed
                .clone()
                .map_or(Location::Source, Location::Installed),
        };

        let mut deps = record.depends.clone();
        deps.extend(
            record
                .fixed_depends
                .iter()
                .map(|fixed| FlaggedDep::Simple(Dependency::fixed(fixed.name.clone(), fixed.unit.clone()))),
        );

        let components: BTreeMap<_, _> = record
            .components
            .iter()
            .map(|(component, raw)| (component.clone(), IsBuildable(raw.admits(env))))
            .collect();

        let info = PInfo {
            deps,
            components,
            flags: record.flags.clone(),
            disqualified: disqualify_reason(record, &installed),
        };
        if let Some(reason) = &info.disqualified {
            trace!(package = %record.name, %instance, %reason, "disqualified record");
        }
        entries.push((record.name.clone(), instance, info));
    }

    debug!(records = entries.len(), os = %env.os, arch = %env.arch, "converted metadata records");
    Ok(entries)
}

fn disqualify_reason(record: &RawPackage, installed: &HashSet<&UnitId>) -> Option<DisqualifyReason> {
    if record.installed.is_some() {
        let missing: Vec<UnitId> = record
            .fixed_depends
            .iter()
            .filter(|fixed| !installed.contains(&fixed.unit))
            .map(|fixed| fixed.unit.clone())
            .collect();
        if !missing.is_empty() || !record.buildable {
            return Some(DisqualifyReason::Broken { missing });
        }
    }
    record
        .excluded
        .as_ref()
        .map(|reason| DisqualifyReason::Excluded {
            reason: reason.clone(),
        })
}

impl Index {
    /// Build an index from a universe document
    ///
    /// The universe's own environment takes precedence over `fallback`.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be converted or the index rejects
    /// an entry.
    pub fn from_universe(universe: &Universe, fallback: &Environment) -> Result<Self, Error> {
        let env = universe.environment.as_ref().unwrap_or(fallback);
        Self::build(convert(&universe.packages, env)?)
    }
}
