//! The in-memory package index

use sprout_errors::{Error, IndexError};
use sprout_types::flagged::referenced_flags;
use sprout_types::{Instance, PInfo, PackageName};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// One `(name, instance, info)` triple as enumerated by a metadata source
pub type IndexEntry = (PackageName, Instance, PInfo);

/// Instances of one package, ordered by [`Instance`]'s ordering
pub type InstanceTable = BTreeMap<Instance, PInfo>;

static EMPTY: InstanceTable = BTreeMap::new();

/// Read-only table of every known package instance
///
/// Built once per resolution and borrowed by the solver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
    packages: HashMap<PackageName, InstanceTable>,
}

impl Index {
    /// Build an index from metadata entries
    ///
    /// Entries are grouped by package name in input order and each group is
    /// folded into its instance table. When two entries share the same
    /// `(name, instance)` key, the later entry in input order wins.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry has an empty package name, or if an
    /// entry's dependency conditions reference a flag its info does not
    /// declare.
    pub fn build<I>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = IndexEntry>,
    {
        let mut order: Vec<PackageName> = Vec::new();
        let mut groups: HashMap<PackageName, Vec<(Instance, PInfo)>> = HashMap::new();

        for (name, instance, info) in entries {
            if name.is_empty() {
                return Err(IndexError::EmptyPackageName.into());
            }
            check_flags(&name, &instance, &info)?;
            groups
                .entry(name.clone())
                .or_insert_with(|| {
                    order.push(name);
                    Vec::new()
                })
                .push((instance, info));
        }

        let mut packages = HashMap::with_capacity(order.len());
        let mut overwritten = 0usize;
        for name in order {
            let Some(group) = groups.remove(&name) else {
                continue;
            };
            let mut table = InstanceTable::new();
            for (instance, info) in group {
                if table.insert(instance, info).is_some() {
                    overwritten += 1;
                }
            }
            packages.insert(name, table);
        }

        let index = Self { packages };
        debug!(
            packages = index.len(),
            instances = index.instance_count(),
            overwritten,
            "built package index"
        );
        Ok(index)
    }

    /// All instances of a package; empty when the name is unknown
    #[must_use]
    pub fn lookup_instances(&self, name: &PackageName) -> &InstanceTable {
        self.packages.get(name).unwrap_or(&EMPTY)
    }

    /// Info for one instance
    #[must_use]
    pub fn lookup(&self, name: &PackageName, instance: &Instance) -> Option<&PInfo> {
        self.packages.get(name)?.get(instance)
    }

    #[must_use]
    pub fn contains(&self, name: &PackageName) -> bool {
        self.packages.contains_key(name)
    }

    /// Every package name with at least one instance
    #[must_use]
    pub fn all_package_names(&self) -> BTreeSet<&PackageName> {
        self.packages.keys().collect()
    }

    /// Iterate over every `(name, instance, info)` triple
    pub fn entries(&self) -> impl Iterator<Item = (&PackageName, &Instance, &PInfo)> {
        self.packages
            .iter()
            .flat_map(|(name, table)| table.iter().map(move |(inst, info)| (name, inst, info)))
    }

    /// Number of packages
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Number of instances across all packages
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.packages.values().map(BTreeMap::len).sum()
    }
}

fn check_flags(name: &PackageName, instance: &Instance, info: &PInfo) -> Result<(), Error> {
    for flag in referenced_flags(&info.deps) {
        if !info.flags.contains_key(flag) {
            return Err(IndexError::UndeclaredFlag {
                package: name.to_string(),
                version: instance.to_string(),
                flag: flag.to_string(),
            }
            .into());
        }
    }
    Ok(())
}
