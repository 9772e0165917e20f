//! Install plan assembled from a complete assignment

use crate::state::SearchState;
use crate::tree::invariant;
use serde::Serialize;
use sprout_errors::Error;
use sprout_index::Index;
use sprout_types::{Component, FlagName, Instance, OptionalStanza, PInfo, Qpn};
use std::collections::{BTreeMap, BTreeSet};
use tracing::error;

/// One configured unit of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub qpn: Qpn,
    pub instance: Instance,
    /// Flag assignment for this unit
    pub flags: BTreeMap<FlagName, bool>,
    /// Enabled optional stanzas
    pub stanzas: Vec<OptionalStanza>,
    /// Components to build
    pub components: Vec<Component>,
    /// Qualified packages this unit depends on, each listed once
    pub dependencies: Vec<Qpn>,
}

/// Configured units in dependency order: every entry comes after all of its
/// dependencies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallPlan {
    entries: Vec<PlanEntry>,
}

impl InstallPlan {
    /// Build the plan for a complete, acyclic assignment
    ///
    /// Among units whose dependencies are all placed, the smallest qualified
    /// name goes first, so the order is a function of the assignment alone.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the assignment names an instance
    /// the index does not hold or still contains a cycle.
    pub fn assemble(index: &Index, state: &SearchState) -> Result<Self, Error> {
        let mut pending: BTreeMap<Qpn, PlanEntry> = BTreeMap::new();
        for (qpn, instance) in state.packages() {
            let info = index
                .lookup(&qpn.name, instance)
                .ok_or_else(|| invariant(format!("{qpn}-{instance} is not in the index")))?;
            pending.insert(qpn.clone(), entry(state, qpn, instance, info));
        }

        let mut waiting: BTreeMap<&Qpn, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&Qpn, Vec<&Qpn>> = BTreeMap::new();
        for (qpn, entry) in &pending {
            waiting.insert(qpn, entry.dependencies.len());
            for dependency in &entry.dependencies {
                dependents.entry(dependency).or_default().push(qpn);
            }
        }

        let mut ready: BTreeSet<&Qpn> = waiting
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(qpn, _)| *qpn)
            .collect();
        let mut order: Vec<Qpn> = Vec::with_capacity(pending.len());

        while let Some(next) = ready.pop_first() {
            order.push(next.clone());
            for dependent in dependents.get(next).into_iter().flatten() {
                if let Some(count) = waiting.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if order.len() != pending.len() {
            let stuck: Vec<String> = waiting
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(qpn, _)| qpn.to_string())
                .collect();
            error!(stuck = ?stuck, "cycle in a complete assignment");
            return Err(invariant(format!(
                "cycle among {} in a complete assignment",
                stuck.join(", ")
            )));
        }

        let entries = order
            .iter()
            .filter_map(|qpn| pending.remove(qpn))
            .collect();
        Ok(Self { entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn get(&self, qpn: &Qpn) -> Option<&PlanEntry> {
        self.entries.iter().find(|entry| &entry.qpn == qpn)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Group entries into batches whose members depend only on earlier
    /// batches
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<&PlanEntry>> {
        let mut levels: BTreeMap<&Qpn, usize> = BTreeMap::new();
        let mut batches: Vec<Vec<&PlanEntry>> = Vec::new();

        for entry in &self.entries {
            let level = entry
                .dependencies
                .iter()
                .filter_map(|dependency| levels.get(dependency))
                .map(|level| level + 1)
                .max()
                .unwrap_or(0);
            levels.insert(&entry.qpn, level);
            if batches.len() <= level {
                batches.resize_with(level + 1, Vec::new);
            }
            batches[level].push(entry);
        }
        batches
    }
}

fn entry(state: &SearchState, qpn: &Qpn, instance: &Instance, info: &PInfo) -> PlanEntry {
    let dependencies: BTreeSet<Qpn> = state
        .edges(qpn)
        .iter()
        .map(|edge| edge.target.clone())
        .collect();
    let stanzas = state.enabled_stanzas(qpn);
    PlanEntry {
        qpn: qpn.clone(),
        instance: instance.clone(),
        flags: state.flags_of(qpn),
        components: components(info, &stanzas),
        stanzas,
        dependencies: dependencies.into_iter().collect(),
    }
}

fn components(info: &PInfo, stanzas: &[OptionalStanza]) -> Vec<Component> {
    if info.components.is_empty() {
        return vec![Component::Library];
    }
    info.components
        .iter()
        .filter(|(_, buildable)| buildable.0)
        .filter(|(component, _)| {
            component
                .stanza()
                .is_none_or(|stanza| stanzas.contains(&stanza))
        })
        .map(|(component, _)| component.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components_follow_stanzas() {
        let info = PInfo::library(vec![])
            .with_component(Component::Library, true)
            .with_component(Component::Executable("tool".into()), false)
            .with_component(Component::TestSuite("spec".into()), true);

        assert_eq!(components(&info, &[]), vec![Component::Library]);
        assert_eq!(
            components(&info, &[OptionalStanza::Tests]),
            vec![Component::Library, Component::TestSuite("spec".into())]
        );
    }

    #[test]
    fn test_components_default_library() {
        assert_eq!(
            components(&PInfo::default(), &[OptionalStanza::Tests]),
            vec![Component::Library]
        );
    }
}
