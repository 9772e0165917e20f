//! Per-path search state

use crate::conflict::{ConflictSet, Var};
use sprout_types::{Dependency, FlagName, Instance, OptionalStanza, Qpn};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// An open decision and the decisions that caused it to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    pub var: Var,
    pub reason: ConflictSet,
}

/// A dependency recorded against a qualified package
#[derive(Debug, Clone)]
pub struct Requirement {
    pub dependency: Dependency,
    pub from: Qpn,
    pub from_instance: Instance,
    /// Decisions that made the dependency active
    pub path: ConflictSet,
}

/// An active dependency edge between chosen packages
#[derive(Debug, Clone)]
pub struct Edge {
    pub target: Qpn,
    pub path: ConflictSet,
}

/// Partial assignment along one path of the choice tree
///
/// Cloned when descending, so sibling branches never see each other's
/// decisions.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    packages: BTreeMap<Qpn, Instance>,
    flags: BTreeMap<Qpn, BTreeMap<FlagName, bool>>,
    stanzas: BTreeMap<Qpn, BTreeMap<OptionalStanza, bool>>,
    requirements: BTreeMap<Qpn, Vec<Requirement>>,
    edges: BTreeMap<Qpn, Vec<Edge>>,
    flag_goals: VecDeque<Goal>,
    stanza_goals: VecDeque<Goal>,
    package_goals: VecDeque<Goal>,
    opened: BTreeSet<Qpn>,
}

impl SearchState {
    /// Initial state with one package goal per target, in order
    #[must_use]
    pub fn with_targets(targets: &[Qpn]) -> Self {
        let mut state = Self::default();
        for qpn in targets {
            state.open_package(qpn.clone(), ConflictSet::new());
        }
        state
    }

    /// Next goal by precedence: flags, then stanzas, then packages
    #[must_use]
    pub fn next_goal(&self) -> Option<&Goal> {
        self.flag_goals
            .front()
            .or_else(|| self.stanza_goals.front())
            .or_else(|| self.package_goals.front())
    }

    /// Remove the goal `next_goal` returns
    pub(crate) fn take_goal(&mut self) -> Option<Goal> {
        self.flag_goals
            .pop_front()
            .or_else(|| self.stanza_goals.pop_front())
            .or_else(|| self.package_goals.pop_front())
    }

    /// Open a package goal unless one was already opened for `qpn`
    pub(crate) fn open_package(&mut self, qpn: Qpn, reason: ConflictSet) -> bool {
        if !self.opened.insert(qpn.clone()) {
            return false;
        }
        self.package_goals.push_back(Goal {
            var: Var::Package(qpn),
            reason,
        });
        true
    }

    pub(crate) fn open_flag(&mut self, qpn: Qpn, flag: FlagName) {
        let reason = ConflictSet::singleton(Var::Package(qpn.clone()));
        self.flag_goals.push_back(Goal {
            var: Var::Flag(qpn, flag),
            reason,
        });
    }

    pub(crate) fn open_stanza(&mut self, qpn: Qpn, stanza: OptionalStanza) {
        let reason = ConflictSet::singleton(Var::Package(qpn.clone()));
        self.stanza_goals.push_back(Goal {
            var: Var::Stanza(qpn, stanza),
            reason,
        });
    }

    pub(crate) fn assign_package(&mut self, qpn: Qpn, instance: Instance) {
        self.packages.insert(qpn, instance);
    }

    pub(crate) fn assign_flag(&mut self, qpn: Qpn, flag: FlagName, value: bool) {
        self.flags.entry(qpn).or_default().insert(flag, value);
    }

    pub(crate) fn assign_stanza(&mut self, qpn: Qpn, stanza: OptionalStanza, enabled: bool) {
        self.stanzas.entry(qpn).or_default().insert(stanza, enabled);
    }

    pub(crate) fn record_requirement(&mut self, target: Qpn, requirement: Requirement) {
        self.requirements.entry(target).or_default().push(requirement);
    }

    pub(crate) fn add_edge(&mut self, from: Qpn, edge: Edge) {
        self.edges.entry(from).or_default().push(edge);
    }

    /// Chosen instance of a qualified package
    #[must_use]
    pub fn instance(&self, qpn: &Qpn) -> Option<&Instance> {
        self.packages.get(qpn)
    }

    #[must_use]
    pub fn flag(&self, qpn: &Qpn, flag: &FlagName) -> Option<bool> {
        self.flags.get(qpn)?.get(flag).copied()
    }

    #[must_use]
    pub fn stanza(&self, qpn: &Qpn, stanza: OptionalStanza) -> Option<bool> {
        self.stanzas.get(qpn)?.get(&stanza).copied()
    }

    /// Every chosen package, ordered by qualified name
    pub fn packages(&self) -> impl Iterator<Item = (&Qpn, &Instance)> {
        self.packages.iter()
    }

    /// Decided flags of a package
    #[must_use]
    pub fn flags_of(&self, qpn: &Qpn) -> BTreeMap<FlagName, bool> {
        self.flags.get(qpn).cloned().unwrap_or_default()
    }

    /// Enabled stanzas of a package
    #[must_use]
    pub fn enabled_stanzas(&self, qpn: &Qpn) -> Vec<OptionalStanza> {
        self.stanzas.get(qpn).map_or_else(Vec::new, |stanzas| {
            stanzas
                .iter()
                .filter(|(_, enabled)| **enabled)
                .map(|(stanza, _)| *stanza)
                .collect()
        })
    }

    /// Requirements recorded against a qualified package
    #[must_use]
    pub fn requirements(&self, qpn: &Qpn) -> &[Requirement] {
        self.requirements.get(qpn).map(Vec::as_slice).unwrap_or_default()
    }

    /// Active dependency edges out of a package
    #[must_use]
    pub fn edges(&self, qpn: &Qpn) -> &[Edge] {
        self.edges.get(qpn).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of decided variables
    #[must_use]
    pub fn decisions(&self) -> usize {
        self.packages.len()
            + self.flags.values().map(BTreeMap::len).sum::<usize>()
            + self.stanzas.values().map(BTreeMap::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprout_types::Version;

    #[test]
    fn test_goal_precedence() {
        let a = Qpn::toplevel("a");
        let mut state = SearchState::with_targets(&[a.clone(), Qpn::toplevel("b")]);
        state.open_stanza(a.clone(), OptionalStanza::Tests);
        state.open_flag(a.clone(), "fast".into());

        assert_eq!(
            state.take_goal().map(|g| g.var),
            Some(Var::Flag(a.clone(), "fast".into()))
        );
        assert_eq!(
            state.take_goal().map(|g| g.var),
            Some(Var::Stanza(a.clone(), OptionalStanza::Tests))
        );
        assert_eq!(state.take_goal().map(|g| g.var), Some(Var::Package(a)));
        assert_eq!(
            state.next_goal().map(|g| g.var.clone()),
            Some(Var::Package(Qpn::toplevel("b")))
        );
    }

    #[test]
    fn test_package_goal_opened_once() {
        let mut state = SearchState::with_targets(&[Qpn::toplevel("a")]);
        assert!(!state.open_package(Qpn::toplevel("a"), ConflictSet::new()));
        assert!(state.open_package(Qpn::toplevel("b"), ConflictSet::new()));
    }

    #[test]
    fn test_assignments() {
        let a = Qpn::toplevel("a");
        let mut state = SearchState::default();
        state.assign_package(a.clone(), Instance::source(Version::new(1, 0, 0)));
        state.assign_flag(a.clone(), "fast".into(), false);
        state.assign_stanza(a.clone(), OptionalStanza::Tests, true);
        state.assign_stanza(a.clone(), OptionalStanza::Benchmarks, false);

        assert_eq!(state.flag(&a, &"fast".into()), Some(false));
        assert_eq!(state.enabled_stanzas(&a), vec![OptionalStanza::Tests]);
        assert_eq!(state.decisions(), 4);
        assert!(state.requirements(&a).is_empty());
    }
}
