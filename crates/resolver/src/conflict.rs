//! Decision variables, conflict sets and failure explanations

use crate::constraint::ConstraintKind;
use serde::Serialize;
use sprout_types::{
    Component, DepRequirement, DisqualifyReason, FlagName, Instance, OptionalStanza, Qpn,
};
use std::collections::BTreeSet;
use std::fmt;

/// A decision the solver makes
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Var {
    /// Which instance of a qualified package
    Package(Qpn),
    /// Value of a flag of a qualified package
    Flag(Qpn, FlagName),
    /// Whether an optional stanza of a qualified package is enabled
    Stanza(Qpn, OptionalStanza),
}

impl Var {
    /// Qualified package the decision belongs to
    #[must_use]
    pub fn qpn(&self) -> &Qpn {
        match self {
            Self::Package(qpn) | Self::Flag(qpn, _) | Self::Stanza(qpn, _) => qpn,
        }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package(qpn) => write!(f, "{qpn}"),
            Self::Flag(qpn, flag) => write!(f, "{qpn}:flag:{flag}"),
            Self::Stanza(qpn, stanza) => write!(f, "{qpn}:{stanza}"),
        }
    }
}

/// Set of decisions that together cause a failure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConflictSet(BTreeSet<Var>);

impl ConflictSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn singleton(var: Var) -> Self {
        let mut set = Self::new();
        set.insert(var);
        set
    }

    /// Copy of this set with one more variable
    #[must_use]
    pub fn with(&self, var: Var) -> Self {
        let mut set = self.clone();
        set.insert(var);
        set
    }

    pub fn insert(&mut self, var: Var) -> bool {
        self.0.insert(var)
    }

    pub fn remove(&mut self, var: &Var) -> bool {
        self.0.remove(var)
    }

    #[must_use]
    pub fn contains(&self, var: &Var) -> bool {
        self.0.contains(var)
    }

    /// Add every variable of `other`
    pub fn union_with(&mut self, other: &Self) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Var> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Var> for ConflictSet {
    fn from_iter<T: IntoIterator<Item = Var>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ConflictSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vars: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{{{}}}", vars.join(", "))
    }
}

/// Why one option was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictKind {
    /// A dependent's version or unit requirement rejects the instance
    Requirement {
        instance: Instance,
        requirement: DepRequirement,
        required_by: Qpn,
        required_by_instance: Instance,
    },
    /// The instance lacks a component a dependent needs, or cannot build it
    ComponentUnavailable {
        instance: Instance,
        component: Component,
        required_by: Qpn,
        required_by_instance: Instance,
    },
    /// A user constraint rejects the instance
    UserConstraint {
        instance: Instance,
        constraint: ConstraintKind,
    },
    /// No instance is usable; each rejected instance is listed with its reason
    NoCandidates {
        rejected: Vec<(Instance, DisqualifyReason)>,
    },
    /// A manual flag can only take its default value
    ManualFlag { flag: FlagName, value: bool },
    /// A user constraint fixes the flag to the other value
    FlagConstraint { flag: FlagName, value: bool },
    /// The stanza is needed but its components cannot be built
    StanzaUnbuildable { stanza: OptionalStanza },
    /// A dependent needs a component of a stanza that is disabled
    StanzaDisabled {
        stanza: OptionalStanza,
        component: Component,
        required_by: Qpn,
        required_by_instance: Instance,
    },
    /// The chosen instances depend on each other in a loop
    CyclicDependencies { cycle: Vec<Qpn> },
}

/// One entry of a failure trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictExplanation {
    /// Package the rejected option belongs to
    pub qpn: Qpn,
    #[serde(flatten)]
    pub kind: ConflictKind,
    /// Decisions this rejection depends on
    pub conflict_set: ConflictSet,
}

impl fmt::Display for ConflictExplanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let qpn = &self.qpn;
        match &self.kind {
            ConflictKind::Requirement {
                instance,
                requirement,
                required_by,
                required_by_instance,
            } => write!(
                f,
                "{qpn}-{instance} rejected: {required_by}-{required_by_instance} requires {} {requirement}",
                qpn.name
            ),
            ConflictKind::ComponentUnavailable {
                instance,
                component,
                required_by,
                required_by_instance,
            } => write!(
                f,
                "{qpn}-{instance} rejected: {required_by}-{required_by_instance} needs component {component}, which is missing or not buildable"
            ),
            ConflictKind::UserConstraint {
                instance,
                constraint,
            } => write!(
                f,
                "{qpn}-{instance} rejected: user constraint `{} {constraint}`",
                qpn.name
            ),
            ConflictKind::NoCandidates { rejected } if rejected.is_empty() => {
                write!(f, "{qpn}: unknown package")
            }
            ConflictKind::NoCandidates { rejected } => {
                let reasons: Vec<String> = rejected
                    .iter()
                    .map(|(instance, reason)| format!("{instance}: {reason}"))
                    .collect();
                write!(f, "{qpn}: no usable instance ({})", reasons.join("; "))
            }
            ConflictKind::ManualFlag { flag, value } => write!(
                f,
                "{qpn}: flag {flag}={value} rejected: manual flag keeps its default"
            ),
            ConflictKind::FlagConstraint { flag, value } => write!(
                f,
                "{qpn}: flag {flag}={value} rejected: user constraint"
            ),
            ConflictKind::StanzaUnbuildable { stanza } => {
                write!(f, "{qpn}: {stanza} stanza required but not buildable")
            }
            ConflictKind::StanzaDisabled {
                stanza,
                component,
                required_by,
                required_by_instance,
            } => write!(
                f,
                "{qpn}: {stanza} stanza disabled but {required_by}-{required_by_instance} needs component {component}"
            ),
            ConflictKind::CyclicDependencies { cycle } => {
                let names: Vec<String> = cycle.iter().map(ToString::to_string).collect();
                write!(f, "dependency cycle: {}", names.join(" -> "))
            }
        }
    }
}

/// A failed subtree: the decisions responsible plus how each leaf failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub set: ConflictSet,
    pub trace: Vec<ConflictExplanation>,
}

impl Conflict {
    /// Leaf failure whose explanation carries the same conflict set
    #[must_use]
    pub fn leaf(qpn: Qpn, kind: ConflictKind, set: ConflictSet) -> Self {
        Self {
            trace: vec![ConflictExplanation {
                qpn,
                kind,
                conflict_set: set.clone(),
            }],
            set,
        }
    }
}

/// Counters collected while exploring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Nodes expanded
    pub nodes: u64,
    /// Conflicts that skipped the remaining options of a decision
    pub backjumps: u64,
}

/// Global unsatisfiability: no assignment satisfies the request
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    /// Decisions named by the trace
    pub conflict_set: ConflictSet,
    pub trace: Vec<ConflictExplanation>,
    pub stats: SearchStats,
}

impl Failure {
    pub(crate) fn from_conflict(conflict: Conflict, stats: SearchStats) -> Self {
        let mut conflict_set = conflict.set;
        for explanation in &conflict.trace {
            conflict_set.union_with(&explanation.conflict_set);
        }
        Self {
            conflict_set,
            trace: conflict.trace,
            stats,
        }
    }

    /// Decisions in the conflict, rendered
    #[must_use]
    pub fn conflicts(&self) -> Vec<String> {
        self.conflict_set.iter().map(ToString::to_string).collect()
    }

    /// Trace entries, rendered
    #[must_use]
    pub fn trace_lines(&self) -> Vec<String> {
        self.trace.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not resolve dependencies: conflict between {}",
            self.conflicts().join(", ")
        )?;
        for line in self.trace_lines() {
            write!(f, "\n  - {line}")?;
        }
        Ok(())
    }
}
