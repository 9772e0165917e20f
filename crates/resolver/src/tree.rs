//! Lazy construction of the choice tree
//!
//! The tree is never materialized as a whole. [`TreeBuilder::expand`] looks
//! at a search state and produces the single node for its next open goal;
//! [`TreeBuilder::apply`] produces the child state for one option.

use crate::conflict::{Conflict, ConflictKind, ConflictSet, Var};
use crate::constraint::{ConstraintKind, UserConstraint};
use crate::preference::Preference;
use crate::state::{Edge, Goal, Requirement, SearchState};
use crate::validate::{check_requirement, check_stanza, validate_instance};
use sprout_errors::{Error, ResolverError};
use sprout_index::{qualify_dependency, Index, QualifyOptions};
use sprout_types::{
    Dependency, FlagName, FlaggedDep, Instance, OptionalStanza, PInfo, PackageName, Qpn,
};
use std::collections::BTreeMap;
use tracing::trace;

/// One node of the choice tree
#[derive(Debug)]
pub enum Node {
    /// An open decision with its options in the order they are tried
    Choice(ChoiceNode),
    /// Every goal is decided and the assignment is acyclic
    Done,
    /// The state cannot be extended
    Fail(Conflict),
}

#[derive(Debug)]
pub struct ChoiceNode {
    pub var: Var,
    /// Decisions that caused the goal to be opened
    pub reason: ConflictSet,
    pub options: Vec<Candidate>,
}

/// One option of a choice node
#[derive(Debug)]
pub struct Candidate {
    pub value: Value,
    /// Set when the option is a failure leaf
    pub rejection: Option<Conflict>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Instance(Instance),
    Flag(bool),
    Stanza(bool),
}

/// Why the search below a node stopped
#[derive(Debug)]
pub enum Halt {
    /// The subtree has no solution
    Conflict(Conflict),
    /// The search was aborted (limit reached or broken invariant)
    Abort(Error),
}

impl From<Conflict> for Halt {
    fn from(conflict: Conflict) -> Self {
        Self::Conflict(conflict)
    }
}

impl From<Error> for Halt {
    fn from(error: Error) -> Self {
        Self::Abort(error)
    }
}

pub(crate) fn invariant(message: impl Into<String>) -> Error {
    ResolverError::InvariantViolation {
        message: message.into(),
    }
    .into()
}

/// Read-only context shared by every node of one resolution
pub struct TreeBuilder<'a> {
    index: &'a Index,
    qualify: QualifyOptions,
    bootstrap: PackageName,
    constraints: BTreeMap<PackageName, Vec<ConstraintKind>>,
    preference: &'a dyn Preference,
}

impl<'a> TreeBuilder<'a> {
    #[must_use]
    pub fn new(
        index: &'a Index,
        qualify: QualifyOptions,
        bootstrap: PackageName,
        constraints: &[UserConstraint],
        preference: &'a dyn Preference,
    ) -> Self {
        let mut grouped: BTreeMap<PackageName, Vec<ConstraintKind>> = BTreeMap::new();
        for constraint in constraints {
            grouped
                .entry(constraint.package.clone())
                .or_default()
                .push(constraint.kind.clone());
        }
        Self {
            index,
            qualify,
            bootstrap,
            constraints: grouped,
            preference,
        }
    }

    fn constraints_for(&self, name: &PackageName) -> &[ConstraintKind] {
        self.constraints
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn info(&self, qpn: &Qpn, instance: &Instance) -> Result<&'a PInfo, Error> {
        self.index
            .lookup(&qpn.name, instance)
            .ok_or_else(|| invariant(format!("{qpn}-{instance} is not in the index")))
    }

    fn chosen_info(&self, state: &SearchState, qpn: &Qpn) -> Result<&'a PInfo, Error> {
        let instance = state
            .instance(qpn)
            .ok_or_else(|| invariant(format!("{qpn} has a goal but no chosen instance")))?;
        self.info(qpn, instance)
    }

    /// Materialize the node for the state's next goal
    ///
    /// # Errors
    ///
    /// Returns an error only when the state references data the index does
    /// not hold.
    pub fn expand(&self, state: &SearchState) -> Result<Node, Error> {
        let Some(goal) = state.next_goal() else {
            return Ok(find_cycle(state).map_or(Node::Done, Node::Fail));
        };
        match &goal.var {
            Var::Package(qpn) => Ok(self.package_node(state, goal, qpn)),
            Var::Flag(qpn, flag) => self.flag_node(state, goal, qpn, flag),
            Var::Stanza(qpn, stanza) => self.stanza_node(state, goal, qpn, *stanza),
        }
    }

    fn package_node(&self, state: &SearchState, goal: &Goal, qpn: &Qpn) -> Node {
        let mut rejected = Vec::new();
        let mut usable: Vec<(&Instance, &PInfo)> = Vec::new();
        for (instance, info) in self.index.lookup_instances(&qpn.name) {
            match &info.disqualified {
                Some(reason) => rejected.push((instance.clone(), reason.clone())),
                None => usable.push((instance, info)),
            }
        }

        if usable.is_empty() {
            trace!(%qpn, rejected = rejected.len(), "no usable instance");
            let set = goal.reason.with(goal.var.clone());
            return Node::Fail(Conflict::leaf(
                qpn.clone(),
                ConflictKind::NoCandidates { rejected },
                set,
            ));
        }

        usable.sort_by(|a, b| self.preference.order(qpn, a.0, b.0));
        let constraints = self.constraints_for(&qpn.name);
        let options = usable
            .into_iter()
            .map(|(instance, info)| Candidate {
                value: Value::Instance(instance.clone()),
                rejection: validate_instance(state, constraints, qpn, instance, info),
            })
            .collect();

        Node::Choice(ChoiceNode {
            var: goal.var.clone(),
            reason: goal.reason.clone(),
            options,
        })
    }

    fn flag_node(
        &self,
        state: &SearchState,
        goal: &Goal,
        qpn: &Qpn,
        flag: &FlagName,
    ) -> Result<Node, Error> {
        let info = self.chosen_info(state, qpn)?;
        let declared = info
            .flags
            .get(flag)
            .ok_or_else(|| invariant(format!("{qpn} has no flag {flag}")))?;

        let required: Vec<bool> = self
            .constraints_for(&qpn.name)
            .iter()
            .filter_map(|constraint| match constraint {
                ConstraintKind::Flag(name, value) if name == flag => Some(*value),
                _ => None,
            })
            .collect();

        let options = [declared.default, !declared.default]
            .into_iter()
            .map(|value| {
                let allowed = if required.is_empty() {
                    !declared.manual || value == declared.default
                } else {
                    required.iter().all(|r| *r == value)
                };
                let rejection = (!allowed).then(|| {
                    let kind = if required.is_empty() {
                        ConflictKind::ManualFlag {
                            flag: flag.clone(),
                            value,
                        }
                    } else {
                        ConflictKind::FlagConstraint {
                            flag: flag.clone(),
                            value,
                        }
                    };
                    Conflict::leaf(qpn.clone(), kind, ConflictSet::singleton(goal.var.clone()))
                });
                Candidate {
                    value: Value::Flag(value),
                    rejection,
                }
            })
            .collect();

        Ok(Node::Choice(ChoiceNode {
            var: goal.var.clone(),
            reason: goal.reason.clone(),
            options,
        }))
    }

    fn stanza_node(
        &self,
        state: &SearchState,
        goal: &Goal,
        qpn: &Qpn,
        stanza: OptionalStanza,
    ) -> Result<Node, Error> {
        let info = self.chosen_info(state, qpn)?;
        let buildable = info.stanza_buildable(stanza);
        let required = self.constraints_for(&qpn.name).iter().any(|constraint| {
            matches!(constraint, ConstraintKind::Stanzas(stanzas) if stanzas.contains(&stanza))
        });

        // A dependent needing one of the stanza's components rules out disabling it
        let demand = state
            .requirements(qpn)
            .iter()
            .find(|requirement| requirement.dependency.component.stanza() == Some(stanza));

        let mut options = Vec::with_capacity(2);
        if !required {
            let rejection = demand.map(|requirement| {
                Conflict::leaf(
                    qpn.clone(),
                    ConflictKind::StanzaDisabled {
                        stanza,
                        component: requirement.dependency.component.clone(),
                        required_by: requirement.from.clone(),
                        required_by_instance: requirement.from_instance.clone(),
                    },
                    requirement.path.with(goal.var.clone()),
                )
            });
            options.push(Candidate {
                value: Value::Stanza(false),
                rejection,
            });
        }
        if buildable || required || demand.is_some() {
            let rejection = (!buildable).then(|| {
                Conflict::leaf(
                    qpn.clone(),
                    ConflictKind::StanzaUnbuildable { stanza },
                    ConflictSet::singleton(goal.var.clone()),
                )
            });
            options.push(Candidate {
                value: Value::Stanza(true),
                rejection,
            });
        }

        Ok(Node::Choice(ChoiceNode {
            var: goal.var.clone(),
            reason: goal.reason.clone(),
            options,
        }))
    }

    /// Child state for choosing `value` for `var`
    ///
    /// Choosing an instance opens goals for its flags and stanzas; every
    /// choice activates the dependencies it unlocks.
    ///
    /// # Errors
    ///
    /// Returns [`Halt::Conflict`] when an activated dependency contradicts
    /// an earlier choice.
    pub fn apply(&self, state: &SearchState, var: &Var, value: &Value) -> Result<SearchState, Halt> {
        let mut child = state.clone();
        child.take_goal();

        match (var, value) {
            (Var::Package(qpn), Value::Instance(instance)) => {
                let info = self.info(qpn, instance)?;
                child.assign_package(qpn.clone(), instance.clone());
                for flag in info.flags.keys() {
                    child.open_flag(qpn.clone(), flag.clone());
                }
                for stanza in info.stanzas() {
                    child.open_stanza(qpn.clone(), stanza);
                }
            }
            (Var::Flag(qpn, flag), Value::Flag(enabled)) => {
                child.assign_flag(qpn.clone(), flag.clone(), *enabled);
            }
            (Var::Stanza(qpn, stanza), Value::Stanza(enabled)) => {
                child.assign_stanza(qpn.clone(), *stanza, *enabled);
                if !enabled {
                    return Ok(child);
                }
            }
            _ => return Err(invariant(format!("option {value:?} does not fit {var}")).into()),
        }

        self.activate(&mut child, var)?;
        Ok(child)
    }

    /// Activate every dependency whose enabling decisions include `trigger`
    /// and are all decided
    fn activate(&self, state: &mut SearchState, trigger: &Var) -> Result<(), Halt> {
        let qpn = trigger.qpn().clone();
        let instance = state
            .instance(&qpn)
            .cloned()
            .ok_or_else(|| invariant(format!("{trigger} decided before {qpn}")))?;
        let info = self.info(&qpn, &instance)?;

        let mut active = Vec::new();
        let root = ConflictSet::singleton(Var::Package(qpn.clone()));
        collect_active(state, &qpn, &info.deps, &root, trigger, &mut active);

        for (dependency, path) in active {
            let target = qualify_dependency(&self.qualify, &self.bootstrap, &qpn, dependency);
            state.add_edge(
                qpn.clone(),
                Edge {
                    target: target.clone(),
                    path: path.clone(),
                },
            );
            let requirement = Requirement {
                dependency: dependency.clone(),
                from: qpn.clone(),
                from_instance: instance.clone(),
                path,
            };

            if let Some(chosen) = state.instance(&target).cloned() {
                let chosen_info = self.info(&target, &chosen)?;
                if let Some(conflict) = check_requirement(&requirement, &target, &chosen, chosen_info)
                    .or_else(|| check_stanza(state, &requirement, &target))
                {
                    trace!(from = %qpn, %target, "dependency contradicts earlier choice");
                    return Err(conflict.into());
                }
            } else if state.open_package(target.clone(), requirement.path.clone()) {
                trace!(from = %qpn, %target, "opened package goal");
            }
            state.record_requirement(target, requirement);
        }
        Ok(())
    }
}

fn collect_active<'i>(
    state: &SearchState,
    qpn: &Qpn,
    deps: &'i [FlaggedDep],
    path: &ConflictSet,
    trigger: &Var,
    out: &mut Vec<(&'i Dependency, ConflictSet)>,
) {
    for node in deps {
        match node {
            FlaggedDep::Simple(dependency) => {
                if path.contains(trigger) {
                    out.push((dependency, path.clone()));
                }
            }
            FlaggedDep::Flagged {
                flag,
                if_true,
                if_false,
            } => {
                if let Some(value) = state.flag(qpn, flag) {
                    let branch = if value { if_true } else { if_false };
                    let path = path.with(Var::Flag(qpn.clone(), flag.clone()));
                    collect_active(state, qpn, branch, &path, trigger, out);
                }
            }
            FlaggedDep::Stanza { stanza, deps } => {
                if state.stanza(qpn, *stanza) == Some(true) {
                    let path = path.with(Var::Stanza(qpn.clone(), *stanza));
                    collect_active(state, qpn, deps, &path, trigger, out);
                }
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Finished,
}

/// First dependency cycle among the chosen packages, as a conflict over the
/// cycle's packages and the decisions enabling its edges
fn find_cycle(state: &SearchState) -> Option<Conflict> {
    let mut marks: BTreeMap<&Qpn, Mark> = BTreeMap::new();
    let mut stack: Vec<&Qpn> = Vec::new();
    let mut paths: Vec<&ConflictSet> = Vec::new();

    for (qpn, _) in state.packages() {
        if marks.contains_key(qpn) {
            continue;
        }
        if let Some(conflict) = visit(state, qpn, &mut marks, &mut stack, &mut paths) {
            return Some(conflict);
        }
    }
    None
}

fn visit<'s>(
    state: &'s SearchState,
    node: &'s Qpn,
    marks: &mut BTreeMap<&'s Qpn, Mark>,
    stack: &mut Vec<&'s Qpn>,
    paths: &mut Vec<&'s ConflictSet>,
) -> Option<Conflict> {
    marks.insert(node, Mark::Active);
    stack.push(node);

    for edge in state.edges(node) {
        match marks.get(&edge.target).copied() {
            Some(Mark::Finished) => {}
            Some(Mark::Active) => {
                let start = stack.iter().position(|qpn| **qpn == edge.target)?;
                let members = &stack[start..];
                let mut set: ConflictSet =
                    members.iter().map(|qpn| Var::Package((*qpn).clone())).collect();
                for path in &paths[start..] {
                    set.union_with(path);
                }
                set.union_with(&edge.path);

                let mut cycle: Vec<Qpn> = members.iter().map(|qpn| (*qpn).clone()).collect();
                cycle.push(edge.target.clone());
                trace!(cycle = ?cycle, "dependency cycle");
                return Some(Conflict::leaf(
                    edge.target.clone(),
                    ConflictKind::CyclicDependencies { cycle },
                    set,
                ));
            }
            None => {
                paths.push(&edge.path);
                let found = visit(state, &edge.target, marks, stack, paths);
                paths.pop();
                if found.is_some() {
                    return found;
                }
            }
        }
    }

    stack.pop();
    marks.insert(node, Mark::Finished);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preference::PreferNewest;
    use sprout_types::{FlagInfo, Version};

    fn v(major: u64) -> Instance {
        Instance::source(Version::new(major, 0, 0))
    }

    fn dep(name: &str) -> FlaggedDep {
        FlaggedDep::Simple(Dependency::library(name))
    }

    fn builder<'a>(index: &'a Index, constraints: &[UserConstraint]) -> TreeBuilder<'a> {
        TreeBuilder::new(
            index,
            QualifyOptions::default(),
            "base".into(),
            constraints,
            &PreferNewest,
        )
    }

    fn choice(node: Node) -> ChoiceNode {
        match node {
            Node::Choice(choice) => choice,
            other => panic!("expected a choice node, got {other:?}"),
        }
    }

    #[test]
    fn test_package_options_newest_first() {
        let index = Index::build(vec![
            ("a".into(), v(1), PInfo::library(vec![])),
            ("a".into(), v(2), PInfo::library(vec![])),
        ])
        .unwrap();
        let tree = builder(&index, &[]);
        let state = SearchState::with_targets(&[Qpn::toplevel("a")]);

        let node = choice(tree.expand(&state).unwrap());
        let values: Vec<Value> = node.options.into_iter().map(|c| c.value).collect();
        assert_eq!(values, vec![Value::Instance(v(2)), Value::Instance(v(1))]);
        assert!(node.reason.is_empty());
    }

    #[test]
    fn test_flag_goals_precede_dependencies() {
        let info = PInfo::library(vec![
            dep("b"),
            FlaggedDep::Flagged {
                flag: "fast".into(),
                if_true: vec![dep("c")],
                if_false: vec![],
            },
        ])
        .with_flag("fast", FlagInfo::automatic(false));
        let index = Index::build(vec![
            ("a".into(), v(1), info),
            ("b".into(), v(1), PInfo::library(vec![])),
            ("c".into(), v(1), PInfo::library(vec![])),
        ])
        .unwrap();
        let tree = builder(&index, &[]);
        let a = Qpn::toplevel("a");

        let root = SearchState::with_targets(&[a.clone()]);
        let chosen = tree
            .apply(&root, &Var::Package(a.clone()), &Value::Instance(v(1)))
            .unwrap();
        // b is active at once, c waits for the flag
        assert_eq!(chosen.edges(&a).len(), 1);

        let node = choice(tree.expand(&chosen).unwrap());
        assert_eq!(node.var, Var::Flag(a.clone(), "fast".into()));
        let values: Vec<Value> = node.options.iter().map(|c| c.value.clone()).collect();
        assert_eq!(values, vec![Value::Flag(false), Value::Flag(true)]);

        let on = tree.apply(&chosen, &node.var, &Value::Flag(true)).unwrap();
        let targets: Vec<&str> = on.edges(&a).iter().map(|e| e.target.name.as_str()).collect();
        assert_eq!(targets, vec!["b", "c"]);
        assert!(on.edges(&a)[1]
            .path
            .contains(&Var::Flag(a.clone(), "fast".into())));
    }

    #[test]
    fn test_manual_flag_other_value_rejected() {
        let info = PInfo::library(vec![]).with_flag("debug", FlagInfo::manual(false));
        let index = Index::build(vec![("a".into(), v(1), info)]).unwrap();
        let a = Qpn::toplevel("a");

        let tree = builder(&index, &[]);
        let chosen = tree
            .apply(
                &SearchState::with_targets(&[a.clone()]),
                &Var::Package(a.clone()),
                &Value::Instance(v(1)),
            )
            .unwrap();
        let node = choice(tree.expand(&chosen).unwrap());
        assert!(node.options[0].rejection.is_none());
        let rejection = node.options[1].rejection.as_ref().unwrap();
        assert!(matches!(
            rejection.trace[0].kind,
            ConflictKind::ManualFlag { value: true, .. }
        ));

        let forced = [UserConstraint::flag("a", "debug", true)];
        let tree = builder(&index, &forced);
        let node = choice(tree.expand(&chosen).unwrap());
        assert!(matches!(
            node.options[0].rejection.as_ref().unwrap().trace[0].kind,
            ConflictKind::FlagConstraint { value: false, .. }
        ));
        assert!(node.options[1].rejection.is_none());
    }

    #[test]
    fn test_stanza_needed_by_dependent() {
        let suite = sprout_types::Component::TestSuite("unit".into());
        let index = Index::build(vec![
            (
                "app".into(),
                v(1),
                PInfo::library(vec![FlaggedDep::Simple(
                    Dependency::library("lib").with_component(suite.clone()),
                )]),
            ),
            (
                "lib".into(),
                v(1),
                PInfo::library(vec![]).with_component(suite, true),
            ),
        ])
        .unwrap();
        let tree = builder(&index, &[]);
        let app = Qpn::toplevel("app");
        let lib = Qpn::toplevel("lib");

        let state = SearchState::with_targets(&[app.clone()]);
        let state = tree
            .apply(&state, &Var::Package(app.clone()), &Value::Instance(v(1)))
            .unwrap();
        let state = tree
            .apply(&state, &Var::Package(lib.clone()), &Value::Instance(v(1)))
            .unwrap();

        let node = choice(tree.expand(&state).unwrap());
        assert_eq!(node.var, Var::Stanza(lib.clone(), OptionalStanza::Tests));
        assert_eq!(node.options[0].value, Value::Stanza(false));
        let rejection = node.options[0].rejection.as_ref().unwrap();
        assert!(rejection.set.contains(&Var::Package(app)));
        assert!(rejection.set.contains(&node.var));
        assert!(matches!(
            rejection.trace[0].kind,
            ConflictKind::StanzaDisabled { .. }
        ));
        assert_eq!(node.options[1].value, Value::Stanza(true));
        assert!(node.options[1].rejection.is_none());

        let disabled = tree
            .apply(&state, &node.var, &Value::Stanza(false))
            .unwrap();
        assert_eq!(disabled.stanza(&lib, OptionalStanza::Tests), Some(false));
    }

    #[test]
    fn test_disqualified_only_is_fail() {
        let info =
            PInfo::library(vec![]).disqualify(sprout_types::DisqualifyReason::Excluded {
                reason: "yanked".into(),
            });
        let index = Index::build(vec![("x".into(), v(1), info)]).unwrap();
        let tree = builder(&index, &[]);

        let Node::Fail(conflict) = tree
            .expand(&SearchState::with_targets(&[Qpn::toplevel("x")]))
            .unwrap()
        else {
            panic!("expected failure");
        };
        assert!(conflict.set.contains(&Var::Package(Qpn::toplevel("x"))));
        assert!(conflict.trace[0].to_string().contains("yanked"));
    }

    #[test]
    fn test_cycle_detected_at_done() {
        let index = Index::build(vec![
            ("a".into(), v(1), PInfo::library(vec![dep("b")])),
            ("b".into(), v(1), PInfo::library(vec![dep("a")])),
        ])
        .unwrap();
        let tree = builder(&index, &[]);
        let a = Qpn::toplevel("a");
        let b = Qpn::toplevel("b");

        let state = SearchState::with_targets(&[a.clone()]);
        let state = tree
            .apply(&state, &Var::Package(a.clone()), &Value::Instance(v(1)))
            .unwrap();
        let state = tree
            .apply(&state, &Var::Package(b.clone()), &Value::Instance(v(1)))
            .unwrap();

        let Node::Fail(conflict) = tree.expand(&state).unwrap() else {
            panic!("expected cycle failure");
        };
        assert!(conflict.set.contains(&Var::Package(a)));
        assert!(conflict.set.contains(&Var::Package(b)));
        assert!(matches!(
            conflict.trace[0].kind,
            ConflictKind::CyclicDependencies { .. }
        ));
    }
}
