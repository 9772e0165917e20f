//! Main dependency resolver implementation

use crate::conflict::{ConflictKind, Failure};
use crate::constraint::UserConstraint;
use crate::explore::Explorer;
use crate::plan::InstallPlan;
use crate::preference::{self, Preference};
use crate::state::SearchState;
use crate::tree::{Halt, TreeBuilder};
use sprout_config::SolverConfig;
use sprout_errors::{Error, ResolverError};
use sprout_events::{DependencyConflictType, EventEmitter, EventSender, ResolverEvent};
use sprout_index::{derive_qualify_options, Index};
use sprout_types::{PackageName, Qpn};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Targets and constraints of one resolution
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    pub targets: Vec<PackageName>,
    pub constraints: Vec<UserConstraint>,
}

impl ResolveRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn target(mut self, name: impl Into<PackageName>) -> Self {
        self.targets.push(name.into());
        self
    }

    #[must_use]
    pub fn constraint(mut self, constraint: UserConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// Outcome of a search that ran to completion
#[derive(Debug, Clone)]
pub enum Resolution {
    Success(InstallPlan),
    Failure(Failure),
}

/// Dependency resolver over a borrowed index
pub struct Resolver<'a> {
    index: &'a Index,
    config: SolverConfig,
    preference: Box<dyn Preference>,
    event_sender: Option<EventSender>,
}

impl EventEmitter for Resolver<'_> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl<'a> Resolver<'a> {
    /// Create a resolver using the preference policy named in `config`
    #[must_use]
    pub fn new(index: &'a Index, config: SolverConfig) -> Self {
        let preference = preference::from_kind(config.preference);
        Self {
            index,
            config,
            preference,
            event_sender: None,
        }
    }

    /// Replace the preference policy
    #[must_use]
    pub fn with_preference(mut self, preference: Box<dyn Preference>) -> Self {
        self.preference = preference;
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Resolve the request into an install plan
    ///
    /// # Errors
    ///
    /// Returns `ResolverError::Unsatisfiable` when no assignment exists, and
    /// the errors of [`Resolver::solve`] otherwise.
    pub fn resolve(&self, request: &ResolveRequest) -> Result<InstallPlan, Error> {
        match self.solve(request)? {
            Resolution::Success(plan) => Ok(plan),
            Resolution::Failure(failure) => Err(ResolverError::Unsatisfiable {
                conflicts: failure.conflicts(),
                trace: failure.trace_lines(),
            }
            .into()),
        }
    }

    /// Run the search and return either the plan or the typed failure
    ///
    /// # Errors
    ///
    /// Returns `ResolverError::UnknownTarget` for a target with no instance
    /// in the index, `ResolverError::BackjumpLimitReached` when the
    /// configured limit is exceeded, and `ResolverError::InvariantViolation`
    /// if the search produced an inconsistent state.
    pub fn solve(&self, request: &ResolveRequest) -> Result<Resolution, Error> {
        let started = Instant::now();

        let mut targets: Vec<Qpn> = Vec::with_capacity(request.targets.len());
        for name in &request.targets {
            if !self.index.contains(name) {
                return Err(ResolverError::UnknownTarget {
                    name: name.to_string(),
                }
                .into());
            }
            let qpn = Qpn::toplevel(name.clone());
            if !targets.contains(&qpn) {
                targets.push(qpn);
            }
        }

        let bootstrap = PackageName::new(self.config.bootstrap_package.clone());
        let qualify = derive_qualify_options(self.index, &bootstrap);

        info!(
            targets = targets.len(),
            constraints = request.constraints.len(),
            preference = self.preference.name(),
            "resolving dependencies"
        );
        self.emit_operation_started("resolve");
        self.emit_resolver(ResolverEvent::ResolutionStarted {
            targets: targets.iter().map(ToString::to_string).collect(),
            constraints: request.constraints.len(),
            known_instances: self.index.instance_count(),
        });

        for constraint in &request.constraints {
            if !self.index.contains(&constraint.package) {
                warn!(package = %constraint.package, "constraint names an unknown package");
                self.emit_warning(
                    format!(
                        "constraint on unknown package {} has no effect",
                        constraint.package
                    ),
                    constraint.to_string(),
                );
            }
        }
        self.emit_debug(
            "derived qualify options",
            BTreeMap::from([
                ("base_shim".to_string(), qualify.base_shim.to_string()),
                (
                    "setup_independent".to_string(),
                    qualify.setup_independent.to_string(),
                ),
            ]),
        );

        let tree = TreeBuilder::new(
            self.index,
            qualify,
            bootstrap,
            &request.constraints,
            self.preference.as_ref(),
        );
        let mut explorer = Explorer::new(
            &tree,
            self.config.max_backjumps,
            self.config.max_trace_entries,
            self.event_sender.as_ref(),
        );

        let outcome = explorer.run(SearchState::with_targets(&targets));
        let stats = explorer.stats();
        debug!(nodes = stats.nodes, backjumps = stats.backjumps, "search finished");

        match outcome {
            Ok(state) => {
                let plan = InstallPlan::assemble(self.index, &state)?;
                let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                info!(packages = plan.len(), duration_ms, "resolution succeeded");
                self.emit_resolver(ResolverEvent::ResolutionCompleted {
                    total_packages: plan.len(),
                    execution_batches: plan.batches().len(),
                    duration_ms,
                    nodes_explored: stats.nodes,
                    backjumps: stats.backjumps,
                    packages_resolved: plan
                        .iter()
                        .map(|entry| format!("{}-{}", entry.qpn, entry.instance))
                        .collect(),
                });
                self.emit_operation_completed("resolve", true);
                Ok(Resolution::Success(plan))
            }
            Err(Halt::Conflict(conflict)) => {
                let failure = Failure::from_conflict(conflict, stats);
                info!(conflict = %failure.conflict_set, "resolution failed");
                self.emit_resolver(ResolverEvent::DependencyConflictDetected {
                    conflicting_packages: failure.conflicts(),
                    message: failure.to_string(),
                    conflict_type: conflict_type(&failure),
                    nodes_explored: stats.nodes,
                    backjumps: stats.backjumps,
                });
                self.emit_operation_completed("resolve", false);
                Ok(Resolution::Failure(failure))
            }
            Err(Halt::Abort(error)) => {
                self.emit_operation_failed("resolve", error.to_string());
                Err(error)
            }
        }
    }
}

/// Category of a failure, taken from its first explanation
fn conflict_type(failure: &Failure) -> DependencyConflictType {
    match failure.trace.first().map(|explanation| &explanation.kind) {
        Some(ConflictKind::ComponentUnavailable { .. }) => {
            DependencyConflictType::PlatformIncompatibility
        }
        Some(
            ConflictKind::UserConstraint { .. }
            | ConflictKind::ManualFlag { .. }
            | ConflictKind::FlagConstraint { .. }
            | ConflictKind::StanzaUnbuildable { .. }
            | ConflictKind::StanzaDisabled { .. },
        ) => DependencyConflictType::ConstraintViolation,
        Some(ConflictKind::NoCandidates { rejected }) if rejected.is_empty() => {
            DependencyConflictType::MissingDependency
        }
        Some(ConflictKind::NoCandidates { .. }) => DependencyConflictType::Disqualified,
        Some(ConflictKind::CyclicDependencies { .. }) => DependencyConflictType::CircularDependency,
        Some(ConflictKind::Requirement { .. }) | None => {
            DependencyConflictType::VersionIncompatibility
        }
    }
}
