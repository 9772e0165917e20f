//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields, so
//! a JSON log carries the same information as the event stream.

use sprout_events::{AppEvent, GeneralEvent, ResolverEvent};
use tracing::{debug, error, info, trace, warn};

/// Log an `AppEvent` at its level with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    let target = event.log_target();
    match event {
        AppEvent::Resolver(resolver_event) => match resolver_event {
            ResolverEvent::ResolutionStarted {
                targets,
                constraints,
                known_instances,
            } => {
                info!(
                    source = target,
                    targets = ?targets,
                    constraints,
                    known_instances,
                    "Resolution started"
                );
            }
            ResolverEvent::Backjumped { skipped, conflict } => {
                trace!(
                    source = target,
                    skipped = %skipped,
                    conflict = ?conflict,
                    "Backjumped"
                );
            }
            ResolverEvent::ResolutionCompleted {
                total_packages,
                execution_batches,
                duration_ms,
                nodes_explored,
                backjumps,
                ..
            } => {
                info!(
                    source = target,
                    total_packages,
                    execution_batches,
                    duration_ms,
                    nodes_explored,
                    backjumps,
                    "Resolution completed"
                );
            }
            ResolverEvent::DependencyConflictDetected {
                conflicting_packages,
                conflict_type,
                nodes_explored,
                backjumps,
                ..
            } => {
                warn!(
                    source = target,
                    conflicting = ?conflicting_packages,
                    conflict_type = ?conflict_type,
                    nodes_explored,
                    backjumps,
                    "Dependency conflict detected"
                );
            }
        },

        AppEvent::General(general_event) => match general_event {
            GeneralEvent::Warning { message, context } => {
                warn!(source = target, context = %context, "{message}");
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(source = target, context = ?context, "{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                debug!(source = target, operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                debug!(source = target, operation = %operation, success, "Operation completed");
            }
            GeneralEvent::OperationFailed { operation, error } => {
                error!(source = target, operation = %operation, error = %error, "Operation failed");
            }
        },
    }
}
