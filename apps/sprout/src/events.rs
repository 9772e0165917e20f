//! Event handling for the command line driver

use crate::logging::log_event_with_tracing;
use sprout_events::{AppEvent, GeneralEvent, ResolverEvent};

/// Turns resolver events into log records and user-facing progress lines
pub struct EventHandler {
    /// Print progress lines to stderr
    show_progress: bool,
    /// Also print search details
    debug_enabled: bool,
}

impl EventHandler {
    pub fn new(show_progress: bool, debug_enabled: bool) -> Self {
        Self {
            show_progress,
            debug_enabled,
        }
    }

    /// Handle one incoming event
    pub fn handle_event(&self, event: AppEvent) {
        log_event_with_tracing(&event);
        if !self.show_progress {
            return;
        }

        match event {
            AppEvent::Resolver(ResolverEvent::ResolutionStarted {
                targets,
                known_instances,
                ..
            }) => {
                eprintln!(
                    "Resolving {} against {known_instances} known instances",
                    targets.join(", ")
                );
            }
            AppEvent::Resolver(ResolverEvent::Backjumped { skipped, conflict })
                if self.debug_enabled =>
            {
                eprintln!("  backjump past {skipped} (conflict: {})", conflict.join(", "));
            }
            AppEvent::Resolver(ResolverEvent::ResolutionCompleted {
                nodes_explored,
                backjumps,
                duration_ms,
                ..
            }) if self.debug_enabled => {
                eprintln!(
                    "Explored {nodes_explored} nodes with {backjumps} backjumps in {duration_ms}ms"
                );
            }
            AppEvent::General(GeneralEvent::Warning { message, .. }) => {
                eprintln!("Warning: {message}");
            }
            _ => {}
        }
    }
}
