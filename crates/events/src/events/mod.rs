use serde::{Deserialize, Serialize};

pub mod general;
pub mod resolver;

pub use general::*;
pub use resolver::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, diagnostics, operations)
    General(GeneralEvent),

    /// Dependency resolution events
    Resolver(ResolverEvent),
}

impl AppEvent {
    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::OperationFailed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Resolver(ResolverEvent::DependencyConflictDetected { .. }) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. }) => Level::DEBUG,

            Self::Resolver(ResolverEvent::Backjumped { .. }) => Level::TRACE,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "sprout::events::general",
            Self::Resolver(_) => "sprout::events::resolver",
        }
    }
}
