use serde::{Deserialize, Serialize};

/// Resolver domain events for dependency resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResolverEvent {
    /// Search started
    ResolutionStarted {
        targets: Vec<String>,
        constraints: usize,
        known_instances: usize,
    },

    /// A conflict skipped over decisions that did not cause it
    Backjumped {
        /// Variable whose remaining options were skipped
        skipped: String,
        /// Decisions the conflict depends on
        conflict: Vec<String>,
    },

    /// Resolution completed successfully
    ResolutionCompleted {
        total_packages: usize,
        execution_batches: usize,
        duration_ms: u64,
        nodes_explored: u64,
        backjumps: u64,
        packages_resolved: Vec<String>,
    },

    /// No consistent assignment exists
    DependencyConflictDetected {
        /// Conflicting decisions, rendered
        conflicting_packages: Vec<String>,
        message: String,
        conflict_type: DependencyConflictType,
        nodes_explored: u64,
        backjumps: u64,
    },
}

/// Types of dependency conflicts for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyConflictType {
    /// Version constraints cannot be satisfied simultaneously
    VersionIncompatibility,
    /// Circular dependency chain detected
    CircularDependency,
    /// Required dependency is not available
    MissingDependency,
    /// User constraint violated by every candidate
    ConstraintViolation,
    /// Component not buildable in this environment
    PlatformIncompatibility,
    /// Every candidate is broken or excluded
    Disqualified,
}

impl ResolverEvent {
    /// Create a conflict detected event with basic info
    #[must_use]
    pub fn conflict_detected(
        packages: Vec<String>,
        message: String,
        conflict_type: DependencyConflictType,
    ) -> Self {
        Self::DependencyConflictDetected {
            conflicting_packages: packages,
            message,
            conflict_type,
            nodes_explored: 0,
            backjumps: 0,
        }
    }
}
