use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Warnings, diagnostics and operation lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    /// Input that is accepted but has no effect
    Warning {
        message: String,
        /// The offending input, as written
        context: String,
    },

    /// Diagnostic with structured fields
    DebugLog {
        message: String,
        context: BTreeMap<String, String>,
    },

    /// Operation started (loading metadata, building the index, solving)
    OperationStarted { operation: String },

    /// Operation finished
    OperationCompleted { operation: String, success: bool },

    /// Operation failed with error details
    OperationFailed { operation: String, error: String },
}
