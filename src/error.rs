//! Error types for the wizard engine.

use std::time::Duration;

use crate::schema::GroupKind;

/// Top-level error type for a wizard session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Shape violation: {0}")]
    Shape(#[from] ShapeError),

    #[error("Configuration source error: {0}")]
    Source(#[from] SourceError),

    #[error("Completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Wizard has no steps to render")]
    NoSteps,

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A step, group or value that does not match what the descriptors declared.
///
/// These are programming errors in a renderer or in the declarations
/// themselves; the offending update is rejected rather than repaired.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("Step index {index} out of range (wizard has {count} steps)")]
    UnknownStep { index: usize, count: usize },

    #[error("Step {step} declares no group named {group}")]
    UnknownGroup { step: usize, group: String },

    #[error("Update for {group} on step {step} is missing field {field}")]
    MissingField {
        step: usize,
        group: String,
        field: String,
    },

    #[error("Update for {group} on step {step} carries undeclared field {field}")]
    UnexpectedField {
        step: usize,
        group: String,
        field: String,
    },

    #[error("Field {group}.{field} on step {step} expects a {expected} value")]
    ValueShape {
        step: usize,
        group: String,
        field: String,
        expected: &'static str,
    },

    #[error("Payload for step {step} is missing group {group}")]
    MissingGroup { step: usize, group: String },

    #[error("Duplicate step key: {key}")]
    DuplicateStepKey { key: String },

    #[error("Step {step} declares group {group} twice")]
    DuplicateGroup { step: String, group: String },

    #[error("Group {group} declares field {field} twice")]
    DuplicateField { group: String, field: String },

    #[error("Step {step} cannot render group {group} of kind {kind}")]
    UnsupportedGroupKind {
        step: String,
        group: String,
        kind: GroupKind,
    },
}

/// Failures of the inbound configuration source. Fatal to the session.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Configuration source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed stored answers: {0}")]
    Malformed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the outbound completion hand-off. Recoverable: the session
/// stays open at the confirmation position.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompletionError {
    #[error("Transform failed: {reason}")]
    Transform { reason: String },

    #[error("Sink rejected the result: {reason}")]
    Rejected { reason: String },

    #[error("Completion timed out after {0:?}")]
    TimedOut(Duration),
}

impl CompletionError {
    pub fn transform(reason: impl Into<String>) -> Self {
        Self::Transform {
            reason: reason.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Operations attempted in a session state that does not allow them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Completion is only possible at the confirmation position (current step {index})")]
    NotAtConfirmation { index: usize },

    #[error("Session {id} already completed")]
    AlreadyCompleted { id: uuid::Uuid },

    #[error("Session is busy with a pending operation")]
    Busy,

    #[error("No completion is pending")]
    NothingPending,
}

/// Failures of the headless script driver outside the session itself.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Invalid built-in wizard definition: {0}")]
    Definition(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the wizard engine.
pub type Result<T> = std::result::Result<T, Error>;
