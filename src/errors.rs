//! Typed error hierarchy for the simulation core.
//!
//! One enum per subsystem:
//! - `ExtractError`: generator responses without the expected code fence
//! - `SchemaError`: inconsistent dimension configuration
//! - `GuardError`: per-entity turn conflicts
//! - `TurnError`: turn and creation pipeline failures

use thiserror::Error;

/// A generator response did not carry the fenced payload a stage expects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Response contains no ```{lang} code block")]
    MissingFence { lang: String },

    #[error("Response opens a ```{lang} code block but never closes it")]
    UnterminatedFence { lang: String },
}

/// Errors raised while validating a document schema.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema defines no dimensions")]
    Empty,

    #[error("Dimension '{title}' is defined more than once")]
    DuplicateTitle { title: String },

    #[error("Dimension '{title}' depends on unknown dimension '{dependency}'")]
    UnknownDependency { title: String, dependency: String },

    #[error("Dimension '{title}' cannot depend on itself")]
    SelfDependency { title: String },
}

/// Errors from the turn concurrency guard.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error("A turn is already running for state {entity_id}")]
    TurnInProgress { entity_id: String },
}

/// Errors from the turn and creation pipelines.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("State {entity_id} not found")]
    EntityNotFound { entity_id: String },

    #[error("State {entity_id} has no committed snapshot")]
    NoSnapshot { entity_id: String },

    #[error("Invalid period key '{period}': expected YYYY-MM")]
    InvalidPeriod { period: String },

    #[error("Next period {next} does not come after {latest}")]
    PeriodNotAdvancing { latest: String, next: String },

    #[error("Answer to '{question}' must be between 1 and 5, got {value}")]
    InvalidAnswer { question: String, value: u8 },

    #[error("{stage} failed: {source}")]
    Extraction {
        stage: String,
        #[source]
        source: ExtractError,
    },

    #[error("{stage} failed: text generator error: {source}")]
    Generator {
        stage: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{stage} failed: {detail}")]
    UnexpectedShape { stage: String, detail: String },

    #[error("Section task failed: {0}")]
    TaskFailed(String),

    #[error("Storage error: {0}")]
    Store(#[source] anyhow::Error),
}

impl TurnError {
    /// Conflicts are user-facing and safe to retry later; everything else is a fault.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TurnError::Guard(GuardError::TurnInProgress { .. }))
    }

    pub(crate) fn generator(stage: impl Into<String>, source: anyhow::Error) -> Self {
        TurnError::Generator {
            stage: stage.into(),
            source,
        }
    }

    pub(crate) fn extraction(stage: impl Into<String>, source: ExtractError) -> Self {
        TurnError::Extraction {
            stage: stage.into(),
            source,
        }
    }
}
