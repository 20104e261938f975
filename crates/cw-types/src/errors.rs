use thiserror::Error;

/// Main error type for the configuration search system
#[derive(Error, Debug)]
pub enum CwError {
    #[error("Invalid field type for '{field}': {reason}")]
    InvalidFieldType { field: String, reason: String },

    #[error("Unknown strategy kind: {0}")]
    UnknownStrategyKind(String),

    #[error("Unknown runner kind: {0}")]
    UnknownRunnerKind(String),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Strategy '{strategy}' cannot run: {message}")]
    StrategyState { strategy: String, message: String },

    #[error("No candidate configuration was evaluated")]
    NoCandidates,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CwError {
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFieldType {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A candidate's field values or cross-field predicate failed validation.
///
/// Strategies recover from this locally (drop the candidate or substitute a
/// sentinel score); it never reaches the caller of a search.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing value for field '{field}'")]
    MissingField { field: String },

    #[error("Field '{field}' is not declared by the schema")]
    UnknownField { field: String },

    #[error("Field '{field}' expects {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Field '{field}' value {value} violates bound {bound}")]
    OutOfBounds {
        field: String,
        value: String,
        bound: String,
    },

    #[error("Field '{field}' value {value} is not one of the declared choices")]
    NotAChoice { field: String, value: String },

    #[error("Cross-field validation failed: {message}")]
    Predicate { message: String },
}

/// Failure reported by a scoring function.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// The scoring function does not accept this call shape.
    #[error("scoring function does not accept this number of arguments")]
    ArityMismatch,

    #[error("scoring failed: {0}")]
    Failed(String),
}

/// Errors raised while evaluating one configuration against a dataset.
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Program failed on sample {sample}: {source}")]
    Program {
        sample: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Scoring failed on sample {sample}: {source}")]
    Scoring {
        sample: usize,
        #[source]
        source: ScoringError,
    },

    #[error("Sample {sample} timed out after {timeout_ms} ms")]
    Timeout { sample: usize, timeout_ms: u64 },

    #[error("Task for sample {sample} failed: {message}")]
    TaskFailed { sample: usize, message: String },

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("Aggregation failed: {message}")]
    Aggregation { message: String },
}

/// Result type alias for configuration search operations
pub type CwResult<T> = Result<T, CwError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::CwError::Config(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::CwError::Internal(format!($($arg)*))
    };
}
