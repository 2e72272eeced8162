use thiserror::Error;

/// Answer input that is not a whole number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("not a whole number: {input:?}")]
pub struct FormatError {
    pub input: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("no operators selected")]
    EmptyOperatorSet,

    #[error("unknown operator: {0:?}")]
    UnknownOperator(String),

    #[error("invalid operand range {min}..={max}")]
    InvalidRange { min: i64, max: i64 },
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Reasons a practice-session operation did not apply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no problem has been generated yet")]
    NoActiveProblem,

    #[error("already at the first problem")]
    AlreadyFirst,

    #[error(transparent)]
    Format(#[from] FormatError),
}
