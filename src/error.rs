//! Error types for hotel metadata generation.

use thiserror::Error;

/// Errors produced by a single content generation call.
///
/// `RateLimited` is kept as its own variant so the batch runner can react
/// to it specially (pause without advancing the cursor) while every other
/// variant is terminal for the task that produced it.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("no external identifier found for '{0}'")]
    IdentifierNotFound(String),

    #[error("generation failed: {0}")]
    Failed(String),
}

impl GenerateError {
    /// True when the error is transient and the same task should be
    /// retried after the caller backs off.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, GenerateError::RateLimited(_))
    }
}

/// Input validation errors. Fatal to the requested operation and surfaced
/// before any run starts; never cause a partially-started run.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{0} must not be blank")]
    BlankField(&'static str),

    #[error("missing required column: expected one of {0}")]
    MissingColumn(&'static str),

    #[error("no usable data rows found (rows with blank country or hotel name are skipped)")]
    NoDataRows,

    #[error("failed to read input file: {0}")]
    Read(String),
}

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
