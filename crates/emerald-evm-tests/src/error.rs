//! Fixture runner errors

use thiserror::Error;

/// Anything that stops a fixture from being loaded or checked
#[derive(Error, Debug)]
pub enum TestError {
    /// Fixture file could not be read
    #[error("reading fixture: {0}")]
    Io(#[from] std::io::Error),

    /// Fixture is not valid JSON for the schema
    #[error("decoding fixture: {0}")]
    Json(#[from] serde_json::Error),

    /// Byte field with bad hex
    #[error("bad hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Numeric or address field out of range
    #[error("bad value: {0}")]
    Parse(String),

    /// Execution result differs from the expectation
    #[error("mismatch: {0}")]
    Assertion(String),
}

/// Result alias for the runner
pub type TestResult<T> = Result<T, TestError>;
