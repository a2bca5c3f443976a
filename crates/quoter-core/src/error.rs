//! Error types for quoter-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    #[error("Unknown side: {0}")]
    UnknownSide(String),

    #[error("Unknown position side: {0}")]
    UnknownPositionSide(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
