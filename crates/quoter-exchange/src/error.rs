//! Gateway error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Exchange API error {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Simulated failure: {0}")]
    Simulated(String),

    #[error("Domain error: {0}")]
    Core(#[from] quoter_core::CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::HttpClient(e.to_string())
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
