//! Engine error types.

use quoter_core::CoreError;
use quoter_exchange::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid strategy config: {0}")]
    InvalidConfig(String),

    #[error("Rejected market update: {0}")]
    MalformedSnapshot(#[from] CoreError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Gateway call {op} timed out after {after_ms}ms")]
    Timeout { op: &'static str, after_ms: u64 },
}

pub type EngineResult<T> = Result<T, EngineError>;
