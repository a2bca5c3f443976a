//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: {0}")]
    Credentials(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] quoter_exchange::GatewayError),

    #[error("Engine error: {0}")]
    Engine(#[from] quoter_mm::EngineError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] quoter_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
