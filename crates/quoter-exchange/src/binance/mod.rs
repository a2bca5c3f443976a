//! Binance USD-M futures implementation of the gateway.

mod rest;
pub mod signer;
mod wire;

pub use rest::BinanceGateway;

use std::time::Duration;

/// Maximum orders per `POST /fapi/v1/batchOrders` call.
pub const MAX_SUBMIT_CHUNK: usize = 5;

/// Maximum ids per `DELETE /fapi/v1/batchOrders` call.
pub const MAX_CANCEL_CHUNK: usize = 10;

/// Connection and credential settings for [`BinanceGateway`].
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// REST base URL, e.g. `https://fapi.binance.com`.
    pub rest_url: String,
    /// Instrument symbol, e.g. `BTCUSDT`.
    pub symbol: String,
    pub api_key: String,
    pub api_secret: String,
    /// `recvWindow` sent with signed requests, in milliseconds.
    pub recv_window_ms: u64,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl BinanceConfig {
    pub fn new(
        rest_url: impl Into<String>,
        symbol: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            rest_url: rest_url.into(),
            symbol: symbol.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            recv_window_ms: 5_000,
            timeout: Duration::from_secs(10),
        }
    }
}
