//! Application configuration.

use std::time::Duration;

use quoter_exchange::BinanceConfig;
use quoter_feed::StreamConfig;
use quoter_mm::{EngineConfig, StrategyConfig};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Exchange connectivity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Instrument symbol, e.g. `BTCUSDT`.
    pub symbol: String,

    /// REST base URL. `BINANCE_BASE_URL` overrides it when set.
    #[serde(default = "default_rest_url")]
    pub rest_url: String,

    /// WebSocket base URL.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Partial-depth stream suffix.
    #[serde(default = "default_depth_stream")]
    pub depth_stream: String,

    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,

    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,

    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,

    /// Listen key refresh period.
    #[serde(default = "default_listen_key_keepalive_secs")]
    pub listen_key_keepalive_secs: u64,
}

impl ExchangeConfig {
    /// `wss://.../ws/<symbol>@<depth_stream>`
    pub fn market_stream_url(&self) -> String {
        format!(
            "{}/ws/{}@{}",
            self.ws_url.trim_end_matches('/'),
            self.symbol.to_lowercase(),
            self.depth_stream
        )
    }

    /// `wss://.../ws/<listen_key>`
    pub fn user_stream_url(&self, listen_key: &str) -> String {
        format!("{}/ws/{}", self.ws_url.trim_end_matches('/'), listen_key)
    }

    pub fn stream_config(&self, url: String) -> StreamConfig {
        StreamConfig {
            url,
            max_reconnect_attempts: 0,
            reconnect_base_delay_ms: self.reconnect_base_delay_ms,
            reconnect_max_delay_ms: self.reconnect_max_delay_ms,
        }
    }

    pub fn gateway_config(&self, credentials: &Credentials) -> BinanceConfig {
        BinanceConfig {
            rest_url: credentials
                .base_url
                .clone()
                .unwrap_or_else(|| self.rest_url.clone()),
            symbol: self.symbol.clone(),
            api_key: credentials.api_key.clone(),
            api_secret: credentials.api_secret.clone(),
            recv_window_ms: self.recv_window_ms,
            timeout: Duration::from_millis(self.http_timeout_ms),
        }
    }
}

/// Telemetry settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Port for `/metrics`; disabled when unset.
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub strategy: StrategyConfig,
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }
}

/// API credentials, read from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    /// Optional REST base URL override (e.g. the testnet).
    pub base_url: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Credentials {
    /// Read `BINANCE_API_KEY`, `BINANCE_API_SECRET` and `BINANCE_BASE_URL`.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::Credentials(name.to_string()))
        };
        Ok(Self {
            api_key: required("BINANCE_API_KEY")?,
            api_secret: required("BINANCE_API_SECRET")?,
            base_url: lookup("BINANCE_BASE_URL").filter(|v| !v.is_empty()),
        })
    }
}

fn default_rest_url() -> String {
    "https://fapi.binance.com".to_string()
}

fn default_ws_url() -> String {
    "wss://fstream.binance.com".to_string()
}

fn default_depth_stream() -> String {
    "depth5@100ms".to_string()
}

fn default_recv_window_ms() -> u64 {
    5000
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_reconnect_base_delay_ms() -> u64 {
    1000
}

fn default_reconnect_max_delay_ms() -> u64 {
    60_000
}

fn default_listen_key_keepalive_secs() -> u64 {
    1800 // 30 minutes
}
