//! Reconnecting WebSocket stream runner.
//!
//! Connects to one stream URL and forwards every text frame to an mpsc
//! channel. Disconnects are followed by a reconnect after exponential
//! backoff with jitter. Decoding is left to the consumer.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{FeedError, FeedResult};

/// Stream connection settings.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Full stream URL, e.g. `wss://fstream.binance.com/ws/btcusdt@depth5@100ms`.
    pub url: String,
    /// Maximum reconnection attempts (0 = infinite).
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff.
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    pub reconnect_max_delay_ms: u64,
}

impl StreamConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_reconnect_attempts: 0,
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 60000,
        }
    }
}

/// Runs one WebSocket stream until shutdown.
pub struct StreamRunner {
    name: &'static str,
    config: StreamConfig,
    frame_tx: mpsc::Sender<String>,
    shutdown_token: CancellationToken,
}

impl StreamRunner {
    pub fn new(
        name: &'static str,
        config: StreamConfig,
        frame_tx: mpsc::Sender<String>,
        shutdown_token: CancellationToken,
    ) -> Self {
        Self {
            name,
            config,
            frame_tx,
            shutdown_token,
        }
    }

    /// Connect and forward frames, reconnecting until cancelled.
    ///
    /// Returns `Ok(())` on shutdown, or an error when the reconnect budget is
    /// exhausted or the receiver has gone away.
    pub async fn run(&self) -> FeedResult<()> {
        let mut attempt = 0u32;

        loop {
            if self.shutdown_token.is_cancelled() {
                info!(stream = self.name, "Shutdown requested, exiting stream loop");
                return Ok(());
            }

            match self.connect_once(&mut attempt).await {
                Ok(()) => info!(stream = self.name, "Stream connection closed"),
                Err(FeedError::ChannelClosed) => {
                    warn!(stream = self.name, "Frame receiver dropped, stopping stream");
                    return Err(FeedError::ChannelClosed);
                }
                Err(e) => error!(stream = self.name, error = %e, "Stream connection error"),
            }

            if self.shutdown_token.is_cancelled() {
                info!(stream = self.name, "Shutdown requested after disconnect");
                return Ok(());
            }

            attempt += 1;
            if self.config.max_reconnect_attempts > 0
                && attempt >= self.config.max_reconnect_attempts
            {
                error!(stream = self.name, attempt, "Max reconnection attempts reached");
                return Err(FeedError::ConnectionFailed(
                    "Max reconnection attempts reached".to_string(),
                ));
            }

            let delay = backoff_delay(&self.config, attempt) + jitter();
            warn!(
                stream = self.name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting"
            );

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown_token.cancelled() => {
                    info!(stream = self.name, "Shutdown requested during backoff");
                    return Ok(());
                }
            }
        }
    }

    async fn connect_once(&self, attempt: &mut u32) -> FeedResult<()> {
        info!(stream = self.name, url = %self.config.url, "Connecting");
        let (ws_stream, _response) =
            connect_async_tls_with_config(&self.config.url, None, true, None).await?;
        let (mut write, mut read) = ws_stream.split();
        *attempt = 0;
        info!(stream = self.name, "Connected");

        loop {
            tokio::select! {
                () = self.shutdown_token.cancelled() => {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        warn!(stream = self.name, error = %e, "Failed to send Close frame");
                    }
                    return Ok(());
                }

                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        self.frame_tx
                            .send(text)
                            .await
                            .map_err(|_| FeedError::ChannelClosed)?;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        debug!(stream = self.name, "Received ping, sending pong");
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (f.code.into(), f.reason.to_string()))
                            .unwrap_or((1000, "Normal close".to_string()));
                        warn!(stream = self.name, code, %reason, "Closed by server");
                        return Err(FeedError::ConnectionClosed { code, reason });
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        warn!(stream = self.name, "Stream ended");
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                },
            }
        }
    }
}

/// Exponential backoff: `base * 2^(attempt-1)`, capped at the max delay.
pub fn backoff_delay(config: &StreamConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    let delay = config
        .reconnect_base_delay_ms
        .saturating_mul(1u64 << exponent)
        .min(config.reconnect_max_delay_ms);
    Duration::from_millis(delay)
}

/// Random jitter in 0..1000ms.
fn jitter() -> Duration {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    Duration::from_millis(u64::from(nanos % 1000))
}
