//! Main application orchestration.
//!
//! Starts the quote engine and feeds it from three independent tasks:
//! - market stream: depth frames decoded and applied in arrival order
//! - user stream: position updates and order-status observability
//! - reconcile timer: periodic open-order resync
//!
//! Plus listen key keep-alive and the optional `/metrics` server.

use std::sync::Arc;
use std::time::Duration;

use quoter_core::{Side, Size};
use quoter_exchange::{BinanceGateway, DynGateway};
use quoter_feed::{decode_account, decode_market, AccountEvent, PositionLegs, StreamRunner};
use quoter_mm::{QuoteEngine, UpdateOutcome};
use quoter_telemetry::Metrics;
use rust_decimal::prelude::ToPrimitive;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, Credentials, ExchangeConfig};
use crate::error::AppResult;

/// Frame channel capacity per stream.
const FRAME_CHANNEL_CAPACITY: usize = 1000;

/// Delay before retrying to open the user stream after a failure.
const USER_STREAM_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Main application.
pub struct Application {
    config: AppConfig,
    credentials: Credentials,
}

impl Application {
    pub fn new(config: AppConfig, credentials: Credentials) -> Self {
        Self {
            config,
            credentials,
        }
    }

    /// Bootstrap the engine, run until Ctrl-C, then stop every task.
    ///
    /// Resting orders are left on the exchange at shutdown.
    pub async fn run(self) -> AppResult<()> {
        let exchange = self.config.exchange.clone();
        let gateway: DynGateway = Arc::new(BinanceGateway::new(
            exchange.gateway_config(&self.credentials),
        )?);

        let engine = Arc::new(
            QuoteEngine::bootstrap(
                self.config.strategy.clone(),
                &self.config.engine,
                gateway.clone(),
            )
            .await?,
        );
        publish_state(&engine);

        let shutdown = CancellationToken::new();
        let mut tasks: Vec<JoinHandle<()>> = Vec::new();

        tasks.extend(spawn_market_stream(&exchange, engine.clone(), shutdown.clone()));
        tasks.push(tokio::spawn(run_user_stream(
            exchange.clone(),
            gateway.clone(),
            engine.clone(),
            shutdown.clone(),
        )));
        tasks.push(tokio::spawn(run_listen_key_keepalive(
            gateway.clone(),
            Duration::from_secs(exchange.listen_key_keepalive_secs),
            shutdown.clone(),
        )));
        tasks.push(tokio::spawn(run_reconcile_timer(
            engine.clone(),
            Duration::from_millis(self.config.engine.reconcile_interval_ms),
            shutdown.clone(),
        )));

        if let Some(port) = self.config.telemetry.metrics_port {
            tasks.push(tokio::spawn(async move {
                if let Err(e) = quoter_telemetry::serve_metrics(port).await {
                    error!(error = %e, "Metrics server failed");
                }
            }));
        }

        info!(
            portfolio = %engine.name(),
            instrument = engine.instrument(),
            "Quoting started"
        );

        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");

        shutdown.cancel();
        for task in tasks {
            task.abort();
        }

        info!(
            asks = engine.resting(Side::Ask).len(),
            bids = engine.resting(Side::Bid).len(),
            "Shut down; resting orders left in place"
        );
        Ok(())
    }
}

/// Spawn the depth stream runner and the task applying its frames.
fn spawn_market_stream(
    exchange: &ExchangeConfig,
    engine: Arc<QuoteEngine>,
    shutdown: CancellationToken,
) -> [JoinHandle<()>; 2] {
    let (frame_tx, mut frame_rx) = mpsc::channel::<String>(FRAME_CHANNEL_CAPACITY);
    let runner = StreamRunner::new(
        "market",
        exchange.stream_config(exchange.market_stream_url()),
        frame_tx,
        shutdown,
    );

    let stream = tokio::spawn(async move {
        if let Err(e) = runner.run().await {
            error!(error = %e, "Market stream stopped");
        }
    });

    let consumer = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            match decode_market(&frame) {
                Ok(Some(raw)) => match engine.on_raw_market_update(&raw).await {
                    Ok(outcome) => record_outcome(&engine, &outcome),
                    Err(_) => Metrics::market_update("rejected"),
                },
                Ok(None) => debug!("Market control frame skipped"),
                Err(e) => {
                    error!(error = %e, "Market frame parse error");
                    Metrics::stream_error("market");
                }
            }
        }
    });

    [stream, consumer]
}

/// Run the user-data stream, opening a fresh listen key whenever the
/// current one expires.
///
/// Each session starts from the position legs reported over REST, then
/// folds in the legs carried by account updates.
async fn run_user_stream(
    exchange: ExchangeConfig,
    gateway: DynGateway,
    engine: Arc<QuoteEngine>,
    shutdown: CancellationToken,
) {
    let symbol = exchange.symbol.clone();
    let mut legs = PositionLegs::new();

    while !shutdown.is_cancelled() {
        let opened = async {
            let seed = gateway.get_position_legs().await?;
            let key = gateway.get_listen_key().await?;
            Ok::<_, quoter_exchange::GatewayError>((seed, key))
        };
        let (seed, listen_key) = match opened.await {
            Ok(opened) => opened,
            Err(e) => {
                warn!(error = %e, "Failed to open user stream");
                tokio::select! {
                    () = tokio::time::sleep(USER_STREAM_RETRY_DELAY) => continue,
                    () = shutdown.cancelled() => return,
                }
            }
        };
        apply_position(&engine, legs.seed(&seed));
        info!(legs = seed.len(), "User stream listen key obtained");

        let session = shutdown.child_token();
        let (frame_tx, mut frame_rx) = mpsc::channel::<String>(FRAME_CHANNEL_CAPACITY);
        let runner = StreamRunner::new(
            "user",
            exchange.stream_config(exchange.user_stream_url(&listen_key)),
            frame_tx,
            session.clone(),
        );
        let stream = tokio::spawn(async move {
            if let Err(e) = runner.run().await {
                error!(error = %e, "User stream stopped");
            }
        });

        while let Some(frame) = frame_rx.recv().await {
            match decode_account(&frame, &symbol) {
                Ok(Some(AccountEvent::Position(changed))) => {
                    apply_position(&engine, legs.apply(&changed));
                }
                Ok(Some(AccountEvent::OrderUpdate(update))) => {
                    info!(
                        order_id = %update.order_id,
                        client_order_id = %update.client_order_id,
                        side = %update.side,
                        status = %update.status,
                        price = %update.price,
                        quantity = %update.quantity,
                        "Order update"
                    );
                    Metrics::order_update(&update.status.to_string());
                }
                Ok(Some(AccountEvent::ListenKeyExpired)) => {
                    warn!("Listen key expired, reopening user stream");
                    break;
                }
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "User frame parse error");
                    Metrics::stream_error("user");
                }
            }
        }

        session.cancel();
        drop(frame_rx);
        if let Err(e) = stream.await {
            warn!(error = %e, "User stream task ended abnormally");
        }
    }
}

/// Periodically extend the listen key.
async fn run_listen_key_keepalive(
    gateway: DynGateway,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    // The first tick fires immediately; the key was just created.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match gateway.keepalive_listen_key().await {
                    Ok(()) => debug!("Listen key refreshed"),
                    Err(e) => warn!(error = %e, "Listen key keep-alive failed"),
                }
            }
            () = shutdown.cancelled() => return,
        }
    }
}

/// Periodically resync the order view with the exchange.
async fn run_reconcile_timer(engine: Arc<QuoteEngine>, period: Duration, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match engine.reconcile().await {
                    Ok(report) => Metrics::reconciled(report.asks, report.bids),
                    Err(e) => {
                        warn!(error = %e, "Periodic reconcile failed");
                        Metrics::reconcile_failed();
                    }
                }
            }
            () = shutdown.cancelled() => return,
        }
    }
}

fn apply_position(engine: &QuoteEngine, net: Size) {
    engine.on_position_update(net);
    Metrics::position(net.inner().to_f64().unwrap_or_default());
}

fn record_outcome(engine: &QuoteEngine, outcome: &UpdateOutcome) {
    let summary = match outcome {
        UpdateOutcome::Unchanged => {
            Metrics::market_update("unchanged");
            return;
        }
        UpdateOutcome::Applied(summary) => summary,
    };

    Metrics::market_update("applied");
    if summary.cancels_sent > 0 {
        Metrics::order_actions("cancel", summary.cancels_sent, summary.cancels_accepted);
    }
    if summary.submits_sent > 0 {
        Metrics::order_actions("submit", summary.submits_sent, summary.submits_accepted);
    }
    if summary.cancel_failed {
        Metrics::batch_failed("cancel");
    }
    if summary.submit_failed {
        Metrics::batch_failed("submit");
    }
    if summary.reconciled {
        Metrics::reconciled(
            engine.resting(Side::Ask).len(),
            engine.resting(Side::Bid).len(),
        );
    } else if summary.acted() {
        Metrics::reconcile_failed();
    }
    publish_state(engine);
}

fn publish_state(engine: &QuoteEngine) {
    let gate = engine.gate();
    Metrics::side_enabled("ask", gate.should_ask);
    Metrics::side_enabled("bid", gate.should_bid);
    Metrics::position(engine.position().inner().to_f64().unwrap_or_default());
}
