//! Prometheus metrics for the quoter.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A failure means duplicate metric
//! names, which must crash at startup. It only happens during static
//! initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_gauge, register_int_counter_vec, register_int_gauge_vec, Encoder, Gauge,
    IntCounterVec, IntGaugeVec, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Market updates by result (applied/unchanged/rejected).
pub static MARKET_UPDATES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "quoter_market_updates_total",
        "Market snapshots processed by the engine",
        &["result"]
    )
    .unwrap()
});

/// Order actions by operation (cancel/submit) and outcome (sent/accepted).
pub static ORDER_ACTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "quoter_order_actions_total",
        "Orders sent to and accepted by the exchange",
        &["op", "outcome"]
    )
    .unwrap()
});

/// Batch calls that failed as a whole.
pub static BATCH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "quoter_batch_failures_total",
        "Cancel or submit batch calls that failed or timed out",
        &["op"]
    )
    .unwrap()
});

/// Reconciliations by result (ok/error).
pub static RECONCILE_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "quoter_reconcile_total",
        "Open-order reconciliations",
        &["result"]
    )
    .unwrap()
});

/// Current signed position.
pub static POSITION: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("quoter_position", "Signed position size (negative = short)").unwrap()
});

/// Resting orders per side after the last reconcile.
pub static RESTING_ORDERS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "quoter_resting_orders",
        "Resting orders per side as of the last reconcile",
        &["side"]
    )
    .unwrap()
});

/// Whether each side is allowed to quote (1) or gated by inventory (0).
pub static SIDE_ENABLED: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "quoter_side_enabled",
        "Inventory gate per side (1=quoting, 0=gated)",
        &["side"]
    )
    .unwrap()
});

/// Order lifecycle events from the user stream by status.
pub static ORDER_UPDATES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "quoter_order_updates_total",
        "Order updates received on the user stream",
        &["status"]
    )
    .unwrap()
});

/// Stream frames that failed to decode.
pub static STREAM_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "quoter_stream_errors_total",
        "Stream frames that failed to decode, by stream",
        &["stream"]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a market update result.
    pub fn market_update(result: &str) {
        MARKET_UPDATES_TOTAL.with_label_values(&[result]).inc();
    }

    /// Record order actions for one batch.
    pub fn order_actions(op: &str, sent: usize, accepted: usize) {
        ORDER_ACTIONS_TOTAL
            .with_label_values(&[op, "sent"])
            .inc_by(sent as u64);
        ORDER_ACTIONS_TOTAL
            .with_label_values(&[op, "accepted"])
            .inc_by(accepted as u64);
    }

    pub fn batch_failed(op: &str) {
        BATCH_FAILURES_TOTAL.with_label_values(&[op]).inc();
    }

    /// Record a reconcile and the resulting per-side counts.
    pub fn reconciled(asks: usize, bids: usize) {
        RECONCILE_TOTAL.with_label_values(&["ok"]).inc();
        RESTING_ORDERS.with_label_values(&["ask"]).set(asks as i64);
        RESTING_ORDERS.with_label_values(&["bid"]).set(bids as i64);
    }

    pub fn reconcile_failed() {
        RECONCILE_TOTAL.with_label_values(&["error"]).inc();
    }

    pub fn position(size: f64) {
        POSITION.set(size);
    }

    pub fn side_enabled(side: &str, enabled: bool) {
        SIDE_ENABLED
            .with_label_values(&[side])
            .set(i64::from(enabled));
    }

    pub fn order_update(status: &str) {
        ORDER_UPDATES_TOTAL.with_label_values(&[status]).inc();
    }

    pub fn stream_error(stream: &str) {
        STREAM_ERRORS_TOTAL.with_label_values(&[stream]).inc();
    }
}

/// Encode every registered metric in the Prometheus text format.
pub fn encode_text() -> TelemetryResult<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facade_updates_are_encoded() {
        Metrics::market_update("applied");
        Metrics::order_actions("submit", 3, 2);
        Metrics::reconciled(2, 1);
        Metrics::side_enabled("ask", false);
        Metrics::position(-0.25);

        let text = encode_text().unwrap();
        assert!(text.contains("quoter_market_updates_total{result=\"applied\"}"));
        assert!(text.contains("quoter_order_actions_total{op=\"submit\",outcome=\"accepted\"}"));
        assert!(text.contains("quoter_resting_orders{side=\"bid\"} 1"));
        assert!(text.contains("quoter_side_enabled{side=\"ask\"} 0"));
        assert!(text.contains("quoter_position -0.25"));
    }
}
