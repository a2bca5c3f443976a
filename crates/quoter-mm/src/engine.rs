//! Concurrent quote-reconciliation engine.
//!
//! Three event sources drive one [`Portfolio`]: market updates, position
//! updates and reconciliation. The portfolio sits behind a single
//! `parking_lot::Mutex` that is only held while reading or applying state,
//! never across a gateway call. Market updates and reconciliations also hold
//! an async action lock for their whole plan/call/apply sequence, so a
//! listing can never be applied on top of actions issued after it was taken.
//! Position updates only touch the portfolio lock and never wait on the
//! exchange.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use quoter_core::{
    MarketSnapshot, OrderParams, OrderStatus, RawSnapshot, RestingOrder, Side, Size,
};
use quoter_exchange::{DynGateway, GatewayResult, ItemResult};
use tracing::{debug, error, info, warn};

use crate::config::{EngineConfig, StrategyConfig};
use crate::error::{EngineError, EngineResult};
use crate::inventory::InventoryGate;
use crate::portfolio::{Portfolio, QuotePlan};

/// What a market update did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Snapshot equal to the stored one; nothing happened.
    Unchanged,
    /// Snapshot stored; actions (possibly none) were issued.
    Applied(ActionSummary),
}

/// Gateway activity for one market update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSummary {
    pub cancels_sent: usize,
    pub cancels_accepted: usize,
    pub submits_sent: usize,
    pub submits_accepted: usize,
    /// The cancel call as a whole failed or timed out.
    pub cancel_failed: bool,
    /// The submit call as a whole failed or timed out.
    pub submit_failed: bool,
    /// A follow-up reconcile ran and was applied.
    pub reconciled: bool,
}

impl ActionSummary {
    /// True if any gateway action was issued.
    pub fn acted(&self) -> bool {
        self.cancels_sent > 0 || self.submits_sent > 0
    }
}

/// Result of applying an exchange listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub asks: usize,
    pub bids: usize,
}

pub struct QuoteEngine {
    portfolio: Mutex<Portfolio>,
    gateway: DynGateway,
    action_lock: tokio::sync::Mutex<()>,
    call_timeout: Duration,
}

impl QuoteEngine {
    /// Validate the config and seed the portfolio from the exchange.
    ///
    /// Fails if the config is invalid or either initial query fails.
    pub async fn bootstrap(
        config: StrategyConfig,
        engine_config: &EngineConfig,
        gateway: DynGateway,
    ) -> EngineResult<Self> {
        config.validate()?;
        let call_timeout = Duration::from_millis(engine_config.call_timeout_ms);

        let position = with_timeout("get_position", call_timeout, gateway.get_position()).await?;
        let open_orders =
            with_timeout("list_open_orders", call_timeout, gateway.list_open_orders()).await?;

        info!(
            portfolio = %config.name,
            instrument = gateway.instrument(),
            position = %position,
            open_orders = open_orders.len(),
            "Portfolio bootstrapped"
        );

        Ok(Self {
            portfolio: Mutex::new(Portfolio::new(config, position, open_orders)),
            gateway,
            action_lock: tokio::sync::Mutex::new(()),
            call_timeout,
        })
    }

    /// Validate a raw snapshot and apply it.
    ///
    /// Malformed input is logged and rejected without touching state.
    pub async fn on_raw_market_update(&self, raw: &RawSnapshot) -> EngineResult<UpdateOutcome> {
        match MarketSnapshot::try_from(raw) {
            Ok(snapshot) => Ok(self.on_market_update(snapshot).await),
            Err(e) => {
                error!(portfolio = %self.name(), error = %e, ?raw, "Market update parse error");
                Err(e.into())
            }
        }
    }

    /// Requote against a new snapshot.
    ///
    /// At most one cancel batch and one submit batch are issued, followed by
    /// a reconcile whenever anything was sent. Gateway failures are logged and
    /// left for the next reconcile to repair.
    pub async fn on_market_update(&self, snapshot: MarketSnapshot) -> UpdateOutcome {
        let _action = self.action_lock.lock().await;

        let (name, plan) = {
            let mut portfolio = self.portfolio.lock();
            (portfolio.name().to_string(), portfolio.plan_update(snapshot))
        };
        let Some(plan) = plan else {
            debug!(portfolio = %name, "Snapshot unchanged");
            return UpdateOutcome::Unchanged;
        };

        let mut summary = self.execute(&name, plan).await;
        if summary.acted() {
            match self.reconcile_locked().await {
                Ok(_) => summary.reconciled = true,
                Err(e) => warn!(portfolio = %name, error = %e, "Post-update reconcile failed"),
            }
        }
        UpdateOutcome::Applied(summary)
    }

    async fn execute(&self, name: &str, plan: QuotePlan) -> ActionSummary {
        let QuotePlan { cancels, submits } = plan;
        let mut summary = ActionSummary {
            cancels_sent: cancels.len(),
            submits_sent: submits.len(),
            ..ActionSummary::default()
        };

        if !cancels.is_empty() {
            debug!(portfolio = %name, ids = ?cancels, "Cancelling orders");
            match self.call("cancel_batch", self.gateway.cancel_batch(cancels)).await {
                Ok(results) => {
                    summary.cancels_accepted = count_accepted(name, "cancel", &results);
                }
                Err(e) => {
                    warn!(portfolio = %name, error = %e, "Cancel batch failed");
                    summary.cancel_failed = true;
                }
            }
        }

        if !submits.is_empty() {
            debug!(portfolio = %name, count = submits.len(), "Submitting orders");
            match self
                .call("submit_batch", self.gateway.submit_batch(submits.clone()))
                .await
            {
                Ok(results) => {
                    summary.submits_accepted = count_accepted(name, "submit", &results);
                    self.portfolio
                        .lock()
                        .record_submitted(accepted_orders(&submits, &results));
                }
                Err(e) => {
                    warn!(portfolio = %name, error = %e, "Submit batch failed");
                    summary.submit_failed = true;
                }
            }
        }

        info!(
            portfolio = %name,
            cancelled = summary.cancels_accepted,
            cancels = summary.cancels_sent,
            submitted = summary.submits_accepted,
            submits = summary.submits_sent,
            "Quotes updated"
        );
        summary
    }

    /// Overwrite the position. No requote and no reconcile.
    pub fn on_position_update(&self, position: Size) {
        let mut portfolio = self.portfolio.lock();
        if portfolio.position() != position {
            debug!(
                portfolio = %portfolio.name(),
                from = %portfolio.position(),
                to = %position,
                "Position updated"
            );
        }
        portfolio.set_position(position);
    }

    /// Replace the order view with the exchange's open orders.
    pub async fn reconcile(&self) -> EngineResult<ReconcileReport> {
        let _action = self.action_lock.lock().await;
        self.reconcile_locked().await
    }

    async fn reconcile_locked(&self) -> EngineResult<ReconcileReport> {
        let orders = self
            .call("list_open_orders", self.gateway.list_open_orders())
            .await?;

        let mut portfolio = self.portfolio.lock();
        portfolio.replace_orders(orders);
        let book = portfolio.book();
        let report = ReconcileReport {
            asks: book.side(Side::Ask).len(),
            bids: book.side(Side::Bid).len(),
        };
        debug!(
            portfolio = %portfolio.name(),
            asks = report.asks,
            bids = report.bids,
            "Reconciled open orders"
        );
        Ok(report)
    }

    async fn call<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = GatewayResult<T>>,
    ) -> EngineResult<T> {
        with_timeout(op, self.call_timeout, fut).await
    }

    pub fn name(&self) -> String {
        self.portfolio.lock().name().to_string()
    }

    pub fn instrument(&self) -> &str {
        self.gateway.instrument()
    }

    pub fn position(&self) -> Size {
        self.portfolio.lock().position()
    }

    pub fn gate(&self) -> InventoryGate {
        self.portfolio.lock().gate()
    }

    pub fn snapshot(&self) -> Option<MarketSnapshot> {
        self.portfolio.lock().snapshot().copied()
    }

    /// Our resting orders on a side, as currently believed.
    pub fn resting(&self, side: Side) -> Vec<RestingOrder> {
        self.portfolio.lock().book().side(side).to_vec()
    }
}

async fn with_timeout<T>(
    op: &'static str,
    limit: Duration,
    fut: impl Future<Output = GatewayResult<T>>,
) -> EngineResult<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(EngineError::Timeout {
            op,
            after_ms: limit.as_millis() as u64,
        }),
    }
}

fn count_accepted(name: &str, op: &'static str, results: &[ItemResult]) -> usize {
    let mut accepted = 0;
    for result in results {
        match result {
            ItemResult::Accepted(_) => accepted += 1,
            ItemResult::Rejected { code, msg } => {
                warn!(portfolio = %name, op, code, %msg, "Batch item rejected");
            }
        }
    }
    accepted
}

/// Pair accepted submit results with the orders that produced them.
fn accepted_orders(submits: &[OrderParams], results: &[ItemResult]) -> Vec<RestingOrder> {
    submits
        .iter()
        .zip(results)
        .filter_map(|(params, result)| {
            result.order_id().map(|id| {
                RestingOrder::new(id, params.side, params.price, params.quantity, OrderStatus::New)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quoter_core::{OrderId, Price};
    use rust_decimal_macros::dec;

    #[test]
    fn test_accepted_orders_skips_rejections() {
        let submits = vec![
            OrderParams::limit(Side::Ask, Price::new(dec!(101)), Size::new(dec!(1))),
            OrderParams::limit(Side::Ask, Price::new(dec!(102)), Size::new(dec!(1))),
        ];
        let results = vec![
            ItemResult::Rejected {
                code: -2019,
                msg: "Margin is insufficient.".to_string(),
            },
            ItemResult::Accepted(OrderId::new(9)),
        ];
        let orders = accepted_orders(&submits, &results);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, OrderId::new(9));
        assert_eq!(orders[0].price, Price::new(dec!(102)));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_engine_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, quoter_exchange::GatewayError>(())
        };
        let err = with_timeout("list_open_orders", Duration::from_millis(5), slow)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Timeout {
                op: "list_open_orders",
                after_ms: 5
            }
        ));
    }
}
