//! In-memory exchange used as the gateway test double.
//!
//! Behaves like a tiny venue for one instrument: submitted orders rest with
//! fresh ids, cancels remove them, and `list_open_orders` returns whatever is
//! resting. Every call is recorded, and each operation can be told to fail.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use quoter_core::{
    OrderId, OrderParams, OrderStatus, PositionLeg, PositionSide, RestingOrder, Size,
};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{BoxFuture, ExchangeGateway, ItemResult};

/// Exchange error code for cancelling an order that is not resting.
pub const UNKNOWN_ORDER_CODE: i64 = -2011;

/// Recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ListOpenOrders,
    GetPosition,
    GetPositionLegs,
    CancelBatch(Vec<OrderId>),
    SubmitBatch(Vec<OrderParams>),
    GetListenKey,
    KeepaliveListenKey,
}

/// Mock gateway for testing.
#[derive(Debug)]
pub struct MockGateway {
    instrument: String,
    calls: Mutex<Vec<GatewayCall>>,
    resting: Mutex<Vec<RestingOrder>>,
    position: Mutex<Vec<PositionLeg>>,
    next_id: AtomicU64,
    fail_list: AtomicBool,
    fail_position: AtomicBool,
    fail_cancel: AtomicBool,
    fail_submit: AtomicBool,
    list_delay: Mutex<Option<Duration>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new("BTCUSDT")
    }
}

impl MockGateway {
    /// Create an empty mock venue with a flat position.
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            calls: Mutex::new(Vec::new()),
            resting: Mutex::new(Vec::new()),
            position: Mutex::new(vec![PositionLeg::new(PositionSide::Both, Size::ZERO)]),
            next_id: AtomicU64::new(1),
            fail_list: AtomicBool::new(false),
            fail_position: AtomicBool::new(false),
            fail_cancel: AtomicBool::new(false),
            fail_submit: AtomicBool::new(false),
            list_delay: Mutex::new(None),
        }
    }

    /// Replace the resting orders the venue reports.
    pub fn set_open_orders(&self, orders: Vec<RestingOrder>) {
        if let Some(max) = orders.iter().map(|o| o.id.get()).max() {
            self.next_id.fetch_max(max + 1, Ordering::SeqCst);
        }
        *self.resting.lock() = orders;
    }

    /// Current resting orders.
    pub fn open_orders(&self) -> Vec<RestingOrder> {
        self.resting.lock().clone()
    }

    /// Remove an order as if it had been filled.
    pub fn fill(&self, id: OrderId) {
        self.resting.lock().retain(|o| o.id != id);
    }

    /// One-way position: a single `Both` leg.
    pub fn set_position(&self, size: Size) {
        *self.position.lock() = vec![PositionLeg::new(PositionSide::Both, size)];
    }

    /// Hedge-mode position, one entry per leg.
    pub fn set_position_legs(&self, legs: Vec<PositionLeg>) {
        *self.position.lock() = legs;
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_position(&self, fail: bool) {
        self.fail_position.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_cancel(&self, fail: bool) {
        self.fail_cancel.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_submit(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }

    /// Delay every `list_open_orders` response.
    pub fn set_list_delay(&self, delay: Option<Duration>) {
        *self.list_delay.lock() = delay;
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    /// Recorded cancel batches.
    pub fn cancel_calls(&self) -> Vec<Vec<OrderId>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                GatewayCall::CancelBatch(ids) => Some(ids.clone()),
                _ => None,
            })
            .collect()
    }

    /// Recorded submit batches.
    pub fn submit_calls(&self) -> Vec<Vec<OrderParams>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                GatewayCall::SubmitBatch(orders) => Some(orders.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of `list_open_orders` calls.
    pub fn list_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, GatewayCall::ListOpenOrders))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().push(call);
    }

    fn cancel_now(&self, ids: &[OrderId]) -> Vec<ItemResult> {
        let mut resting = self.resting.lock();
        ids.iter()
            .map(|id| match resting.iter().position(|o| o.id == *id) {
                Some(idx) => {
                    resting.remove(idx);
                    ItemResult::Accepted(*id)
                }
                None => ItemResult::Rejected {
                    code: UNKNOWN_ORDER_CODE,
                    msg: "Unknown order sent.".to_string(),
                },
            })
            .collect()
    }

    fn submit_now(&self, orders: &[OrderParams]) -> Vec<ItemResult> {
        let mut resting = self.resting.lock();
        orders
            .iter()
            .map(|params| {
                let id = OrderId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
                resting.push(RestingOrder::new(
                    id,
                    params.side,
                    params.price,
                    params.quantity,
                    OrderStatus::New,
                ));
                ItemResult::Accepted(id)
            })
            .collect()
    }
}

impl ExchangeGateway for MockGateway {
    fn instrument(&self) -> &str {
        &self.instrument
    }

    fn list_open_orders(&self) -> BoxFuture<'_, GatewayResult<Vec<RestingOrder>>> {
        Box::pin(async move {
            self.record(GatewayCall::ListOpenOrders);
            let delay = *self.list_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(GatewayError::Simulated("list_open_orders".to_string()));
            }
            Ok(self.resting.lock().clone())
        })
    }

    fn get_position(&self) -> BoxFuture<'_, GatewayResult<Size>> {
        Box::pin(async move {
            self.record(GatewayCall::GetPosition);
            if self.fail_position.load(Ordering::SeqCst) {
                return Err(GatewayError::Simulated("get_position".to_string()));
            }
            let net = self
                .position
                .lock()
                .iter()
                .fold(Size::ZERO, |acc, leg| acc + leg.amount);
            Ok(net)
        })
    }

    fn get_position_legs(&self) -> BoxFuture<'_, GatewayResult<Vec<PositionLeg>>> {
        Box::pin(async move {
            self.record(GatewayCall::GetPositionLegs);
            if self.fail_position.load(Ordering::SeqCst) {
                return Err(GatewayError::Simulated("get_position_legs".to_string()));
            }
            Ok(self.position.lock().clone())
        })
    }

    fn cancel_batch(&self, ids: Vec<OrderId>) -> BoxFuture<'_, GatewayResult<Vec<ItemResult>>> {
        Box::pin(async move {
            self.record(GatewayCall::CancelBatch(ids.clone()));
            if self.fail_cancel.load(Ordering::SeqCst) {
                return Err(GatewayError::Simulated("cancel_batch".to_string()));
            }
            Ok(self.cancel_now(&ids))
        })
    }

    fn submit_batch(
        &self,
        orders: Vec<OrderParams>,
    ) -> BoxFuture<'_, GatewayResult<Vec<ItemResult>>> {
        Box::pin(async move {
            self.record(GatewayCall::SubmitBatch(orders.clone()));
            if self.fail_submit.load(Ordering::SeqCst) {
                return Err(GatewayError::Simulated("submit_batch".to_string()));
            }
            Ok(self.submit_now(&orders))
        })
    }

    fn get_listen_key(&self) -> BoxFuture<'_, GatewayResult<String>> {
        Box::pin(async move {
            self.record(GatewayCall::GetListenKey);
            Ok("mock-listen-key".to_string())
        })
    }

    fn keepalive_listen_key(&self) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async move {
            self.record(GatewayCall::KeepaliveListenKey);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quoter_core::{Price, Side};
    use rust_decimal_macros::dec;

    fn ask(price: rust_decimal::Decimal) -> OrderParams {
        OrderParams::limit(Side::Ask, Price::new(price), Size::new(dec!(1)))
    }

    #[tokio::test]
    async fn test_submit_then_list() {
        let gw = MockGateway::default();
        let results = gw.submit_batch(vec![ask(dec!(101)), ask(dec!(102))]).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(ItemResult::is_accepted));

        let open = gw.list_open_orders().await.unwrap();
        assert_eq!(open.len(), 2);
        assert_eq!(open[1].price, Price::new(dec!(102)));
        assert_eq!(gw.submit_calls().len(), 1);
        assert_eq!(gw.list_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_unknown_order_is_rejected_item() {
        let gw = MockGateway::default();
        let ids: Vec<OrderId> = gw
            .submit_batch(vec![ask(dec!(101))])
            .await
            .unwrap()
            .iter()
            .filter_map(ItemResult::order_id)
            .collect();

        let results = gw.cancel_batch(vec![ids[0], OrderId::new(999)]).await.unwrap();
        assert!(results[0].is_accepted());
        assert!(matches!(
            results[1],
            ItemResult::Rejected { code: UNKNOWN_ORDER_CODE, .. }
        ));
        assert!(gw.open_orders().is_empty());
    }

    #[tokio::test]
    async fn test_seeded_ids_do_not_collide() {
        let gw = MockGateway::default();
        gw.set_open_orders(vec![RestingOrder::new(
            OrderId::new(40),
            Side::Bid,
            Price::new(dec!(99)),
            Size::new(dec!(1)),
            OrderStatus::New,
        )]);
        let results = gw.submit_batch(vec![ask(dec!(101))]).await.unwrap();
        assert_eq!(results[0].order_id(), Some(OrderId::new(41)));
    }

    #[tokio::test]
    async fn test_failures_are_recorded() {
        let gw = MockGateway::default();
        gw.set_fail_cancel(true);
        assert!(gw.cancel_batch(vec![OrderId::new(1)]).await.is_err());
        assert_eq!(gw.cancel_calls(), vec![vec![OrderId::new(1)]]);

        gw.set_fail_position(true);
        assert!(gw.get_position().await.is_err());
        assert!(gw.get_position_legs().await.is_err());
    }

    #[tokio::test]
    async fn test_hedge_legs_net_out() {
        let gw = MockGateway::default();
        let legs = vec![
            PositionLeg::new(PositionSide::Long, Size::new(dec!(3))),
            PositionLeg::new(PositionSide::Short, Size::new(dec!(-5))),
        ];
        gw.set_position_legs(legs.clone());
        assert_eq!(gw.get_position().await.unwrap(), Size::new(dec!(-2)));
        assert_eq!(gw.get_position_legs().await.unwrap(), legs);
    }
}
