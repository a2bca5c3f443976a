//! Exchange gateway trait.
//!
//! Abstracts the REST operations the quote engine needs so the engine can be
//! driven against the real exchange or an in-memory mock.

use std::pin::Pin;
use std::sync::Arc;

use quoter_core::{OrderId, OrderParams, PositionLeg, RestingOrder, Size};

use crate::error::GatewayResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Outcome of one item of a batch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemResult {
    /// Accepted by the exchange; carries the affected order id.
    Accepted(OrderId),
    /// Rejected by the exchange with its error code and message.
    Rejected { code: i64, msg: String },
}

impl ItemResult {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// Order id of an accepted item.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Self::Accepted(id) => Some(*id),
            Self::Rejected { .. } => None,
        }
    }
}

/// REST operations against one instrument.
///
/// The instrument is bound when the gateway is constructed. Every call is
/// individually atomic but may fail or time out; batch calls are best effort
/// and report one [`ItemResult`] per input item, in input order.
pub trait ExchangeGateway: Send + Sync {
    /// Symbol this gateway trades.
    fn instrument(&self) -> &str;

    /// Orders currently resting on the book (terminal statuses excluded).
    fn list_open_orders(&self) -> BoxFuture<'_, GatewayResult<Vec<RestingOrder>>>;

    /// Signed position size (negative = short).
    fn get_position(&self) -> BoxFuture<'_, GatewayResult<Size>>;

    /// Position broken down by leg; a single `Both` leg in one-way mode.
    fn get_position_legs(&self) -> BoxFuture<'_, GatewayResult<Vec<PositionLeg>>>;

    /// Cancel orders by id.
    fn cancel_batch(&self, ids: Vec<OrderId>) -> BoxFuture<'_, GatewayResult<Vec<ItemResult>>>;

    /// Submit new orders.
    fn submit_batch(
        &self,
        orders: Vec<OrderParams>,
    ) -> BoxFuture<'_, GatewayResult<Vec<ItemResult>>>;

    /// Obtain a listen key for the account stream.
    fn get_listen_key(&self) -> BoxFuture<'_, GatewayResult<String>>;

    /// Extend the validity of the current listen key.
    fn keepalive_listen_key(&self) -> BoxFuture<'_, GatewayResult<()>>;
}

/// Arc wrapper for gateway trait objects.
pub type DynGateway = Arc<dyn ExchangeGateway>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_result_accessors() {
        let ok = ItemResult::Accepted(OrderId::new(7));
        assert!(ok.is_accepted());
        assert_eq!(ok.order_id(), Some(OrderId::new(7)));

        let rejected = ItemResult::Rejected {
            code: -2011,
            msg: "Unknown order sent.".to_string(),
        };
        assert!(!rejected.is_accepted());
        assert_eq!(rejected.order_id(), None);
    }
}
