//! Binance REST response and request bodies.

use quoter_core::{
    ClientOrderId, CoreError, OrderId, OrderParams, OrderStatus, PositionLeg, PositionSide,
    RestingOrder, Side, Size,
};
use serde::{Deserialize, Serialize};

use crate::gateway::ItemResult;

/// Entry of `GET /fapi/v1/openOrders`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OpenOrderWire {
    pub order_id: u64,
    pub symbol: String,
    pub status: String,
    pub price: String,
    pub orig_qty: String,
    pub side: String,
}

impl OpenOrderWire {
    pub fn into_resting(self) -> Result<RestingOrder, CoreError> {
        Ok(RestingOrder::new(
            OrderId::new(self.order_id),
            Side::from_exchange(&self.side)?,
            self.price.parse()?,
            self.orig_qty.parse()?,
            self.status.parse::<OrderStatus>()?,
        ))
    }
}

/// Entry of `GET /fapi/v2/positionRisk`.
///
/// One-way mode reports a single `BOTH` entry; hedge mode reports `LONG`
/// and `SHORT` entries whose signed amounts add up to the net position.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PositionRiskWire {
    pub symbol: String,
    pub position_amt: String,
    #[serde(default = "default_position_side")]
    pub position_side: String,
}

fn default_position_side() -> String {
    "BOTH".to_string()
}

/// Position legs reported for `symbol`.
pub(crate) fn position_legs(
    entries: &[PositionRiskWire],
    symbol: &str,
) -> Result<Vec<PositionLeg>, CoreError> {
    entries
        .iter()
        .filter(|e| e.symbol == symbol)
        .map(|e| -> Result<PositionLeg, CoreError> {
            Ok(PositionLeg::new(
                PositionSide::from_exchange(&e.position_side)?,
                e.position_amt.parse()?,
            ))
        })
        .collect()
}

/// Net signed position for `symbol` across all legs.
pub(crate) fn net_position(entries: &[PositionRiskWire], symbol: &str) -> Result<Size, CoreError> {
    Ok(position_legs(entries, symbol)?
        .iter()
        .fold(Size::ZERO, |acc, leg| acc + leg.amount))
}

/// Item of a batch order response: either an order echo or an error object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum BatchEntryWire {
    Order {
        #[serde(rename = "orderId")]
        order_id: u64,
    },
    Error {
        code: i64,
        msg: String,
    },
}

impl From<BatchEntryWire> for ItemResult {
    fn from(entry: BatchEntryWire) -> Self {
        match entry {
            BatchEntryWire::Order { order_id } => ItemResult::Accepted(OrderId::new(order_id)),
            BatchEntryWire::Error { code, msg } => ItemResult::Rejected { code, msg },
        }
    }
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorWire {
    pub code: i64,
    pub msg: String,
}

/// One element of the `batchOrders` parameter.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewOrderWire {
    pub symbol: String,
    pub side: &'static str,
    #[serde(rename = "type")]
    pub order_type: String,
    pub time_in_force: String,
    pub quantity: String,
    pub price: String,
    pub new_client_order_id: String,
}

impl NewOrderWire {
    pub fn from_params(symbol: &str, params: &OrderParams, client_id: ClientOrderId) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: params.side.as_exchange_str(),
            order_type: params.order_type.to_string(),
            time_in_force: params.time_in_force.to_string(),
            quantity: params.quantity.to_string(),
            price: params.price.to_string(),
            new_client_order_id: client_id.as_str().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListenKeyWire {
    pub listen_key: String,
}
