//! Order-related types and identifiers.
//!
//! Provides book side, order status, type, time-in-force and identifiers
//! for the orders the strategy rests on the exchange.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;
use crate::{Price, Size};

/// Side of the book an order rests on.
///
/// Asks are sell orders, bids are buy orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Ask,
    Bid,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Ask, Side::Bid];

    /// Exchange wire value (`SELL` / `BUY`).
    pub fn as_exchange_str(&self) -> &'static str {
        match self {
            Self::Ask => "SELL",
            Self::Bid => "BUY",
        }
    }

    /// Parse the exchange wire value.
    pub fn from_exchange(s: &str) -> Result<Self, CoreError> {
        match s {
            "SELL" => Ok(Self::Ask),
            "BUY" => Ok(Self::Bid),
            other => Err(CoreError::UnknownSide(other.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ask => write!(f, "ask"),
            Self::Bid => write!(f, "bid"),
        }
    }
}

/// Position leg as reported by the exchange (`positionSide` / `ps`).
///
/// One-way accounts only ever report `Both`; hedge-mode accounts report
/// separate `Long` and `Short` legs whose signed amounts add up to the net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Both,
    Long,
    Short,
}

impl PositionSide {
    pub fn from_exchange(s: &str) -> Result<Self, CoreError> {
        match s {
            "BOTH" => Ok(Self::Both),
            "LONG" => Ok(Self::Long),
            "SHORT" => Ok(Self::Short),
            other => Err(CoreError::UnknownPositionSide(other.to_string())),
        }
    }
}

/// Signed position amount of one leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLeg {
    pub side: PositionSide,
    pub amount: Size,
}

impl PositionLeg {
    pub fn new(side: PositionSide, amount: Size) -> Self {
        Self { side, amount }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Limit order.
    #[default]
    Limit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "LIMIT"),
        }
    }
}

/// Time-in-force for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-til-cancelled. Every ladder rung rests GTC.
    #[default]
    #[serde(rename = "GTC")]
    GoodTilCancelled,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoodTilCancelled => write!(f, "GTC"),
        }
    }
}

/// Exchange-assigned order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl OrderId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Client order ID attached to every submission.
///
/// Lets log lines and user-data events be correlated with the submit
/// batch that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create a new unique client order ID.
    ///
    /// Format: `qtr_{timestamp_ms}_{uuid_short}` (well under the 36 char limit).
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().simple().to_string()[..8];
        Self(format!("qtr_{ts}_{uuid_short}"))
    }

    /// Create from an existing string (for parsing responses).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order lifecycle status as reported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
}

impl OrderStatus {
    /// Returns true if the order can no longer rest on the book.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Canceled | Self::Rejected | Self::Expired
        )
    }

    /// Returns true if the order is still resting.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PARTIALLY_FILLED" => Ok(Self::PartiallyFilled),
            "FILLED" => Ok(Self::Filled),
            "CANCELED" => Ok(Self::Canceled),
            "REJECTED" => Ok(Self::Rejected),
            "EXPIRED" | "EXPIRED_IN_MATCH" => Ok(Self::Expired),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "NEW",
            Self::PartiallyFilled => "PARTIALLY_FILLED",
            Self::Filled => "FILLED",
            Self::Canceled => "CANCELED",
            Self::Rejected => "REJECTED",
            Self::Expired => "EXPIRED",
        };
        write!(f, "{s}")
    }
}

/// An order of ours believed to be resting on the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrder {
    /// Exchange order ID.
    pub id: OrderId,
    /// Book side.
    pub side: Side,
    /// Limit price.
    pub price: Price,
    /// Original order quantity.
    pub quantity: Size,
    /// Last known status.
    pub status: OrderStatus,
}

impl RestingOrder {
    pub fn new(id: OrderId, side: Side, price: Price, quantity: Size, status: OrderStatus) -> Self {
        Self {
            id,
            side,
            price,
            quantity,
            status,
        }
    }
}

/// Parameters of a new order to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderParams {
    pub side: Side,
    pub price: Price,
    pub quantity: Size,
    pub time_in_force: TimeInForce,
    pub order_type: OrderType,
}

impl OrderParams {
    /// A GTC limit order, the only kind the ladder produces.
    #[must_use]
    pub fn limit(side: Side, price: Price, quantity: Size) -> Self {
        Self {
            side,
            price,
            quantity,
            time_in_force: TimeInForce::GoodTilCancelled,
            order_type: OrderType::Limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_exchange_mapping() {
        assert_eq!(Side::Ask.as_exchange_str(), "SELL");
        assert_eq!(Side::Bid.as_exchange_str(), "BUY");
        assert_eq!(Side::from_exchange("SELL").unwrap(), Side::Ask);
        assert_eq!(Side::from_exchange("BUY").unwrap(), Side::Bid);
        assert!(Side::from_exchange("sell").is_err());
    }

    #[test]
    fn test_position_side_mapping() {
        assert_eq!(PositionSide::from_exchange("BOTH").unwrap(), PositionSide::Both);
        assert_eq!(PositionSide::from_exchange("LONG").unwrap(), PositionSide::Long);
        assert_eq!(PositionSide::from_exchange("SHORT").unwrap(), PositionSide::Short);
        assert!(PositionSide::from_exchange("both").is_err());
    }

    #[test]
    fn test_order_status_parse_and_terminal() {
        assert_eq!("NEW".parse::<OrderStatus>().unwrap(), OrderStatus::New);
        assert_eq!(
            "EXPIRED_IN_MATCH".parse::<OrderStatus>().unwrap(),
            OrderStatus::Expired
        );
        assert!("BOGUS".parse::<OrderStatus>().is_err());

        assert!(OrderStatus::New.is_open());
        assert!(OrderStatus::PartiallyFilled.is_open());
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
    }

    #[test]
    fn test_limit_params_default_to_gtc() {
        let params = OrderParams::limit(Side::Bid, Price::new(dec!(99.5)), Size::new(dec!(0.01)));
        assert_eq!(params.time_in_force, TimeInForce::GoodTilCancelled);
        assert_eq!(params.order_type, OrderType::Limit);
        assert_eq!(params.time_in_force.to_string(), "GTC");
        assert_eq!(params.order_type.to_string(), "LIMIT");
    }

    #[test]
    fn test_client_order_id_unique() {
        let id1 = ClientOrderId::new();
        let id2 = ClientOrderId::new();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("qtr_"));
        assert!(id1.as_str().len() <= 36);
    }
}
