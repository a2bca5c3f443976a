//! Stream payload decoding.
//!
//! Market data arrives as partial-depth updates (`<symbol>@depth5`), account
//! data as user-data events keyed by `e`. Both may be wrapped in a combined
//! stream envelope `{"stream": .., "data": ..}`. Subscription acks
//! (`{"result": null, "id": ..}`) are control frames and decode to `None`.

use quoter_core::{
    OrderId, OrderStatus, PositionLeg, PositionSide, Price, RawSnapshot, Side, Size,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{FeedError, FeedResult};

/// Price level as sent on the wire: `[price, quantity]`.
type LevelWire = (String, String);

#[derive(Debug, Deserialize)]
struct DepthWire {
    #[serde(rename = "b", default)]
    bids: Vec<LevelWire>,
    #[serde(rename = "a", default)]
    asks: Vec<LevelWire>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "e")]
enum UserEventWire {
    #[serde(rename = "ORDER_TRADE_UPDATE")]
    OrderTradeUpdate {
        #[serde(rename = "o")]
        order: OrderWire,
    },
    #[serde(rename = "ACCOUNT_UPDATE")]
    AccountUpdate {
        #[serde(rename = "a")]
        account: AccountWire,
    },
    #[serde(rename = "listenKeyExpired")]
    ListenKeyExpired,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct OrderWire {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "c", default)]
    client_order_id: String,
    #[serde(rename = "S")]
    side: String,
    #[serde(rename = "X")]
    status: String,
    #[serde(rename = "i")]
    order_id: u64,
    #[serde(rename = "p")]
    price: String,
    #[serde(rename = "q")]
    quantity: String,
}

#[derive(Debug, Deserialize)]
struct AccountWire {
    #[serde(rename = "P", default)]
    positions: Vec<PositionWire>,
}

#[derive(Debug, Deserialize)]
struct PositionWire {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "pa")]
    amount: String,
    #[serde(rename = "ps", default = "default_position_side")]
    position_side: String,
}

fn default_position_side() -> String {
    "BOTH".to_string()
}

/// Order lifecycle notification for one of our orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    pub order_id: OrderId,
    pub client_order_id: String,
    pub side: Side,
    pub status: OrderStatus,
    pub price: Price,
    pub quantity: Size,
}

/// Decoded account event for the tracked instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEvent {
    /// Order status change; observability only.
    OrderUpdate(OrderUpdate),
    /// Legs of the tracked instrument that changed, with their new amounts.
    ///
    /// A hedge-mode update may carry only one leg; fold it into a
    /// [`PositionLegs`](crate::PositionLegs) to get the net position.
    Position(Vec<PositionLeg>),
    /// The listen key is no longer valid; the stream must be reopened.
    ListenKeyExpired,
}

/// Strip the combined-stream envelope; `None` for control frames.
fn unwrap_payload(text: &str) -> FeedResult<Option<Value>> {
    let mut value: Value = serde_json::from_str(text)?;
    if value.get("result").is_some() && value.get("id").is_some() {
        return Ok(None);
    }
    if value.get("stream").is_some() {
        if let Some(data) = value.get_mut("data") {
            return Ok(Some(data.take()));
        }
    }
    Ok(Some(value))
}

/// Decode a partial-depth payload into the top two levels of each side.
///
/// Missing levels are left as `None`; validation happens in the engine.
pub fn decode_market(text: &str) -> FeedResult<Option<RawSnapshot>> {
    let Some(payload) = unwrap_payload(text)? else {
        return Ok(None);
    };
    let depth: DepthWire = serde_json::from_value(payload)
        .map_err(|e| FeedError::ParseError(format!("depth payload: {e}")))?;

    let level = |levels: &[LevelWire], idx: usize| levels.get(idx).cloned();
    let best_ask = level(&depth.asks, 0);
    let best_bid = level(&depth.bids, 0);

    Ok(Some(RawSnapshot {
        ask_px: best_ask.as_ref().map(|(p, _)| p.clone()),
        ask_qty: best_ask.map(|(_, q)| q),
        bid_px: best_bid.as_ref().map(|(p, _)| p.clone()),
        bid_qty: best_bid.map(|(_, q)| q),
        secondary_ask_px: level(&depth.asks, 1).map(|(p, _)| p),
        secondary_bid_px: level(&depth.bids, 1).map(|(p, _)| p),
    }))
}

/// Decode a user-data event, keeping only events for `symbol`.
///
/// Events for other symbols and event types the engine does not consume
/// decode to `None`.
pub fn decode_account(text: &str, symbol: &str) -> FeedResult<Option<AccountEvent>> {
    let Some(payload) = unwrap_payload(text)? else {
        return Ok(None);
    };
    let event: UserEventWire = serde_json::from_value(payload)
        .map_err(|e| FeedError::ParseError(format!("user event: {e}")))?;

    match event {
        UserEventWire::OrderTradeUpdate { order } => {
            if order.symbol != symbol {
                return Ok(None);
            }
            Ok(Some(AccountEvent::OrderUpdate(OrderUpdate {
                order_id: OrderId::new(order.order_id),
                client_order_id: order.client_order_id,
                side: Side::from_exchange(&order.side)?,
                status: order.status.parse()?,
                price: parse_decimal(&order.price)?,
                quantity: parse_decimal(&order.quantity)?,
            })))
        }
        UserEventWire::AccountUpdate { account } => {
            let legs = account
                .positions
                .iter()
                .filter(|p| p.symbol == symbol)
                .map(|p| -> FeedResult<PositionLeg> {
                    Ok(PositionLeg::new(
                        PositionSide::from_exchange(&p.position_side)?,
                        parse_decimal(&p.amount)?,
                    ))
                })
                .collect::<FeedResult<Vec<_>>>()?;
            if legs.is_empty() {
                return Ok(None);
            }
            Ok(Some(AccountEvent::Position(legs)))
        }
        UserEventWire::ListenKeyExpired => Ok(Some(AccountEvent::ListenKeyExpired)),
        UserEventWire::Other => Ok(None),
    }
}

fn parse_decimal<T>(text: &str) -> FeedResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text.parse()
        .map_err(|e| FeedError::ParseError(format!("{text:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const DEPTH: &str = r#"{"e":"depthUpdate","E":1700000000000,"T":1700000000000,
        "s":"BTCUSDT","U":1,"u":2,"pu":0,
        "b":[["27000.10","1.500"],["27000.00","3.000"]],
        "a":[["27000.20","0.800"],["27000.30","2.000"]]}"#;

    #[test]
    fn test_decode_depth() {
        let raw = decode_market(DEPTH).unwrap().unwrap();
        assert_eq!(raw.bid_px.as_deref(), Some("27000.10"));
        assert_eq!(raw.bid_qty.as_deref(), Some("1.500"));
        assert_eq!(raw.ask_px.as_deref(), Some("27000.20"));
        assert_eq!(raw.ask_qty.as_deref(), Some("0.800"));
        assert_eq!(raw.secondary_bid_px.as_deref(), Some("27000.00"));
        assert_eq!(raw.secondary_ask_px.as_deref(), Some("27000.30"));
    }

    #[test]
    fn test_decode_combined_stream_envelope() {
        let text = format!(r#"{{"stream":"btcusdt@depth5@100ms","data":{DEPTH}}}"#);
        let raw = decode_market(&text).unwrap().unwrap();
        assert_eq!(raw.ask_px.as_deref(), Some("27000.20"));
    }

    #[test]
    fn test_subscription_ack_is_control_frame() {
        assert_eq!(decode_market(r#"{"result":null,"id":1}"#).unwrap(), None);
        assert!(decode_account(r#"{"result":null,"id":2}"#, "BTCUSDT")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_thin_book_leaves_fields_missing() {
        let raw = decode_market(r#"{"b":[["100","1"]],"a":[]}"#).unwrap().unwrap();
        assert_eq!(raw.bid_px.as_deref(), Some("100"));
        assert!(raw.secondary_bid_px.is_none());
        assert!(raw.ask_px.is_none());
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(decode_market("not json").is_err());
        assert!(decode_market(r#"{"b":"oops"}"#).is_err());
    }

    #[test]
    fn test_decode_order_trade_update() {
        let text = r#"{"e":"ORDER_TRADE_UPDATE","E":1,"T":1,"o":{"s":"BTCUSDT",
            "c":"qtr_1_abc","S":"SELL","o":"LIMIT","f":"GTC","q":"0.010","p":"27000.2",
            "ap":"0","x":"NEW","X":"NEW","i":8886774,"l":"0","z":"0","L":"0"}}"#;
        let event = decode_account(text, "BTCUSDT").unwrap().unwrap();
        let AccountEvent::OrderUpdate(update) = event else {
            panic!("expected order update");
        };
        assert_eq!(update.order_id, OrderId::new(8886774));
        assert_eq!(update.side, Side::Ask);
        assert_eq!(update.status, OrderStatus::New);
        assert_eq!(update.price, Price::new(dec!(27000.2)));
        assert_eq!(update.client_order_id, "qtr_1_abc");

        assert!(decode_account(text, "ETHUSDT").unwrap().is_none());
    }

    #[test]
    fn test_decode_account_update_position() {
        let text = r#"{"e":"ACCOUNT_UPDATE","E":1,"T":1,"a":{"m":"ORDER",
            "B":[{"a":"USDT","wb":"100","cw":"100","bc":"0"}],
            "P":[{"s":"BTCUSDT","pa":"-0.020","ep":"27000","cr":"0","up":"0","mt":"cross","iw":"0","ps":"BOTH"},
                 {"s":"ETHUSDT","pa":"1","ep":"1500","cr":"0","up":"0","mt":"cross","iw":"0","ps":"BOTH"}]}}"#;
        assert_eq!(
            decode_account(text, "BTCUSDT").unwrap(),
            Some(AccountEvent::Position(vec![PositionLeg::new(
                PositionSide::Both,
                Size::new(dec!(-0.02))
            )]))
        );

        let balance_only = r#"{"e":"ACCOUNT_UPDATE","a":{"m":"DEPOSIT","B":[],"P":[]}}"#;
        assert_eq!(decode_account(balance_only, "BTCUSDT").unwrap(), None);
    }

    #[test]
    fn test_decode_hedge_mode_single_leg() {
        let text = r#"{"e":"ACCOUNT_UPDATE","E":1,"T":1,"a":{"m":"ORDER","B":[],
            "P":[{"s":"BTCUSDT","pa":"-0.050","ep":"27000","cr":"0","up":"0","mt":"cross","iw":"0","ps":"SHORT"}]}}"#;
        assert_eq!(
            decode_account(text, "BTCUSDT").unwrap(),
            Some(AccountEvent::Position(vec![PositionLeg::new(
                PositionSide::Short,
                Size::new(dec!(-0.05))
            )]))
        );

        let bogus = text.replace("SHORT", "SIDEWAYS");
        assert!(decode_account(&bogus, "BTCUSDT").is_err());
    }

    #[test]
    fn test_listen_key_expired_and_unknown_events() {
        let expired = r#"{"e":"listenKeyExpired","E":1,"listenKey":"abc"}"#;
        assert_eq!(
            decode_account(expired, "BTCUSDT").unwrap(),
            Some(AccountEvent::ListenKeyExpired)
        );
        let margin = r#"{"e":"MARGIN_CALL","E":1,"cw":"3.16","p":[]}"#;
        assert_eq!(decode_account(margin, "BTCUSDT").unwrap(), None);
    }
}
