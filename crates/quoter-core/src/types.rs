//! Market data types.
//!
//! `RawSnapshot` is what a feed decoder hands over: every field optional and
//! still in wire text. `MarketSnapshot` is the validated value the engine
//! works with; it can only be built with all six fields present and finite.

use crate::error::CoreError;
use crate::{Price, Side, Size};
use serde::{Deserialize, Serialize};

/// Top two levels of the book as delivered by the feed, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSnapshot {
    pub ask_px: Option<String>,
    pub ask_qty: Option<String>,
    pub bid_px: Option<String>,
    pub bid_qty: Option<String>,
    pub secondary_ask_px: Option<String>,
    pub secondary_bid_px: Option<String>,
}

/// Validated top-of-book snapshot.
///
/// Replaced wholesale on each market event. Equality is structural and is
/// what the engine uses to detect a no-op update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ask_px: Price,
    pub ask_qty: Size,
    pub bid_px: Price,
    pub bid_qty: Size,
    pub secondary_ask_px: Price,
    pub secondary_bid_px: Price,
}

impl MarketSnapshot {
    pub fn new(
        ask_px: Price,
        ask_qty: Size,
        bid_px: Price,
        bid_qty: Size,
        secondary_ask_px: Price,
        secondary_bid_px: Price,
    ) -> Self {
        Self {
            ask_px,
            ask_qty,
            bid_px,
            bid_qty,
            secondary_ask_px,
            secondary_bid_px,
        }
    }

    /// Best price on a side.
    pub fn top_price(&self, side: Side) -> Price {
        match side {
            Side::Ask => self.ask_px,
            Side::Bid => self.bid_px,
        }
    }

    /// Quantity available at the best price on a side.
    pub fn top_qty(&self, side: Side) -> Size {
        match side {
            Side::Ask => self.ask_qty,
            Side::Bid => self.bid_qty,
        }
    }

    /// Second-best price on a side.
    pub fn secondary_price(&self, side: Side) -> Price {
        match side {
            Side::Ask => self.secondary_ask_px,
            Side::Bid => self.secondary_bid_px,
        }
    }
}

fn required<T>(field: &'static str, value: Option<&str>) -> Result<T, CoreError>
where
    T: std::str::FromStr<Err = rust_decimal::Error>,
{
    let text = value.ok_or_else(|| CoreError::MalformedSnapshot(format!("{field} missing")))?;
    text.parse::<T>()
        .map_err(|e| CoreError::MalformedSnapshot(format!("{field}={text:?}: {e}")))
}

impl TryFrom<&RawSnapshot> for MarketSnapshot {
    type Error = CoreError;

    fn try_from(raw: &RawSnapshot) -> Result<Self, Self::Error> {
        let snapshot = Self {
            ask_px: required("ask_px", raw.ask_px.as_deref())?,
            ask_qty: required("ask_qty", raw.ask_qty.as_deref())?,
            bid_px: required("bid_px", raw.bid_px.as_deref())?,
            bid_qty: required("bid_qty", raw.bid_qty.as_deref())?,
            secondary_ask_px: required("secondary_ask_px", raw.secondary_ask_px.as_deref())?,
            secondary_bid_px: required("secondary_bid_px", raw.secondary_bid_px.as_deref())?,
        };

        if !snapshot.ask_px.is_positive() || !snapshot.bid_px.is_positive() {
            return Err(CoreError::MalformedSnapshot(format!(
                "non-positive top price: ask={} bid={}",
                snapshot.ask_px, snapshot.bid_px
            )));
        }
        if snapshot.ask_qty.inner().is_sign_negative() || snapshot.bid_qty.inner().is_sign_negative()
        {
            return Err(CoreError::MalformedSnapshot(format!(
                "negative top quantity: ask={} bid={}",
                snapshot.ask_qty, snapshot.bid_qty
            )));
        }

        Ok(snapshot)
    }
}

impl TryFrom<RawSnapshot> for MarketSnapshot {
    type Error = CoreError;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        Self::try_from(&raw)
    }
}

impl From<&MarketSnapshot> for RawSnapshot {
    fn from(s: &MarketSnapshot) -> Self {
        Self {
            ask_px: Some(s.ask_px.to_string()),
            ask_qty: Some(s.ask_qty.to_string()),
            bid_px: Some(s.bid_px.to_string()),
            bid_qty: Some(s.bid_qty.to_string()),
            secondary_ask_px: Some(s.secondary_ask_px.to_string()),
            secondary_bid_px: Some(s.secondary_bid_px.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw() -> RawSnapshot {
        RawSnapshot {
            ask_px: Some("100.5".to_string()),
            ask_qty: Some("3".to_string()),
            bid_px: Some("100.4".to_string()),
            bid_qty: Some("2.5".to_string()),
            secondary_ask_px: Some("100.6".to_string()),
            secondary_bid_px: Some("100.3".to_string()),
        }
    }

    #[test]
    fn test_valid_raw_snapshot() {
        let snap = MarketSnapshot::try_from(raw()).unwrap();
        assert_eq!(snap.ask_px, Price::new(dec!(100.5)));
        assert_eq!(snap.bid_qty, Size::new(dec!(2.5)));
        assert_eq!(snap.top_price(Side::Bid), Price::new(dec!(100.4)));
        assert_eq!(snap.top_qty(Side::Ask), Size::new(dec!(3)));
        assert_eq!(snap.secondary_price(Side::Ask), Price::new(dec!(100.6)));
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut r = raw();
        r.secondary_bid_px = None;
        let err = MarketSnapshot::try_from(r).unwrap_err();
        assert!(err.to_string().contains("secondary_bid_px missing"));
    }

    #[test]
    fn test_nan_field_rejected() {
        let mut r = raw();
        r.ask_qty = Some("NaN".to_string());
        assert!(matches!(
            MarketSnapshot::try_from(r),
            Err(CoreError::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn test_zero_top_price_rejected() {
        let mut r = raw();
        r.bid_px = Some("0".to_string());
        assert!(MarketSnapshot::try_from(r).is_err());
    }

    #[test]
    fn test_structural_equality() {
        let a = MarketSnapshot::try_from(raw()).unwrap();
        let b = MarketSnapshot::try_from(RawSnapshot::from(&a)).unwrap();
        assert_eq!(a, b);

        let mut r = raw();
        r.bid_qty = Some("2.6".to_string());
        let c = MarketSnapshot::try_from(r).unwrap();
        assert_ne!(a, c);
    }
}
