//! Core domain types for the quoter market maker.
//!
//! This crate provides the value types shared by the engine, the exchange
//! gateway and the feed decoders:
//! - `Price`, `Size`: Precision-safe numeric types
//! - `Side`, `OrderStatus`, `TimeInForce`, `OrderType`: Trading enums
//! - `PositionLeg`: signed amount per position side (one-way or hedge mode)
//! - `MarketSnapshot`: Top two levels of the book, validated at the boundary
//! - `RestingOrder`, `OrderParams`: Orders we track and orders we submit

pub mod decimal;
pub mod error;
pub mod order;
pub mod types;

pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use order::{
    ClientOrderId, OrderId, OrderParams, OrderStatus, OrderType, PositionLeg, PositionSide,
    RestingOrder, Side, TimeInForce,
};
pub use types::{MarketSnapshot, RawSnapshot};
