//! Exchange gateway for the quoter market maker.
//!
//! The engine only talks to the exchange through [`ExchangeGateway`]:
//! - list open orders / get position (ground truth for reconciliation)
//! - cancel batch / submit batch (best effort, per-item results)
//! - listen key management for the account stream
//!
//! [`BinanceGateway`] implements it against the Binance USD-M futures REST
//! API; [`MockGateway`] is an in-memory exchange used by tests.

pub mod binance;
pub mod error;
pub mod gateway;
pub mod mock;

pub use binance::{BinanceConfig, BinanceGateway};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{BoxFuture, DynGateway, ExchangeGateway, ItemResult};
pub use mock::{GatewayCall, MockGateway};
