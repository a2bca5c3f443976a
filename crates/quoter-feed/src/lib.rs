//! Stream handling for the quoter market maker.
//!
//! - [`parser`]: decodes partial-depth and user-data payloads
//! - [`position`]: folds per-leg position updates into a net position
//! - [`stream`]: WebSocket runner with reconnection and exponential backoff

pub mod error;
pub mod parser;
pub mod position;
pub mod stream;

pub use error::{FeedError, FeedResult};
pub use parser::{decode_account, decode_market, AccountEvent, OrderUpdate};
pub use position::PositionLegs;
pub use stream::{StreamConfig, StreamRunner};
