//! Ladder market-making bot.
//!
//! Wires the quote engine to its three event sources:
//! - partial-depth market stream
//! - user-data stream (position and order updates)
//! - periodic reconcile timer

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::{AppConfig, Credentials};
pub use error::{AppError, AppResult};
