//! Ladder market making for a single instrument.
//!
//! Keeps a small ladder of resting limit orders on both sides of the book and
//! reconciles it against the exchange as the market and the position change.
//!
//! # Architecture
//!
//! ```text
//! depth stream ──► QuoteEngine.on_market_update()
//!                    ├─ Portfolio.plan_update(): reprice / retreat / gate
//!                    ├─ gateway.cancel_batch() + gateway.submit_batch()
//!                    └─ reconcile()
//! user stream  ──► QuoteEngine.on_position_update()
//! timer        ──► QuoteEngine.reconcile()  (open orders overwrite the view)
//! ```

pub mod book;
pub mod config;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod ladder;
pub mod portfolio;

pub use book::OrderBookView;
pub use config::{EngineConfig, InventoryLimits, LadderRung, QuoteLadders, StrategyConfig};
pub use engine::{ActionSummary, QuoteEngine, ReconcileReport, UpdateOutcome};
pub use error::{EngineError, EngineResult};
pub use inventory::InventoryGate;
pub use ladder::build_ladder;
pub use portfolio::{Portfolio, QuotePlan};
