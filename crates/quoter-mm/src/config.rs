//! Strategy and engine configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use quoter_core::{Side, Size};

use crate::error::{EngineError, EngineResult};

/// One rung of a quote ladder: distance from the top price and order size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderRung {
    /// Signed offset added to the top price.
    pub offset: Decimal,
    /// Order quantity, used verbatim.
    pub size: Decimal,
}

impl LadderRung {
    pub fn new(offset: Decimal, size: Decimal) -> Self {
        Self { offset, size }
    }
}

/// Position bounds outside which a side stops quoting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLimits {
    /// Asks are only placed while the position is above this.
    pub short_limit: Decimal,
    /// Bids are only placed while the position is below this.
    pub long_limit: Decimal,
}

/// Ask and bid ladders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLadders {
    pub asks: Vec<LadderRung>,
    pub bids: Vec<LadderRung>,
}

impl QuoteLadders {
    pub fn rungs(&self, side: Side) -> &[LadderRung] {
        match side {
            Side::Ask => &self.asks,
            Side::Bid => &self.bids,
        }
    }
}

/// Strategy configuration. Loaded once and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Strategy name, used as the logging context.
    #[serde(default = "default_name")]
    pub name: String,
    pub inventory: InventoryLimits,
    pub quotes: QuoteLadders,
}

impl StrategyConfig {
    /// Fail fast on a configuration the engine cannot quote with.
    pub fn validate(&self) -> EngineResult<()> {
        let limits = &self.inventory;
        if limits.short_limit >= limits.long_limit {
            return Err(EngineError::InvalidConfig(format!(
                "short_limit ({}) must be below long_limit ({})",
                limits.short_limit, limits.long_limit
            )));
        }

        for side in Side::BOTH {
            let rungs = self.quotes.rungs(side);
            if rungs.is_empty() {
                return Err(EngineError::InvalidConfig(format!("{side} ladder is empty")));
            }
            for (idx, rung) in rungs.iter().enumerate() {
                if !Size::new(rung.size).is_positive() {
                    return Err(EngineError::InvalidConfig(format!(
                        "{side} rung {idx}: size must be positive, got {}",
                        rung.size
                    )));
                }
                let wrong_way = match side {
                    Side::Ask => rung.offset.is_sign_negative() && !rung.offset.is_zero(),
                    Side::Bid => rung.offset.is_sign_positive() && !rung.offset.is_zero(),
                };
                if wrong_way {
                    return Err(EngineError::InvalidConfig(format!(
                        "{side} rung {idx}: offset {} crosses the top price",
                        rung.offset
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Engine timing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Period of the background reconcile.
    #[serde(default = "default_reconcile_interval_ms")]
    pub reconcile_interval_ms: u64,

    /// Upper bound on any single gateway call.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_ms: default_reconcile_interval_ms(),
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}

fn default_name() -> String {
    "default".to_string()
}

fn default_reconcile_interval_ms() -> u64 {
    1000
}

fn default_call_timeout_ms() -> u64 {
    5000
}
