//! Inventory gating.
//!
//! A side only quotes while adding to it keeps the position inside the
//! configured limits. Comparisons are strict: sitting exactly on a limit
//! disables the side that would push further out.

use quoter_core::{Side, Size};

use crate::config::InventoryLimits;

/// Per-side permission to quote, derived from the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryGate {
    pub should_ask: bool,
    pub should_bid: bool,
}

impl Default for InventoryGate {
    fn default() -> Self {
        Self {
            should_ask: true,
            should_bid: true,
        }
    }
}

impl InventoryGate {
    /// Gate for both sides at the given position.
    pub fn evaluate(position: Size, limits: &InventoryLimits) -> Self {
        Self {
            should_ask: Self::allows(Side::Ask, position, limits),
            should_bid: Self::allows(Side::Bid, position, limits),
        }
    }

    /// `position > short_limit` for asks, `position < long_limit` for bids.
    pub fn allows(side: Side, position: Size, limits: &InventoryLimits) -> bool {
        match side {
            Side::Ask => position.inner() > limits.short_limit,
            Side::Bid => position.inner() < limits.long_limit,
        }
    }

    pub fn get(&self, side: Side) -> bool {
        match side {
            Side::Ask => self.should_ask,
            Side::Bid => self.should_bid,
        }
    }

    pub fn set(&mut self, side: Side, allowed: bool) {
        match side {
            Side::Ask => self.should_ask = allowed,
            Side::Bid => self.should_bid = allowed,
        }
    }
}
