//! Net position from per-leg account updates.
//!
//! Hedge-mode `ACCOUNT_UPDATE` events only carry the legs that changed, so
//! the net position is the sum over the last known amount of every leg.
//! One-way accounts only ever report the `Both` leg.

use std::collections::HashMap;

use quoter_core::{PositionLeg, PositionSide, Size};

/// Last known amount per position leg.
#[derive(Debug, Clone, Default)]
pub struct PositionLegs {
    legs: HashMap<PositionSide, Size>,
}

impl PositionLegs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every leg with a full listing (e.g. from `positionRisk`).
    pub fn seed(&mut self, legs: &[PositionLeg]) -> Size {
        self.legs.clear();
        self.apply(legs)
    }

    /// Overwrite the legs present in `legs`, keep the others, return the net.
    pub fn apply(&mut self, legs: &[PositionLeg]) -> Size {
        for leg in legs {
            self.legs.insert(leg.side, leg.amount);
        }
        self.net()
    }

    /// Signed net position across all known legs.
    pub fn net(&self) -> Size {
        self.legs.values().fold(Size::ZERO, |acc, amount| acc + *amount)
    }
}
