//! Quote ladder construction.

use quoter_core::{OrderParams, Price, Side, Size};

use crate::config::LadderRung;

/// Orders for one side of the book, one per rung, in rung order.
///
/// Rung price is `top + offset`; rung quantity is the configured size. A
/// disabled side yields no orders.
pub fn build_ladder(side: Side, rungs: &[LadderRung], top: Price, enabled: bool) -> Vec<OrderParams> {
    if !enabled {
        return Vec::new();
    }
    rungs
        .iter()
        .map(|rung| OrderParams::limit(side, top.offset_by(rung.offset), Size::new(rung.size)))
        .collect()
}
