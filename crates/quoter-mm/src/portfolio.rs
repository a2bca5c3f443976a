//! Portfolio aggregate and quote planning.
//!
//! `Portfolio` owns everything the engine decides from: config, last market
//! snapshot, our resting orders, position and the derived inventory gate.
//! Planning is pure state manipulation; gateway calls happen in the engine.

use quoter_core::{MarketSnapshot, OrderId, OrderParams, RestingOrder, Side, Size};
use tracing::{debug, warn};

use crate::book::OrderBookView;
use crate::config::StrategyConfig;
use crate::inventory::InventoryGate;
use crate::ladder::build_ladder;

/// Orders to cancel and submit for one market update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuotePlan {
    /// Ids from both sides, asks first.
    pub cancels: Vec<OrderId>,
    /// New orders from both sides, asks first.
    pub submits: Vec<OrderParams>,
}

impl QuotePlan {
    pub fn is_empty(&self) -> bool {
        self.cancels.is_empty() && self.submits.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Portfolio {
    config: StrategyConfig,
    snapshot: Option<MarketSnapshot>,
    book: OrderBookView,
    position: Size,
    gate: InventoryGate,
}

impl Portfolio {
    /// Build from config plus the initial exchange state.
    pub fn new(config: StrategyConfig, position: Size, open_orders: Vec<RestingOrder>) -> Self {
        let gate = InventoryGate::evaluate(position, &config.inventory);
        Self {
            config,
            snapshot: None,
            book: OrderBookView::from_orders(open_orders),
            position,
            gate,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Option<&MarketSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn book(&self) -> &OrderBookView {
        &self.book
    }

    pub fn position(&self) -> Size {
        self.position
    }

    pub fn gate(&self) -> InventoryGate {
        self.gate
    }

    pub fn set_position(&mut self, position: Size) {
        self.position = position;
    }

    /// Replace the view with an exchange listing.
    pub fn replace_orders(&mut self, orders: Vec<RestingOrder>) {
        self.book = OrderBookView::from_orders(orders);
    }

    /// Track orders the exchange accepted until the next listing replaces them.
    pub fn record_submitted(&mut self, accepted: Vec<RestingOrder>) {
        for order in accepted {
            self.book.insert(order);
        }
    }

    /// Decide what to cancel and submit for a new snapshot.
    ///
    /// Returns `None` when the snapshot equals the stored one. Otherwise the
    /// view is updated as if every planned action succeeds and the snapshot is
    /// stored.
    pub fn plan_update(&mut self, snapshot: MarketSnapshot) -> Option<QuotePlan> {
        if self.snapshot.as_ref() == Some(&snapshot) {
            return None;
        }

        let mut plan = QuotePlan::default();
        for side in Side::BOTH {
            let top = snapshot.top_price(side);
            let repriced = self
                .snapshot
                .map_or(true, |prev| prev.top_price(side) != top);

            if repriced {
                plan.cancels.extend(self.book.clear_side(side));
                plan.submits.extend(self.requote_side(side, &snapshot));
            } else {
                plan.cancels.extend(self.retreat_side(side, &snapshot));
            }
        }

        self.snapshot = Some(snapshot);
        Some(plan)
    }

    fn requote_side(&mut self, side: Side, snapshot: &MarketSnapshot) -> Vec<OrderParams> {
        let allowed = InventoryGate::allows(side, self.position, &self.config.inventory);
        self.gate.set(side, allowed);

        if !allowed {
            let limits = &self.config.inventory;
            match side {
                Side::Ask => warn!(
                    portfolio = %self.config.name,
                    position = %self.position,
                    short_limit = %limits.short_limit,
                    "not asking"
                ),
                Side::Bid => warn!(
                    portfolio = %self.config.name,
                    position = %self.position,
                    long_limit = %limits.long_limit,
                    "not bidding"
                ),
            }
        }

        let top = snapshot.top_price(side);
        let orders = build_ladder(side, self.config.quotes.rungs(side), top, allowed);
        debug!(
            portfolio = %self.config.name,
            side = %side,
            top = %top,
            count = orders.len(),
            "Repricing side"
        );
        orders
    }

    /// Pull orders that would be the whole top level.
    ///
    /// An order resting at the top price with at least the displayed top
    /// quantity is the only liquidity there. Pulled orders are not replaced.
    fn retreat_side(&mut self, side: Side, snapshot: &MarketSnapshot) -> Vec<OrderId> {
        let top = snapshot.top_price(side);
        let top_qty = snapshot.top_qty(side);
        let pulled = self
            .book
            .remove_where(side, |o| o.price == top && o.quantity >= top_qty);
        if !pulled.is_empty() {
            debug!(
                portfolio = %self.config.name,
                side = %side,
                top = %top,
                top_qty = %top_qty,
                count = pulled.len(),
                "Sole provider at top, pulling"
            );
        }
        pulled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InventoryLimits, LadderRung, QuoteLadders};
    use quoter_core::{OrderStatus, Price};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn config() -> StrategyConfig {
        StrategyConfig {
            name: "test".to_string(),
            inventory: InventoryLimits {
                short_limit: dec!(-1),
                long_limit: dec!(1),
            },
            quotes: QuoteLadders {
                asks: vec![
                    LadderRung::new(dec!(0.1), dec!(1)),
                    LadderRung::new(dec!(0.2), dec!(1)),
                ],
                bids: vec![LadderRung::new(dec!(-0.1), dec!(1))],
            },
        }
    }

    fn snap(ask: Decimal, ask_qty: Decimal, bid: Decimal, bid_qty: Decimal) -> MarketSnapshot {
        MarketSnapshot::new(
            Price::new(ask),
            Size::new(ask_qty),
            Price::new(bid),
            Size::new(bid_qty),
            Price::new(ask + dec!(0.1)),
            Price::new(bid - dec!(0.1)),
        )
    }

    fn resting(id: u64, side: Side, px: Decimal, qty: Decimal) -> RestingOrder {
        RestingOrder::new(
            OrderId::new(id),
            side,
            Price::new(px),
            Size::new(qty),
            OrderStatus::New,
        )
    }

    #[test]
    fn test_first_snapshot_quotes_both_sides() {
        let mut p = Portfolio::new(config(), Size::ZERO, vec![]);
        let plan = p.plan_update(snap(dec!(100), dec!(3), dec!(99), dec!(3))).unwrap();
        assert!(plan.cancels.is_empty());
        let prices: Vec<_> = plan.submits.iter().map(|o| (o.side, o.price)).collect();
        assert_eq!(
            prices,
            vec![
                (Side::Ask, Price::new(dec!(100.1))),
                (Side::Ask, Price::new(dec!(100.2))),
                (Side::Bid, Price::new(dec!(98.9))),
            ]
        );
    }

    #[test]
    fn test_identical_snapshot_is_noop() {
        let mut p = Portfolio::new(config(), Size::ZERO, vec![]);
        let s = snap(dec!(100), dec!(3), dec!(99), dec!(3));
        assert!(p.plan_update(s).is_some());
        let before = p.book().clone();
        assert!(p.plan_update(s).is_none());
        assert_eq!(p.book(), &before);
    }

    #[test]
    fn test_reprice_cancels_only_changed_side() {
        let mut p = Portfolio::new(
            config(),
            Size::ZERO,
            vec![
                resting(1, Side::Ask, dec!(100.1), dec!(1)),
                resting(2, Side::Bid, dec!(98.9), dec!(1)),
            ],
        );
        p.plan_update(snap(dec!(100), dec!(3), dec!(99), dec!(3)));
        p.replace_orders(vec![
            resting(1, Side::Ask, dec!(100.1), dec!(1)),
            resting(2, Side::Bid, dec!(98.9), dec!(1)),
        ]);

        let plan = p.plan_update(snap(dec!(101), dec!(3), dec!(99), dec!(3))).unwrap();
        assert_eq!(plan.cancels, vec![OrderId::new(1)]);
        assert_eq!(plan.submits.len(), 2);
        assert!(plan.submits.iter().all(|o| o.side == Side::Ask));
        assert_eq!(plan.submits[0].price, Price::new(dec!(101.1)));
        assert!(p.book().side(Side::Ask).is_empty());
        assert_eq!(p.book().ids(Side::Bid), vec![OrderId::new(2)]);
    }

    #[test]
    fn test_sole_provider_retreat_is_pull_only() {
        let mut p = Portfolio::new(config(), Size::ZERO, vec![]);
        p.plan_update(snap(dec!(100), dec!(9), dec!(99), dec!(9)));
        p.replace_orders(vec![
            resting(7, Side::Bid, dec!(99), dec!(5)),
            resting(8, Side::Bid, dec!(98.9), dec!(5)),
        ]);

        // Market shows 6 at our price: someone else is there too.
        let plan = p.plan_update(snap(dec!(100), dec!(9), dec!(99), dec!(6))).unwrap();
        assert!(plan.is_empty());

        // Market shows exactly our 5: we are alone.
        let plan = p.plan_update(snap(dec!(100), dec!(9), dec!(99), dec!(5))).unwrap();
        assert_eq!(plan.cancels, vec![OrderId::new(7)]);
        assert!(plan.submits.is_empty());
        assert_eq!(p.book().ids(Side::Bid), vec![OrderId::new(8)]);
    }

    #[test]
    fn test_gated_side_submits_nothing() {
        let mut p = Portfolio::new(config(), Size::new(dec!(-1)), vec![]);
        let plan = p.plan_update(snap(dec!(100), dec!(3), dec!(99), dec!(3))).unwrap();
        assert!(plan.submits.iter().all(|o| o.side == Side::Bid));
        assert!(!p.gate().should_ask);
        assert!(p.gate().should_bid);
    }

    #[test]
    fn test_gate_recomputed_only_on_reprice() {
        let mut p = Portfolio::new(config(), Size::ZERO, vec![]);
        p.plan_update(snap(dec!(100), dec!(3), dec!(99), dec!(3)));
        p.set_position(dec!(2).into());
        assert!(p.gate().should_bid);

        // Bid top unchanged: gate untouched.
        p.plan_update(snap(dec!(100), dec!(4), dec!(99), dec!(3)));
        assert!(p.gate().should_bid);

        p.plan_update(snap(dec!(100), dec!(4), dec!(98), dec!(3)));
        assert!(!p.gate().should_bid);
    }

    #[test]
    fn test_both_sides_in_one_plan() {
        let mut p = Portfolio::new(config(), Size::ZERO, vec![]);
        p.plan_update(snap(dec!(100), dec!(3), dec!(99), dec!(3)));
        p.replace_orders(vec![
            resting(1, Side::Ask, dec!(100.1), dec!(1)),
            resting(2, Side::Bid, dec!(98.9), dec!(1)),
        ]);
        let plan = p.plan_update(snap(dec!(100.5), dec!(3), dec!(98.5), dec!(3))).unwrap();
        assert_eq!(plan.cancels, vec![OrderId::new(1), OrderId::new(2)]);
        assert_eq!(plan.submits.len(), 3);
    }
}
