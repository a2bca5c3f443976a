//! Cached view of our own resting orders.
//!
//! Tolerant of staleness: entries may have filled or been cancelled on the
//! exchange since they were recorded. Reconciliation replaces the view
//! wholesale with what the exchange reports.

use quoter_core::{OrderId, RestingOrder, Side};

/// Our resting orders, split by side and kept in exchange order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBookView {
    asks: Vec<RestingOrder>,
    bids: Vec<RestingOrder>,
}

impl OrderBookView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a view from an order listing, dropping terminal orders.
    pub fn from_orders(orders: impl IntoIterator<Item = RestingOrder>) -> Self {
        let mut view = Self::new();
        for order in orders {
            view.insert(order);
        }
        view
    }

    /// Track an order; terminal orders are ignored.
    pub fn insert(&mut self, order: RestingOrder) {
        if order.status.is_terminal() {
            return;
        }
        self.side_mut(order.side).push(order);
    }

    pub fn side(&self, side: Side) -> &[RestingOrder] {
        match side {
            Side::Ask => &self.asks,
            Side::Bid => &self.bids,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Vec<RestingOrder> {
        match side {
            Side::Ask => &mut self.asks,
            Side::Bid => &mut self.bids,
        }
    }

    /// Ids of every order on a side.
    pub fn ids(&self, side: Side) -> Vec<OrderId> {
        self.side(side).iter().map(|o| o.id).collect()
    }

    /// Drop every order on a side, returning their ids.
    pub fn clear_side(&mut self, side: Side) -> Vec<OrderId> {
        self.side_mut(side).drain(..).map(|o| o.id).collect()
    }

    /// Remove orders on a side matching `pred`, returning their ids.
    pub fn remove_where<F>(&mut self, side: Side, mut pred: F) -> Vec<OrderId>
    where
        F: FnMut(&RestingOrder) -> bool,
    {
        let orders = self.side_mut(side);
        let mut removed = Vec::new();
        orders.retain(|o| {
            if pred(o) {
                removed.push(o.id);
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.asks.iter().chain(&self.bids).any(|o| o.id == id)
    }

    pub fn len(&self) -> usize {
        self.asks.len() + self.bids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() && self.bids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quoter_core::{OrderStatus, Price, Size};
    use rust_decimal_macros::dec;

    fn order(id: u64, side: Side, px: rust_decimal::Decimal, status: OrderStatus) -> RestingOrder {
        RestingOrder::new(
            OrderId::new(id),
            side,
            Price::new(px),
            Size::new(dec!(1)),
            status,
        )
    }

    #[test]
    fn test_from_orders_partitions_and_filters() {
        let view = OrderBookView::from_orders(vec![
            order(1, Side::Ask, dec!(101), OrderStatus::New),
            order(2, Side::Bid, dec!(99), OrderStatus::PartiallyFilled),
            order(3, Side::Ask, dec!(102), OrderStatus::Filled),
            order(4, Side::Bid, dec!(98), OrderStatus::Canceled),
            order(5, Side::Ask, dec!(103), OrderStatus::New),
        ]);
        assert_eq!(view.ids(Side::Ask), vec![OrderId::new(1), OrderId::new(5)]);
        assert_eq!(view.ids(Side::Bid), vec![OrderId::new(2)]);
        assert_eq!(view.len(), 3);
        assert!(!view.contains(OrderId::new(3)));
    }

    #[test]
    fn test_clear_side_leaves_other_side() {
        let mut view = OrderBookView::from_orders(vec![
            order(1, Side::Ask, dec!(101), OrderStatus::New),
            order(2, Side::Bid, dec!(99), OrderStatus::New),
        ]);
        assert_eq!(view.clear_side(Side::Ask), vec![OrderId::new(1)]);
        assert!(view.side(Side::Ask).is_empty());
        assert_eq!(view.side(Side::Bid).len(), 1);
    }

    #[test]
    fn test_remove_where() {
        let mut view = OrderBookView::from_orders(vec![
            order(1, Side::Bid, dec!(99), OrderStatus::New),
            order(2, Side::Bid, dec!(98), OrderStatus::New),
        ]);
        let removed = view.remove_where(Side::Bid, |o| o.price == Price::new(dec!(99)));
        assert_eq!(removed, vec![OrderId::new(1)]);
        assert_eq!(view.ids(Side::Bid), vec![OrderId::new(2)]);
    }
}
