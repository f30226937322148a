//! FIFO queue of resting order ids at a single price.
//!
//! A `PriceLevel` does not own `Order`s; it holds `order_id`s and the
//! `OrderBook`'s `order_id -> Order` map is the sole owner. This lets
//! cancellation mark an order dead in O(1) without touching the level:
//! the level discards dead heads lazily the next time it is peeked.

use std::collections::VecDeque;

use common::Order;

/// FIFO queue of order ids resting at one price.
#[derive(Debug, Default)]
pub struct PriceLevel {
    orders: VecDeque<u64>,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
        }
    }

    /// Adds an order id to the tail. O(1).
    pub fn append(&mut self, order_id: u64) {
        self.orders.push_back(order_id);
    }

    /// Returns the id of the first live order, discarding dead heads as it
    /// goes. `is_live` is supplied by the caller because liveness is a
    /// property of the `Order`, which this level does not own.
    pub fn peek_live(&mut self, is_live: impl Fn(u64) -> bool) -> Option<u64> {
        while let Some(&front) = self.orders.front() {
            if is_live(front) {
                return Some(front);
            }
            self.orders.pop_front();
        }
        None
    }

    /// Removes the current front unconditionally.
    pub fn pop_front(&mut self) -> Option<u64> {
        self.orders.pop_front()
    }

    /// True iff no live order remains at this level.
    pub fn is_empty_live(&mut self, is_live: impl Fn(u64) -> bool) -> bool {
        self.peek_live(is_live).is_none()
    }
}

/// Convenience bound so callers can pass `&HashMap<u64, Order>` directly.
pub fn live_lookup<'a>(
    orders: &'a std::collections::HashMap<u64, Order>,
) -> impl Fn(u64) -> bool + 'a {
    move |order_id| orders.get(&order_id).is_some_and(Order::is_live)
}
