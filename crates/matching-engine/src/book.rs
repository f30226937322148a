//! Per-instrument order book: matching algorithm, cancellation, and the
//! invariants that make replay deterministic.
//!
//! The book has no I/O and cannot fail on valid input; its contract is a
//! pure function `(state, order) -> (state, trades)`. Callers (the
//! `exchange` crate) are responsible for field-level request validation
//! before calling `submit`. Violating a documented invariant here is a
//! programming error, not a recoverable condition, and is caught by
//! `debug_assert!` rather than returned as an error.

use std::collections::HashMap;

use common::{Order, OrderSide, OrderType, Trade};

use crate::metrics::OrderBookMetrics;
use crate::price_heap::{AskHeap, BidHeap};
use crate::price_level::{live_lookup, PriceLevel};

/// Matching state for one instrument: two side books plus the order-id
/// map that owns every resting `Order`.
pub struct OrderBook {
    instrument_id: u64,
    bid_heap: BidHeap,
    ask_heap: AskHeap,
    bid_levels: HashMap<u64, PriceLevel>,
    ask_levels: HashMap<u64, PriceLevel>,
    orders: HashMap<u64, Order>,
    metrics: OrderBookMetrics,
}

impl OrderBook {
    pub fn new(instrument_id: u64) -> Self {
        Self {
            instrument_id,
            bid_heap: BidHeap::new(),
            ask_heap: AskHeap::new(),
            bid_levels: HashMap::new(),
            ask_levels: HashMap::new(),
            orders: HashMap::new(),
            metrics: OrderBookMetrics::default(),
        }
    }

    pub fn instrument_id(&self) -> u64 {
        self.instrument_id
    }

    /// Per-book counters, republished by `exchange` alongside its own
    /// process-wide counters.
    pub fn metrics(&self) -> &OrderBookMetrics {
        &self.metrics
    }

    /// Submits an order for matching. Returns the order with its final
    /// `filled_quantity`/`cancelled` state, the trades produced in
    /// execution order, and a snapshot of every maker order touched along
    /// the way — taken *before* a fully-filled maker is dropped from the
    /// book, so the caller can journal its final state even though
    /// `get_order` can no longer find it afterward. A maker appears at
    /// most once per call: a partial maker fill means the taker was fully
    /// filled and the loop terminated.
    ///
    /// `order` must already satisfy the contract in `spec.md` §4.3:
    /// `quantity > 0`, `price_cents == 0` for MARKET, `price_cents >= 0`
    /// for GTC/IOC. The caller (`exchange`) enforces this before the book
    /// ever sees the order.
    pub fn submit(&mut self, mut order: Order) -> (Order, Vec<Trade>, Vec<Order>) {
        debug_assert!(order.quantity > 0, "order quantity must be positive");
        debug_assert!(
            order.order_type != OrderType::Market || order.price_cents == 0,
            "MARKET orders must carry price_cents == 0"
        );

        self.metrics.orders_submitted.increment();
        let mut trades = Vec::new();
        let mut maker_updates = Vec::new();

        loop {
            if order.remaining_quantity() == 0 {
                break;
            }

            let crosses = match order.order_type {
                OrderType::Market => true,
                OrderType::Gtc | OrderType::Ioc => match order.side {
                    OrderSide::Buy => self
                        .best_ask()
                        .is_some_and(|ask| ask <= order.price_cents),
                    OrderSide::Sell => self
                        .best_bid()
                        .is_some_and(|bid| bid >= order.price_cents),
                },
            };

            if !crosses {
                break;
            }

            let opposite_price = match order.side {
                OrderSide::Buy => self.best_ask(),
                OrderSide::Sell => self.best_bid(),
            };

            let Some(price) = opposite_price else {
                break;
            };

            let maker_order_id = {
                let levels = match order.side {
                    OrderSide::Buy => &mut self.ask_levels,
                    OrderSide::Sell => &mut self.bid_levels,
                };
                let Some(level) = levels.get_mut(&price) else {
                    break;
                };
                level.peek_live(live_lookup(&self.orders))
            };

            let Some(maker_order_id) = maker_order_id else {
                break;
            };

            let trade_quantity = {
                let maker = self.orders.get(&maker_order_id).expect(
                    "order id produced by a live price level must exist in the order map",
                );
                order.remaining_quantity().min(maker.remaining_quantity())
            };

            let maker_snapshot = {
                let maker = self.orders.get_mut(&maker_order_id).unwrap();
                maker.filled_quantity += trade_quantity;
                maker.clone()
            };
            order.filled_quantity += trade_quantity;

            let maker_is_buyer = maker_snapshot.side.is_buy();
            let maker_remaining = maker_snapshot.remaining_quantity();
            let maker_party_id = maker_snapshot.party_id.clone();

            trades.push(Trade {
                instrument_id: self.instrument_id,
                price_cents: price,
                quantity: trade_quantity,
                timestamp: order.timestamp,
                maker_order_id,
                maker_party_id,
                taker_order_id: order.order_id,
                taker_party_id: order.party_id.clone(),
                maker_is_buyer,
                maker_quantity_remaining: maker_remaining,
                taker_quantity_remaining: order.remaining_quantity(),
            });
            self.metrics.trades_executed.increment();
            maker_updates.push(maker_snapshot);

            if maker_remaining == 0 {
                self.orders.remove(&maker_order_id);
                let levels = match order.side {
                    OrderSide::Buy => &mut self.ask_levels,
                    OrderSide::Sell => &mut self.bid_levels,
                };
                if let Some(level) = levels.get_mut(&price) {
                    level.pop_front();
                }
            }
        }

        match order.order_type {
            OrderType::Market => {
                if order.remaining_quantity() > 0 {
                    order.cancelled = true;
                }
            }
            OrderType::Ioc => {
                if order.remaining_quantity() > 0 {
                    order.cancelled = true;
                }
            }
            OrderType::Gtc => {
                if order.remaining_quantity() > 0 {
                    self.rest(order.clone());
                }
            }
        }

        debug_assert!(
            order.filled_quantity <= order.quantity,
            "filled quantity must never exceed submitted quantity"
        );
        debug_assert!(
            match (self.best_bid(), self.best_ask()) {
                (Some(bid), Some(ask)) => bid < ask,
                _ => true,
            },
            "book must not be crossed after matching"
        );

        (order, trades, maker_updates)
    }

    /// Reinserts a previously-resting order exactly as journaled, without
    /// running the matching loop. Used only by cold-start rebuild: the
    /// journal already reflects each order's final `filled_quantity` as
    /// of the crash, so replaying it through `submit` would double-fill
    /// against orders that are themselves being replayed.
    pub fn restore(&mut self, order: Order) {
        debug_assert!(order.is_live(), "rebuild must only restore live orders");
        self.rest(order);
    }

    /// Inserts a GTC residue into the book: creates the level if absent,
    /// appends to it, pushes the price onto the heap, and registers the
    /// order in the id map.
    fn rest(&mut self, order: Order) {
        let (levels, heap_push): (&mut HashMap<u64, PriceLevel>, _) = match order.side {
            OrderSide::Buy => (&mut self.bid_levels, true),
            OrderSide::Sell => (&mut self.ask_levels, false),
        };
        let price = order.price_cents;
        let order_id = order.order_id;

        let level = levels.entry(price).or_default();
        level.append(order_id);

        if heap_push {
            self.bid_heap.push(price);
        } else {
            self.ask_heap.push(price);
        }

        self.orders.insert(order_id, order);
    }

    /// Cancels a resting order. Returns `false` (idempotent failure) if
    /// the order is unknown, already filled, or already cancelled.
    pub fn cancel(&mut self, order_id: u64) -> bool {
        let Some(order) = self.orders.get_mut(&order_id) else {
            return false;
        };
        if order.cancelled || order.remaining_quantity() == 0 {
            return false;
        }
        order.cancelled = true;
        self.orders.remove(&order_id);
        self.metrics.orders_cancelled.increment();
        true
    }

    /// Looks up a live order by id without mutating book state.
    pub fn get_order(&self, order_id: u64) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// Returns an immutable snapshot of every currently resting order,
    /// in no particular order. Used by `cancel_all_for_party`.
    pub fn live_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Best (highest) live bid price, lazily discarding stale heap entries.
    pub fn best_bid(&mut self) -> Option<u64> {
        loop {
            let price = self.bid_heap.peek()?;
            match self.bid_levels.get_mut(&price) {
                Some(level) if !level.is_empty_live(live_lookup(&self.orders)) => {
                    return Some(price);
                }
                _ => {
                    self.bid_heap.pop();
                }
            }
        }
    }

    /// Best (lowest) live ask price, lazily discarding stale heap entries.
    pub fn best_ask(&mut self) -> Option<u64> {
        loop {
            let price = self.ask_heap.peek()?;
            match self.ask_levels.get_mut(&price) {
                Some(level) if !level.is_empty_live(live_lookup(&self.orders)) => {
                    return Some(price);
                }
                _ => {
                    self.ask_heap.pop();
                }
            }
        }
    }
}
