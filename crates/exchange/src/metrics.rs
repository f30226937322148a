//! Process-wide counters published alongside each `OrderBook`'s own
//! counters, in the donor's `ServerMetrics` style: plain atomics read by
//! `observability::metrics` and republished as `metrics` gauges.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ExchangeMetrics {
    pub orders_accepted: AtomicU64,
    pub orders_rejected: AtomicU64,
    pub cancels_accepted: AtomicU64,
    pub cancels_rejected: AtomicU64,
    pub trades_executed: AtomicU64,
}

impl ExchangeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_order_accepted(&self) {
        self.orders_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_order_rejected(&self) {
        self.orders_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancel_accepted(&self) {
        self.cancels_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancel_rejected(&self) {
        self.cancels_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_trade_executed(&self) {
        self.trades_executed.fetch_add(1, Ordering::Relaxed);
    }
}
