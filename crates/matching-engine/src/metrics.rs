//! In-process counters for the matching engine.
//!
//! Kept as plain atomics rather than routed through the `metrics` crate
//! here: the matching engine itself has no async runtime dependency and
//! is meant to stay embeddable. `exchange` reads these through
//! `OrderBookMetrics::snapshot` and republishes them as `metrics` gauges
//! alongside its own counters.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Counters for a single `OrderBook`.
#[derive(Debug, Default)]
pub struct OrderBookMetrics {
    pub orders_submitted: Counter,
    pub orders_cancelled: Counter,
    pub trades_executed: Counter,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct OrderBookMetricsSnapshot {
    pub orders_submitted: u64,
    pub orders_cancelled: u64,
    pub trades_executed: u64,
}

impl OrderBookMetrics {
    pub fn snapshot(&self) -> OrderBookMetricsSnapshot {
        OrderBookMetricsSnapshot {
            orders_submitted: self.orders_submitted.get(),
            orders_cancelled: self.orders_cancelled.get(),
            trades_executed: self.trades_executed.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_accumulates() {
        let counter = Counter::new();
        counter.increment();
        counter.increment_by(4);
        assert_eq!(counter.get(), 5);
    }
}
