//! Fan-out adaptor over an ordered list of writers.
//!
//! The first writer is the primary whose result is returned and whose
//! query methods (`iter_orders`, `list_instruments`) are authoritative.
//! Failures from secondary writers are logged and swallowed: a secondary
//! must never affect primary durability.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use common::{Instrument, Order, Trade};

use crate::error::StoreResult;
use crate::writer::Writer;

pub struct CompositeWriter {
    writers: Vec<Arc<dyn Writer>>,
}

impl CompositeWriter {
    /// `writers[0]` is the primary. Panics if `writers` is empty.
    pub fn new(writers: Vec<Arc<dyn Writer>>) -> Self {
        assert!(!writers.is_empty(), "CompositeWriter requires at least one writer");
        Self { writers }
    }

    fn primary(&self) -> &Arc<dyn Writer> {
        &self.writers[0]
    }

    fn secondaries(&self) -> &[Arc<dyn Writer>] {
        &self.writers[1..]
    }
}

macro_rules! dispatch_mut {
    ($self:ident, $method:ident ( $($arg:expr),* $(,)? )) => {{
        let result = $self.primary().$method($($arg.clone()),*).await;
        for writer in $self.secondaries() {
            if let Err(err) = writer.$method($($arg.clone()),*).await {
                error!(%err, writer = stringify!($method), "secondary writer failed, continuing");
            }
        }
        result
    }};
}

#[async_trait]
impl Writer for CompositeWriter {
    async fn create_instrument(&self, record: Instrument) -> StoreResult<()> {
        dispatch_mut!(self, create_instrument(record))
    }

    async fn record_order(&self, order: Order) -> StoreResult<()> {
        dispatch_mut!(self, record_order(order))
    }

    async fn record_trade(&self, trade: Trade) -> StoreResult<()> {
        dispatch_mut!(self, record_trade(trade))
    }

    async fn record_cancel(
        &self,
        instrument_id: u64,
        order_id: u64,
        party_id: String,
        timestamp: i64,
    ) -> StoreResult<()> {
        dispatch_mut!(self, record_cancel(instrument_id, order_id, party_id, timestamp))
    }

    async fn upsert_live_order(&self, order: Order) -> StoreResult<()> {
        dispatch_mut!(self, upsert_live_order(order))
    }

    async fn remove_live_order(&self, instrument_id: u64, order_id: u64) -> StoreResult<()> {
        dispatch_mut!(self, remove_live_order(instrument_id, order_id))
    }

    async fn update_order_quantity(
        &self,
        instrument_id: u64,
        order_id: u64,
        filled_quantity: u64,
        remaining_quantity: u64,
    ) -> StoreResult<()> {
        dispatch_mut!(
            self,
            update_order_quantity(instrument_id, order_id, filled_quantity, remaining_quantity)
        )
    }

    async fn iter_orders(&self, instrument_id: u64) -> StoreResult<Vec<Order>> {
        self.primary().iter_orders(instrument_id).await
    }

    async fn list_instruments(&self) -> StoreResult<Vec<Instrument>> {
        self.primary().list_instruments().await
    }

    async fn list_live_orders(&self, instrument_id: u64) -> StoreResult<Vec<Order>> {
        self.primary().list_live_orders(instrument_id).await
    }

    async fn list_trades(&self, instrument_id: u64) -> StoreResult<Vec<Trade>> {
        self.primary().list_trades(instrument_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use common::{OrderSide, OrderType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingWriter {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Writer for CountingWriter {
        async fn create_instrument(&self, _record: Instrument) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn record_order(&self, _order: Order) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn record_trade(&self, _trade: Trade) -> StoreResult<()> {
            Ok(())
        }
        async fn record_cancel(&self, _: u64, _: u64, _: String, _: i64) -> StoreResult<()> {
            Ok(())
        }
        async fn upsert_live_order(&self, _order: Order) -> StoreResult<()> {
            Ok(())
        }
        async fn remove_live_order(&self, _: u64, _: u64) -> StoreResult<()> {
            Ok(())
        }
        async fn update_order_quantity(&self, _: u64, _: u64, _: u64, _: u64) -> StoreResult<()> {
            Ok(())
        }
        async fn iter_orders(&self, _instrument_id: u64) -> StoreResult<Vec<Order>> {
            Ok(Vec::new())
        }
        async fn list_instruments(&self) -> StoreResult<Vec<Instrument>> {
            Ok(Vec::new())
        }
        async fn list_live_orders(&self, _instrument_id: u64) -> StoreResult<Vec<Order>> {
            Ok(Vec::new())
        }
        async fn list_trades(&self, _instrument_id: u64) -> StoreResult<Vec<Trade>> {
            Ok(Vec::new())
        }
    }

    struct FailingWriter;

    #[async_trait]
    impl Writer for FailingWriter {
        async fn create_instrument(&self, _record: Instrument) -> StoreResult<()> {
            Err(StoreError::Io("disk full".to_string()))
        }
        async fn record_order(&self, _order: Order) -> StoreResult<()> {
            Err(StoreError::Io("disk full".to_string()))
        }
        async fn record_trade(&self, _trade: Trade) -> StoreResult<()> {
            Ok(())
        }
        async fn record_cancel(&self, _: u64, _: u64, _: String, _: i64) -> StoreResult<()> {
            Ok(())
        }
        async fn upsert_live_order(&self, _order: Order) -> StoreResult<()> {
            Ok(())
        }
        async fn remove_live_order(&self, _: u64, _: u64) -> StoreResult<()> {
            Ok(())
        }
        async fn update_order_quantity(&self, _: u64, _: u64, _: u64, _: u64) -> StoreResult<()> {
            Ok(())
        }
        async fn iter_orders(&self, _instrument_id: u64) -> StoreResult<Vec<Order>> {
            Ok(Vec::new())
        }
        async fn list_instruments(&self) -> StoreResult<Vec<Instrument>> {
            Ok(Vec::new())
        }
        async fn list_live_orders(&self, _instrument_id: u64) -> StoreResult<Vec<Order>> {
            Ok(Vec::new())
        }
        async fn list_trades(&self, _instrument_id: u64) -> StoreResult<Vec<Trade>> {
            Ok(Vec::new())
        }
    }

    fn test_order() -> Order {
        Order {
            order_id: 1,
            instrument_id: 100,
            side: OrderSide::Buy,
            order_type: OrderType::Gtc,
            price_cents: 100,
            quantity: 1,
            filled_quantity: 0,
            cancelled: false,
            party_id: "a".to_string(),
            timestamp: 1,
        }
    }

    #[tokio::test]
    async fn dispatches_to_every_writer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let primary = Arc::new(CountingWriter { calls: calls.clone() });
        let secondary = Arc::new(CountingWriter { calls: calls.clone() });
        let composite = CompositeWriter::new(vec![primary, secondary]);

        composite.record_order(test_order()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn secondary_failure_does_not_affect_primary_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let primary = Arc::new(CountingWriter { calls: calls.clone() });
        let secondary = Arc::new(FailingWriter);
        let composite = CompositeWriter::new(vec![primary, secondary]);

        let result = composite.record_order(test_order()).await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn primary_failure_is_surfaced() {
        let primary = Arc::new(FailingWriter);
        let secondary = Arc::new(CountingWriter {
            calls: Arc::new(AtomicUsize::new(0)),
        });
        let composite = CompositeWriter::new(vec![primary, secondary]);

        let result = composite.record_order(test_order()).await;
        assert!(result.is_err());
    }
}
