//! Fire-and-forget event publication over a `tokio::sync::broadcast`
//! channel. Lossy by design: a subscriber that falls behind receives
//! `RecvError::Lagged` and is expected to resynchronize by rereading
//! durable state, not to be resent.

use async_trait::async_trait;
use tokio::sync::broadcast;

use common::{Instrument, Order, Trade};

use crate::error::StoreResult;
use crate::events::WireEvent;
use crate::writer::Writer;

pub struct BroadcastWriter {
    sender: broadcast::Sender<WireEvent>,
}

impl BroadcastWriter {
    pub fn new(channel_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WireEvent> {
        self.sender.subscribe()
    }

    fn publish(&self, event: WireEvent) {
        // No subscribers is not an error; it just means nobody is listening yet.
        let _ = self.sender.send(event);
    }
}

#[async_trait]
impl Writer for BroadcastWriter {
    async fn create_instrument(&self, _record: Instrument) -> StoreResult<()> {
        Ok(())
    }

    async fn record_order(&self, order: Order) -> StoreResult<()> {
        self.publish(WireEvent::Order {
            instrument_id: order.instrument_id,
            order,
        });
        Ok(())
    }

    async fn record_trade(&self, trade: Trade) -> StoreResult<()> {
        self.publish(WireEvent::Trade {
            instrument_id: trade.instrument_id,
            trade,
        });
        Ok(())
    }

    async fn record_cancel(
        &self,
        instrument_id: u64,
        order_id: u64,
        party_id: String,
        timestamp: i64,
    ) -> StoreResult<()> {
        self.publish(WireEvent::Cancel {
            instrument_id,
            order_id,
            party_id,
            timestamp,
        });
        Ok(())
    }

    async fn upsert_live_order(&self, _order: Order) -> StoreResult<()> {
        Ok(())
    }

    async fn remove_live_order(&self, _instrument_id: u64, _order_id: u64) -> StoreResult<()> {
        Ok(())
    }

    async fn update_order_quantity(
        &self,
        _instrument_id: u64,
        _order_id: u64,
        _filled_quantity: u64,
        _remaining_quantity: u64,
    ) -> StoreResult<()> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderSide, OrderType};

    #[tokio::test]
    async fn subscriber_receives_published_order() {
        let writer = BroadcastWriter::new(16);
        let mut rx = writer.subscribe();

        let order = Order {
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
        };
        writer.record_order(order.clone()).await.unwrap();

        match rx.recv().await.unwrap() {
            WireEvent::Order { instrument_id, order: received } => {
                assert_eq!(instrument_id, 100);
                assert_eq!(received.order_id, 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn publishing_without_subscribers_does_not_error() {
        let writer = BroadcastWriter::new(16);
        let order = Order {
            order_id: 1,
            instrument_id: 100,
            side: OrderSide::Sell,
            order_type: OrderType::Gtc,
            price_cents: 100,
            quantity: 1,
            filled_quantity: 0,
            cancelled: false,
            party_id: "a".to_string(),
            timestamp: 1,
        };
        assert!(writer.record_order(order).await.is_ok());
    }
}
