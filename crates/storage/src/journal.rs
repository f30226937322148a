//! The in-process durable journal and the queued writer that drains
//! into it off the matching hot path.
//!
//! `DurableJournal` is the storage engine spec.md leaves unspecified,
//! made concrete: a `tokio::sync::RwLock`-guarded set of per-instrument
//! `BTreeMap<u64, Order>` journals (ordered by `order_id` for rebuild), a
//! per-instrument trade log, and the live-order projection. A real
//! deployment would back this with a disk-backed log or a database; the
//! `Writer` trait is the seam where that swap happens.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tracing::{debug, error, warn};

use common::{Instrument, Order, Trade};

use crate::error::{StoreError, StoreResult};
use crate::events::WriterEvent;
use crate::writer::Writer;

#[derive(Default)]
struct JournalState {
    instruments: HashMap<u64, Instrument>,
    orders: HashMap<u64, BTreeMap<u64, Order>>,
    trades: HashMap<u64, Vec<Trade>>,
    live_orders: HashMap<u64, HashMap<u64, Order>>,
}

/// The durable store backing `QueuedDurableWriter`.
pub struct DurableJournal {
    state: RwLock<JournalState>,
}

impl DurableJournal {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(JournalState::default()),
        }
    }

    async fn apply(&self, event: &WriterEvent) -> StoreResult<()> {
        let mut state = self.state.write().await;
        match event {
            WriterEvent::CreateInstrument(record) => {
                state.instruments.insert(record.instrument_id, record.clone());
            }
            WriterEvent::RecordOrder(order) => {
                state
                    .orders
                    .entry(order.instrument_id)
                    .or_default()
                    .insert(order.order_id, order.clone());
            }
            WriterEvent::RecordTrade(trade) => {
                state.trades.entry(trade.instrument_id).or_default().push(trade.clone());
            }
            WriterEvent::RecordCancel { instrument_id, order_id, .. } => {
                if let Some(orders) = state.orders.get_mut(instrument_id) {
                    if let Some(order) = orders.get_mut(order_id) {
                        order.cancelled = true;
                    }
                }
            }
            WriterEvent::UpsertLiveOrder(order) => {
                state
                    .live_orders
                    .entry(order.instrument_id)
                    .or_default()
                    .insert(order.order_id, order.clone());
            }
            WriterEvent::RemoveLiveOrder { instrument_id, order_id } => {
                if let Some(live) = state.live_orders.get_mut(instrument_id) {
                    live.remove(order_id);
                }
            }
            WriterEvent::UpdateOrderQuantity {
                instrument_id,
                order_id,
                filled_quantity,
                remaining_quantity,
            } => {
                if let Some(live) = state.live_orders.get_mut(instrument_id) {
                    if let Some(order) = live.get_mut(order_id) {
                        order.filled_quantity = *filled_quantity;
                        debug_assert_eq!(order.remaining_quantity(), *remaining_quantity);
                    }
                }
                if let Some(orders) = state.orders.get_mut(instrument_id) {
                    if let Some(order) = orders.get_mut(order_id) {
                        order.filled_quantity = *filled_quantity;
                    }
                }
            }
        }
        Ok(())
    }

    pub async fn iter_orders(&self, instrument_id: u64) -> Vec<Order> {
        let state = self.state.read().await;
        state
            .orders
            .get(&instrument_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn list_instruments(&self) -> Vec<Instrument> {
        let state = self.state.read().await;
        state.instruments.values().cloned().collect()
    }

    pub async fn list_live_orders(&self, instrument_id: u64) -> Vec<Order> {
        let state = self.state.read().await;
        state
            .live_orders
            .get(&instrument_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn list_trades(&self, instrument_id: u64) -> Vec<Trade> {
        let state = self.state.read().await;
        let mut trades = state.trades.get(&instrument_id).cloned().unwrap_or_default();
        trades.sort_by_key(|t| t.timestamp);
        trades
    }
}

impl Default for DurableJournal {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-blocking on the matching hot path: every operation enqueues a
/// tagged event and returns immediately. A background task drains the
/// queue strictly in enqueue order and applies mutations to the
/// [`DurableJournal`]. A poison event that fails repeatedly is retried
/// with bounded backoff, then logged and skipped so the consumer never
/// stalls.
pub struct QueuedDurableWriter {
    sender: mpsc::Sender<WriterEvent>,
    journal: Arc<DurableJournal>,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl QueuedDurableWriter {
    pub fn new(queue_capacity: usize, max_retries: u32, retry_backoff_ms: u64) -> Self {
        let journal = Arc::new(DurableJournal::new());
        let (sender, receiver) = mpsc::channel(queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker_journal = journal.clone();
        let worker = tokio::spawn(Self::run(
            receiver,
            worker_journal,
            shutdown_rx,
            max_retries,
            retry_backoff_ms,
        ));

        Self {
            sender,
            journal,
            shutdown_tx,
            worker: Mutex::new(Some(worker)),
        }
    }

    async fn run(
        mut receiver: mpsc::Receiver<WriterEvent>,
        journal: Arc<DurableJournal>,
        mut shutdown: watch::Receiver<bool>,
        max_retries: u32,
        retry_backoff_ms: u64,
    ) {
        loop {
            tokio::select! {
                event = receiver.recv() => {
                    match event {
                        Some(event) => {
                            Self::apply_with_retry(&journal, event, max_retries, retry_backoff_ms).await;
                        }
                        None => return,
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!("durable writer draining remaining events before shutdown");
                        receiver.close();
                        while let Some(event) = receiver.recv().await {
                            Self::apply_with_retry(&journal, event, max_retries, retry_backoff_ms).await;
                        }
                        return;
                    }
                }
            }
        }
    }

    async fn apply_with_retry(
        journal: &DurableJournal,
        event: WriterEvent,
        max_retries: u32,
        retry_backoff_ms: u64,
    ) {
        let mut attempt = 0;
        loop {
            match journal.apply(&event).await {
                Ok(()) => return,
                Err(err) if attempt < max_retries => {
                    attempt += 1;
                    warn!(attempt, %err, "durable writer retrying after transient failure");
                    tokio::time::sleep(Duration::from_millis(retry_backoff_ms)).await;
                }
                Err(err) => {
                    error!(%err, "durable writer dropping poison event after exhausting retries");
                    return;
                }
            }
        }
    }

    async fn enqueue(&self, event: WriterEvent) -> StoreResult<()> {
        self.sender.send(event).await.map_err(|_| StoreError::QueueClosed)
    }

    /// Signals the background task to drain and exit, then awaits it.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(worker) = self.worker.lock().await.take() {
            let _ = worker.await;
        }
    }
}

#[async_trait]
impl Writer for QueuedDurableWriter {
    async fn create_instrument(&self, record: Instrument) -> StoreResult<()> {
        self.enqueue(WriterEvent::CreateInstrument(record)).await
    }

    async fn record_order(&self, order: Order) -> StoreResult<()> {
        self.enqueue(WriterEvent::RecordOrder(order)).await
    }

    async fn record_trade(&self, trade: Trade) -> StoreResult<()> {
        self.enqueue(WriterEvent::RecordTrade(trade)).await
    }

    async fn record_cancel(
        &self,
        instrument_id: u64,
        order_id: u64,
        party_id: String,
        timestamp: i64,
    ) -> StoreResult<()> {
        self.enqueue(WriterEvent::RecordCancel {
            instrument_id,
            order_id,
            party_id,
            timestamp,
        })
        .await
    }

    async fn upsert_live_order(&self, order: Order) -> StoreResult<()> {
        self.enqueue(WriterEvent::UpsertLiveOrder(order)).await
    }

    async fn remove_live_order(&self, instrument_id: u64, order_id: u64) -> StoreResult<()> {
        self.enqueue(WriterEvent::RemoveLiveOrder { instrument_id, order_id }).await
    }

    async fn update_order_quantity(
        &self,
        instrument_id: u64,
        order_id: u64,
        filled_quantity: u64,
        remaining_quantity: u64,
    ) -> StoreResult<()> {
        self.enqueue(WriterEvent::UpdateOrderQuantity {
            instrument_id,
            order_id,
            filled_quantity,
            remaining_quantity,
        })
        .await
    }

    async fn iter_orders(&self, instrument_id: u64) -> StoreResult<Vec<Order>> {
        Ok(self.journal.iter_orders(instrument_id).await)
    }

    async fn list_instruments(&self) -> StoreResult<Vec<Instrument>> {
        Ok(self.journal.list_instruments().await)
    }

    async fn list_live_orders(&self, instrument_id: u64) -> StoreResult<Vec<Order>> {
        Ok(self.journal.list_live_orders(instrument_id).await)
    }

    async fn list_trades(&self, instrument_id: u64) -> StoreResult<Vec<Trade>> {
        Ok(self.journal.list_trades(instrument_id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderSide, OrderType};

    fn test_order(order_id: u64, instrument_id: u64) -> Order {
        Order {
            order_id,
            instrument_id,
            side: OrderSide::Buy,
            order_type: OrderType::Gtc,
            price_cents: 100,
            quantity: 10,
            filled_quantity: 0,
            cancelled: false,
            party_id: "alice".to_string(),
            timestamp: 1,
        }
    }

    #[tokio::test]
    async fn record_and_read_back_orders_in_order() {
        let writer = QueuedDurableWriter::new(16, 3, 1);
        writer.record_order(test_order(2, 100)).await.unwrap();
        writer.record_order(test_order(1, 100)).await.unwrap();
        writer.shutdown().await;

        let orders = writer.iter_orders(100).await.unwrap();
        let ids: Vec<_> = orders.iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn live_order_projection_tracks_fills_and_removal() {
        let writer = QueuedDurableWriter::new(16, 3, 1);
        writer.upsert_live_order(test_order(1, 100)).await.unwrap();
        writer.update_order_quantity(100, 1, 4, 6).await.unwrap();
        writer.remove_live_order(100, 1).await.unwrap();
        writer.shutdown().await;

        let state = writer.journal.state.read().await;
        assert!(!state.live_orders.get(&100).unwrap().contains_key(&1));
    }

    #[tokio::test]
    async fn list_trades_is_sorted_by_timestamp() {
        let writer = QueuedDurableWriter::new(16, 3, 1);
        writer.record_trade(test_trade(100, 1, 2, 50)).await.unwrap();
        writer.record_trade(test_trade(100, 3, 4, 10)).await.unwrap();
        writer.shutdown().await;

        let trades = writer.list_trades(100).await.unwrap();
        let timestamps: Vec<_> = trades.iter().map(|t| t.timestamp).collect();
        assert_eq!(timestamps, vec![10, 50]);
    }

    fn test_trade(instrument_id: u64, maker_order_id: u64, taker_order_id: u64, timestamp: i64) -> Trade {
        Trade {
            instrument_id,
            price_cents: 100,
            quantity: 1,
            timestamp,
            maker_order_id,
            maker_party_id: "maker".to_string(),
            taker_order_id,
            taker_party_id: "taker".to_string(),
            maker_is_buyer: false,
            maker_quantity_remaining: 0,
            taker_quantity_remaining: 0,
        }
    }

    #[tokio::test]
    async fn shutdown_drains_pending_events() {
        let writer = QueuedDurableWriter::new(16, 3, 1);
        for id in 1..=10 {
            writer.record_order(test_order(id, 100)).await.unwrap();
        }
        writer.shutdown().await;
        let orders = writer.iter_orders(100).await.unwrap();
        assert_eq!(orders.len(), 10);
    }
}
