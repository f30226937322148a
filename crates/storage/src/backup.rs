//! Append-only, line-oriented backup journal: one file per
//! `(instrument_id, event kind)` under a configured directory. Writes
//! happen off the hot path via a dedicated background task, the same
//! shape as [`crate::journal::QueuedDurableWriter`] but without a
//! read-back path: the backup format is not part of the matching
//! contract and does not participate in replay.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::error;

use common::{Instrument, Order, Trade};

use crate::error::StoreResult;
use crate::events::WriterEvent;
use crate::writer::Writer;

pub struct BackupWriter {
    sender: mpsc::Sender<WriterEvent>,
}

impl BackupWriter {
    pub fn new(directory: impl Into<PathBuf>, queue_capacity: usize) -> Self {
        let directory = directory.into();
        let (sender, receiver) = mpsc::channel(queue_capacity);
        tokio::spawn(Self::run(directory, receiver));
        Self { sender }
    }

    async fn run(directory: PathBuf, mut receiver: mpsc::Receiver<WriterEvent>) {
        if let Err(err) = tokio::fs::create_dir_all(&directory).await {
            error!(%err, directory = %directory.display(), "failed to create backup directory");
        }
        while let Some(event) = receiver.recv().await {
            if let Err(err) = Self::append(&directory, &event).await {
                error!(%err, "failed to append backup record");
            }
        }
    }

    async fn append(directory: &PathBuf, event: &WriterEvent) -> std::io::Result<()> {
        let (instrument_id, kind, line) = match event {
            WriterEvent::CreateInstrument(record) => (
                record.instrument_id,
                "instrument",
                serde_json::to_string(record)?,
            ),
            WriterEvent::RecordOrder(order) => {
                (order.instrument_id, "order", serde_json::to_string(order)?)
            }
            WriterEvent::RecordTrade(trade) => {
                (trade.instrument_id, "trade", serde_json::to_string(trade)?)
            }
            WriterEvent::RecordCancel {
                instrument_id,
                order_id,
                party_id,
                timestamp,
            } => (
                *instrument_id,
                "cancel",
                serde_json::to_string(&serde_json::json!({
                    "order_id": order_id,
                    "party_id": party_id,
                    "timestamp": timestamp,
                }))?,
            ),
            // Live-order projection updates are not historical events and
            // are not part of the append-only backup journal.
            WriterEvent::UpsertLiveOrder(_)
            | WriterEvent::RemoveLiveOrder { .. }
            | WriterEvent::UpdateOrderQuantity { .. } => return Ok(()),
        };

        let path = directory.join(format!("{instrument_id}.{kind}.jsonl"));
        let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        Ok(())
    }

    async fn enqueue(&self, event: WriterEvent) -> StoreResult<()> {
        // Backup is best-effort; a full queue silently drops the event
        // rather than blocking the matching path.
        let _ = self.sender.try_send(event);
        Ok(())
    }
}

#[async_trait]
impl Writer for BackupWriter {
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

    /// Does not participate in replay.
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
