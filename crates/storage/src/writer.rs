//! The `Writer` trait: the durability contract shared by every writer
//! implementation (queued durable, broadcast, backup, composite).
//!
//! Mirrors the shape of the donor's `MatchingStore` trait, but scoped to
//! what a matching core actually needs to persist: instrument metadata,
//! order/trade/cancel events, the live-order projection, and the two
//! rebuild-time reads (`iter_orders`, `list_instruments`).

use async_trait::async_trait;
use common::{Instrument, Order, Trade};

use crate::error::StoreResult;

/// Durability contract implemented by every writer. Mutating operations
/// must preserve the ordering guarantees of `spec.md` §4.5: for a single
/// `submit_order` call, `record_order` of the taker precedes
/// `record_trade`s in execution order, which precede
/// `remove_live_order`/`update_order_quantity` for affected makers,
/// which precede `upsert_live_order` for any resting residue.
#[async_trait]
pub trait Writer: Send + Sync {
    /// Persists instrument metadata. Called exactly once per instrument.
    async fn create_instrument(&self, record: Instrument) -> StoreResult<()>;

    /// Appends a full, immutable order snapshot to the order journal.
    async fn record_order(&self, order: Order) -> StoreResult<()>;

    /// Appends a trade to the trade journal.
    async fn record_trade(&self, trade: Trade) -> StoreResult<()>;

    /// Records a cancel event against a previously journaled order.
    async fn record_cancel(
        &self,
        instrument_id: u64,
        order_id: u64,
        party_id: String,
        timestamp: i64,
    ) -> StoreResult<()>;

    /// Projects the current open state of a resting order.
    async fn upsert_live_order(&self, order: Order) -> StoreResult<()>;

    /// Removes an order from the open-order projection.
    async fn remove_live_order(&self, instrument_id: u64, order_id: u64) -> StoreResult<()>;

    /// Patches the open-order projection after a partial fill.
    async fn update_order_quantity(
        &self,
        instrument_id: u64,
        order_id: u64,
        filled_quantity: u64,
        remaining_quantity: u64,
    ) -> StoreResult<()>;

    /// Streams every journaled order for an instrument, ascending by
    /// `order_id`. Used at rebuild and to serve the full order-history
    /// query of `spec.md` §6.
    async fn iter_orders(&self, instrument_id: u64) -> StoreResult<Vec<Order>>;

    /// Lists every instrument record. Used at rebuild and to serve the
    /// `list instruments` query of `spec.md` §6.
    async fn list_instruments(&self) -> StoreResult<Vec<Instrument>>;

    /// Lists every order currently in the live-order projection for an
    /// instrument. Serves the `list live orders` query of `spec.md` §6.
    async fn list_live_orders(&self, instrument_id: u64) -> StoreResult<Vec<Order>>;

    /// Lists every journaled trade for an instrument, ascending by
    /// `timestamp`. Serves the `list trades` query of `spec.md` §6.
    async fn list_trades(&self, instrument_id: u64) -> StoreResult<Vec<Trade>>;
}
