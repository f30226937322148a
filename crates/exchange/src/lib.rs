//! The multi-instrument exchange facade (`spec.md` §4.4).
//!
//! `Exchange` owns the set of per-instrument `OrderBook`s, allocates
//! globally unique order ids, validates requests before they ever reach
//! a book, and fans the resulting durable events out through a single
//! `Writer`. It has no opinion on transport: `bins/openx`'s CLI builds
//! `SubmitOrderRequest`s from argv and calls straight through.
//!
//! Each `OrderBook` is guarded by its own `tokio::sync::Mutex`. The lock
//! is held across the matching call *and* the writer fan-out that
//! follows it, so two concurrent `submit_order` calls on the same book
//! can never interleave their event groups (`spec.md` §4.5); this is
//! safe because every `Writer` call is a non-blocking enqueue, never I/O
//! itself (`spec.md` §5).

pub mod error;
pub mod metrics;
pub mod types;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use common::{Clock, Instrument, Order, OrderType};
use matching_engine::{OrderBook, OrderBookMetricsSnapshot};
use storage::Writer;

pub use error::{ExchangeError, ExchangeResult};
pub use metrics::ExchangeMetrics;
pub use types::{CancelAllResult, SubmitOrderRequest, SubmitOrderResponse};

struct Book {
    instrument: Instrument,
    book: Mutex<OrderBook>,
}

/// Owns every `OrderBook`, the order-id allocator, and the writer
/// fan-out. One `Exchange` serves an entire process; there is no
/// cross-instrument matching or sharding (`spec.md` §1).
pub struct Exchange {
    books: RwLock<HashMap<u64, Arc<Book>>>,
    next_order_id: AtomicU64,
    writer: Arc<dyn Writer>,
    clock: Arc<dyn Clock>,
    metrics: ExchangeMetrics,
}

impl Exchange {
    /// Builds an empty exchange. Call [`Exchange::rebuild`] before
    /// accepting any request so that previously journaled instruments
    /// and orders are restored and `next_order_id` does not collide
    /// with ids issued before a crash.
    pub fn new(writer: Arc<dyn Writer>, clock: Arc<dyn Clock>) -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            next_order_id: AtomicU64::new(1),
            writer,
            clock,
            metrics: ExchangeMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &ExchangeMetrics {
        &self.metrics
    }

    fn allocate_order_id(&self) -> u64 {
        self.next_order_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn get_book(&self, instrument_id: u64) -> ExchangeResult<Arc<Book>> {
        self.books
            .read()
            .await
            .get(&instrument_id)
            .cloned()
            .ok_or(ExchangeError::UnknownInstrument(instrument_id))
    }

    /// Registers a new instrument and its empty book. Fails with
    /// `InstrumentExists` if the id is already taken.
    pub async fn create_book(
        &self,
        instrument_id: u64,
        name: String,
        description: String,
        admin_party_id: String,
    ) -> ExchangeResult<()> {
        {
            let books = self.books.read().await;
            if books.contains_key(&instrument_id) {
                return Err(ExchangeError::InstrumentExists(instrument_id));
            }
        }

        let record = Instrument {
            instrument_id,
            name,
            description,
            created_time: self.clock.now_nanos(),
            created_by: admin_party_id,
        };

        let mut books = self.books.write().await;
        if books.contains_key(&instrument_id) {
            return Err(ExchangeError::InstrumentExists(instrument_id));
        }
        books.insert(
            instrument_id,
            Arc::new(Book {
                instrument: record.clone(),
                book: Mutex::new(OrderBook::new(instrument_id)),
            }),
        );
        drop(books);

        if let Err(err) = self.writer.create_instrument(record).await {
            error!(%err, instrument_id, "failed to persist instrument record");
        }

        info!(instrument_id, "instrument created");
        Ok(())
    }

    /// Validates, sequences, and submits an order, then fans out the
    /// resulting events in the order required by `spec.md` §4.5: the
    /// taker's snapshot, then each trade, then maker projection updates,
    /// then the taker's own resting residue if any. Every touched maker
    /// gets an `update_order_quantity` call regardless of whether it was
    /// partially or fully filled, so its full-history journal entry
    /// always ends with the right `filled_quantity`/`remaining_quantity`
    /// — a fully-filled maker additionally gets `remove_live_order` to
    /// drop it from the live projection. Without the former, a
    /// fully-filled maker's journal entry would still read
    /// `remaining_quantity() > 0` and `rebuild` would wrongly resurrect
    /// it as a live order.
    pub async fn submit_order(&self, request: SubmitOrderRequest) -> ExchangeResult<SubmitOrderResponse> {
        let book = match self.get_book(request.instrument_id).await {
            Ok(book) => book,
            Err(err) => {
                self.metrics.record_order_rejected();
                return Err(err);
            }
        };

        let price_cents = match validate_submit_request(&request) {
            Ok(price) => price,
            Err(err) => {
                self.metrics.record_order_rejected();
                return Err(err);
            }
        };

        let order_id = self.allocate_order_id();
        let order = Order {
            order_id,
            instrument_id: request.instrument_id,
            side: request.side,
            order_type: request.order_type,
            price_cents,
            quantity: request.quantity,
            filled_quantity: 0,
            cancelled: false,
            party_id: request.party_id,
            timestamp: self.clock.now_nanos(),
        };

        let mut guard = book.book.lock().await;
        let (resting, trades, maker_updates) = guard.submit(order);

        // Every writer call below is a non-blocking enqueue (spec.md §5),
        // so holding the book lock across them costs nothing on the hot
        // path while guaranteeing this event group cannot interleave with
        // another concurrent submit_order on the same book (spec.md §4.5).
        if let Err(err) = self.writer.record_order(resting.clone()).await {
            error!(%err, order_id, "failed to journal order snapshot");
        }

        for trade in &trades {
            if let Err(err) = self.writer.record_trade(trade.clone()).await {
                error!(%err, order_id, "failed to journal trade");
            }
        }

        for maker in &maker_updates {
            if let Err(err) = self
                .writer
                .update_order_quantity(
                    request.instrument_id,
                    maker.order_id,
                    maker.filled_quantity,
                    maker.remaining_quantity(),
                )
                .await
            {
                error!(%err, maker_order_id = maker.order_id, "failed to update maker live projection");
            }
            if maker.remaining_quantity() == 0 {
                if let Err(err) = self
                    .writer
                    .remove_live_order(request.instrument_id, maker.order_id)
                    .await
                {
                    error!(%err, maker_order_id = maker.order_id, "failed to remove filled maker from live projection");
                }
            }
        }

        if resting.order_type == OrderType::Gtc && resting.is_live() {
            if let Err(err) = self.writer.upsert_live_order(resting.clone()).await {
                error!(%err, order_id, "failed to project resting order");
            }
        }

        drop(guard);

        self.metrics.record_order_accepted();
        for _ in &trades {
            self.metrics.record_trade_executed();
        }

        Ok(SubmitOrderResponse {
            order_id: resting.order_id,
            remaining_quantity: resting.remaining_quantity(),
            cancelled: resting.cancelled,
            trades,
        })
    }

    /// Cancels a resting order. Enforces that `party_id` matches the
    /// order's owner; a mismatch is reported as `OrderNotOpen` rather
    /// than `Forbidden` so a non-owning caller cannot distinguish
    /// "not yours" from "doesn't exist" (`spec.md` §9 open question,
    /// decided in `DESIGN.md`).
    pub async fn cancel_order(
        &self,
        instrument_id: u64,
        order_id: u64,
        party_id: &str,
    ) -> ExchangeResult<()> {
        let book = self.get_book(instrument_id).await?;

        let timestamp = self.clock.now_nanos();
        let mut guard = book.book.lock().await;
        let cancelled = match guard.get_order(order_id) {
            Some(order) if order.party_id == party_id => guard.cancel(order_id),
            _ => false,
        };

        if !cancelled {
            self.metrics.record_cancel_rejected();
            return Err(ExchangeError::OrderNotOpen);
        }

        // Held across the writer calls for the same reason as
        // `submit_order`: both enqueues are non-blocking, and keeping the
        // book lock means this cancel's events cannot interleave with
        // another concurrent submit_order/cancel_order on the same book.
        if let Err(err) = self
            .writer
            .record_cancel(instrument_id, order_id, party_id.to_string(), timestamp)
            .await
        {
            error!(%err, order_id, "failed to journal cancel");
        }
        if let Err(err) = self.writer.remove_live_order(instrument_id, order_id).await {
            error!(%err, order_id, "failed to remove cancelled order from live projection");
        }
        drop(guard);

        self.metrics.record_cancel_accepted();
        Ok(())
    }

    /// Cancels every order resting for `party_id` on one instrument.
    /// Snapshots the live order ids first so a concurrent mutation
    /// cannot extend or shrink the set mid-iteration, then cancels each
    /// independently and reports successes and failures separately.
    pub async fn cancel_all_for_party(
        &self,
        instrument_id: u64,
        party_id: &str,
    ) -> ExchangeResult<CancelAllResult> {
        let book = self.get_book(instrument_id).await?;

        let candidate_ids: Vec<u64> = {
            let guard = book.book.lock().await;
            guard
                .live_orders()
                .filter(|order| order.party_id == party_id)
                .map(|order| order.order_id)
                .collect()
        };

        let mut result = CancelAllResult::default();
        for order_id in candidate_ids {
            match self.cancel_order(instrument_id, order_id, party_id).await {
                Ok(()) => result.cancelled_ids.push(order_id),
                Err(ExchangeError::OrderNotOpen) => result.failed_ids.push(order_id),
                Err(err) => return Err(err),
            }
        }

        Ok(result)
    }

    /// Reconstructs every book from the writer's full order journal.
    /// Must run to completion, single-threaded, before any other
    /// request is served (`spec.md` §5). Idempotent: replaying the same
    /// journal prefix twice produces identical book state and
    /// `next_order_id`, because each journaled order is re-inserted via
    /// [`OrderBook::restore`] rather than re-run through matching, and
    /// the new books fully replace whatever was registered before.
    pub async fn rebuild(&self) -> ExchangeResult<()> {
        let instruments = self
            .writer
            .list_instruments()
            .await
            .map_err(|err| ExchangeError::Internal(err.to_string()))?;

        let mut rebuilt = HashMap::new();
        let mut max_order_id = 0u64;

        for record in instruments {
            let mut book = OrderBook::new(record.instrument_id);
            let orders = self
                .writer
                .iter_orders(record.instrument_id)
                .await
                .map_err(|err| ExchangeError::Internal(err.to_string()))?;

            for order in orders {
                max_order_id = max_order_id.max(order.order_id);
                if order.cancelled || order.remaining_quantity() == 0 {
                    continue;
                }
                if !order.order_type.can_rest() {
                    warn!(
                        order_id = order.order_id,
                        "journaled non-resting order type found live at rebuild; skipping"
                    );
                    continue;
                }
                book.restore(order);
            }

            rebuilt.insert(
                record.instrument_id,
                Arc::new(Book {
                    instrument: record,
                    book: Mutex::new(book),
                }),
            );
        }

        let instrument_count = rebuilt.len();
        *self.books.write().await = rebuilt;
        self.next_order_id.store(max_order_id + 1, Ordering::SeqCst);

        info!(
            instruments = instrument_count,
            next_order_id = max_order_id + 1,
            "rebuild complete"
        );
        Ok(())
    }

    /// Returns the instrument record for `instrument_id`, if known.
    pub async fn instrument(&self, instrument_id: u64) -> Option<Instrument> {
        self.books
            .read()
            .await
            .get(&instrument_id)
            .map(|book| book.instrument.clone())
    }

    /// Lists every registered instrument.
    pub async fn list_instruments(&self) -> Vec<Instrument> {
        self.books
            .read()
            .await
            .values()
            .map(|book| book.instrument.clone())
            .collect()
    }

    /// Full order history for an instrument, ascending by `order_id`
    /// (`spec.md` §6's read-only query surface). Served from the writer's
    /// journal projection rather than the live in-memory book, since a
    /// filled or cancelled order has already left `OrderBook`.
    pub async fn order_history(&self, instrument_id: u64) -> ExchangeResult<Vec<Order>> {
        self.get_book(instrument_id).await?;
        self.writer
            .iter_orders(instrument_id)
            .await
            .map_err(|err| ExchangeError::Internal(err.to_string()))
    }

    /// Every currently live order for an instrument, as projected by the
    /// writer.
    pub async fn live_orders(&self, instrument_id: u64) -> ExchangeResult<Vec<Order>> {
        self.get_book(instrument_id).await?;
        self.writer
            .list_live_orders(instrument_id)
            .await
            .map_err(|err| ExchangeError::Internal(err.to_string()))
    }

    /// Every trade executed on an instrument, ascending by `timestamp`.
    pub async fn trades(&self, instrument_id: u64) -> ExchangeResult<Vec<common::Trade>> {
        self.get_book(instrument_id).await?;
        self.writer
            .list_trades(instrument_id)
            .await
            .map_err(|err| ExchangeError::Internal(err.to_string()))
    }

    /// The per-book counters for one instrument, republished by
    /// `observability::metrics` alongside this `Exchange`'s own
    /// process-wide counters.
    pub async fn book_metrics(&self, instrument_id: u64) -> ExchangeResult<OrderBookMetricsSnapshot> {
        let book = self.get_book(instrument_id).await?;
        let guard = book.book.lock().await;
        Ok(guard.metrics().snapshot())
    }
}

/// Field-level validation for `submit_order`, independent of whether the
/// instrument exists. Returns the concrete `price_cents` to store (0 for
/// MARKET). No partial mutation ever happens on a validation failure: no
/// id is consumed and no writer event is emitted.
fn validate_submit_request(request: &SubmitOrderRequest) -> ExchangeResult<u64> {
    if request.quantity == 0 {
        return Err(ExchangeError::InvalidRequest("quantity must be positive".to_string()));
    }

    match request.order_type {
        OrderType::Market => match request.price_cents {
            None | Some(0) => Ok(0),
            Some(_) => Err(ExchangeError::InvalidRequest(
                "MARKET orders must not specify a price".to_string(),
            )),
        },
        OrderType::Gtc | OrderType::Ioc => match request.price_cents {
            Some(price) if price > 0 => Ok(price),
            _ => Err(ExchangeError::InvalidRequest(
                "GTC/IOC orders require a positive price".to_string(),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderSide, TestClock};
    use storage::CompositeWriter;

    fn exchange() -> Exchange {
        let journal = storage::QueuedDurableWriter::new(256, 3, 1);
        let writer: Arc<dyn Writer> = Arc::new(CompositeWriter::new(vec![Arc::new(journal)]));
        let clock: Arc<dyn Clock> = Arc::new(TestClock::new(1));
        Exchange::new(writer, clock)
    }

    fn submit(
        instrument_id: u64,
        side: OrderSide,
        order_type: OrderType,
        price_cents: Option<u64>,
        quantity: u64,
        party_id: &str,
    ) -> SubmitOrderRequest {
        SubmitOrderRequest {
            instrument_id,
            side,
            order_type,
            price_cents,
            quantity,
            party_id: party_id.to_string(),
        }
    }

    #[tokio::test]
    async fn create_book_rejects_duplicate() {
        let exchange = exchange();
        exchange
            .create_book(100, "Test".to_string(), "desc".to_string(), "admin".to_string())
            .await
            .unwrap();
        let err = exchange
            .create_book(100, "Test".to_string(), "desc".to_string(), "admin".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InstrumentExists(100)));
    }

    #[tokio::test]
    async fn submit_order_rejects_unknown_instrument() {
        let exchange = exchange();
        let err = exchange
            .submit_order(submit(999, OrderSide::Buy, OrderType::Gtc, Some(100), 1, "a"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::UnknownInstrument(999)));
    }

    #[tokio::test]
    async fn submit_order_rejects_gtc_without_price() {
        let exchange = exchange();
        exchange
            .create_book(100, "Test".to_string(), "desc".to_string(), "admin".to_string())
            .await
            .unwrap();
        let err = exchange
            .submit_order(submit(100, OrderSide::Buy, OrderType::Gtc, None, 1, "a"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn submit_order_rejects_market_with_price() {
        let exchange = exchange();
        exchange
            .create_book(100, "Test".to_string(), "desc".to_string(), "admin".to_string())
            .await
            .unwrap();
        let err = exchange
            .submit_order(submit(100, OrderSide::Buy, OrderType::Market, Some(100), 1, "a"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn s1_partial_cross_via_exchange() {
        let exchange = exchange();
        exchange
            .create_book(100, "Test".to_string(), "desc".to_string(), "admin".to_string())
            .await
            .unwrap();

        let sell = exchange
            .submit_order(submit(100, OrderSide::Sell, OrderType::Gtc, Some(10_000), 5, "A"))
            .await
            .unwrap();
        assert_eq!(sell.order_id, 1);
        assert!(sell.trades.is_empty());

        let buy = exchange
            .submit_order(submit(100, OrderSide::Buy, OrderType::Gtc, Some(10_100), 3, "B"))
            .await
            .unwrap();
        assert_eq!(buy.order_id, 2);
        assert_eq!(buy.trades.len(), 1);
        assert_eq!(buy.trades[0].maker_quantity_remaining, 2);
        assert_eq!(buy.remaining_quantity, 0);
    }

    #[tokio::test]
    async fn s4_double_cancel_via_exchange() {
        let exchange = exchange();
        exchange
            .create_book(100, "Test".to_string(), "desc".to_string(), "admin".to_string())
            .await
            .unwrap();
        let resp = exchange
            .submit_order(submit(100, OrderSide::Buy, OrderType::Gtc, Some(100), 4, "Z"))
            .await
            .unwrap();

        exchange.cancel_order(100, resp.order_id, "Z").await.unwrap();
        let err = exchange.cancel_order(100, resp.order_id, "Z").await.unwrap_err();
        assert!(matches!(err, ExchangeError::OrderNotOpen));
    }

    #[tokio::test]
    async fn cancel_rejects_non_owning_party() {
        let exchange = exchange();
        exchange
            .create_book(100, "Test".to_string(), "desc".to_string(), "admin".to_string())
            .await
            .unwrap();
        let resp = exchange
            .submit_order(submit(100, OrderSide::Buy, OrderType::Gtc, Some(100), 4, "Z"))
            .await
            .unwrap();

        let err = exchange
            .cancel_order(100, resp.order_id, "not-z")
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::OrderNotOpen));
    }

    #[tokio::test]
    async fn s5_cancel_all_reports_failures_for_already_filled_orders() {
        let exchange = exchange();
        exchange
            .create_book(100, "Test".to_string(), "desc".to_string(), "admin".to_string())
            .await
            .unwrap();

        let o10 = exchange
            .submit_order(submit(100, OrderSide::Buy, OrderType::Gtc, Some(100), 1, "Z"))
            .await
            .unwrap();
        let o11 = exchange
            .submit_order(submit(100, OrderSide::Buy, OrderType::Gtc, Some(100), 1, "Z"))
            .await
            .unwrap();
        let o12 = exchange
            .submit_order(submit(100, OrderSide::Buy, OrderType::Gtc, Some(100), 1, "Z"))
            .await
            .unwrap();

        // Fill order 11 with a matching sell so it leaves the book.
        exchange
            .submit_order(submit(100, OrderSide::Sell, OrderType::Ioc, Some(100), 1, "counterparty"))
            .await
            .unwrap();

        let result = exchange.cancel_all_for_party(100, "Z").await.unwrap();
        let mut cancelled = result.cancelled_ids.clone();
        cancelled.sort_unstable();
        assert_eq!(cancelled, vec![o10.order_id, o12.order_id]);
        assert_eq!(result.failed_ids, vec![o11.order_id]);
    }

    #[tokio::test]
    async fn rebuild_restores_live_orders_and_next_id() {
        let journal = Arc::new(storage::QueuedDurableWriter::new(256, 3, 1));
        let writer: Arc<dyn Writer> = Arc::new(CompositeWriter::new(vec![journal.clone()]));
        let clock: Arc<dyn Clock> = Arc::new(TestClock::new(1));
        let exchange = Exchange::new(writer.clone(), clock.clone());

        exchange
            .create_book(100, "Test".to_string(), "desc".to_string(), "admin".to_string())
            .await
            .unwrap();
        exchange
            .submit_order(submit(100, OrderSide::Sell, OrderType::Gtc, Some(10_000), 5, "A"))
            .await
            .unwrap();
        let buy = exchange
            .submit_order(submit(100, OrderSide::Buy, OrderType::Gtc, Some(10_100), 3, "B"))
            .await
            .unwrap();
        journal.shutdown().await;

        let rebuilt = Exchange::new(writer, clock);
        rebuilt.rebuild().await.unwrap();

        assert_eq!(rebuilt.submit_order(submit(100, OrderSide::Buy, OrderType::Gtc, Some(1), 1, "x")).await.unwrap().order_id, buy.order_id + 1);

        let result = rebuilt.cancel_order(100, 1, "A").await;
        assert!(result.is_ok(), "order 1's residual 2 units should have survived rebuild");
    }

    #[tokio::test]
    async fn query_surface_reflects_history_live_orders_and_trades() {
        let exchange = exchange();
        exchange
            .create_book(100, "Test".to_string(), "desc".to_string(), "admin".to_string())
            .await
            .unwrap();

        exchange
            .submit_order(submit(100, OrderSide::Sell, OrderType::Gtc, Some(10_000), 5, "A"))
            .await
            .unwrap();
        exchange
            .submit_order(submit(100, OrderSide::Buy, OrderType::Gtc, Some(10_100), 3, "B"))
            .await
            .unwrap();

        let history = exchange.order_history(100).await.unwrap();
        assert_eq!(history.len(), 2);

        let live = exchange.live_orders(100).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].order_id, 1);
        assert_eq!(live[0].remaining_quantity(), 2);

        let trades = exchange.trades(100).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, 3);

        let err = exchange.order_history(999).await.unwrap_err();
        assert!(matches!(err, ExchangeError::UnknownInstrument(999)));

        let book_metrics = exchange.book_metrics(100).await.unwrap();
        assert_eq!(book_metrics.orders_submitted, 2);
        assert_eq!(book_metrics.trades_executed, 1);
    }

    #[tokio::test]
    async fn rebuild_is_idempotent() {
        let journal = Arc::new(storage::QueuedDurableWriter::new(256, 3, 1));
        let writer: Arc<dyn Writer> = Arc::new(CompositeWriter::new(vec![journal.clone()]));
        let clock: Arc<dyn Clock> = Arc::new(TestClock::new(1));
        let exchange = Exchange::new(writer.clone(), clock.clone());

        exchange
            .create_book(100, "Test".to_string(), "desc".to_string(), "admin".to_string())
            .await
            .unwrap();
        exchange
            .submit_order(submit(100, OrderSide::Sell, OrderType::Gtc, Some(10_000), 5, "A"))
            .await
            .unwrap();
        journal.shutdown().await;

        let rebuilt = Exchange::new(writer, clock);
        rebuilt.rebuild().await.unwrap();
        rebuilt.rebuild().await.unwrap();

        rebuilt.cancel_order(100, 1, "A").await.unwrap();
    }

    #[tokio::test]
    async fn rebuild_does_not_resurrect_a_fully_filled_maker() {
        let journal = Arc::new(storage::QueuedDurableWriter::new(256, 3, 1));
        let writer: Arc<dyn Writer> = Arc::new(CompositeWriter::new(vec![journal.clone()]));
        let clock: Arc<dyn Clock> = Arc::new(TestClock::new(1));
        let exchange = Exchange::new(writer.clone(), clock.clone());

        exchange
            .create_book(100, "Test".to_string(), "desc".to_string(), "admin".to_string())
            .await
            .unwrap();

        exchange
            .submit_order(submit(100, OrderSide::Sell, OrderType::Gtc, Some(10_000), 5, "A"))
            .await
            .unwrap();
        let buy = exchange
            .submit_order(submit(100, OrderSide::Buy, OrderType::Gtc, Some(10_000), 5, "B"))
            .await
            .unwrap();
        assert_eq!(buy.trades.len(), 1);
        assert_eq!(buy.remaining_quantity, 0);
        journal.shutdown().await;

        let rebuilt = Exchange::new(writer, clock);
        rebuilt.rebuild().await.unwrap();

        // The fully-filled sell (order 1) must not come back as a live
        // order: cancelling it should fail as "not open", not succeed.
        let err = rebuilt.cancel_order(100, 1, "A").await.unwrap_err();
        assert!(matches!(err, ExchangeError::OrderNotOpen));

        let live = rebuilt.live_orders(100).await.unwrap();
        assert!(live.is_empty());
    }
}
