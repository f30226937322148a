//! Event payloads shared between the queued durable writer's internal
//! channel and the broadcast writer's wire format.

use serde::{Deserialize, Serialize};

use common::{Instrument, Order, Trade};

/// One unit of work enqueued to a background writer. Each variant
/// corresponds one-to-one with a `Writer` trait method.
#[derive(Debug, Clone)]
pub enum WriterEvent {
    CreateInstrument(Instrument),
    RecordOrder(Order),
    RecordTrade(Trade),
    RecordCancel {
        instrument_id: u64,
        order_id: u64,
        party_id: String,
        timestamp: i64,
    },
    UpsertLiveOrder(Order),
    RemoveLiveOrder {
        instrument_id: u64,
        order_id: u64,
    },
    UpdateOrderQuantity {
        instrument_id: u64,
        order_id: u64,
        filled_quantity: u64,
        remaining_quantity: u64,
    },
}

/// Self-describing payload published over the broadcast channel. Each
/// event carries its own kind tag and instrument id so a subscriber can
/// decode it without any prior state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WireEvent {
    #[serde(rename = "ORDER")]
    Order { instrument_id: u64, order: Order },
    #[serde(rename = "TRADE")]
    Trade { instrument_id: u64, trade: Trade },
    #[serde(rename = "CANCEL")]
    Cancel {
        instrument_id: u64,
        order_id: u64,
        party_id: String,
        timestamp: i64,
    },
}
