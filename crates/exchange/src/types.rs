//! Request/response shapes for the exchange invocation surface
//! (`spec.md` §6). Transport-agnostic: `bins/openx`'s CLI and any future
//! HTTP layer both build these from their own input parsing.

use common::{OrderSide, OrderType, Trade};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOrderRequest {
    pub instrument_id: u64,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price_cents: Option<u64>,
    pub quantity: u64,
    pub party_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOrderResponse {
    pub order_id: u64,
    pub remaining_quantity: u64,
    pub cancelled: bool,
    pub trades: Vec<Trade>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelAllResult {
    pub cancelled_ids: Vec<u64>,
    pub failed_ids: Vec<u64>,
}
