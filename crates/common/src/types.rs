//! Common domain types used across OpenExchange.
//!
//! These are the wire/journal shapes shared by `matching-engine`,
//! `exchange`, and `storage`: order sides, order types, the `Order` and
//! `Trade` records, and the `Instrument` metadata record.

use serde::{Deserialize, Serialize};

/// Side of an order or a trade's maker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, OrderSide::Buy)
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// Order type. Only these three exist; there are no stop or iceberg orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Matches at any price against best available liquidity; never rests.
    Market,
    /// Good-Till-Cancelled: rests in the book after any immediate matches.
    Gtc,
    /// Immediate-Or-Cancel: matches what it can immediately, residue canceled.
    Ioc,
}

impl OrderType {
    /// MARKET and IOC never rest in the book; only GTC residue can.
    pub fn can_rest(&self) -> bool {
        matches!(self, OrderType::Gtc)
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Gtc => write!(f, "GTC"),
            OrderType::Ioc => write!(f, "IOC"),
        }
    }
}

/// A single order, live or historical.
///
/// Invariants (see the matching engine for where they are enforced):
/// `filled_quantity + remaining_quantity == quantity`; `remaining_quantity
/// == 0` implies `!cancelled` (a filled order is not also marked
/// cancelled); once `cancelled` is true it never flips back; `order_type
/// == Market` implies `price_cents == 0` and the order never rests;
/// `order_type == Ioc` never rests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: u64,
    pub instrument_id: u64,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price_cents: u64,
    pub quantity: u64,
    pub filled_quantity: u64,
    pub cancelled: bool,
    pub party_id: String,
    pub timestamp: i64,
}

impl Order {
    pub fn remaining_quantity(&self) -> u64 {
        self.quantity - self.filled_quantity
    }

    pub fn is_live(&self) -> bool {
        !self.cancelled && self.remaining_quantity() > 0
    }
}

/// An immutable trade record. The price is always the maker's price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub instrument_id: u64,
    pub price_cents: u64,
    pub quantity: u64,
    pub timestamp: i64,
    pub maker_order_id: u64,
    pub maker_party_id: String,
    pub taker_order_id: u64,
    pub taker_party_id: String,
    pub maker_is_buyer: bool,
    pub maker_quantity_remaining: u64,
    pub taker_quantity_remaining: u64,
}

/// Instrument metadata. Created exactly once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub instrument_id: u64,
    pub name: String,
    pub description: String,
    pub created_time: i64,
    pub created_by: String,
}
