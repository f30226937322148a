//! Storage error types

use thiserror::Error;

/// Errors that can occur during writer/journal operations. Never
/// propagated to the matching hot path: the durable writer surfaces
/// these only through its own health signal and log output.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("instrument not found: {0}")]
    InstrumentNotFound(u64),

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("writer queue is closed")]
    QueueClosed,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
