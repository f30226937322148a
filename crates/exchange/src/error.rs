//! Error taxonomy surfaced by the exchange façade, exactly the kinds
//! enumerated for the invocation surface: unknown/duplicate instrument,
//! field-level validation failure, a cancel target that is not open,
//! credential errors (trusted to the caller), and fatal invariant
//! violations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("instrument {0} does not exist")]
    UnknownInstrument(u64),

    #[error("instrument {0} already exists")]
    InstrumentExists(u64),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("order not open")]
    OrderNotOpen,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;
