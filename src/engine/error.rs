use ulid::Ulid;

use crate::model::{Ms, ReservationStatus};
use crate::store::StoreError;

#[derive(Debug)]
pub enum EngineError {
    /// Resource or reservation id unresolvable (or resource inactive on create).
    NotFound(Ulid),
    /// Requested quantity exceeds remaining availability in the window.
    InsufficientQuantity { available: u32, requested: u32 },
    /// Role/ownership violation, or edit attempted on a terminal reservation.
    Unauthorized(&'static str),
    InvalidInterval { start: Ms, end: Ms },
    InvalidQuantity(u32),
    InvalidTransition { from: ReservationStatus, reason: &'static str },
    /// Field constraint violation (name length, past start, etc.).
    Validation(&'static str),
    LimitExceeded(&'static str),
    Store(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::InsufficientQuantity { available, requested } => {
                write!(f, "insufficient quantity: requested {requested}, available {available}")
            }
            EngineError::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            EngineError::InvalidInterval { start, end } => {
                write!(f, "invalid interval: start {start} must be before end {end}")
            }
            EngineError::InvalidQuantity(q) => {
                write!(f, "invalid quantity: {q} (must be positive)")
            }
            EngineError::InvalidTransition { from, reason } => {
                write!(f, "illegal transition from {from}: {reason}")
            }
            EngineError::Validation(msg) => write!(f, "validation failed: {msg}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Store(e.0)
    }
}
