use ulid::Ulid;

use crate::model::{Ms, Reservation, Span};

use super::availability::availability;
use super::EngineError;

pub(crate) fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as Ms
}

pub(crate) fn validate_span(span: &Span) -> Result<(), EngineError> {
    use crate::limits::*;
    if span.start >= span.end {
        return Err(EngineError::InvalidInterval { start: span.start, end: span.end });
    }
    if span.start < MIN_VALID_TIMESTAMP_MS || span.end > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::LimitExceeded("timestamp out of range"));
    }
    if span.duration_ms() > MAX_SPAN_DURATION_MS {
        return Err(EngineError::LimitExceeded("span too wide"));
    }
    Ok(())
}

/// The capacity gate: reject when the requested quantity exceeds what is
/// left of `total_quantity` over `span`. Resource condition (maintenance
/// etc.) is deliberately not consulted here.
pub(crate) fn check_capacity(
    total_quantity: u32,
    existing: &[Reservation],
    span: &Span,
    exclude: Option<Ulid>,
    requested: u32,
) -> Result<(), EngineError> {
    let report = availability(total_quantity, existing, span, exclude);
    if requested > report.available_quantity {
        return Err(EngineError::InsufficientQuantity {
            available: report.available_quantity,
            requested,
        });
    }
    Ok(())
}
