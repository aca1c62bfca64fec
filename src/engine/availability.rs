use ulid::Ulid;

use crate::model::{Reservation, Span};

/// Remaining capacity of a resource over a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityReport {
    pub total_quantity: u32,
    pub reserved_quantity: u32,
    pub available_quantity: u32,
}

/// Compute remaining bookable quantity over `window` from a snapshot of
/// reservations. Only Scheduled/Confirmed reservations whose span overlaps
/// the window count; `exclude` drops one reservation from the sum so an
/// edit does not conflict with itself.
///
/// Pure and deterministic given a consistent snapshot.
pub fn availability(
    total_quantity: u32,
    reservations: &[Reservation],
    window: &Span,
    exclude: Option<Ulid>,
) -> AvailabilityReport {
    let mut reserved: u32 = 0;
    for r in reservations {
        if !r.status.is_active() {
            continue;
        }
        if Some(r.id) == exclude {
            continue;
        }
        if !r.span.overlaps(window) {
            continue;
        }
        reserved = reserved.saturating_add(r.quantity);
    }
    AvailabilityReport {
        total_quantity,
        reserved_quantity: reserved,
        available_quantity: total_quantity.saturating_sub(reserved),
    }
}
