//! Hard limits. Anything beyond these is rejected with `LimitExceeded`
//! or `Validation` rather than clamped.

use crate::model::Ms;

pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 100;
pub const MIN_KIND_LEN: usize = 2;
pub const MAX_NOTES_LEN: usize = 2_000;
pub const MAX_LOCATION_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2_000;

pub const DAY_MS: Ms = 86_400_000;

/// Timestamps before the epoch are never valid inputs.
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
/// Year 3000. Catches second-vs-millisecond mixups.
pub const MAX_VALID_TIMESTAMP_MS: Ms = 32_503_680_000_000;

/// A single reservation longer than a year is a data-entry error.
pub const MAX_SPAN_DURATION_MS: Ms = 366 * DAY_MS;
pub const MAX_QUERY_WINDOW_MS: Ms = 366 * DAY_MS;
