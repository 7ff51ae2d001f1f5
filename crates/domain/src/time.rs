//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `created_at`, log entries, due dates, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Index of the fixed-width window `ts` falls into.
///
/// Two timestamps share a bucket when they fall in the same
/// `window_ms`-millisecond slice since the Unix epoch. A zero window is
/// treated as one millisecond.
#[must_use]
pub fn bucket(ts: Timestamp, window_ms: u64) -> i64 {
    let window = i64::try_from(window_ms.max(1)).unwrap_or(i64::MAX);
    ts.timestamp_millis().div_euclid(window)
}
