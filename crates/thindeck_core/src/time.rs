use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix time in milliseconds; clamps to 0 if the clock is before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
