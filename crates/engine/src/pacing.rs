//! Wall-clock pacing for the background loops

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Margin past the minute boundary so a tick never lands on the previous minute
pub const MINUTE_EPSILON: Duration = Duration::from_millis(50);

const CANCEL_POLL: Duration = Duration::from_millis(500);

/// Time from `now` until the next minute boundary plus `MINUTE_EPSILON`
pub fn until_next_minute(now: DateTime<Utc>) -> Duration {
    let into_minute = now.timestamp_millis().rem_euclid(60_000) as u64;
    Duration::from_millis(60_000 - into_minute) + MINUTE_EPSILON
}

/// Sleep for `total`, waking early if `cancelled` is set.
/// Returns false when cancelled.
pub async fn sleep_unless_cancelled(total: Duration, cancelled: &AtomicBool) -> bool {
    let mut remaining = total;
    while !remaining.is_zero() {
        if cancelled.load(Ordering::Relaxed) {
            return false;
        }
        let step = remaining.min(CANCEL_POLL);
        tokio::time::sleep(step).await;
        remaining -= step;
    }
    !cancelled.load(Ordering::Relaxed)
}
