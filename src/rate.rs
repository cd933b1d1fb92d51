// Counter-delta arithmetic: byte rates and busy percentages from two
// consecutive readings of monotonically increasing kernel counters.

use std::time::Duration;

/// Per-second rate between two cumulative counter readings.
///
/// A counter that went backwards (device replaced, wrap) yields 0. A zero
/// elapsed time (first sample, same instant) also yields 0.
pub fn per_second(prev: u64, curr: u64, elapsed: Duration) -> u64 {
    let delta = curr.saturating_sub(prev);
    let nanos = elapsed.as_nanos();
    if nanos == 0 {
        return 0;
    }
    let rate = u128::from(delta) * 1_000_000_000 / nanos;
    u64::try_from(rate).unwrap_or(u64::MAX)
}

/// Busy percentage from idle/total jiffy counters: `100 - idle% of total`.
///
/// Returns 0 when no time was observed (`total` unchanged, or reset).
pub fn busy_percent(prev_idle: u64, idle: u64, prev_total: u64, total: u64) -> u64 {
    if total <= prev_total {
        return 0;
    }
    let total_delta = total - prev_total;
    let idle_delta = idle.saturating_sub(prev_idle).min(total_delta);
    100 - idle_delta * 100 / total_delta
}
