//! Recency filtering anchored at a series' own latest sample.

use chrono::TimeDelta;

use crate::models::Series;

const MICROS_PER_HOUR: f64 = 3_600_000_000.0;

// ---

/// Keep only the samples within `window_hours` of the latest sample.
///
/// The cutoff is `latest - window_hours` and is inclusive. The window is
/// measured from the newest sample in the series, **not** from the current
/// time: if the feed has been stale for days, the result still holds the last
/// `window_hours` of whatever was received. Fractional hours are honored to
/// the microsecond; negative or non-finite windows count as zero.
///
/// Order is preserved and the input is left untouched. An empty series comes
/// back empty.
pub fn filter_recent(series: &Series, window_hours: f64) -> Series {
    // ---
    let Some(latest) = series.latest() else {
        return series.clone();
    };

    // A window reaching past chrono's range keeps everything.
    match window_delta(window_hours).and_then(|window| latest.checked_sub_signed(window)) {
        Some(cutoff) => series.retain_into(|s| s.timestamp >= cutoff),
        None => series.clone(),
    }
}

/// Window length as a duration; `None` if it exceeds what chrono can represent.
fn window_delta(window_hours: f64) -> Option<TimeDelta> {
    // ---
    let hours = if window_hours.is_finite() {
        window_hours.max(0.0)
    } else {
        0.0
    };
    let micros = (hours * MICROS_PER_HOUR).round();
    if micros >= i64::MAX as f64 {
        return None;
    }
    Some(TimeDelta::microseconds(micros as i64))
}
