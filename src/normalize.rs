//! Raw record normalization: text to zoned, numeric, time-ordered samples.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::error::RecordError;
use crate::models::{RawRecord, Sample, Series};

/// Layouts tried in order. STH emits milliseconds most of the time but not always.
const TIMESTAMP_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

// ---

/// Normalize a batch of raw records into a sorted series in `zone`.
///
/// Records whose timestamp or value fails to parse are logged and dropped one
/// by one; the rest of the batch is kept. A record missing either field, or
/// carrying one of the wrong JSON type, counts as a parse failure.
pub fn normalize(records: &[RawRecord], zone: Tz) -> Series {
    // ---
    let mut samples = Vec::with_capacity(records.len());

    for record in records {
        match to_sample(record, zone) {
            Ok(sample) => samples.push(sample),
            Err(e) => warn!("Dropping record {:?}: {}", record, e),
        }
    }

    let dropped = records.len() - samples.len();
    if dropped > 0 {
        debug!("Normalized {} records, dropped {}", samples.len(), dropped);
    }

    Series::from_unsorted(samples)
}

/// Convert one raw record into a sample localized to `zone`.
pub fn to_sample(record: &RawRecord, zone: Tz) -> Result<Sample, RecordError> {
    // ---
    let naive = parse_recv_time(record.recv_time_text()?)?;
    let value = parse_value(&record.attr_value_text()?)?;

    Ok(Sample {
        timestamp: localize(naive, zone),
        value,
    })
}

/// Parse a `recvTime` string as a naive UTC timestamp.
///
/// Accepts `T` or space as the date/time separator and an optional trailing `Z`.
pub fn parse_recv_time(raw: &str) -> Result<NaiveDateTime, RecordError> {
    // ---
    let text = raw.trim();
    let text = text.strip_suffix('Z').unwrap_or(text).replacen('T', " ", 1);

    TIMESTAMP_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(&text, layout).ok())
        .ok_or_else(|| RecordError::Timestamp(raw.to_string()))
}

/// Parse an `attrValue` as a finite float.
pub fn parse_value(raw: &str) -> Result<f64, RecordError> {
    // ---
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RecordError::Value(raw.to_string()))
}

/// Convert a naive UTC instant into `zone`, keeping the offset that zone had
/// at that instant (DST included).
pub fn localize(utc: NaiveDateTime, zone: Tz) -> DateTime<FixedOffset> {
    utc.and_utc().with_timezone(&zone).fixed_offset()
}
