//! Data models for the environment history pipeline.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::error::RecordError;

// ---

/// One historical value as returned by STH-Comet.
///
/// Fields are kept exactly as received, `None` when absent or `null`. Parsing
/// happens in [`crate::normalize`] so a bad record is dropped on its own
/// without failing the rest of the response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    // ---
    pub recv_time: Option<Value>,
    pub attr_value: Option<Value>,
}

impl RawRecord {
    // ---
    pub fn new(recv_time: impl Into<String>, attr_value: impl Into<String>) -> Self {
        Self {
            recv_time: Some(Value::String(recv_time.into())),
            attr_value: Some(Value::String(attr_value.into())),
        }
    }

    /// Pick `recvTime` and `attrValue` out of one entry of an STH `values`
    /// list. Anything that is not an object yields an empty record.
    pub fn from_value(item: &Value) -> Self {
        // ---
        let field = |key: &str| item.get(key).filter(|v| !v.is_null()).cloned();
        Self {
            recv_time: field("recvTime"),
            attr_value: field("attrValue"),
        }
    }

    /// `recvTime` as text.
    pub fn recv_time_text(&self) -> Result<&str, RecordError> {
        // ---
        match &self.recv_time {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(RecordError::Timestamp(other.to_string())),
            None => Err(RecordError::Missing("recvTime")),
        }
    }

    /// `attrValue` as text. STH stores whatever the context broker sent, so
    /// it shows up both as `"21.5"` and as `21.5`.
    pub fn attr_value_text(&self) -> Result<Cow<'_, str>, RecordError> {
        // ---
        match &self.attr_value {
            Some(Value::String(s)) => Ok(Cow::Borrowed(s)),
            Some(Value::Number(n)) => Ok(Cow::Owned(n.to_string())),
            Some(other) => Err(RecordError::Value(other.to_string())),
            None => Err(RecordError::Missing("attrValue")),
        }
    }
}

/// A normalized reading, localized to the configured target zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    // ---
    pub timestamp: DateTime<FixedOffset>,
    pub value: f64,
}

/// Samples for one attribute, non-decreasing by timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    // ---
    /// Build a series from samples, sorting them by timestamp.
    ///
    /// The sort is stable, so samples sharing a timestamp keep their input order.
    pub fn from_unsorted(mut samples: Vec<Sample>) -> Self {
        // ---
        samples.sort_by_key(|s| s.timestamp);
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Latest timestamp in the series, if any.
    pub fn latest(&self) -> Option<DateTime<FixedOffset>> {
        self.samples.iter().map(|s| s.timestamp).max()
    }

    /// Arithmetic mean of the values, `None` for an empty series.
    pub fn mean(&self) -> Option<f64> {
        // ---
        if self.samples.is_empty() {
            return None;
        }
        // Running mean; a plain sum overflows for large finite values.
        let mean = self
            .samples
            .iter()
            .enumerate()
            .fold(0.0, |m, (i, s)| m + (s.value - m) / (i + 1) as f64);
        Some(mean)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<FixedOffset>> + '_ {
        self.samples.iter().map(|s| s.timestamp)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    /// Keep the samples matching `keep`, preserving order.
    pub(crate) fn retain_into(&self, keep: impl Fn(&Sample) -> bool) -> Self {
        Self {
            samples: self.samples.iter().copied().filter(|s| keep(s)).collect(),
        }
    }
}

/// A monitored attribute and how it is displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    // ---
    /// Attribute name on the STH entity, e.g. `noiseLevel`.
    pub name: String,
    pub label: String,
    pub unit: String,
    /// Line color, any CSS color string.
    pub color: String,
}

impl AttributeSpec {
    // ---
    pub fn new(name: &str, label: &str, unit: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            unit: unit.to_string(),
            color: color.to_string(),
        }
    }
}

/// Final per-attribute artifact handed to the chart renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    // ---
    pub name: String,
    pub label: String,
    pub unit: String,
    pub color: String,
    pub series: Series,
    /// Mean over the retained samples; `None` means "no data in window".
    pub mean: Option<f64>,
}

impl SeriesSummary {
    // ---
    pub fn new(spec: &AttributeSpec, series: Series) -> Self {
        // ---
        let mean = series.mean();
        Self {
            name: spec.name.clone(),
            label: spec.label.clone(),
            unit: spec.unit.clone(),
            color: spec.color.clone(),
            series,
            mean,
        }
    }

    pub fn has_data(&self) -> bool {
        !self.series.is_empty()
    }
}
