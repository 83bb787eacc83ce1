//! Error taxonomy for the history pipeline.
//!
//! Neither error type escapes the aggregator: fetch errors collapse into an
//! empty record list and record errors drop the single offending record.

use reqwest::StatusCode;
use thiserror::Error;

// ---

/// Failure while retrieving one attribute's history.
#[derive(Debug, Error)]
pub enum FetchError {
    // ---
    /// Endpoint could not be assembled from configuration.
    #[error("invalid endpoint url: {0}")]
    Url(String),

    /// Transport failure: connect, timeout, body read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Service answered with a non-2xx status.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Response body did not match the expected envelope.
    #[error("unexpected response shape: {0}")]
    Shape(String),
}

/// Failure while normalizing a single raw record.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    // ---
    #[error("missing or null {0}")]
    Missing(&'static str),

    #[error("unparseable recvTime {0:?}")]
    Timestamp(String),

    #[error("unparseable attrValue {0:?}")]
    Value(String),
}
