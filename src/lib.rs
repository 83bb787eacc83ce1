//! Environment history pipeline.
//!
//! Pulls the recent history of the monitored environment attributes from
//! STH-Comet, normalizes and windows each series, computes means, and hands
//! the result to a chart renderer:
//!
//! - `config`    – explicit run configuration, loaded once at startup
//! - `fetcher`   – STH-Comet client behind the [`HistorySource`] seam
//! - `normalize` – raw records to zoned, sorted samples
//! - `window`    – recency filter anchored at the latest sample
//! - `aggregate` – the per-attribute pipeline
//! - `render`    – the [`ChartRenderer`] boundary
pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod normalize;
pub mod render;
pub mod window;

use anyhow::Result;

pub use aggregate::build_summaries;
pub use config::Config;
pub use error::{FetchError, RecordError};
pub use fetcher::{HistorySource, SthClient};
pub use models::{AttributeSpec, RawRecord, Sample, Series, SeriesSummary};
pub use normalize::normalize;
pub use render::{ChartRenderer, DisplayConfig, HtmlChartRenderer};
pub use window::filter_recent;

// ---

/// One full run: summarize every configured attribute, then render.
///
/// The summaries are returned whether or not any attribute had data; only a
/// renderer failure is an error.
pub async fn run<S, R>(cfg: &Config, source: &S, renderer: &R) -> Result<Vec<SeriesSummary>>
where
    S: HistorySource,
    R: ChartRenderer,
{
    // ---
    let summaries = build_summaries(
        source,
        &cfg.attributes,
        cfg.last_n,
        cfg.window_hours,
        cfg.target_zone,
    )
    .await;

    renderer.render(&summaries, &DisplayConfig::new(cfg.window_hours))?;

    Ok(summaries)
}
