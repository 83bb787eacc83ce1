//! Per-attribute pipeline: fetch, normalize, filter, summarize.

use chrono_tz::Tz;
use tracing::{info, warn};

use crate::fetcher::HistorySource;
use crate::models::{AttributeSpec, SeriesSummary};
use crate::normalize::normalize;
use crate::window::filter_recent;

// ---

/// Build one summary per attribute, in the order given.
///
/// Attributes are processed one after another. Each step is fail-soft, so an
/// attribute whose fetch fails or whose window is empty still yields a summary,
/// just with an empty series and no mean. Nothing here returns an error.
pub async fn build_summaries<S>(
    source: &S,
    specs: &[AttributeSpec],
    fetch_limit: u32,
    window_hours: f64,
    zone: Tz,
) -> Vec<SeriesSummary>
where
    S: HistorySource,
{
    // ---
    let mut summaries = Vec::with_capacity(specs.len());

    for spec in specs {
        let raw = source.fetch(&spec.name, fetch_limit).await;
        let normalized = normalize(&raw, zone);
        let recent = filter_recent(&normalized, window_hours);

        info!(
            "{}: {} points after filter ({} fetched, {} valid)",
            spec.label,
            recent.len(),
            raw.len(),
            normalized.len()
        );

        let summary = SeriesSummary::new(spec, recent);
        match summary.mean {
            Some(mean) => info!("{}: mean {:.2} {}", spec.label, mean, spec.unit),
            None => warn!("{}: no data in window", spec.label),
        }
        summaries.push(summary);
    }

    summaries
}
