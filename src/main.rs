//! Application entry point for `envmon-history`.
//!
//! One-shot batch run:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Fetching, normalizing and windowing each monitored attribute
//! - Writing the three-panel chart
//!
//! # Environment Variables
//! See [`envmon_history::config::load_from_env`] for the pipeline settings.
//! - `ENVMON_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `ENVMON_SPAN_EVENTS` (optional) – span event mode for tracing
use std::env;

use is_terminal::IsTerminal;

use anyhow::Result;
use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use envmon_history::{config, HtmlChartRenderer, SthClient};

// ---

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let source = SthClient::new(cfg.sth.clone())?;
    let renderer = HtmlChartRenderer::new(&cfg.chart_output);

    let summaries = envmon_history::run(&cfg, &source, &renderer).await?;

    let empty = summaries.iter().filter(|s| !s.has_data()).count();
    if empty > 0 {
        tracing::warn!("{} of {} attributes had no data in window", empty, summaries.len());
    }

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `ENVMON_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by `RUST_LOG`, else `ENVMON_LOG_LEVEL`
///
/// Called once at startup before any logging macros are invoked.
fn init_tracing() {
    // ---
    let span_events = match env::var("ENVMON_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to ENVMON_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("ENVMON_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},hyper=warn,reqwest=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
