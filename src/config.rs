//! Configuration loader for `envmon-history`.
//!
//! All runtime configuration lives here and is built once at startup, then
//! passed explicitly to the pipeline. Values come from environment variables
//! (with optional `.env` file support provided by the caller); every variable
//! has a default, so the binary runs against the reference deployment with no
//! environment at all.
use std::env;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use chrono_tz::Tz;

use crate::models::AttributeSpec;

/// Parse an optional numeric variable with a default value.
macro_rules! parse_or {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string variable with a default value.
macro_rules! string_or {
    ($lookup:expr, $var_name:expr, $default:expr) => {
        $lookup($var_name).unwrap_or_else(|| $default.to_string())
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the whole run.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Endpoint of the STH-Comet historical service.
    pub sth: SthConfig,

    /// How many most-recent records to request per attribute (`lastN`).
    pub last_n: u32,

    /// Recency window, anchored at each series' latest sample.
    pub window_hours: f64,

    /// IANA zone every sample timestamp is converted to.
    pub target_zone: Tz,

    /// Where the rendered chart is written.
    pub chart_output: String,

    /// Monitored attributes, in panel order.
    pub attributes: Vec<AttributeSpec>,
}

/// Connection settings for STH-Comet. Fixed per run, never per call.
#[derive(Debug, Clone)]
pub struct SthConfig {
    // ---
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub entity_id: String,
    pub entity_type: String,
    /// Value of the `fiware-service` header.
    pub service: String,
    /// Value of the `fiware-servicepath` header.
    pub service_path: String,
    pub timeout: Duration,
}

/// The three environment attributes shown on the chart.
pub fn default_attributes() -> Vec<AttributeSpec> {
    // ---
    vec![
        AttributeSpec::new("temperature", "Temperature", "°C", "#ff4d4d"),
        AttributeSpec::new("humidity", "Humidity", "%", "#3b82f6"),
        AttributeSpec::new("noiseLevel", "Noise Level", "dB", "#a855f7"),
    ]
}

/// Load configuration from process environment variables.
///
/// Optional (defaults in parentheses):
/// - `STH_SCHEME` (`http`), `STH_HOST` (`102.37.18.193`), `STH_PORT` (`8666`)
/// - `ENTITY_ID` (`urn:ngsi-ld:Env:001`), `ENTITY_TYPE` (`Environment`)
/// - `FIWARE_SERVICE` (`smart`), `FIWARE_SERVICEPATH` (`/`)
/// - `LAST_N_RECORDS` (`100`), `HOURS_WINDOW` (`6`)
/// - `REQUEST_TIMEOUT_SECS` (`20`)
/// - `TARGET_TZ` (`America/Sao_Paulo`), an IANA zone name
/// - `CHART_OUTPUT` (`environment_chart.html`)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    load_with(|key| env::var(key).ok())
}

/// Load configuration from an arbitrary key lookup.
pub fn load_with<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let scheme = string_or!(lookup, "STH_SCHEME", "http");
    let host = string_or!(lookup, "STH_HOST", "102.37.18.193");
    let port = parse_or!(lookup, "STH_PORT", u16, 8666);
    let entity_id = string_or!(lookup, "ENTITY_ID", "urn:ngsi-ld:Env:001");
    let entity_type = string_or!(lookup, "ENTITY_TYPE", "Environment");
    let service = string_or!(lookup, "FIWARE_SERVICE", "smart");
    let service_path = string_or!(lookup, "FIWARE_SERVICEPATH", "/");
    let last_n = parse_or!(lookup, "LAST_N_RECORDS", u32, 100);
    let window_hours = parse_or!(lookup, "HOURS_WINDOW", f64, 6.0);
    let timeout_secs = parse_or!(lookup, "REQUEST_TIMEOUT_SECS", u64, 20);
    let tz_name = string_or!(lookup, "TARGET_TZ", "America/Sao_Paulo");
    let chart_output = string_or!(lookup, "CHART_OUTPUT", "environment_chart.html");

    if scheme != "http" && scheme != "https" {
        bail!("Invalid STH_SCHEME: expected http or https, got {scheme}");
    }
    for (name, value) in [
        ("STH_HOST", &host),
        ("ENTITY_ID", &entity_id),
        ("ENTITY_TYPE", &entity_type),
    ] {
        if value.trim().is_empty() {
            bail!("{name} must not be empty");
        }
    }
    if port == 0 {
        bail!("Invalid STH_PORT: must be greater than zero");
    }
    if last_n == 0 {
        bail!("Invalid LAST_N_RECORDS: must be greater than zero");
    }
    if !window_hours.is_finite() || window_hours < 0.0 {
        bail!("Invalid HOURS_WINDOW: must be a finite, non-negative number of hours");
    }
    if timeout_secs == 0 {
        bail!("Invalid REQUEST_TIMEOUT_SECS: must be greater than zero");
    }
    let target_zone = tz_name
        .trim()
        .parse::<Tz>()
        .map_err(|e| anyhow!("Invalid TARGET_TZ: {}", e))?;

    Ok(Config {
        sth: SthConfig {
            scheme,
            host,
            port,
            entity_id,
            entity_type,
            service,
            service_path,
            timeout: Duration::from_secs(timeout_secs),
        },
        last_n,
        window_hours,
        target_zone,
        chart_output,
        attributes: default_attributes(),
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!(
            "  STH endpoint       : {}://{}:{}",
            self.sth.scheme,
            self.sth.host,
            self.sth.port
        );
        tracing::info!(
            "  Entity             : {} ({})",
            self.sth.entity_id,
            self.sth.entity_type
        );
        tracing::info!(
            "  fiware-service     : {} {}",
            self.sth.service,
            self.sth.service_path
        );
        tracing::info!("  LAST_N_RECORDS     : {}", self.last_n);
        tracing::info!("  HOURS_WINDOW       : {}", self.window_hours);
        tracing::info!("  REQUEST_TIMEOUT    : {:?}", self.sth.timeout);
        tracing::info!("  Target zone        : {}", self.target_zone);
        tracing::info!("  CHART_OUTPUT       : {}", self.chart_output);
    }
}
