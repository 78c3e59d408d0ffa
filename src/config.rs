use crate::error::{AppError, Result};

pub const CLOB_API_URL: &str = "https://clob.polymarket.com";

/// Hard cap on concurrently charted series. Callers requesting more are truncated.
pub const MAX_CHART_SERIES: usize = 4;

/// Default fetch lookback when no explicit start time is given (days).
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Synthetic fallback series span (days). The generator emits one point per
/// day for days `SYNTHETIC_LOOKBACK_DAYS` down to 0 inclusive.
pub const SYNTHETIC_LOOKBACK_DAYS: i64 = 90;

/// Synthetic walk bounds: seed price range, per-day step range, clamp range.
pub mod synthetic_walk {
    pub const SEED_MIN: f64 = 0.3;
    pub const SEED_MAX: f64 = 0.7;
    pub const STEP_MAX: f64 = 0.05;
    pub const CLAMP_MIN: f64 = 0.05;
    pub const CLAMP_MAX: f64 = 0.95;
}

/// Per-request HTTP timeout (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// TUI redraw poll interval (milliseconds).
pub const TUI_TICK_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub clob_api_url: String,
    pub log_level: String,
    /// (token_id, label) pairs parsed from MARKETS ("id=label,id=label").
    pub markets: Vec<(String, String)>,
    /// Explicit history start (Unix seconds, START_TS). None = default lookback.
    pub start_ts: Option<i64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let markets = std::env::var("MARKETS")
            .unwrap_or_default()
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(parse_market_entry)
            .collect::<Vec<_>>();

        if markets.is_empty() {
            return Err(AppError::Config(
                "MARKETS must list at least one market as token_id=label (comma-separated)"
                    .to_string(),
            ));
        }

        let start_ts = match std::env::var("START_TS") {
            Ok(v) => Some(v.parse::<i64>().map_err(|_| {
                AppError::Config("START_TS must be a Unix timestamp in seconds".to_string())
            })?),
            Err(_) => None,
        };

        Ok(Self {
            clob_api_url: std::env::var("CLOB_API_URL")
                .unwrap_or_else(|_| CLOB_API_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            markets,
            start_ts,
        })
    }
}

/// Parse one MARKETS entry. "id=label" → (id, label); a bare "id" labels
/// itself with a shortened form of the token id.
fn parse_market_entry(entry: &str) -> (String, String) {
    let entry = entry.trim();
    match entry.split_once('=') {
        Some((id, label)) if !label.trim().is_empty() => {
            (id.trim().to_string(), label.trim().to_string())
        }
        _ => {
            let id = entry.trim_end_matches('=').to_string();
            let label = if id.chars().count() > 10 {
                let head: String = id.chars().take(10).collect();
                format!("{head}…")
            } else {
                id.clone()
            };
            (id, label)
        }
    }
}
