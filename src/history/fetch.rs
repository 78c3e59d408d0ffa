use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{DEFAULT_LOOKBACK_DAYS, HTTP_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::history::synthetic;
use crate::types::{now_secs, PricePoint, SeriesHistory, SeriesRequest};

/// Source of raw price histories. The orchestrator is generic over this so
/// the fetch/merge pipeline tests run against stubs, no network required.
pub trait HistoryProvider: Send + Sync + 'static {
    /// Fetch one market's history from `start_ts` (Unix seconds; `None` or a
    /// future value falls back to the default lookback). Returns `None` only
    /// when cancelled — fetch failures degrade to a synthetic series, so a
    /// live (uncancelled) call always yields data.
    fn fetch_history(
        &self,
        request: &SeriesRequest,
        start_ts: Option<i64>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Option<SeriesHistory>> + Send;
}

// ---------------------------------------------------------------------------
// CLOB prices-history REST client
// ---------------------------------------------------------------------------

/// Wire shape of `GET /prices-history`. Parse-or-reject at the boundary:
/// a body that doesn't match this schema is a fetch failure, not a guess.
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    history: Vec<RawPoint>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RawPoint {
    t: Option<f64>,
    p: Option<f64>,
}

impl RawPoint {
    /// A point is kept only if both fields are present and finite.
    fn validate(self) -> Option<PricePoint> {
        let (t, p) = (self.t?, self.p?);
        if !t.is_finite() || !p.is_finite() {
            return None;
        }
        Some(PricePoint {
            ts: t as i64,
            price: p,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClobHistoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl ClobHistoryClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, base_url })
    }

    async fn fetch_raw(&self, token_id: &str, start_ts: i64, fidelity: u32) -> Result<Vec<PricePoint>> {
        let url = format!(
            "{}/prices-history?market={}&startTs={}&fidelity={}",
            self.base_url, token_id, start_ts, fidelity
        );
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(AppError::NoData(format!(
                "prices-history returned {}",
                resp.status()
            )));
        }
        let body: HistoryResponse = resp.json().await?;

        let mut points: Vec<PricePoint> = body
            .history
            .into_iter()
            .filter_map(RawPoint::validate)
            .collect();
        // The API sends ascending timestamps; don't rely on it.
        points.sort_by_key(|p| p.ts);
        Ok(points)
    }
}

impl HistoryProvider for ClobHistoryClient {
    async fn fetch_history(
        &self,
        request: &SeriesRequest,
        start_ts: Option<i64>,
        cancel: &CancellationToken,
    ) -> Option<SeriesHistory> {
        if cancel.is_cancelled() {
            return None;
        }

        let now = now_secs();
        let start = effective_start(start_ts, now);
        let fidelity = fidelity_for_lookback(now - start);

        let fetched = tokio::select! {
            _ = cancel.cancelled() => return None,
            res = self.fetch_raw(&request.token_id, start, fidelity) => res,
        };

        match fetched {
            Ok(points) if !points.is_empty() => {
                debug!(
                    token_id = %request.token_id,
                    points = points.len(),
                    "fetched price history"
                );
                Some(SeriesHistory {
                    series_id: request.token_id.clone(),
                    label: request.label.clone(),
                    history: points,
                    synthetic: false,
                })
            }
            Ok(_) => {
                warn!(
                    token_id = %request.token_id,
                    "prices-history returned no valid points, using synthetic series"
                );
                Some(synthetic::random_walk(request, now))
            }
            Err(e) => {
                warn!(
                    token_id = %request.token_id,
                    error = %e,
                    "price history fetch failed, using synthetic series"
                );
                Some(synthetic::random_walk(request, now))
            }
        }
    }
}

/// `start_ts` wins when it is set and not in the future; otherwise the fetch
/// reaches back the default lookback from now.
fn effective_start(start_ts: Option<i64>, now_secs: i64) -> i64 {
    match start_ts {
        Some(ts) if ts > 0 && ts <= now_secs => ts,
        _ => now_secs - DEFAULT_LOOKBACK_DAYS * 86_400,
    }
}

/// Minutes per point, scaled to the lookback so point counts stay bounded.
fn fidelity_for_lookback(lookback_secs: i64) -> u32 {
    if lookback_secs <= 86_400 {
        5
    } else if lookback_secs <= 7 * 86_400 {
        60
    } else {
        720
    }
}
