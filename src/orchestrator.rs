use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MAX_CHART_SERIES;
use crate::history::fetch::HistoryProvider;
use crate::history::merge;
use crate::types::{MergedPoint, SeriesHistory, SeriesRequest};

/// Everything the renderer needs once a fetch group lands.
#[derive(Debug, Clone)]
pub struct ChartData {
    /// Per-series raw histories, in request order.
    pub series: Vec<SeriesHistory>,
    /// Unified forward-filled timeline over all series.
    pub merged: Vec<MergedPoint>,
    /// Default active-series selection (the first requested series).
    pub active: usize,
}

#[derive(Debug, Clone)]
pub enum ChartPhase {
    Idle,
    Loading,
    Ready(ChartData),
    Error(String),
}

/// Coordinates concurrent fetches of all requested series and drives the
/// `Idle → Loading → {Ready | Error}` phase machine published over a watch
/// channel.
///
/// Each fetch group shares one cancellation token; issuing a new group cancels
/// the previous token first, and only the most recently issued group may
/// commit a transition — a slow superseded group resolving late is a no-op.
pub struct ChartOrchestrator<P> {
    provider: Arc<P>,
    tx: watch::Sender<ChartPhase>,
    /// Generation of the most recently issued fetch group.
    latest_gen: Arc<AtomicU64>,
    /// Serializes generation checks against phase publishes, so a stale
    /// group can't pass the check and then commit after a newer group.
    commit: Arc<Mutex<()>>,
    current_cancel: Option<CancellationToken>,
}

impl<P: HistoryProvider> ChartOrchestrator<P> {
    pub fn new(provider: P) -> Self {
        let (tx, _) = watch::channel(ChartPhase::Idle);
        Self {
            provider: Arc::new(provider),
            tx,
            latest_gen: Arc::new(AtomicU64::new(0)),
            commit: Arc::new(Mutex::new(())),
            current_cancel: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ChartPhase> {
        self.tx.subscribe()
    }

    /// Cancel the in-flight fetch group, if any, without a phase transition.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.current_cancel.take() {
            cancel.cancel();
        }
    }

    /// Issue a new fetch group, superseding any in-flight one.
    pub fn request(&mut self, mut requests: Vec<SeriesRequest>, start_ts: Option<i64>) {
        if requests.len() > MAX_CHART_SERIES {
            warn!(
                requested = requests.len(),
                cap = MAX_CHART_SERIES,
                "truncating chart series request"
            );
            requests.truncate(MAX_CHART_SERIES);
        }

        self.cancel();
        let cancel = CancellationToken::new();
        self.current_cancel = Some(cancel.clone());

        let generation;
        {
            let _guard = self.commit.lock().unwrap_or_else(|e| e.into_inner());
            generation = self.latest_gen.fetch_add(1, Ordering::SeqCst) + 1;
            self.tx.send_replace(ChartPhase::Loading);
        }
        debug!(generation, series = requests.len(), "fetch group issued");

        let provider = Arc::clone(&self.provider);
        let latest_gen = Arc::clone(&self.latest_gen);
        let commit = Arc::clone(&self.commit);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let fetches = requests.iter().map(|request| {
                let provider = Arc::clone(&provider);
                let cancel = cancel.clone();
                async move { provider.fetch_history(request, start_ts, &cancel).await }
            });
            let results = join_all(fetches).await;

            // Cancelled results (None) and empty histories are discarded.
            let series: Vec<SeriesHistory> = results
                .into_iter()
                .flatten()
                .filter(|s| !s.history.is_empty())
                .collect();

            let phase = if series.is_empty() {
                ChartPhase::Error("no valid market data available".to_string())
            } else {
                let merged = merge::merge(&series);
                info!(
                    generation,
                    series = series.len(),
                    points = merged.len(),
                    "chart data ready"
                );
                ChartPhase::Ready(ChartData {
                    series,
                    merged,
                    active: 0,
                })
            };

            let _guard = commit.lock().unwrap_or_else(|e| e.into_inner());
            if cancel.is_cancelled() || latest_gen.load(Ordering::SeqCst) != generation {
                debug!(generation, "fetch group superseded, discarding results");
                return;
            }
            tx.send_replace(phase);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PricePoint;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Scripted provider: per-token delay and points, no network.
    struct StubProvider {
        scripts: HashMap<String, (Duration, Vec<PricePoint>)>,
    }

    impl StubProvider {
        fn new(scripts: &[(&str, u64, &[(i64, f64)])]) -> Self {
            Self {
                scripts: scripts
                    .iter()
                    .map(|&(id, delay_ms, points)| {
                        let points = points
                            .iter()
                            .map(|&(ts, price)| PricePoint { ts, price })
                            .collect();
                        (id.to_string(), (Duration::from_millis(delay_ms), points))
                    })
                    .collect(),
            }
        }
    }

    impl HistoryProvider for StubProvider {
        async fn fetch_history(
            &self,
            request: &SeriesRequest,
            _start_ts: Option<i64>,
            cancel: &CancellationToken,
        ) -> Option<SeriesHistory> {
            let (delay, points) = self.scripts.get(&request.token_id)?.clone();
            tokio::select! {
                _ = cancel.cancelled() => None,
                _ = tokio::time::sleep(delay) => Some(SeriesHistory {
                    series_id: request.token_id.clone(),
                    label: request.label.clone(),
                    history: points,
                    synthetic: false,
                }),
            }
        }
    }

    fn req(id: &str) -> SeriesRequest {
        SeriesRequest {
            token_id: id.to_string(),
            label: id.to_string(),
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_group_lands_ready_with_merged_data() {
        let provider = StubProvider::new(&[
            ("a", 10, &[(0, 0.5), (10, 0.6)]),
            ("b", 20, &[(5, 0.3)]),
        ]);
        let mut orch = ChartOrchestrator::new(provider);
        let rx = orch.subscribe();

        orch.request(vec![req("a"), req("b")], None);
        settle().await;

        let phase = rx.borrow().clone();
        match &phase {
            ChartPhase::Ready(data) => {
                assert_eq!(data.series.len(), 2);
                assert_eq!(data.merged.len(), 3);
                assert_eq!(data.active, 0);
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_group_never_overwrites_newer_state() {
        let provider = StubProvider::new(&[
            ("slow", 400, &[(0, 0.1)]),
            ("fast", 10, &[(0, 0.9)]),
        ]);
        let mut orch = ChartOrchestrator::new(provider);
        let rx = orch.subscribe();

        orch.request(vec![req("slow")], None);
        orch.request(vec![req("fast")], None);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let phase = rx.borrow().clone();
        match &phase {
            ChartPhase::Ready(data) => assert_eq!(data.series[0].series_id, "fast"),
            other => panic!("expected fast group Ready, got {other:?}"),
        }

        // Let the slow group's deadline pass; its commit must be a no-op.
        settle().await;
        let phase = rx.borrow().clone();
        match &phase {
            ChartPhase::Ready(data) => assert_eq!(data.series[0].series_id, "fast"),
            other => panic!("slow group overwrote state: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_group_makes_no_transition() {
        let provider = StubProvider::new(&[("a", 100, &[(0, 0.5)])]);
        let mut orch = ChartOrchestrator::new(provider);
        let rx = orch.subscribe();

        orch.request(vec![req("a")], None);
        orch.cancel();
        settle().await;

        assert!(
            matches!(&*rx.borrow(), ChartPhase::Loading),
            "cancelled group must leave the phase untouched"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn all_empty_results_transition_to_error() {
        let provider = StubProvider::new(&[("a", 10, &[])]);
        let mut orch = ChartOrchestrator::new(provider);
        let rx = orch.subscribe();

        orch.request(vec![req("a")], None);
        settle().await;

        let phase = rx.borrow().clone();
        match &phase {
            ChartPhase::Error(cause) => assert_eq!(cause, "no valid market data available"),
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn requests_beyond_cap_are_truncated() {
        let provider = StubProvider::new(&[
            ("a", 10, &[(0, 0.1)]),
            ("b", 10, &[(0, 0.2)]),
            ("c", 10, &[(0, 0.3)]),
            ("d", 10, &[(0, 0.4)]),
            ("e", 10, &[(0, 0.5)]),
        ]);
        let mut orch = ChartOrchestrator::new(provider);
        let rx = orch.subscribe();

        orch.request(
            vec![req("a"), req("b"), req("c"), req("d"), req("e")],
            None,
        );
        settle().await;

        let phase = rx.borrow().clone();
        match &phase {
            ChartPhase::Ready(data) => {
                assert_eq!(data.series.len(), MAX_CHART_SERIES);
                assert!(data.series.iter().all(|s| s.series_id != "e"));
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }
}
