use crate::history::window;
use crate::orchestrator::{ChartData, ChartPhase};
use crate::types::{now_secs, MergedPoint, SeriesRequest, TimeWindow, WindowStats};

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

pub struct AppState {
    /// Latest phase snapshot from the orchestrator's watch channel.
    pub phase: ChartPhase,
    pub window: TimeWindow,
    /// Index of the emphasized series.
    pub active: usize,
    /// Crosshair index into the filtered timeline. None = no inspection.
    pub cursor: Option<usize>,
    pub requests: Vec<SeriesRequest>,
    pub start_ts: Option<i64>,
}

impl AppState {
    pub fn new(requests: Vec<SeriesRequest>, start_ts: Option<i64>) -> Self {
        Self {
            phase: ChartPhase::Idle,
            window: TimeWindow::All,
            active: 0,
            cursor: None,
            requests,
            start_ts,
        }
    }

    /// Adopt a new phase. On Ready the crosshair resets, the active series is
    /// clamped to the fetched set, and the window drops back to `All` if the
    /// fresh data no longer spans it.
    pub fn apply_phase(&mut self, phase: ChartPhase) {
        if let ChartPhase::Ready(data) = &phase {
            self.cursor = None;
            if self.active >= data.series.len() {
                self.active = data.active;
            }
            if !window::window_available(self.window, &data.merged, now_secs()) {
                self.window = TimeWindow::All;
            }
        }
        self.phase = phase;
    }

    pub fn data(&self) -> Option<&ChartData> {
        match &self.phase {
            ChartPhase::Ready(data) => Some(data),
            _ => None,
        }
    }

    /// The merged timeline restricted to the active window.
    pub fn filtered(&self) -> &[MergedPoint] {
        self.data()
            .map(|d| window::filter_window(&d.merged, self.window, now_secs()))
            .unwrap_or(&[])
    }

    /// Switch windows; refused (returning false) while loading or when the
    /// data doesn't span the requested window.
    pub fn select_window(&mut self, requested: TimeWindow) -> bool {
        let available = self
            .data()
            .map(|d| window::window_available(requested, &d.merged, now_secs()))
            .unwrap_or(false);
        if available {
            self.window = requested;
            self.cursor = None;
        }
        available
    }

    pub fn cycle_active(&mut self) {
        let len = self.data().map(|d| d.series.len()).unwrap_or(0);
        if len > 0 {
            self.active = (self.active + 1) % len;
        }
    }

    /// Move the crosshair; entering inspection starts at the latest point.
    pub fn move_cursor(&mut self, delta: i64) {
        let len = self.filtered().len();
        if len == 0 {
            return;
        }
        let next = match self.cursor {
            None => len - 1,
            Some(i) => (i as i64 + delta).clamp(0, len as i64 - 1) as usize,
        };
        self.cursor = Some(next);
    }

    pub fn clear_cursor(&mut self) {
        self.cursor = None;
    }

    /// Per-series headline stats for the active window, in series order.
    pub fn stats(&self) -> Vec<WindowStats> {
        let now = now_secs();
        self.data()
            .map(|d| {
                d.series
                    .iter()
                    .map(|s| window::series_stats(s, self.window, now))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Reasons for disabled windows, for the footer. (window, reason) pairs.
    pub fn disabled_windows(&self) -> Vec<(TimeWindow, String)> {
        let Some(data) = self.data() else {
            return Vec::new();
        };
        let now = now_secs();
        TimeWindow::ALL
            .iter()
            .filter_map(|&w| window::unavailable_reason(w, &data.merged, now).map(|r| (w, r)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn format_value(v: f64) -> String {
    format!("{v:.1}%")
}

pub fn format_change(stats: &WindowStats) -> String {
    format!("{:+.1}", stats.change_absolute)
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PricePoint, SeriesHistory};

    fn ready_state(ages_secs: &[i64]) -> AppState {
        let now = now_secs();
        // Ages oldest-first, so the history comes out ascending.
        let history: Vec<PricePoint> = ages_secs
            .iter()
            .map(|age| PricePoint { ts: now - age, price: 0.5 })
            .collect();
        let series = vec![SeriesHistory {
            series_id: "a".to_string(),
            label: "A".to_string(),
            history,
            synthetic: false,
        }];
        let merged = crate::history::merge::merge(&series);
        let mut app = AppState::new(
            vec![SeriesRequest { token_id: "a".to_string(), label: "A".to_string() }],
            None,
        );
        app.apply_phase(ChartPhase::Ready(ChartData { series, merged, active: 0 }));
        app
    }

    #[test]
    fn unavailable_window_is_not_selectable() {
        // 3 hours of data: OneDay must stay disabled.
        let mut app = ready_state(&[3 * 3600, 0]);
        assert!(!app.select_window(TimeWindow::OneDay));
        assert_eq!(app.window, TimeWindow::All);
        assert_eq!(app.disabled_windows().len(), 3);
    }

    #[test]
    fn available_window_selects_and_resets_cursor() {
        let mut app = ready_state(&[10 * 86_400, 0]);
        app.move_cursor(0);
        assert!(app.select_window(TimeWindow::OneWeek));
        assert_eq!(app.window, TimeWindow::OneWeek);
        assert_eq!(app.cursor, None);
    }

    #[test]
    fn refetch_drops_window_no_longer_spanned() {
        let mut app = ready_state(&[10 * 86_400, 0]);
        assert!(app.select_window(TimeWindow::OneWeek));

        // New data from a younger market arrives.
        let young = ready_state(&[3600, 0]);
        app.apply_phase(young.phase);
        assert_eq!(app.window, TimeWindow::All);
    }

    #[test]
    fn cursor_enters_at_latest_point_and_clamps() {
        let mut app = ready_state(&[7200, 3600, 0]);
        app.move_cursor(-1);
        assert_eq!(app.cursor, Some(2));
        app.move_cursor(-1);
        assert_eq!(app.cursor, Some(1));
        app.move_cursor(-5);
        assert_eq!(app.cursor, Some(0));
        app.move_cursor(10);
        assert_eq!(app.cursor, Some(2));
    }

    #[test]
    fn truncate_handles_multibyte_labels() {
        assert_eq!(truncate("BTC über 100k läuft", 8), "BTC übe…");
        assert_eq!(truncate("short", 8), "short");
    }
}
