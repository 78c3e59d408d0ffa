use std::time::{SystemTime, UNIX_EPOCH};

// ---------------------------------------------------------------------------
// Price points & series
// ---------------------------------------------------------------------------

/// One observed price of a binary-outcome market share. Immutable once fetched.
/// The wire shape lives in `history::fetch`; this is the validated form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    /// Unix seconds.
    pub ts: i64,
    /// Share price in [0, 1].
    pub price: f64,
}

/// One market the caller wants charted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub token_id: String,
    pub label: String,
}

/// Raw price history for one market, for the duration of one fetch cycle.
/// Replaced wholesale on every re-fetch.
#[derive(Debug, Clone)]
pub struct SeriesHistory {
    pub series_id: String,
    pub label: String,
    /// Ascending by ts. Intervals may be irregular and differ across series.
    pub history: Vec<PricePoint>,
    /// True if this series came from the synthetic fallback, not the API.
    pub synthetic: bool,
}

// ---------------------------------------------------------------------------
// Merged timeline
// ---------------------------------------------------------------------------

/// One row of the unified timeline: the union timestamp plus each series'
/// last-known value in percent. `None` only before a series' first point.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedPoint {
    /// Unix milliseconds.
    pub ts_ms: i64,
    /// Indexed in input-series order. Percent in [0, 100], forward-filled.
    pub values: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// Time windows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    OneDay,
    OneWeek,
    OneMonth,
    All,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 4] = [
        TimeWindow::OneDay,
        TimeWindow::OneWeek,
        TimeWindow::OneMonth,
        TimeWindow::All,
    ];

    /// Required lookback in seconds. `All` has none.
    pub fn duration_secs(self) -> Option<i64> {
        match self {
            TimeWindow::OneDay => Some(86_400),
            TimeWindow::OneWeek => Some(7 * 86_400),
            TimeWindow::OneMonth => Some(30 * 86_400),
            TimeWindow::All => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::OneDay => "1D",
            TimeWindow::OneWeek => "1W",
            TimeWindow::OneMonth => "1M",
            TimeWindow::All => "ALL",
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Derived stats
// ---------------------------------------------------------------------------

/// Headline numbers for one series over the active window. Recomputed whenever
/// the window or the underlying data changes; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowStats {
    pub series_id: String,
    /// Last price in the window, percent [0, 100].
    pub current_value: f64,
    /// Percentage-point change vs the first point of the window.
    pub change_absolute: f64,
    pub is_positive: bool,
    /// False when the series has no data spanning the window.
    pub available: bool,
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
