use ratatui::style::Color;

use crate::config::MAX_CHART_SERIES;
use crate::types::{MergedPoint, TimeWindow};

/// Fixed palette, one color per charted series slot.
pub const SERIES_COLORS: [Color; MAX_CHART_SERIES] =
    [Color::Cyan, Color::Yellow, Color::Magenta, Color::Green];

pub fn series_color(idx: usize) -> Color {
    SERIES_COLORS[idx % SERIES_COLORS.len()]
}

/// Plot points for one series over the filtered timeline, skipping rows where
/// the series has not yet been observed. X is the timestamp in milliseconds.
pub fn series_points(filtered: &[MergedPoint], idx: usize) -> Vec<(f64, f64)> {
    filtered
        .iter()
        .filter_map(|p| p.values.get(idx).copied().flatten().map(|v| (p.ts_ms as f64, v)))
        .collect()
}

pub fn x_bounds(filtered: &[MergedPoint]) -> [f64; 2] {
    match (filtered.first(), filtered.last()) {
        (Some(first), Some(last)) if last.ts_ms > first.ts_ms => {
            [first.ts_ms as f64, last.ts_ms as f64]
        }
        (Some(only), _) => [only.ts_ms as f64 - 1.0, only.ts_ms as f64 + 1.0],
        _ => [0.0, 1.0],
    }
}

/// First / middle / last tick labels for the x axis.
pub fn x_labels(filtered: &[MergedPoint], window: TimeWindow) -> Vec<String> {
    if filtered.is_empty() {
        return Vec::new();
    }
    let mid = filtered[filtered.len() / 2].ts_ms;
    vec![
        format_tick(filtered[0].ts_ms, window),
        format_tick(mid, window),
        format_tick(filtered[filtered.len() - 1].ts_ms, window),
    ]
}

/// Axis tick label adapted to the window granularity: sub-day windows show
/// hour:minute, wider windows show month/day.
pub fn format_tick(ts_ms: i64, window: TimeWindow) -> String {
    let secs = ts_ms / 1000;
    match window {
        TimeWindow::OneDay => {
            let (h, m) = hour_minute(secs);
            format!("{h:02}:{m:02}")
        }
        _ => {
            let (month, day) = month_day(secs);
            format!("{month}/{day}")
        }
    }
}

fn hour_minute(secs: i64) -> (u32, u32) {
    let s = secs.rem_euclid(86_400);
    ((s / 3600) as u32, ((s % 3600) / 60) as u32)
}

/// Civil month/day from a Unix timestamp (proleptic Gregorian).
fn month_day(secs: i64) -> (u32, u32) {
    let days = secs.div_euclid(86_400);
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    (month as u32, day as u32)
}
