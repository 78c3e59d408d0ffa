use crate::types::{MergedPoint, SeriesHistory, TimeWindow, WindowStats};

/// Restrict the merged timeline to the active window.
///
/// `All` returns the input unchanged. Bounded windows keep points with
/// `ts_ms >= now - duration`; if that leaves nothing (a market younger than
/// the window), the entire unfiltered sequence is returned so a freshly
/// created market still renders.
pub fn filter_window(merged: &[MergedPoint], window: TimeWindow, now_secs: i64) -> &[MergedPoint] {
    let Some(duration) = window.duration_secs() else {
        return merged;
    };
    let cutoff_ms = (now_secs - duration) * 1000;
    let start = merged.partition_point(|p| p.ts_ms < cutoff_ms);
    if start == merged.len() {
        merged
    } else {
        &merged[start..]
    }
}

/// Headline numbers for one series over the active window.
///
/// The comparison baseline is the first point of the windowed range (falling
/// back to the whole history when the window holds no points), applied
/// uniformly regardless of how many series are charted.
pub fn series_stats(series: &SeriesHistory, window: TimeWindow, now_secs: i64) -> WindowStats {
    let history = &series.history;
    if history.is_empty() {
        return WindowStats {
            series_id: series.series_id.clone(),
            current_value: 0.0,
            change_absolute: 0.0,
            is_positive: false,
            available: false,
        };
    }

    let windowed = match window.duration_secs() {
        None => &history[..],
        Some(duration) => {
            let cutoff = now_secs - duration;
            let start = history.partition_point(|p| p.ts < cutoff);
            if start == history.len() {
                &history[..]
            } else {
                &history[start..]
            }
        }
    };

    let current_value = windowed.last().map(|p| p.price * 100.0).unwrap_or(0.0);
    let baseline = windowed.first().map(|p| p.price * 100.0).unwrap_or(0.0);
    let change_absolute = current_value - baseline;

    let available = match window.duration_secs() {
        None => true,
        Some(duration) => now_secs - history[0].ts >= duration,
    };

    WindowStats {
        series_id: series.series_id.clone(),
        current_value,
        change_absolute,
        is_positive: change_absolute >= 0.0,
        available,
    }
}

/// A bounded window is selectable only when the oldest merged point predates
/// the window's full span. `All` is always selectable.
pub fn window_available(window: TimeWindow, merged: &[MergedPoint], now_secs: i64) -> bool {
    let Some(duration) = window.duration_secs() else {
        return true;
    };
    match merged.first() {
        Some(oldest) => now_secs - oldest.ts_ms / 1000 >= duration,
        None => false,
    }
}

/// Why a window is disabled, for display next to the selector.
/// Returns `None` when the window is selectable.
pub fn unavailable_reason(
    window: TimeWindow,
    merged: &[MergedPoint],
    now_secs: i64,
) -> Option<String> {
    if window_available(window, merged, now_secs) {
        return None;
    }
    let duration = window.duration_secs()?;
    let have = merged
        .first()
        .map(|oldest| now_secs - oldest.ts_ms / 1000)
        .unwrap_or(0);
    Some(format!(
        "needs {} of history, have {}",
        format_age(duration),
        format_age(have),
    ))
}

/// "3h", "45m", "12d" — coarse age label for availability messages.
pub fn format_age(secs: i64) -> String {
    let secs = secs.max(0);
    if secs >= 86_400 {
        format!("{}d", secs / 86_400)
    } else if secs >= 3600 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}m", secs / 60)
    }
}
