use std::collections::{BTreeSet, HashMap};

use crate::types::{MergedPoint, SeriesHistory};

/// Align independently-timestamped series onto one unified timeline.
///
/// The output timestamp set is the exact union of all input timestamps,
/// sorted ascending with duplicates collapsed. Each row carries every series'
/// last-known value in percent (price × 100), forward-filled across gaps;
/// `None` appears only before a series' first observation.
///
/// O(T log T + T·N) for T distinct timestamps and N series: the union is a
/// `BTreeSet`, exact-timestamp lookups are per-series hash maps.
pub fn merge(series: &[SeriesHistory]) -> Vec<MergedPoint> {
    let mut timestamps = BTreeSet::new();
    for s in series {
        for p in &s.history {
            timestamps.insert(p.ts);
        }
    }
    if timestamps.is_empty() {
        return Vec::new();
    }

    let lookups: Vec<HashMap<i64, f64>> = series
        .iter()
        .map(|s| s.history.iter().map(|p| (p.ts, p.price * 100.0)).collect())
        .collect();

    let mut last_known: Vec<Option<f64>> = vec![None; series.len()];
    let mut merged = Vec::with_capacity(timestamps.len());
    for ts in timestamps {
        for (slot, lookup) in last_known.iter_mut().zip(&lookups) {
            if let Some(&value) = lookup.get(&ts) {
                *slot = Some(value);
            }
        }
        merged.push(MergedPoint {
            ts_ms: ts * 1000,
            values: last_known.clone(),
        });
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PricePoint;

    fn series(id: &str, points: &[(i64, f64)]) -> SeriesHistory {
        SeriesHistory {
            series_id: id.to_string(),
            label: id.to_string(),
            history: points
                .iter()
                .map(|&(ts, price)| PricePoint { ts, price })
                .collect(),
            synthetic: false,
        }
    }

    #[test]
    fn two_series_forward_fill() {
        let a = series("a", &[(0, 0.5), (10, 0.6), (20, 0.4)]);
        let b = series("b", &[(5, 0.3), (15, 0.7)]);

        let merged = merge(&[a, b]);

        let ts: Vec<i64> = merged.iter().map(|p| p.ts_ms).collect();
        assert_eq!(ts, vec![0, 5_000, 10_000, 15_000, 20_000]);

        assert_eq!(merged[0].values, vec![Some(50.0), None]);
        assert_eq!(merged[1].values, vec![Some(50.0), Some(30.0)]);
        assert_eq!(merged[2].values, vec![Some(60.0), Some(30.0)]);
        assert_eq!(merged[3].values, vec![Some(60.0), Some(70.0)]);
        assert_eq!(merged[4].values, vec![Some(40.0), Some(70.0)]);
    }

    #[test]
    fn union_is_sorted_and_deduplicated() {
        let a = series("a", &[(10, 0.5), (20, 0.6)]);
        let b = series("b", &[(10, 0.3), (15, 0.7), (20, 0.8)]);

        let merged = merge(&[a, b]);
        let ts: Vec<i64> = merged.iter().map(|p| p.ts_ms).collect();
        assert_eq!(ts, vec![10_000, 15_000, 20_000]);
    }

    #[test]
    fn value_never_reverts_to_none_after_first_observation() {
        let a = series("a", &[(5, 0.5)]);
        let b = series("b", &[(0, 0.2), (10, 0.3), (20, 0.4)]);

        let merged = merge(&[a, b]);
        assert_eq!(merged[0].values[0], None);
        for point in &merged[1..] {
            assert_eq!(point.values[0], Some(50.0));
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(merge(&[]).is_empty());
        assert!(merge(&[series("a", &[]), series("b", &[])]).is_empty());
    }

    #[test]
    fn empty_series_beside_populated_one_stays_none() {
        let a = series("a", &[]);
        let b = series("b", &[(0, 0.25)]);

        let merged = merge(&[a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].values, vec![None, Some(25.0)]);
    }
}
