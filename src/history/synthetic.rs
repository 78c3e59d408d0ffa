use rand::Rng;

use crate::config::{synthetic_walk, SYNTHETIC_LOOKBACK_DAYS};
use crate::types::{PricePoint, SeriesHistory, SeriesRequest};

/// Random-walk stand-in for a market whose history could not be fetched.
///
/// Always emits one point per day for days `SYNTHETIC_LOOKBACK_DAYS` down to 0
/// inclusive, so downstream merge/stats code never sees an empty or partial
/// series from the fallback path. Seed price is uniform in [0.3, 0.7], each
/// day steps by a bounded walk in [-0.05, +0.05], clamped to [0.05, 0.95].
pub fn random_walk(request: &SeriesRequest, now_secs: i64) -> SeriesHistory {
    let mut rng = rand::thread_rng();
    let mut price = rng.gen_range(synthetic_walk::SEED_MIN..=synthetic_walk::SEED_MAX);

    let mut history = Vec::with_capacity(SYNTHETIC_LOOKBACK_DAYS as usize + 1);
    for days_back in (0..=SYNTHETIC_LOOKBACK_DAYS).rev() {
        history.push(PricePoint {
            ts: now_secs - days_back * 86_400,
            price,
        });
        let step = rng.gen_range(-synthetic_walk::STEP_MAX..=synthetic_walk::STEP_MAX);
        price = (price + step).clamp(synthetic_walk::CLAMP_MIN, synthetic_walk::CLAMP_MAX);
    }

    SeriesHistory {
        series_id: request.token_id.clone(),
        label: request.label.clone(),
        history,
        synthetic: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SeriesRequest {
        SeriesRequest {
            token_id: "token1".to_string(),
            label: "Test market".to_string(),
        }
    }

    #[test]
    fn always_emits_full_window() {
        let now = 1_700_000_000;
        let series = random_walk(&request(), now);

        assert_eq!(series.history.len(), 91);
        assert!(series.synthetic);
        assert_eq!(series.history.first().unwrap().ts, now - 90 * 86_400);
        assert_eq!(series.history.last().unwrap().ts, now);
    }

    #[test]
    fn prices_stay_clamped() {
        // The walk is random; run it a few times to cover different seeds.
        for _ in 0..20 {
            let series = random_walk(&request(), 1_700_000_000);
            for p in &series.history {
                assert!(p.price >= 0.05 && p.price <= 0.95, "price {} out of range", p.price);
            }
        }
    }

    #[test]
    fn timestamps_strictly_increase() {
        let series = random_walk(&request(), 1_700_000_000);
        for pair in series.history.windows(2) {
            assert!(pair[0].ts < pair[1].ts);
        }
    }
}
