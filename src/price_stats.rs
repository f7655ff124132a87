use crate::models::{PriceObservation, PriceStats};

/// Summarize a chronologically ordered price series. Returns `None` for
/// an empty series — absence of data is not an error.
///
/// The input ordering is the caller's contract (the storage collaborator
/// returns observations in recording order); no sorting happens here.
/// `delta_percent` is defined as 0 when the baseline price is 0.
pub fn compute_stats(series: &[PriceObservation]) -> Option<PriceStats> {
    let first = series.first()?.price;
    let current = series.last()?.price;

    let mut min = i64::MAX;
    let mut max = i64::MIN;
    for observation in series {
        min = min.min(observation.price);
        max = max.max(observation.price);
    }

    let delta = current - first;
    let delta_percent = if first == 0 {
        0.0
    } else {
        delta as f64 / first as f64 * 100.0
    };

    Some(PriceStats {
        min,
        max,
        current,
        first,
        delta,
        delta_percent,
        sample_count: series.len(),
    })
}
