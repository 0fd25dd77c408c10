//! Small robust-statistics helpers for the detector's trailing windows.
//!
//! MAD is used instead of standard deviation deliberately: a bump *is*
//! an outlier in the vertical-acceleration series, so standard deviation
//! inflates with the very signal the detector is trying to isolate.

/// Arithmetic mean of an iterator of `f64`. Returns `0.0` for an empty
/// iterator (callers only use this on windows they've already checked
/// are non-empty, except where a zero fallback is the desired behavior).
pub fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Median of a slice, via a sorted copy. Panics on an empty slice —
/// callers gate on window size before calling this.
pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median absolute deviation around a given center.
pub fn median_absolute_deviation(values: &[f64], center: f64) -> f64 {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}
