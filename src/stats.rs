//! Quantile-based interval summaries over posterior and predictive draws.

use std::cmp::Ordering;

pub(crate) fn sort_floats(xs: &mut [f64]) {
    xs.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

/// Quantile of already sorted data using linear interpolation between order
/// statistics (Hyndman & Fan type 7, the default of R's `quantile`).
///
/// # Panics
/// Panics if `sorted` is empty or `p` is outside `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty(), "quantile of an empty sample");
    assert!((0.0..=1.0).contains(&p), "quantile probability must be in [0, 1]");
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Type-7 quantiles of unsorted data.
pub fn quantiles(xs: &[f64], probs: &[f64]) -> Vec<f64> {
    let mut sorted = xs.to_vec();
    sort_floats(&mut sorted);
    probs.iter().map(|&p| quantile_sorted(&sorted, p)).collect()
}

/// Equal-tailed interval holding `level` of the mass.
pub fn equal_tailed_interval(xs: &[f64], level: f64) -> (f64, f64) {
    let tail = (1.0 - level) / 2.0;
    let q = quantiles(xs, &[tail, 1.0 - tail]);
    (q[0], q[1])
}

/// Highest posterior density interval: the narrowest window of sorted draws
/// spanning `round(level * n)` gaps, as in `coda::HPDinterval`.
pub fn hpd_interval(xs: &[f64], level: f64) -> (f64, f64) {
    assert!(!xs.is_empty(), "HPD interval of an empty sample");
    let mut sorted = xs.to_vec();
    sort_floats(&mut sorted);
    let n = sorted.len();
    if n == 1 {
        return (sorted[0], sorted[0]);
    }
    let gap = ((n as f64 * level).round() as usize).clamp(1, n - 1);

    let (best, _) = (0..n - gap)
        .map(|i| (i, sorted[i + gap] - sorted[i]))
        .fold((0, f64::INFINITY), |acc, (i, width)| {
            if width < acc.1 { (i, width) } else { acc }
        });
    (sorted[best], sorted[best + gap])
}
