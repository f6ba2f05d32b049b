//! Posterior predictive simulation and its per-observation summaries.
//!
//! For merged posterior draws (aᵢ, bᵢ) and centered explanatory values x̃ⱼ, one
//! replicate count is drawn per pair: ỹᵢⱼ ∼ Poisson(exp(aᵢ + bᵢ·x̃ⱼ)).

use crate::error::{GlmError, Result};
use crate::stats;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use rand::distributions::Distribution;
use serde::{Deserialize, Serialize};
use statrs::distribution::Poisson;

#[cfg(feature = "rayon")]
use rand::SeedableRng;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Interval and point summaries of the posterior predictive distribution, one entry
/// per observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveSummary {
    pub level: f64,
    pub x_centered: Vec<f64>,
    /// Lower predictive bound (quantile at (1 - level) / 2)
    pub lower: Vec<f64>,
    /// Upper predictive bound (quantile at (1 + level) / 2)
    pub upper: Vec<f64>,
    /// Plug-in curve exp(mean(a) + mean(b)·x̃), without Poisson noise
    pub mean_curve: Vec<f64>,
}

/// Draw a single count from Poisson(`rate`).
///
/// A rate that underflows to zero yields zero; an infinite or NaN rate is an error.
fn draw_count<R: Rng + ?Sized>(rng: &mut R, rate: f64) -> Result<u64> {
    if rate == 0.0 {
        return Ok(0);
    }
    if !rate.is_finite() {
        return Err(GlmError::InvalidParameter(format!(
            "Poisson rate {rate} is not finite"
        )));
    }
    let poisson = Poisson::new(rate)
        .map_err(|e| GlmError::InvalidParameter(format!("Poisson({rate}): {e}")))?;
    let k: f64 = poisson.sample(rng);
    Ok(k as u64)
}

fn check_draws(draws: &ArrayView2<'_, f64>) -> Result<()> {
    if draws.ncols() != 2 {
        return Err(GlmError::InvalidParameter(format!(
            "expected (intercept, slope) columns, got {}",
            draws.ncols()
        )));
    }
    Ok(())
}

fn simulate_row<R: Rng + ?Sized>(
    rng: &mut R,
    a: f64,
    b: f64,
    x_centered: &ArrayView1<'_, f64>,
) -> Result<Vec<u64>> {
    x_centered
        .iter()
        .map(|&x| draw_count(rng, (a + b * x).exp()))
        .collect()
}

/// Simulate the `(draws × observations)` posterior predictive matrix.
///
/// `draws` holds merged posterior draws with the intercept in column 0 and the slope
/// in column 1.
///
/// # Errors
/// [`GlmError::InvalidParameter`] if `draws` does not have two columns or a rate is
/// not finite.
pub fn simulate_predictive<R: Rng + ?Sized>(
    draws: ArrayView2<'_, f64>,
    x_centered: ArrayView1<'_, f64>,
    rng: &mut R,
) -> Result<Array2<u64>> {
    check_draws(&draws)?;
    let n_obs = x_centered.len();
    let mut out = Array2::<u64>::zeros((draws.nrows(), n_obs));
    for (draw, mut row) in draws.outer_iter().zip(out.outer_iter_mut()) {
        let counts = simulate_row(rng, draw[0], draw[1], &x_centered)?;
        row.assign(&Array1::from_vec(counts));
    }
    Ok(out)
}

/// Simulate the posterior predictive matrix in parallel.
///
/// A seed is drawn from `rng` and every chunk of draws gets its own RNG seeded from
/// it, so the result depends only on the state of `rng`, not on thread scheduling.
#[cfg(feature = "rayon")]
pub fn simulate_predictive_par_deterministic<R: SeedableRng + Rng>(
    draws: ArrayView2<'_, f64>,
    x_centered: ArrayView1<'_, f64>,
    rng: &mut R,
) -> Result<Array2<u64>> {
    check_draws(&draws)?;
    let n_obs = x_centered.len();
    let seed = rng.next_u64();

    const CHUNK_ROWS: usize = 32;
    let blocks: Vec<ArrayView2<'_, f64>> = draws.axis_chunks_iter(Axis(0), CHUNK_ROWS).collect();
    let chunks: Vec<Vec<u64>> = blocks
        .into_par_iter()
        .enumerate()
        .map(|(i, chunk)| -> Result<Vec<u64>> {
            let mut chunk_rng = R::seed_from_u64(seed.wrapping_add(i as u64));
            let mut flat = Vec::with_capacity(chunk.nrows() * n_obs);
            for draw in chunk.outer_iter() {
                flat.extend(simulate_row(&mut chunk_rng, draw[0], draw[1], &x_centered)?);
            }
            Ok(flat)
        })
        .collect::<Result<_>>()?;

    let flat: Vec<u64> = chunks.into_iter().flatten().collect();
    Ok(Array2::from_shape_vec((draws.nrows(), n_obs), flat)?)
}

/// Summarise a predictive matrix per observation.
///
/// `coefficient_means` are the posterior means of (a, b) used for the plug-in curve.
///
/// # Panics
/// If `predictive` has no rows or its column count differs from `x_centered`.
pub fn summarize_predictive(
    predictive: ArrayView2<'_, u64>,
    x_centered: ArrayView1<'_, f64>,
    coefficient_means: &[f64],
    level: f64,
) -> PredictiveSummary {
    assert_eq!(
        predictive.ncols(),
        x_centered.len(),
        "one predictive column per observation"
    );
    let (lower, upper): (Vec<f64>, Vec<f64>) = predictive
        .axis_iter(Axis(1))
        .map(|col| {
            let values: Vec<f64> = col.iter().map(|&k| k as f64).collect();
            stats::equal_tailed_interval(&values, level)
        })
        .unzip();

    PredictiveSummary {
        level,
        x_centered: x_centered.to_vec(),
        lower,
        upper,
        mean_curve: mean_curve(x_centered, coefficient_means),
    }
}

/// exp(a + b·x̃) for every x̃.
pub fn mean_curve(x_centered: ArrayView1<'_, f64>, coefficients: &[f64]) -> Vec<f64> {
    let (a, b) = (coefficients[0], coefficients[1]);
    x_centered.iter().map(|&x| (a + b * x).exp()).collect()
}

impl PredictiveSummary {
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Fraction of observed counts lying inside their predictive interval.
    pub fn coverage(&self, counts: &[u64]) -> f64 {
        let inside = counts
            .iter()
            .zip(self.lower.iter().zip(&self.upper))
            .filter(|&(&k, (&lo, &hi))| lo <= k as f64 && k as f64 <= hi)
            .count();
        inside as f64 / counts.len() as f64
    }
}
