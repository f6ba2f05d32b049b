//! Synthetic data from a known Poisson regression.
//!
//! The generative model is
//! - xᵢ ∼ Uniform(x_min, x_max), sorted ascending, then centered: x̃ᵢ = xᵢ − x̄
//! - λᵢ = exp(a + b·x̃ᵢ)
//! - yᵢ ∼ Poisson(λᵢ)

use crate::config::SimulationConfig;
use crate::error::{GlmError, Result};
use ndarray::{Array1, Array2, Axis, stack};
use rand::Rng;
use rand::distributions::Distribution;
use statrs::distribution::{Poisson, Uniform};
use tracing::debug;

/// Simulated observations, stored column-wise.
///
/// Row `i` of every column belongs to the same observation.
#[derive(Debug, Clone)]
pub struct SimulatedData {
    /// Raw explanatory values, sorted ascending
    pub x: Array1<f64>,
    /// Explanatory values minus their sample mean
    pub x_centered: Array1<f64>,
    /// Observed counts
    pub counts: Vec<u64>,
    /// Noise-free rate exp(a + b·x̃) used to draw each count
    pub true_rate: Array1<f64>,
    pub true_coefficients: Vec<f64>,
}

/// Draw a data set according to `config`.
///
/// # Errors
/// Returns [`GlmError::InvalidConfig`] for an invalid configuration and
/// [`GlmError::InvalidParameter`] if a rate is not a valid Poisson mean (for
/// example when `exp` overflows for extreme coefficients).
///
/// # Example
/// ```
/// # use rand::SeedableRng;
/// # use rand_chacha::ChaCha8Rng;
/// use poisson_glm::{SimulationConfig, simulate::simulate};
///
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
/// let data = simulate(&SimulationConfig::default(), &mut rng).unwrap();
/// assert_eq!(data.len(), 100);
/// ```
pub fn simulate<R: Rng + ?Sized>(config: &SimulationConfig, rng: &mut R) -> Result<SimulatedData> {
    config.validate()?;

    let uniform = Uniform::new(config.x_min, config.x_max).map_err(|e| {
        GlmError::InvalidParameter(format!("Uniform({}, {}): {e}", config.x_min, config.x_max))
    })?;
    let mut x: Vec<f64> = (0..config.n_obs).map(|_| uniform.sample(rng)).collect();
    crate::stats::sort_floats(&mut x);
    let x = Array1::from_vec(x);

    let x_bar = x.mean().unwrap_or(0.0);
    let x_centered = x.mapv(|v| v - x_bar);

    let true_rate = x_centered.mapv(|v| (config.true_intercept + config.true_slope * v).exp());
    let counts = true_rate
        .iter()
        .map(|&lambda| {
            if !lambda.is_finite() {
                return Err(GlmError::InvalidParameter(format!(
                    "Poisson rate {lambda} is not finite"
                )));
            }
            let poisson = Poisson::new(lambda)
                .map_err(|e| GlmError::InvalidParameter(format!("Poisson({lambda}): {e}")))?;
            let draw: f64 = poisson.sample(rng);
            Ok(draw as u64)
        })
        .collect::<Result<Vec<u64>>>()?;

    debug!(
        n_obs = config.n_obs,
        x_bar,
        total_count = counts.iter().sum::<u64>(),
        "simulated poisson data"
    );

    Ok(SimulatedData {
        x,
        x_centered,
        counts,
        true_rate,
        true_coefficients: config.true_coefficients(),
    })
}

impl SimulatedData {
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Counts as floats, the response vector handed to the sampler.
    pub fn response(&self) -> Array1<f64> {
        self.counts.iter().map(|&c| c as f64).collect()
    }

    /// Design matrix `[1, x̃]` of shape `(n_obs, 2)`.
    pub fn design_matrix(&self) -> Array2<f64> {
        let ones = Array1::<f64>::ones(self.len());
        stack(Axis(1), &[ones.view(), self.x_centered.view()])
            .expect("columns of a data set share its length")
    }

    /// Noise-free rate per observation, for overlaying the generating curve.
    pub fn true_curve(&self) -> &Array1<f64> {
        &self.true_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn reference_data(seed: u64) -> SimulatedData {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        simulate(&SimulationConfig::default(), &mut rng).unwrap()
    }

    #[test]
    fn centered_values_have_zero_mean() {
        let data = reference_data(1);
        assert_abs_diff_eq!(data.x_centered.mean().unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn explanatory_values_are_sorted_and_in_range() {
        let data = reference_data(2);
        assert!(data.x.windows(2).into_iter().all(|w| w[0] <= w[1]));
        assert!(data.x.iter().all(|&v| (5.0..8.0).contains(&v)));
    }

    #[test]
    fn rates_follow_the_log_link() {
        let data = reference_data(3);
        for (&xc, &rate) in data.x_centered.iter().zip(&data.true_rate) {
            assert_abs_diff_eq!(rate.ln(), 2.5 - 1.1 * xc, epsilon = 1e-10);
        }
    }

    #[test]
    fn counts_track_their_rates() {
        // Over many observations the mean count matches the mean rate.
        let cfg = SimulationConfig::default().with_n_obs(20_000);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let data = simulate(&cfg, &mut rng).unwrap();
        let mean_count = data.counts.iter().sum::<u64>() as f64 / data.len() as f64;
        let mean_rate = data.true_rate.mean().unwrap();
        assert!((mean_count - mean_rate).abs() / mean_rate < 0.03);
    }

    #[test]
    fn design_matrix_has_intercept_column() {
        let data = reference_data(5);
        let x = data.design_matrix();
        assert_eq!(x.dim(), (100, 2));
        assert!(x.column(0).iter().all(|&v| v == 1.0));
        assert_eq!(x.column(1), data.x_centered);
    }

    #[test]
    fn same_seed_same_data() {
        assert_eq!(reference_data(9).counts, reference_data(9).counts);
    }

    #[test]
    fn invalid_range_is_rejected() {
        let cfg = SimulationConfig::default().with_range(3.0, 3.0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(simulate(&cfg, &mut rng).is_err());
    }
}
