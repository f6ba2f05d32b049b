//! Bayesian Poisson regression with a log link.
//!
//! # Model
//! - yᵢ | β ∼ Poisson(exp(xᵢᵀβ))
//! - βₖ ∼ N(0, 1/τ) independently, with prior precision τ
//!
//! The chains are driven by `mini-mcmc`'s [`GibbsSampler`]. Each sweep updates one
//! coefficient at a time from its full conditional
//!
//! log p(βₖ | β₋ₖ, y) = Σᵢ [yᵢ ηᵢ − exp(ηᵢ)] − τ βₖ² / 2 + const,
//!
//! which is log-concave; the update draws from it exactly with a slice sampler.

use super::slice::{SliceDraws, slice_sample};
use crate::error::{GlmError, Result};
use crate::posterior::PosteriorSamples;
use crate::rng::RngDraw;
use mini_mcmc::core::{ChainRunner, init_det};
use mini_mcmc::distributions::Conditional;
use mini_mcmc::gibbs::GibbsSampler;
use mini_mcmc::stats::RunStats;
use ndarray::{Array1, Array2, Array3, ArrayView3, Axis, concatenate, s};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, info_span};

/// Initial bracket of the slice updates, on the coefficient scale
const SLICE_WIDTH: f64 = 1.0;
/// Upper bound on stepping-out moves per update
const MAX_STEP_OUT: usize = 32;
/// Standard deviation of the over-dispersed chain starting points
const INIT_SCALE: f64 = 1.0;

/// A Gibbs sampler for Bayesian Poisson regression.
///
/// Every chain gets its own random stream, split off the sampler's RNG, and its own
/// over-dispersed starting point, so the between-chain variance used by R-hat is
/// meaningful.
///
/// # Type Parameters
/// * `R` - The random number generator type (defaults to `ChaCha8Rng`)
///
/// # Example
/// ```no_run
/// # use ndarray::{array, Array2};
/// # use rand::{Rng, SeedableRng};
/// # use rand_chacha::ChaCha8Rng;
/// # use statrs::distribution::Poisson;
/// use poisson_glm::regression::GibbsPoisson;
///
/// let n = 100;
/// let mut rng = ChaCha8Rng::seed_from_u64(42);
///
/// // Intercept column plus one centered predictor
/// let x = Array2::from_shape_fn((n, 2), |(_, j)| {
///     if j == 0 { 1.0 } else { rng.r#gen::<f64>() - 0.5 }
/// });
/// let true_beta = array![1.0, 0.8];
/// let y = x.dot(&true_beta).mapv(|eta| {
///     let k: f64 = rng.sample(Poisson::new(eta.exp()).unwrap());
///     k
/// });
///
/// let model = GibbsPoisson::new(x, y, 0.001, 3, 42);
/// let results = model
///     .run(1_000, 2_000, 2, Some(true_beta.to_vec()))
///     .expect("MCMC failed");
/// results.summary();
/// ```
pub struct GibbsPoisson<R = ChaCha8Rng>
where
    R: SeedableRng + Rng + Clone + Send + Sync,
{
    /// Design matrix (n_obs × p)
    x: Array2<f64>,
    /// Count response vector (n_obs,)
    y: Array1<f64>,
    /// Prior precision τ shared by every coefficient
    prior_precision: f64,
    /// Number of MCMC chains
    n_chains: usize,
    /// Leading retained draws of each chain left out of the pooled summaries
    drop_leading: usize,
    /// Seed handed to the engine
    seed: u64,
    /// Source of the per-chain RNG streams
    rng: R,
}

/// Posterior draws and summaries from the Poisson regression MCMC.
pub struct PoissonRegressionResults {
    /// Posterior means of the coefficients, in design-matrix column order.
    ///
    /// Computed over the retained draws of every chain after the leading
    /// `drop_leading` draws of each chain are removed.
    pub posterior_means: Vec<f64>,

    /// Posterior standard deviations of the coefficients
    pub posterior_sds: Vec<f64>,

    /// Retained draws, dimensions `[n_chains, n_retained, n_parameters]`.
    /// Nothing is dropped here.
    pub samples: Array3<f64>,

    /// Leading draws per chain excluded from the means and standard deviations
    pub drop_leading: usize,

    /// The true coefficients if provided for comparison
    pub true_coefficients: Option<Vec<f64>>,

    /// Runtime statistics reported by the engine, one entry per chain
    pub run_stats: Vec<RunStats>,
}

impl GibbsPoisson<ChaCha8Rng> {
    /// Create a new Poisson regression Gibbs sampler with the default RNG.
    ///
    /// # Arguments
    /// * `x` - Design matrix of shape `(n_observations, n_predictors)`.
    ///   For models with an intercept, include a column of ones.
    /// * `y` - Count response vector of shape `(n_observations,)`.
    /// * `prior_precision` - Precision of the N(0, 1/precision) prior on every coefficient.
    ///   Small values (e.g. 0.001) give a wide, weakly informative prior.
    /// * `n_chains` - Number of independent chains (≥ 1).
    /// * `seed` - Random seed; the same seed and data reproduce the same draws.
    ///
    /// # Panics
    /// - If `x` and `y` have incompatible dimensions
    /// - If `prior_precision` is not positive
    /// - If `n_chains` is zero
    ///
    /// # Example
    /// ```
    /// use ndarray::array;
    /// use poisson_glm::regression::GibbsPoisson;
    ///
    /// let x = array![[1.0, -1.0], [1.0, 0.0], [1.0, 1.0]];
    /// let y = array![7.0, 3.0, 1.0];
    /// let model = GibbsPoisson::new(x, y, 0.001, 3, 42);
    /// ```
    pub fn new(
        x: Array2<f64>,
        y: Array1<f64>,
        prior_precision: f64,
        n_chains: usize,
        seed: u64,
    ) -> Self {
        Self::from_rng(
            ChaCha8Rng::seed_from_u64(seed),
            x,
            y,
            prior_precision,
            n_chains,
            seed,
        )
    }
}

impl<R: SeedableRng + Rng + Clone + Send + Sync> GibbsPoisson<R> {
    /// Create a new Poisson regression Gibbs sampler with a custom RNG.
    ///
    /// The per-chain streams are split off `rng`; `seed` is handed to `mini-mcmc`.
    ///
    /// # Example
    /// ```
    /// use ndarray::array;
    /// use rand_chacha::ChaCha8Rng;
    /// use rand::SeedableRng;
    /// use poisson_glm::regression::GibbsPoisson;
    ///
    /// let rng = ChaCha8Rng::seed_from_u64(42);
    /// let x = array![[1.0, -1.0], [1.0, 0.0], [1.0, 1.0]];
    /// let y = array![7.0, 3.0, 1.0];
    /// let model = GibbsPoisson::from_rng(rng, x, y, 0.001, 2, 42);
    /// ```
    pub fn from_rng(
        rng: R,
        x: Array2<f64>,
        y: Array1<f64>,
        prior_precision: f64,
        n_chains: usize,
        seed: u64,
    ) -> Self {
        assert_eq!(
            x.nrows(),
            y.len(),
            "Number of rows in x must match length of y"
        );
        assert!(prior_precision > 0.0, "prior_precision must be positive");
        assert!(n_chains > 0, "n_chains must be positive");

        Self {
            x,
            y,
            prior_precision,
            n_chains,
            drop_leading: 1,
            seed,
            rng,
        }
    }

    /// Number of leading retained draws of each chain to leave out of the pooled
    /// means and standard deviations (default 1, 0 keeps everything).
    pub fn with_drop_leading(mut self, n: usize) -> Self {
        self.drop_leading = n;
        self
    }

    /// Run every chain and collect the thinned post-burn-in draws.
    ///
    /// # Arguments
    /// * `burn_in` - Iterations per chain discarded before collection.
    /// * `samples` - Post-burn-in iterations per chain.
    /// * `thin` - Keep every `thin`-th post-burn-in iteration (the last of each block),
    ///   giving `samples / thin` retained draws per chain.
    /// * `true_coefficients` - Optional true coefficients stored for comparison.
    ///
    /// # Errors
    /// [`GlmError::InsufficientDraws`] when thinning leaves no draw beyond the dropped
    /// leading ones, [`GlmError::Sampler`] when the engine fails.
    ///
    /// # Panics
    /// If `thin` is zero.
    pub fn run(
        mut self,
        burn_in: usize,
        samples: usize,
        thin: usize,
        true_coefficients: Option<Vec<f64>>,
    ) -> Result<PoissonRegressionResults> {
        assert!(thin > 0, "thin must be positive");
        if samples / thin <= self.drop_leading {
            return Err(GlmError::InsufficientDraws {
                dropped: self.drop_leading,
                available: samples / thin,
            });
        }
        let p = self.x.ncols();
        let _span = info_span!("gibbs_poisson", chains = self.n_chains, burn_in, samples, thin)
            .entered();

        let mut chains: Vec<Array3<f64>> = Vec::with_capacity(self.n_chains);
        let mut run_stats = Vec::with_capacity(self.n_chains);
        for chain in 0..self.n_chains {
            let chain_rng =
                R::from_rng(&mut self.rng).map_err(|e| GlmError::Sampler(e.to_string()))?;
            let mut cond = PoissonConditional::new(
                self.x.clone(),
                self.y.clone(),
                self.prior_precision,
                chain_rng,
            );

            let mut init: Vec<Vec<f64>> = init_det(1, p);
            for state in &mut init {
                for beta in state.iter_mut() {
                    *beta = cond.draw_initial(INIT_SCALE);
                }
            }
            debug!(chain, init = ?init[0], "starting chain");

            let mut gibbs =
                GibbsSampler::new(cond, init).set_seed(self.seed.wrapping_add(chain as u64));
            let (draws, stats) = gibbs
                .run_progress(samples, burn_in)
                .map_err(|e| GlmError::Sampler(e.to_string()))?;

            chains.push(thin_draws(draws.view(), thin));
            run_stats.push(stats);
        }

        let views: Vec<ArrayView3<'_, f64>> = chains.iter().map(|c| c.view()).collect();
        let all_samples = concatenate(Axis(0), &views)?;
        let retained = all_samples.shape()[1];

        let kept = all_samples.slice(s![.., self.drop_leading.., ..]);
        let posterior_means: Vec<f64> = (0..p)
            .map(|j| kept.index_axis(Axis(2), j).mean().unwrap_or(f64::NAN))
            .collect();
        let posterior_sds: Vec<f64> = (0..p)
            .map(|j| kept.index_axis(Axis(2), j).std(1.0))
            .collect();

        info!(
            retained,
            dropped = self.drop_leading,
            means = ?posterior_means,
            "sampling finished"
        );

        Ok(PoissonRegressionResults {
            posterior_means,
            posterior_sds,
            samples: all_samples,
            drop_leading: self.drop_leading,
            true_coefficients,
            run_stats,
        })
    }
}

/// Keep the last iteration of every block of `thin` along the draw axis.
fn thin_draws(draws: ArrayView3<'_, f64>, thin: usize) -> Array3<f64> {
    let first = thin - 1;
    draws.slice(s![.., first..;thin, ..]).to_owned()
}

impl PoissonRegressionResults {
    /// Print a summary of the MCMC results
    pub fn summary(&self) {
        println!("Poisson Regression Results");
        println!("==========================");
        println!(
            "{:<10} {:<15} {:<15} {:<15}",
            "Parameter", "Mean", "Std. Dev.", "True Value"
        );
        println!("{}", "-".repeat(55));

        for (i, (mean, sd)) in self
            .posterior_means
            .iter()
            .zip(&self.posterior_sds)
            .enumerate()
        {
            let true_val = self
                .true_coefficients
                .as_ref()
                .and_then(|v| v.get(i))
                .map_or("N/A".to_string(), |v| format!("{:.4}", v));

            println!(
                "{:<10} {:<15.4} {:<15.4} {:<15}",
                format!("β{}", i),
                mean,
                sd,
                true_val
            );
        }
    }

    /// Number of chains, retained draws per chain and parameters.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.samples.dim()
    }

    /// Get the posterior samples for a specific coefficient, chain by chain.
    ///
    /// Returns `None` if `param_idx` is out of bounds.
    pub fn get_posterior_samples(&self, param_idx: usize) -> Option<Vec<f64>> {
        if param_idx >= self.samples.shape()[2] {
            return None;
        }
        Some(
            self.samples
                .index_axis(Axis(2), param_idx)
                .iter()
                .copied()
                .collect(),
        )
    }

    /// Wrap the draws for post-processing, naming the parameters in column order.
    pub fn posterior(&self, names: &[&str]) -> PosteriorSamples {
        PosteriorSamples::new(
            self.samples.clone(),
            names.iter().map(|s| s.to_string()).collect(),
        )
    }
}

/// Full conditionals of the Poisson regression coefficients.
///
/// `sample(i, given)` draws βᵢ given the other coefficients in `given`.
#[derive(Clone)]
struct PoissonConditional<R>
where
    R: SeedableRng + Rng + Clone + Send + Sync,
{
    /// Design matrix (n_observations × n_predictors)
    x: Array2<f64>,
    /// Count response vector (n_observations,)
    y: Array1<f64>,
    /// Prior precision τ of every coefficient
    prior_precision: f64,
    draws: SliceDraws,
    rng: R,
}

impl<R> PoissonConditional<R>
where
    R: SeedableRng + Rng + Clone + Send + Sync,
{
    fn new(x: Array2<f64>, y: Array1<f64>, prior_precision: f64, rng: R) -> Self {
        Self {
            x,
            y,
            prior_precision,
            draws: SliceDraws::new(),
            rng,
        }
    }

    /// A chain starting value drawn from N(0, scale²).
    fn draw_initial(&mut self, scale: f64) -> f64 {
        scale * self.draws.sample_norm(&mut self.rng)
    }
}

impl<R> Conditional<f64> for PoissonConditional<R>
where
    R: SeedableRng + Rng + Clone + Send + Sync,
{
    /// Draw βᵢ from its full conditional given the other coefficients.
    ///
    /// # Panics
    /// If `i` is not a coefficient index.
    fn sample(&mut self, i: usize, given: &[f64]) -> f64 {
        let p = self.x.ncols();
        assert!(i < p, "coefficient index {i} out of range for {p} predictors");

        // Linear predictor with the contribution of βᵢ removed
        let offsets: Vec<f64> = self
            .x
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .zip(&given[..p])
                    .enumerate()
                    .filter(|(k, _)| *k != i)
                    .map(|(_, (xk, bk))| xk * bk)
                    .sum::<f64>()
            })
            .collect();

        let col_i = self.x.column(i);
        let y = &self.y;
        let precision = self.prior_precision;
        let log_conditional = |beta: f64| -> f64 {
            let log_lik: f64 = offsets
                .iter()
                .zip(col_i.iter())
                .zip(y.iter())
                .map(|((off, xi), yi)| {
                    let eta = off + xi * beta;
                    yi * eta - eta.exp()
                })
                .sum();
            log_lik - 0.5 * precision * beta * beta
        };

        slice_sample(
            &self.draws,
            &mut self.rng,
            given[i],
            SLICE_WIDTH,
            MAX_STEP_OUT,
            log_conditional,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn design(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 {
                1.0
            } else {
                i as f64 / (n - 1) as f64 - 0.5
            }
        })
    }

    #[test]
    fn thinning_keeps_the_last_of_each_block() {
        let draws = Array3::from_shape_fn((2, 10, 1), |(c, t, _)| (c * 100 + t) as f64);
        let thinned = thin_draws(draws.view(), 5);
        assert_eq!(thinned.dim(), (2, 2, 1));
        assert_eq!(thinned[[0, 0, 0]], 4.0);
        assert_eq!(thinned[[0, 1, 0]], 9.0);
        assert_eq!(thinned[[1, 1, 0]], 109.0);
    }

    #[test]
    fn conditional_concentrates_near_the_mle_for_a_single_rate() {
        // Intercept-only model with Σy = 500 over 100 rows: β ≈ ln(5).
        let x = Array2::<f64>::ones((100, 1));
        let y = Array1::from_elem(100, 5.0);
        let mut cond = PoissonConditional::new(x, y, 0.001, ChaCha8Rng::seed_from_u64(3));
        let mut beta = 0.0;
        let mut kept = Vec::new();
        for t in 0..3_000 {
            beta = cond.sample(0, &[beta]);
            if t >= 500 {
                kept.push(beta);
            }
        }
        let kept = Array1::from(kept);
        let m = kept.mean().unwrap();
        // posterior sd ≈ 1/sqrt(500) ≈ 0.045
        assert_abs_diff_eq!(m, 5.0_f64.ln(), epsilon = 0.02);
        let sd = kept.std(1.0);
        assert!((sd - 0.045).abs() < 0.01, "sd {sd}");
    }

    #[test]
    fn recovers_coefficients_on_noise_free_counts() {
        let x = design(200);
        let truth = array![1.5, -1.0];
        let y = x.dot(&truth).mapv(|eta| eta.exp().round());
        let results = GibbsPoisson::new(x, y, 0.001, 2, 7)
            .run(500, 1_000, 2, Some(truth.to_vec()))
            .unwrap();

        assert_eq!(results.dim(), (2, 500, 2));
        assert_abs_diff_eq!(results.posterior_means[0], 1.5, epsilon = 0.15);
        assert_abs_diff_eq!(results.posterior_means[1], -1.0, epsilon = 0.3);
        assert!(results.posterior_sds.iter().all(|&sd| sd > 0.0));
        assert_eq!(results.run_stats.len(), 2);
    }

    #[test]
    fn chains_start_from_different_points() {
        let x = design(50);
        let y = Array1::from_elem(50, 3.0);
        let results = GibbsPoisson::new(x, y, 0.001, 3, 1)
            .run(10, 20, 1, None)
            .unwrap();
        let first = results.samples.index_axis(Axis(1), 0).to_owned();
        assert_ne!(first.row(0), first.row(1));
        assert_ne!(first.row(1), first.row(2));
    }

    #[test]
    fn too_few_samples_for_thinning_is_an_error() {
        let x = design(10);
        let y = Array1::from_elem(10, 1.0);
        let err = GibbsPoisson::new(x, y, 0.001, 1, 1).run(10, 5, 10, None);
        assert!(matches!(err, Err(GlmError::InsufficientDraws { .. })));
    }

    #[test]
    fn a_single_retained_draw_cannot_survive_the_drop() {
        let x = design(10);
        let y = Array1::from_elem(10, 1.0);
        let err = GibbsPoisson::new(x, y, 0.001, 1, 1).run(10, 10, 10, None);
        assert!(matches!(
            err,
            Err(GlmError::InsufficientDraws {
                dropped: 1,
                available: 1
            })
        ));
    }

    #[test]
    fn pooled_moments_skip_the_leading_draw_of_each_chain() {
        let x = design(30);
        let y = Array1::from_elem(30, 4.0);
        let results = GibbsPoisson::new(x, y, 0.001, 2, 9)
            .with_drop_leading(1)
            .run(20, 40, 2, None)
            .unwrap();
        assert_eq!(results.dim(), (2, 20, 2));
        assert_eq!(results.drop_leading, 1);

        let kept = results.samples.slice(s![.., 1.., ..]);
        for j in 0..2 {
            let column = kept.index_axis(Axis(2), j);
            assert_abs_diff_eq!(
                results.posterior_means[j],
                column.mean().unwrap(),
                epsilon = 1e-12
            );
            assert_abs_diff_eq!(results.posterior_sds[j], column.std(1.0), epsilon = 1e-12);
        }
    }

    #[test]
    fn posterior_samples_are_returned_chain_by_chain() {
        let x = design(20);
        let y = Array1::from_elem(20, 2.0);
        let results = GibbsPoisson::new(x, y, 0.001, 2, 5)
            .run(10, 30, 3, None)
            .unwrap();
        let intercept = results.get_posterior_samples(0).unwrap();
        assert_eq!(intercept.len(), 2 * 10);
        assert_eq!(intercept[10], results.samples[[1, 0, 0]]);
        assert!(results.get_posterior_samples(2).is_none());
    }
}
