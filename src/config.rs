//! Run configuration.
//!
//! [`PipelineConfig::default`] reproduces the reference run: 100 observations drawn on
//! `[5, 8]`, true intercept 2.5 and slope -1.1, N(0, 1/0.001) priors, and three chains of
//! 25 000 iterations with 5 000 burn-in, thinned by 20.

use crate::error::{GlmError, Result};
use serde::{Deserialize, Serialize};

/// Parameters of the synthetic data generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of observations
    pub n_obs: usize,
    /// Lower bound of the uniform explanatory range
    pub x_min: f64,
    /// Upper bound of the uniform explanatory range
    pub x_max: f64,
    pub true_intercept: f64,
    pub true_slope: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_obs: 100,
            x_min: 5.0,
            x_max: 8.0,
            true_intercept: 2.5,
            true_slope: -1.1,
        }
    }
}

impl SimulationConfig {
    pub fn with_n_obs(mut self, n_obs: usize) -> Self {
        self.n_obs = n_obs;
        self
    }

    pub fn with_range(mut self, x_min: f64, x_max: f64) -> Self {
        self.x_min = x_min;
        self.x_max = x_max;
        self
    }

    pub fn with_truth(mut self, intercept: f64, slope: f64) -> Self {
        self.true_intercept = intercept;
        self.true_slope = slope;
        self
    }

    /// True coefficients in design-matrix order (intercept first).
    pub fn true_coefficients(&self) -> Vec<f64> {
        vec![self.true_intercept, self.true_slope]
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_obs == 0 {
            return Err(GlmError::InvalidConfig("n_obs must be positive".into()));
        }
        if !(self.x_min.is_finite() && self.x_max.is_finite()) || self.x_min >= self.x_max {
            return Err(GlmError::InvalidConfig(format!(
                "explanatory range [{}, {}] is empty",
                self.x_min, self.x_max
            )));
        }
        if !(self.true_intercept.is_finite() && self.true_slope.is_finite()) {
            return Err(GlmError::InvalidConfig(
                "true coefficients must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// Settings handed to the MCMC engine and to the chain post-processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub n_chains: usize,
    /// Total iterations per chain, burn-in included
    pub iterations: usize,
    pub burn_in: usize,
    /// Keep every `thin`-th post-burn-in iteration
    pub thin: usize,
    /// Precision (1 / variance) of the N(0, ·) prior on every coefficient
    pub prior_precision: f64,
    /// Retained draws discarded from the head of every chain before merging
    pub drop_leading: usize,
    /// Level of the credible, HPD and predictive intervals
    pub credible_level: f64,
    pub seed: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            n_chains: 3,
            iterations: 25_000,
            burn_in: 5_000,
            thin: 20,
            prior_precision: 0.001,
            drop_leading: 1,
            credible_level: 0.95,
            seed: 42,
        }
    }
}

impl SamplerConfig {
    pub fn with_chains(mut self, n_chains: usize) -> Self {
        self.n_chains = n_chains;
        self
    }

    pub fn with_iterations(mut self, iterations: usize, burn_in: usize, thin: usize) -> Self {
        self.iterations = iterations;
        self.burn_in = burn_in;
        self.thin = thin;
        self
    }

    pub fn with_prior_precision(mut self, precision: f64) -> Self {
        self.prior_precision = precision;
        self
    }

    pub fn with_drop_leading(mut self, drop_leading: usize) -> Self {
        self.drop_leading = drop_leading;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Post-burn-in iterations per chain.
    pub fn kept_iterations(&self) -> usize {
        self.iterations.saturating_sub(self.burn_in)
    }

    /// Draws per chain that survive thinning.
    pub fn retained_per_chain(&self) -> usize {
        self.kept_iterations() / self.thin.max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_chains == 0 {
            return Err(GlmError::InvalidConfig("n_chains must be positive".into()));
        }
        if self.thin == 0 {
            return Err(GlmError::InvalidConfig("thin must be positive".into()));
        }
        if self.burn_in >= self.iterations {
            return Err(GlmError::InvalidConfig(format!(
                "burn_in ({}) must be smaller than iterations ({})",
                self.burn_in, self.iterations
            )));
        }
        if !(self.prior_precision.is_finite() && self.prior_precision > 0.0) {
            return Err(GlmError::InvalidConfig(
                "prior_precision must be positive".into(),
            ));
        }
        if !(self.credible_level > 0.0 && self.credible_level < 1.0) {
            return Err(GlmError::InvalidConfig(
                "credible_level must lie in (0, 1)".into(),
            ));
        }
        let retained = self.retained_per_chain();
        if retained <= self.drop_leading {
            return Err(GlmError::InsufficientDraws {
                dropped: self.drop_leading,
                available: retained,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub simulation: SimulationConfig,
    pub sampler: SamplerConfig,
}

impl PipelineConfig {
    pub fn new(simulation: SimulationConfig, sampler: SamplerConfig) -> Self {
        Self {
            simulation,
            sampler,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.sampler.validate()
    }
}
