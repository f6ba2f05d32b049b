//! Simulate → fit → summarise, end to end, from one [`PipelineConfig`].

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::posterior::{PosteriorSamples, PosteriorSummary, coefficient_means};
use crate::predictive::{self, PredictiveSummary};
use crate::regression::{GibbsPoisson, PoissonRegressionResults};
use crate::simulate::{SimulatedData, simulate};
use ndarray::Array2;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, info_span, warn};

/// Names of the two coefficients, in design-matrix order
pub const PARAMETER_NAMES: [&str; 2] = ["a", "b"];

/// R-hat values further than this from 1.0 are reported as non-convergence
pub const RHAT_TOLERANCE: f64 = 0.1;

/// Everything a run produces.
pub struct PipelineReport {
    pub config: PipelineConfig,
    pub data: SimulatedData,
    pub fit: PoissonRegressionResults,
    /// Chains with their leading draws removed
    pub posterior: PosteriorSamples,
    /// Flat `(draws × 2)` matrix of the merged chains
    pub merged: Array2<f64>,
    pub summary: PosteriorSummary,
    pub predictive: PredictiveSummary,
}

pub struct PoissonGlmPipeline {
    config: PipelineConfig,
}

impl PoissonGlmPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage. All randomness derives from `config.sampler.seed`.
    pub fn run(&self) -> Result<PipelineReport> {
        self.config.validate()?;
        let sim = &self.config.simulation;
        let smp = &self.config.sampler;
        let _span = info_span!("pipeline", seed = smp.seed).entered();

        let mut rng = ChaCha8Rng::seed_from_u64(smp.seed);
        let data = simulate(sim, &mut rng)?;
        info!(n_obs = data.len(), "data simulated");

        let model = GibbsPoisson::from_rng(
            ChaCha8Rng::seed_from_u64(rng.next_u64()),
            data.design_matrix(),
            data.response(),
            smp.prior_precision,
            smp.n_chains,
            smp.seed,
        )
        .with_drop_leading(smp.drop_leading);
        let fit = model.run(
            smp.burn_in,
            smp.kept_iterations(),
            smp.thin,
            Some(sim.true_coefficients()),
        )?;

        let all = fit.posterior(&PARAMETER_NAMES);
        let posterior = all.drop_leading(smp.drop_leading)?;
        let merged = all.merge_chains(smp.drop_leading)?;
        info!(
            merged = merged.nrows(),
            dropped_per_chain = smp.drop_leading,
            "chains merged"
        );

        let summary = posterior.summarize(smp.credible_level);
        if !summary.converged(RHAT_TOLERANCE) {
            let rhat: Vec<f64> = summary.params.iter().map(|p| p.rhat).collect();
            warn!(?rhat, "chains have not converged");
        }

        let replicates = simulate_replicates(&merged, &data, &mut rng)?;
        let predictive = predictive::summarize_predictive(
            replicates.view(),
            data.x_centered.view(),
            &coefficient_means(merged.view()),
            smp.credible_level,
        );
        info!(
            coverage = predictive.coverage(&data.counts),
            "posterior predictive summarised"
        );

        Ok(PipelineReport {
            config: self.config.clone(),
            data,
            fit,
            posterior,
            merged,
            summary,
            predictive,
        })
    }
}

#[cfg(feature = "rayon")]
fn simulate_replicates(
    merged: &Array2<f64>,
    data: &SimulatedData,
    rng: &mut ChaCha8Rng,
) -> Result<Array2<u64>> {
    predictive::simulate_predictive_par_deterministic(merged.view(), data.x_centered.view(), rng)
}

#[cfg(not(feature = "rayon"))]
fn simulate_replicates(
    merged: &Array2<f64>,
    data: &SimulatedData,
    rng: &mut ChaCha8Rng,
) -> Result<Array2<u64>> {
    predictive::simulate_predictive(merged.view(), data.x_centered.view(), rng)
}

impl PipelineReport {
    /// Print the fit table, the posterior summary and the predictive coverage.
    pub fn summary(&self) {
        self.fit.summary();
        println!();
        print!("{}", self.summary);
        println!(
            "\nObserved counts inside their {:.0}% predictive interval: {:.1}%",
            self.predictive.level * 100.0,
            self.predictive.coverage(&self.data.counts) * 100.0
        );
    }

    /// Write the predictive and trace figures as SVG files.
    #[cfg(feature = "plot")]
    pub fn plot<P: AsRef<std::path::Path>>(&self, predictive_path: P, trace_path: P) -> Result<()> {
        crate::plot::plot_predictive(predictive_path, &self.data, &self.predictive)?;
        crate::plot::plot_traces(trace_path, &self.posterior)
    }
}
