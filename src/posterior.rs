//! Post-processing of posterior draws: chain merging, interval summaries, convergence
//! diagnostics and posterior correlations.
//!
//! Split R-hat and effective sample size are taken from `mini-mcmc`'s own diagnostics.

use crate::error::{GlmError, Result};
use crate::stats;
use mini_mcmc::stats::split_rhat_mean_ess;
use nalgebra::DMatrix;
use ndarray::{Array2, Array3, ArrayView2, Axis, s};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Draws of every parameter from every chain, `[n_chains, n_draws, n_params]`.
///
/// Within a chain draws are in iteration order.
#[derive(Debug, Clone)]
pub struct PosteriorSamples {
    draws: Array3<f64>,
    names: Vec<String>,
}

/// Per-parameter posterior summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSummary {
    pub name: String,
    pub mean: f64,
    pub sd: f64,
    /// Equal-tailed credible interval
    pub credible: (f64, f64),
    /// Highest posterior density interval
    pub hpd: (f64, f64),
    /// Split potential scale reduction factor
    pub rhat: f64,
    /// Effective sample size across chains
    pub ess: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSummary {
    pub level: f64,
    pub n_chains: usize,
    /// Draws per chain that entered the summary
    pub draws_per_chain: usize,
    pub params: Vec<ParameterSummary>,
    /// Row-major pairwise correlation matrix of the merged draws
    pub correlation: Vec<Vec<f64>>,
}

impl PosteriorSamples {
    /// # Panics
    /// If `names` does not have one entry per parameter.
    pub fn new(draws: Array3<f64>, names: Vec<String>) -> Self {
        assert_eq!(
            draws.shape()[2],
            names.len(),
            "one name per parameter is required"
        );
        Self { draws, names }
    }

    pub fn n_chains(&self) -> usize {
        self.draws.shape()[0]
    }

    pub fn draws_per_chain(&self) -> usize {
        self.draws.shape()[1]
    }

    pub fn n_params(&self) -> usize {
        self.draws.shape()[2]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn draws(&self) -> &Array3<f64> {
        &self.draws
    }

    /// A copy with the first `n` draws of every chain removed.
    ///
    /// # Errors
    /// [`GlmError::InsufficientDraws`] if no draw would remain in a chain.
    pub fn drop_leading(&self, n: usize) -> Result<Self> {
        let available = self.draws_per_chain();
        if n >= available {
            return Err(GlmError::InsufficientDraws {
                dropped: n,
                available,
            });
        }
        Ok(Self {
            draws: self.draws.slice(s![.., n.., ..]).to_owned(),
            names: self.names.clone(),
        })
    }

    /// Drop the first `drop_leading` draws of every chain and stack the rest.
    ///
    /// The result has `n_chains * (draws_per_chain - drop_leading)` rows, chain 0 first.
    pub fn merge_chains(&self, drop_leading: usize) -> Result<Array2<f64>> {
        let kept = self.drop_leading(drop_leading)?;
        let rows = kept.n_chains() * kept.draws_per_chain();
        Ok(kept
            .draws
            .into_shape_with_order((rows, self.n_params()))?)
    }

    /// Every draw of parameter `j`, chain by chain.
    fn pooled(&self, j: usize) -> Vec<f64> {
        self.draws.index_axis(Axis(2), j).iter().copied().collect()
    }

    pub fn posterior_means(&self) -> Vec<f64> {
        (0..self.n_params())
            .map(|j| {
                self.draws
                    .index_axis(Axis(2), j)
                    .mean()
                    .unwrap_or(f64::NAN)
            })
            .collect()
    }

    /// Sample standard deviations over every draw.
    pub fn posterior_sds(&self) -> Vec<f64> {
        (0..self.n_params())
            .map(|j| self.draws.index_axis(Axis(2), j).std(1.0))
            .collect()
    }

    /// Equal-tailed credible intervals at `level` (type-7 quantiles).
    pub fn credible_intervals(&self, level: f64) -> Vec<(f64, f64)> {
        (0..self.n_params())
            .map(|j| stats::equal_tailed_interval(&self.pooled(j), level))
            .collect()
    }

    /// Highest posterior density intervals at `level`.
    pub fn hpd_intervals(&self, level: f64) -> Vec<(f64, f64)> {
        (0..self.n_params())
            .map(|j| stats::hpd_interval(&self.pooled(j), level))
            .collect()
    }

    /// Split R-hat and effective sample size per parameter, as computed by `mini-mcmc`.
    pub fn convergence(&self) -> (Vec<f64>, Vec<f64>) {
        let draws = self.draws.mapv(|v| v as f32);
        let (rhat, ess) = split_rhat_mean_ess(draws.view());
        (
            rhat.iter().map(|&r| f64::from(r)).collect(),
            ess.iter().map(|&e| f64::from(e)).collect(),
        )
    }

    pub fn rhat(&self) -> Vec<f64> {
        self.convergence().0
    }

    pub fn ess(&self) -> Vec<f64> {
        self.convergence().1
    }

    /// Pearson correlation between parameters over all draws.
    pub fn correlation_matrix(&self) -> DMatrix<f64> {
        let p = self.n_params();
        let n = self.n_chains() * self.draws_per_chain();
        let samples = DMatrix::from_fn(n, p, |row, col| {
            self.draws[[row / self.draws_per_chain(), row % self.draws_per_chain(), col]]
        });
        correlation(&samples)
    }

    /// Collect means, intervals, convergence diagnostics and correlations at `level`.
    pub fn summarize(&self, level: f64) -> PosteriorSummary {
        let means = self.posterior_means();
        let sds = self.posterior_sds();
        let credible = self.credible_intervals(level);
        let hpd = self.hpd_intervals(level);
        let (rhat, ess) = self.convergence();

        let params = (0..self.n_params())
            .map(|j| ParameterSummary {
                name: self.names[j].clone(),
                mean: means[j],
                sd: sds[j],
                credible: credible[j],
                hpd: hpd[j],
                rhat: rhat[j],
                ess: ess[j],
            })
            .collect();

        let corr = self.correlation_matrix();
        let correlation = corr
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();

        PosteriorSummary {
            level,
            n_chains: self.n_chains(),
            draws_per_chain: self.draws_per_chain(),
            params,
            correlation,
        }
    }
}

/// Column-wise Pearson correlation of a `(draws × params)` matrix.
fn correlation(samples: &DMatrix<f64>) -> DMatrix<f64> {
    let n = samples.nrows() as f64;
    let means = samples.row_mean();
    let centered = DMatrix::from_fn(samples.nrows(), samples.ncols(), |r, c| {
        samples[(r, c)] - means[c]
    });
    let cov = centered.transpose() * &centered / (n - 1.0);
    let sd: Vec<f64> = (0..cov.ncols()).map(|j| cov[(j, j)].sqrt()).collect();
    DMatrix::from_fn(cov.nrows(), cov.ncols(), |i, j| cov[(i, j)] / (sd[i] * sd[j]))
}

/// Column means of merged `(draws × params)` draws: the plug-in coefficients.
pub fn coefficient_means(merged: ArrayView2<'_, f64>) -> Vec<f64> {
    merged
        .mean_axis(Axis(0))
        .map(|m| m.to_vec())
        .unwrap_or_default()
}

impl PosteriorSummary {
    /// True when every R-hat is within `tolerance` of 1.
    pub fn converged(&self, tolerance: f64) -> bool {
        self.params
            .iter()
            .all(|p| (p.rhat - 1.0).abs() <= tolerance)
    }

    pub fn param(&self, name: &str) -> Option<&ParameterSummary> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for PosteriorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = self.level * 100.0;
        writeln!(
            f,
            "Posterior summary ({} chains x {} draws)",
            self.n_chains, self.draws_per_chain
        )?;
        writeln!(
            f,
            "{:<10} {:>10} {:>10} {:>22} {:>22} {:>8} {:>8}",
            "Parameter",
            "Mean",
            "Std. Dev.",
            format!("{pct:.0}% credible"),
            format!("{pct:.0}% HPD"),
            "R-hat",
            "ESS"
        )?;
        writeln!(f, "{}", "-".repeat(96))?;
        for p in &self.params {
            writeln!(
                f,
                "{:<10} {:>10.4} {:>10.4} {:>22} {:>22} {:>8.4} {:>8.0}",
                p.name,
                p.mean,
                p.sd,
                format!("[{:.4}, {:.4}]", p.credible.0, p.credible.1),
                format!("[{:.4}, {:.4}]", p.hpd.0, p.hpd.1),
                p.rhat,
                p.ess
            )?;
        }
        writeln!(f, "\nPosterior correlation")?;
        for (param, row) in self.params.iter().zip(&self.correlation) {
            write!(f, "{:<10}", param.name)?;
            for v in row {
                write!(f, " {v:>8.4}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Two chains, two parameters; b = -2a within each draw.
    fn samples() -> PosteriorSamples {
        let draws = Array3::from_shape_fn((2, 5, 2), |(c, t, j)| {
            let a = (c * 5 + t) as f64;
            if j == 0 { a } else { -2.0 * a }
        });
        PosteriorSamples::new(draws, vec!["a".into(), "b".into()])
    }

    #[test]
    fn merge_drops_the_leading_draw_of_each_chain() {
        let merged = samples().merge_chains(1).unwrap();
        assert_eq!(merged.dim(), (2 * 4, 2));
        assert_eq!(merged.column(0).to_vec(), vec![1.0, 2.0, 3.0, 4.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn merge_without_dropping_keeps_everything() {
        assert_eq!(samples().merge_chains(0).unwrap().nrows(), 10);
    }

    #[test]
    fn dropping_every_draw_is_an_error() {
        assert!(matches!(
            samples().merge_chains(5),
            Err(GlmError::InsufficientDraws {
                dropped: 5,
                available: 5
            })
        ));
    }

    #[test]
    fn perfectly_anticorrelated_parameters() {
        let corr = samples().correlation_matrix();
        assert_abs_diff_eq!(corr[(0, 0)], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(corr[(0, 1)], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(corr[(1, 0)], -1.0, epsilon = 1e-12);
    }

    /// Three chains of 200 draws; chain `c` wiggles around `offset * c`.
    fn wiggly(offset: f64) -> PosteriorSamples {
        let draws = Array3::from_shape_fn((3, 200, 2), |(c, t, j)| {
            let noise = (t as f64 * 2.4 + c as f64 * 1.3 + j as f64 * 0.5).sin();
            offset * c as f64 + noise + j as f64
        });
        PosteriorSamples::new(draws, vec!["a".into(), "b".into()])
    }

    #[test]
    fn summary_collects_every_parameter() {
        let summary = samples().summarize(0.9);
        assert_eq!(summary.params.len(), 2);
        let a = summary.param("a").unwrap();
        assert_abs_diff_eq!(a.mean, 4.5);
        assert_abs_diff_eq!(a.sd, 3.0277, epsilon = 1e-4);
        assert!(a.credible.0 <= a.mean && a.mean <= a.credible.1);
        assert!(a.hpd.0 <= a.hpd.1);
        assert!(summary.to_string().contains("R-hat"));
    }

    #[test]
    fn separated_chains_are_flagged_by_split_rhat() {
        let summary = wiggly(10.0).summarize(0.95);
        assert!(!summary.converged(0.1));
        assert!(summary.params.iter().all(|p| p.rhat > 2.0));
    }

    #[test]
    fn overlapping_chains_pass_split_rhat() {
        let samples = wiggly(0.0);
        let (rhat, ess) = samples.convergence();
        assert_eq!(rhat.len(), 2);
        assert!(rhat.iter().all(|r| (r - 1.0).abs() < 0.1), "{rhat:?}");
        assert!(ess.iter().all(|&e| e > 0.0), "{ess:?}");
        assert!(samples.summarize(0.95).converged(0.1));
    }

    #[test]
    fn summary_serializes_to_json() {
        let json = samples().summarize(0.95).to_json().unwrap();
        let back: PosteriorSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.params[1].name, "b");
    }

    #[test]
    fn coefficient_means_average_rows() {
        let merged = samples().merge_chains(0).unwrap();
        let m = coefficient_means(merged.view());
        assert_abs_diff_eq!(m[0], 4.5);
        assert_abs_diff_eq!(m[1], -9.0);
    }
}
