//! # Bayesian Poisson Regression, End to End
//!
//! This crate simulates count data from a known Poisson generalized linear model, fits a
//! Bayesian Poisson regression with an MCMC engine, and post-processes the draws into
//! posterior and posterior predictive summaries.
//!
//! ## Stages
//!
//! - **Simulation** ([`simulate`]): uniform explanatory values, centered, pushed through
//!   a log link, with one Poisson count per observation.
//! - **Sampling** ([`regression`]): [`regression::GibbsPoisson`] hands the model to
//!   `mini-mcmc`'s Gibbs engine. Coefficients have independent N(0, 1/τ) priors.
//! - **Post-processing** ([`posterior`], [`predictive`]): chain merging with the leading
//!   draw of every chain dropped, credible and HPD intervals, R-hat, posterior
//!   correlations, posterior predictive intervals and the plug-in mean curve.
//! - **Plots** (`plot` feature): SVG figures of the predictive bands and chain traces.
//!
//! [`pipeline::PoissonGlmPipeline`] runs all stages from a single [`PipelineConfig`],
//! whose default is the reference run: 100 observations on `[5, 8]`, a = 2.5, b = -1.1,
//! prior precision 0.001, three chains of 25 000 iterations with 5 000 burn-in, thinned
//! by 20.
//!
//! ## Usage Example
//!
//! ```no_run
//! use poisson_glm::{PipelineConfig, pipeline::PoissonGlmPipeline};
//!
//! let report = PoissonGlmPipeline::new(PipelineConfig::default())
//!     .run()
//!     .expect("pipeline failed");
//! report.summary();
//! assert_eq!(report.merged.nrows(), 3 * 999);
//! ```
//!
//! The `demos` directory in the repository contains a runnable example.
//! ## License
//! This crate is dual-licensed under the MIT OR Apache-2.0 licenses.

pub mod config;
pub mod error;
pub mod pipeline;
#[cfg(feature = "plot")]
pub mod plot;
pub mod posterior;
pub mod predictive;
pub mod regression;
pub(crate) mod rng;
pub mod simulate;
pub mod stats;

pub use config::{PipelineConfig, SamplerConfig, SimulationConfig};
pub use error::GlmError;
