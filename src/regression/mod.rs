//! Bayesian Poisson regression driven by the `mini-mcmc` Gibbs engine.
//!
//! The engine owns the chains, burn-in and bookkeeping; this module supplies the model
//! in the form it consumes: a [`mini_mcmc::distributions::Conditional`] whose coordinate
//! updates draw each coefficient from its full conditional.
//!
//! # Available Models
//! - [`GibbsPoisson`]: Poisson likelihood, log link, independent normal priors

pub use poisson::{GibbsPoisson, PoissonRegressionResults};

mod poisson;
pub(crate) mod slice;
