use crate::regression::slice::SliceDraws;
use rand::{Rng, prelude::Distribution};

/// Unified interface for the auxiliary draws of the slice-sampling updates
pub(crate) trait RngDraw<R: Rng + ?Sized> {
    fn sample_exp(&self, rng: &mut R) -> f64;
    fn sample_unif(&self, rng: &mut R) -> f64;
    fn sample_norm(&self, rng: &mut R) -> f64;
}

impl<R: Rng + ?Sized> RngDraw<R> for SliceDraws {
    /// Sample from the Exp(1) distribution
    ///
    /// The slice height is drawn on the log scale as `log f(x0) - E`, `E ~ Exp(1)`.
    #[inline(always)]
    fn sample_exp(&self, rng: &mut R) -> f64 {
        self.exp.sample(rng)
    }

    /// Sample from the standard uniform distribution
    #[inline(always)]
    fn sample_unif(&self, rng: &mut R) -> f64 {
        self.unif.sample(rng)
    }

    /// Sample from the standard normal distribution
    #[inline(always)]
    fn sample_norm(&self, rng: &mut R) -> f64 {
        self.std_norm.sample(rng)
    }
}
