//! Univariate slice sampling (Neal, 2003) with stepping-out and shrinkage.
//!
//! This is the coordinate update used inside the Gibbs sweep: it draws exactly from a
//! one-dimensional full conditional known only up to a constant, without tuning a
//! proposal scale.
//!
//! # References
//! - Neal, R. M. (2003). Slice sampling. *The Annals of Statistics*, 31(3), 705–767.

use crate::rng::RngDraw;
use rand::Rng;
use statrs::distribution::{Exp, Normal, Uniform};

/// Distributions reused by every slice update.
#[derive(Debug, Clone)]
pub(crate) struct SliceDraws {
    pub(crate) exp: Exp,
    pub(crate) unif: Uniform,
    pub(crate) std_norm: Normal,
}

impl SliceDraws {
    pub(crate) fn new() -> Self {
        Self {
            exp: Exp::new(1.0).expect("Exp(1) is always valid"),
            unif: Uniform::standard(),
            std_norm: Normal::standard(),
        }
    }
}

/// Draw one value from the density proportional to `exp(log_f)`, starting at `x0`.
///
/// `width` is the initial bracket size and `max_steps` bounds the stepping-out
/// phase. `log_f(x0)` must be finite.
pub(crate) fn slice_sample<R, F>(
    draws: &SliceDraws,
    rng: &mut R,
    x0: f64,
    width: f64,
    max_steps: usize,
    log_f: F,
) -> f64
where
    R: Rng + ?Sized,
    F: Fn(f64) -> f64,
{
    debug_assert!(width > 0.0, "slice width must be positive");
    let log_f0 = log_f(x0);
    debug_assert!(log_f0.is_finite(), "log density must be finite at the start point");
    let log_y = log_f0 - draws.sample_exp(rng);

    // Randomly placed initial bracket around x0
    let mut left = x0 - width * draws.sample_unif(rng);
    let mut right = left + width;

    // Split the step-out budget between both ends
    let mut steps_left = (max_steps as f64 * draws.sample_unif(rng)).floor() as usize;
    let mut steps_right = max_steps.saturating_sub(1).saturating_sub(steps_left);
    while steps_left > 0 && log_y < log_f(left) {
        left -= width;
        steps_left -= 1;
    }
    while steps_right > 0 && log_y < log_f(right) {
        right += width;
        steps_right -= 1;
    }

    // Shrink towards x0 until a point under the density is found
    loop {
        let x1 = left + draws.sample_unif(rng) * (right - left);
        if log_y < log_f(x1) {
            return x1;
        }
        if x1 < x0 {
            left = x1;
        } else {
            right = x1;
        }
    }
}
