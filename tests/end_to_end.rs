//! The reference run: 100 observations on [5, 8], a = 2.5, b = -1.1, three chains of
//! 25 000 iterations with 5 000 burn-in, thinned by 20.

use poisson_glm::PipelineConfig;
use poisson_glm::pipeline::{PoissonGlmPipeline, RHAT_TOLERANCE};

#[test]
fn reference_run_recovers_the_generating_coefficients() {
    let report = PoissonGlmPipeline::new(PipelineConfig::default())
        .run()
        .expect("reference run should succeed");

    // 3 chains x (1000 retained - 1 dropped)
    assert_eq!(report.fit.dim(), (3, 1_000, 2));
    assert_eq!(report.merged.nrows(), 2_997);

    let a = report.summary.param("a").unwrap();
    let b = report.summary.param("b").unwrap();
    assert!((a.mean - 2.5).abs() < 0.3, "posterior mean of a: {}", a.mean);
    assert!((b.mean + 1.1).abs() < 0.3, "posterior mean of b: {}", b.mean);

    for (j, p) in report.summary.params.iter().enumerate() {
        assert!(
            p.credible.0 <= p.mean && p.mean <= p.credible.1,
            "{}: mean {} outside {:?}",
            p.name,
            p.mean,
            p.credible
        );
        assert!(p.hpd.0 < p.hpd.1);
        assert!(p.ess > 100.0, "{}: ESS {}", p.name, p.ess);
        // The printed fit table reports the same post-drop posterior.
        assert!((report.fit.posterior_means[j] - p.mean).abs() < 1e-10);
    }
    assert!(
        report.summary.converged(RHAT_TOLERANCE),
        "R-hat: {:?}",
        report.summary.params.iter().map(|p| p.rhat).collect::<Vec<_>>()
    );

    let pred = &report.predictive;
    assert_eq!(pred.len(), report.data.len());
    for ((lo, hi), curve) in pred.lower.iter().zip(&pred.upper).zip(&pred.mean_curve) {
        assert!(0.0 <= *lo && lo <= hi);
        assert!(*curve > 0.0);
    }
    // A 95% band should hold most of the data it was fitted to.
    assert!(pred.coverage(&report.data.counts) > 0.85);

    // Negative slope: the plug-in curve falls across the sorted explanatory values.
    assert!(pred.mean_curve.first() > pred.mean_curve.last());
}
