//! Frequentist check of the fitted model: over repeated data sets the 95% credible
//! intervals should cover the generating coefficients most of the time.

use poisson_glm::pipeline::PoissonGlmPipeline;
use poisson_glm::{PipelineConfig, SamplerConfig, SimulationConfig};

const TRIALS: u64 = 10;

#[test]
fn credible_intervals_cover_the_truth_in_most_trials() {
    let mut covered = [0usize; 2];
    let truth = [2.5, -1.1];

    for trial in 0..TRIALS {
        let config = PipelineConfig::new(
            SimulationConfig::default(),
            SamplerConfig::default()
                .with_chains(2)
                .with_iterations(4_000, 1_000, 5)
                .with_seed(1_000 + trial),
        );
        let report = PoissonGlmPipeline::new(config).run().unwrap();

        for (j, p) in report.summary.params.iter().enumerate() {
            if p.credible.0 <= truth[j] && truth[j] <= p.credible.1 {
                covered[j] += 1;
            }
        }
        assert!(report.data.counts.iter().all(|&k| k < 10_000));
    }

    for (name, hits) in ["a", "b"].iter().zip(covered) {
        assert!(
            hits >= 8,
            "{name}: truth inside the 95% interval in only {hits}/{TRIALS} trials"
        );
    }
}

#[test]
fn without_dropping_the_merge_keeps_every_retained_draw() {
    let config = PipelineConfig::new(
        SimulationConfig::default().with_n_obs(40),
        SamplerConfig::default()
            .with_chains(3)
            .with_iterations(1_500, 500, 10)
            .with_drop_leading(0),
    );
    let report = PoissonGlmPipeline::new(config).run().unwrap();
    assert_eq!(report.merged.nrows(), 3 * 100);
}
