//! SVG figures: posterior predictive bands over the data, and chain traces.

use crate::error::{GlmError, Result};
use crate::posterior::PosteriorSamples;
use crate::predictive::PredictiveSummary;
use crate::simulate::SimulatedData;
use plotters::prelude::*;
use std::path::Path;

fn plot_err<E: std::fmt::Display>(e: E) -> GlmError {
    GlmError::Plot(e.to_string())
}

fn bounds<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> (f64, f64) {
    values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Scatter of the observed counts against x̃ with the true curve, the fitted mean
/// curve and the predictive interval bounds on top.
pub fn plot_predictive<P: AsRef<Path>>(
    path: P,
    data: &SimulatedData,
    summary: &PredictiveSummary,
) -> Result<()> {
    let xs = &summary.x_centered;
    let (x_min, x_max) = bounds(xs);
    let counts: Vec<f64> = data.counts.iter().map(|&k| k as f64).collect();
    let (_, y_max) = bounds(
        counts
            .iter()
            .chain(&summary.upper)
            .chain(data.true_rate.iter()),
    );

    let root = SVGBackend::new(path.as_ref(), (900, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Posterior predictive, {:.0}% intervals", summary.level * 100.0),
            ("sans-serif", 24),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max * 1.05)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("centered x")
        .y_desc("count")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(
            xs.iter()
                .zip(&counts)
                .map(|(&x, &y)| Circle::new((x, y), 3, BLACK.filled())),
        )
        .map_err(plot_err)?
        .label("observed")
        .legend(|(x, y)| Circle::new((x, y), 3, BLACK.filled()));

    chart
        .draw_series(LineSeries::new(
            xs.iter().copied().zip(data.true_rate.iter().copied()),
            &RED,
        ))
        .map_err(plot_err)?
        .label("true rate")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .draw_series(LineSeries::new(
            xs.iter().copied().zip(summary.mean_curve.iter().copied()),
            BLUE.stroke_width(2),
        ))
        .map_err(plot_err)?
        .label("fitted mean")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    for bound in [&summary.lower, &summary.upper] {
        chart
            .draw_series(LineSeries::new(
                xs.iter().copied().zip(bound.iter().copied()),
                BLUE.mix(0.4),
            ))
            .map_err(plot_err)?;
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// One panel per parameter, one line per chain.
pub fn plot_traces<P: AsRef<Path>>(path: P, samples: &PosteriorSamples) -> Result<()> {
    let draws = samples.draws();
    let n_draws = samples.draws_per_chain();

    let root = SVGBackend::new(path.as_ref(), (900, 300 * samples.n_params() as u32))
        .into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let panels = root.split_evenly((samples.n_params(), 1));

    for (j, panel) in panels.iter().enumerate() {
        let (lo, hi) = bounds(draws.index_axis(ndarray::Axis(2), j).iter());
        let pad = ((hi - lo) * 0.05).max(1e-9);

        let mut chart = ChartBuilder::on(panel)
            .caption(format!("trace of {}", samples.names()[j]), ("sans-serif", 20))
            .margin(8)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(0..n_draws, (lo - pad)..(hi + pad))
            .map_err(plot_err)?;
        chart.configure_mesh().draw().map_err(plot_err)?;

        for chain in 0..samples.n_chains() {
            let color = Palette99::pick(chain);
            chart
                .draw_series(LineSeries::new(
                    (0..n_draws).map(|t| (t, draws[[chain, t, j]])),
                    color.stroke_width(1),
                ))
                .map_err(plot_err)?;
        }
    }

    root.present().map_err(plot_err)?;
    Ok(())
}
