// ============================================================
// Layer 6 - Loss Curve Plotter
// ============================================================
// Draws training and validation losses per epoch as two line
// series in an SVG chart: <out_dir>/<metric_type>.svg

use anyhow::{anyhow, Result};
use plotters::prelude::*;
use std::{fs, path::PathBuf};

use crate::domain::traits::LossVisualizer;

/// Renders loss curves with plotters.
pub struct LossPlotter {
    out_dir: PathBuf,
    size:    (u32, u32),
}

impl LossPlotter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into(), size: (800, 480) }
    }

    /// File the chart for `metric_type` is written to
    pub fn chart_path(&self, metric_type: &str) -> PathBuf {
        let name: String = metric_type
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        self.out_dir.join(format!("{name}.svg"))
    }
}

/// Upper bound of the y axis: the largest finite value plus 5% headroom.
fn y_upper_bound(series: &[&[f64]]) -> f64 {
    let max = series
        .iter()
        .flat_map(|s| s.iter().copied())
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max);
    if max > 0.0 { max * 1.05 } else { 1.0 }
}

fn points(values: &[f64]) -> Vec<(usize, f64)> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, &v)| (i + 1, v))
        .collect()
}

impl LossVisualizer for LossPlotter {
    fn vis_train(
        &self,
        training:    &[f64],
        validation:  &[f64],
        epochs:      usize,
        metric_type: &str,
    ) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.chart_path(metric_type);

        let root = SVGBackend::new(&path, self.size).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| anyhow!("backend error: {e}"))?;

        {
            let y_max = y_upper_bound(&[training, validation]);
            let mut chart = ChartBuilder::on(&root)
                .margin(10)
                .caption(format!("Training vs validation {metric_type}"), ("sans-serif", 24.0))
                .set_label_area_size(LabelAreaPosition::Left, 60)
                .set_label_area_size(LabelAreaPosition::Bottom, 40)
                .build_cartesian_2d(1usize..epochs.max(2), 0.0..y_max)
                .map_err(|e| anyhow!("chart build error: {e}"))?;

            chart
                .configure_mesh()
                .x_desc("epoch")
                .y_desc(metric_type)
                .draw()
                .map_err(|e| anyhow!("mesh error: {e}"))?;

            chart
                .draw_series(LineSeries::new(points(training), &BLUE))
                .map_err(|e| anyhow!("draw error: {e}"))?
                .label("training")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

            chart
                .draw_series(LineSeries::new(points(validation), &RED))
                .map_err(|e| anyhow!("draw error: {e}"))?
                .label("validation")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(|e| anyhow!("legend error: {e}"))?;
        }

        root.present().map_err(|e| anyhow!("render error: {e}"))?;
        tracing::info!("Loss curves written to '{}'", path.display());
        Ok(())
    }
}
