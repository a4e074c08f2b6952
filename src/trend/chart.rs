use log::info;
use plotters::prelude::*;
use std::fs;
use std::path::Path;

use crate::error::{DigestError, Result};
use crate::trend::MonthlyTrend;

pub const CHART_TITLE: &str = "ArXiv Papers per Month";

const COUNT_COLOR: RGBColor = RGBColor(31, 119, 180);
const AVERAGE_COLOR: RGBColor = RGBColor(255, 127, 14);

fn chart_err<E: std::fmt::Display>(e: E) -> DigestError {
    DigestError::Chart(e.to_string())
}

/// Draw the monthly line and yearly-average bars to an SVG file.
///
/// Returns `false` without touching the filesystem when the trend is empty.
pub fn draw_trend(trend: &MonthlyTrend, path: &Path) -> Result<bool> {
    if trend.is_empty() {
        info!("No dated papers, skipping chart {:?}", path);
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| DigestError::io(parent, e))?;
        }
    }

    let labels: Vec<String> = trend.buckets.iter().map(|(ym, _)| ym.label()).collect();
    let points: Vec<(f64, f64)> = trend
        .buckets
        .iter()
        .enumerate()
        .map(|(idx, (_, count))| (idx as f64, *count as f64))
        .collect();
    let max_count = points.iter().map(|(_, y)| *y).fold(0.0, f64::max);
    let x_range = -0.5f64..(labels.len() as f64 - 0.5);
    let y_range = 0f64..(max_count * 1.15).max(1.0);

    let root = SVGBackend::new(path, (900, 400)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(CHART_TITLE, ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .map_err(chart_err)?;

    let label_at = |x: &f64| -> String {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    };

    chart
        .configure_mesh()
        .x_labels(labels.len().min(24))
        .x_label_formatter(&label_at)
        .y_desc("Count")
        .draw()
        .map_err(chart_err)?;

    let mut first_bar = true;
    for (year, (first, last)) in trend.year_spans() {
        let avg = trend.yearly_average.get(&year).copied().unwrap_or(0.0);
        let center = (first + last) as f64 / 2.0;
        let half_width = (last - first + 1) as f64 * 0.8 / 2.0;
        let bar = Rectangle::new(
            [(center - half_width, 0.0), (center + half_width, avg)],
            AVERAGE_COLOR.mix(0.2).filled(),
        );

        let series = chart
            .draw_series(std::iter::once(bar))
            .map_err(chart_err)?;
        if first_bar {
            series.label("Annual avg").legend(|(x, y)| {
                Rectangle::new([(x, y - 5), (x + 20, y + 5)], AVERAGE_COLOR.mix(0.2).filled())
            });
            first_bar = false;
        }
    }

    chart
        .draw_series(LineSeries::new(points.clone(), &COUNT_COLOR))
        .map_err(chart_err)?
        .label("Monthly count")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &COUNT_COLOR));

    chart
        .draw_series(points.iter().map(|&point| Circle::new(point, 3, COUNT_COLOR.filled())))
        .map_err(chart_err)?;

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    info!("Trend chart saved to {:?}", path);
    Ok(true)
}
