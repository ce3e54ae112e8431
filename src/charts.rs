//! Chart data and PNG rasterization for account reports.
//!
//! Charts carry no text: titles, axis names and legends are written into the
//! surrounding report markup, so rasterization needs no font backend.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::path::Path;

use plotters::prelude::*;

use crate::aggregator::InsightAggregator;
use crate::config::SliceWeighting;
use crate::error::{InsightsError, Result};
use crate::models::TermCount;

/// Histogram figure size in pixels
pub const HISTOGRAM_SIZE: (u32, u32) = (1000, 500);
/// Pie figure size in pixels
pub const PIE_SIZE: (u32, u32) = (700, 700);

const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);

/// Slice colors, cycled when there are more slices than entries
pub const PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

/// One histogram bar covering `[lower, upper)`, the last bar also including `upper`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// One pie slice
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
}

impl PieSlice {
    /// Share of the whole pie in percent
    #[must_use]
    pub fn percent(&self, total: f64) -> f64 {
        if total > 0.0 {
            self.value / total * 100.0
        } else {
            0.0
        }
    }
}

/// Split `values` into `bins` equal-width bins spanning their range.
///
/// A range of zero width is widened by 0.5 on both sides. Empty input gives
/// no bins.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if (hi - lo).abs() < f64::EPSILON {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0_usize; bins];
    for value in values {
        let idx = (((value - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lower = lo + width * i as f64;
            let upper = if i + 1 == bins { hi } else { lower + width };
            HistogramBin { lower, upper, count }
        })
        .collect()
}

/// Slice values for a ranked term list.
///
/// `Retally` joins the ranked terms and counts them again, so each distinct
/// term gets one equal slice; `Counts` uses the counts from the full text.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn pie_slices(
    terms: &[TermCount],
    weighting: SliceWeighting,
    aggregator: &InsightAggregator,
) -> Vec<PieSlice> {
    match weighting {
        SliceWeighting::Counts => terms
            .iter()
            .map(|t| PieSlice {
                label: t.term.clone(),
                value: t.count as f64,
            })
            .collect(),
        SliceWeighting::Retally => {
            let joined = terms
                .iter()
                .map(|t| t.term.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let retallied: HashMap<String, usize> = aggregator
                .tally_terms(&joined)
                .into_iter()
                .map(|t| (t.term, t.count))
                .collect();

            terms
                .iter()
                .map(|t| PieSlice {
                    label: t.term.clone(),
                    value: retallied.get(&t.term).copied().unwrap_or(0) as f64,
                })
                .collect()
        }
    }
}

fn render_err<E: std::fmt::Display>(err: E) -> InsightsError {
    InsightsError::Render(err.to_string())
}

/// Draw the ratings histogram as a PNG at `path`
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn draw_histogram(path: &Path, bins: &[HistogramBin]) -> Result<()> {
    let root = BitMapBackend::new(path, HISTOGRAM_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let x_lo = bins.first().map_or(0.0, |b| b.lower);
    let x_hi = bins.last().map_or(1.0, |b| b.upper);
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    let y_hi = max_count as f64 * 1.05;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)
        .map_err(render_err)?;

    chart
        .draw_series(bins.iter().map(|b| {
            let top = b.count as f64;
            Rectangle::new([(b.lower, 0.0), (b.upper, top)], BAR_COLOR.mix(0.7).filled())
        }))
        .map_err(render_err)?;

    chart
        .draw_series(bins.iter().filter(|b| b.count > 0).map(|b| {
            let top = b.count as f64;
            Rectangle::new([(b.lower, 0.0), (b.upper, top)], BLACK.stroke_width(1))
        }))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Draw a pie chart as a PNG at `path`. Slices start at 3 o'clock and run counterclockwise.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn draw_pie(path: &Path, slices: &[PieSlice]) -> Result<()> {
    let root = BitMapBackend::new(path, PIE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let (w, h) = PIE_SIZE;
    let center = (f64::from(w) / 2.0, f64::from(h) / 2.0);
    let radius = f64::from(w.min(h)) * 0.4;
    let total: f64 = slices.iter().map(|s| s.value).sum();

    if total <= 0.0 {
        root.draw(&Circle::new(
            (center.0 as i32, center.1 as i32),
            radius as i32,
            RGBColor(230, 230, 230).filled(),
        ))
        .map_err(render_err)?;
        root.present().map_err(render_err)?;
        return Ok(());
    }

    let mut start = 0.0_f64;
    for (i, slice) in slices.iter().enumerate() {
        let sweep = slice.value / total * 2.0 * PI;
        if sweep <= 0.0 {
            continue;
        }

        let points = wedge_points(center, radius, start, sweep);
        let color = PALETTE[i % PALETTE.len()];
        root.draw(&Polygon::new(points, color.filled()))
            .map_err(render_err)?;
        start += sweep;
    }

    root.present().map_err(render_err)?;
    Ok(())
}

/// Outline of a wedge: the center followed by points along the arc
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn wedge_points(center: (f64, f64), radius: f64, start: f64, sweep: f64) -> Vec<(i32, i32)> {
    // Roughly one point per degree of arc
    let steps = ((sweep.to_degrees()).ceil() as usize).max(2);

    let mut points = Vec::with_capacity(steps + 2);
    points.push((center.0.round() as i32, center.1.round() as i32));
    for step in 0..=steps {
        let angle = start + sweep * step as f64 / steps as f64;
        // Screen y grows downward, so subtract to turn counterclockwise
        let x = radius.mul_add(angle.cos(), center.0);
        let y = (-radius).mul_add(angle.sin(), center.1);
        points.push((x.round() as i32, y.round() as i32));
    }
    points
}
