//! Time-series line chart: value/label series -> axes, line, markers, labels.
//!
//! The numeric mapping lives in `ChartLayout` so it can be checked without a
//! surface; `render_series` only turns the layout into drawing calls.

use chrono::NaiveDate;

use crate::domain::{ChartConfig, SeriesPoint};
use crate::plot::surface::{Ink, Point, Surface};

/// Lower bound of the y-axis maximum; keeps all-zero series drawable.
pub const Y_MAX_FLOOR: f64 = 10.0;

/// Point marker radius, in logical units.
pub const MARKER_RADIUS: f64 = 3.0;

/// Plot-area bounds and the mapped point positions.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub max_value: f64,
    pub points: Vec<Point>,
}

impl ChartLayout {
    /// Map `series` into a `width` x `height` surface with `margin` on every side.
    ///
    /// A single point is centered horizontally (there is no `n - 1` span to divide by).
    pub fn compute(series: &[SeriesPoint], width: f64, height: f64, margin: f64) -> Self {
        let left = margin;
        let right = width - margin;
        let top = margin;
        let bottom = height - margin;

        let values: Vec<f64> = series.iter().map(|p| finite_or_zero(p.value)).collect();
        let max_value = values.iter().copied().fold(Y_MAX_FLOOR, f64::max);

        let n = values.len();
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let x = if n > 1 {
                    left + (i as f64 / (n - 1) as f64) * (right - left)
                } else {
                    (left + right) / 2.0
                };
                let y = bottom - (v / max_value) * (bottom - top);
                (x, y)
            })
            .collect();

        Self {
            left,
            right,
            top,
            bottom,
            max_value,
            points,
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Draw `series` onto `surface`, laid out on the `config` area.
///
/// Never fails: an empty series yields the axes and y-axis labels only.
pub fn render_series<S: Surface + ?Sized>(series: &[SeriesPoint], surface: &mut S, config: &ChartConfig) {
    surface.clear();

    let layout = ChartLayout::compute(
        series,
        config.width as f64,
        config.height as f64,
        config.margin as f64,
    );

    // Axes first so the data sits on top.
    surface.line((layout.left, layout.top), (layout.left, layout.bottom), Ink::Axis);
    surface.line((layout.left, layout.bottom), (layout.right, layout.bottom), Ink::Axis);

    for pair in layout.points.windows(2) {
        surface.line(pair[0], pair[1], Ink::Line);
    }
    for &p in &layout.points {
        surface.disc(p, MARKER_RADIUS, Ink::Marker);
    }

    // Labels sit one text-height away from the axis they annotate, but never
    // start left of the surface: a wide maximum eats into the gap instead.
    let max_label = format!("{}", layout.max_value);
    for (text, top) in [("0".to_string(), None), (max_label, Some(layout.top))] {
        let (w, h) = surface.text_extent(&text);
        let y = top.unwrap_or(layout.bottom - h);
        surface.text(&text, ((layout.left - h - w).max(0.0), y), Ink::Label);
    }

    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return;
    };
    let first_label = date_label(&first.label);
    let (_, h) = surface.text_extent(&first_label);
    surface.text(&first_label, (layout.left, layout.bottom + h), Ink::Label);

    if series.len() > 1 {
        let last_label = date_label(&last.label);
        let (w, h) = surface.text_extent(&last_label);
        surface.text(&last_label, ((layout.right - w).max(0.0), layout.bottom + h), Ink::Label);
    }
}

/// Reduce timestamp-like labels to `YYYY-MM-DD`; other labels pass through.
///
/// Accepts compact `YYYYMMDD[HH]` (the pageviews format) and ISO-8601 prefixes.
pub fn date_label(raw: &str) -> String {
    if let Some(compact) = raw.get(..8) {
        if compact.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(date) = NaiveDate::parse_from_str(compact, "%Y%m%d") {
                return date.format("%Y-%m-%d").to_string();
            }
        }
    }
    if let Some(iso) = raw.get(..10) {
        if NaiveDate::parse_from_str(iso, "%Y-%m-%d").is_ok() {
            return iso.to_string();
        }
    }
    raw.to_string()
}
