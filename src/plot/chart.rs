//! Scatter-plus-fit chart rendered to PNG.
//!
//! The chart description is data-driven: series and bounds are computed in
//! [`ChartSpec::new`] and `render_png` only draws. Plotters renders into an
//! in-memory RGB buffer which is then PNG-encoded, so the caller decides
//! where (and whether) the bytes are written.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::CoordinatePair;
use crate::error::PipelineError;
use crate::fit::FittedLine;
use crate::plot::font::{FONT_FAMILY, font_available};

/// Relative padding added around the data range.
const PADDING: f64 = 0.05;

const MARKER_RADIUS: i32 = 3;
const LINE_COLOR: RGBColor = RGBColor(128, 128, 128);

/// A render-only chart description.
#[derive(Debug, Clone)]
pub struct ChartSpec<'a> {
    pub title: &'a str,
    pub x_label: &'a str,
    pub y_label: &'a str,
    /// Observed pairs, drawn as markers.
    pub points: Vec<(f64, f64)>,
    /// `(x, predict(x))` for every observed x, sorted by x and drawn as a line.
    pub fit: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    /// Image size in pixels.
    pub size: (u32, u32),
    /// Draw title, axis titles and tick labels (requires a registered font).
    pub draw_text: bool,
}

impl<'a> ChartSpec<'a> {
    pub fn new(
        title: &'a str,
        (x_label, y_label): (&'a str, &'a str),
        pairs: &[CoordinatePair],
        line: &FittedLine,
        size: (u32, u32),
    ) -> Self {
        let points: Vec<(f64, f64)> = pairs.iter().map(|p| (p.x, p.y)).collect();

        let mut fit: Vec<(f64, f64)> = pairs.iter().map(|p| (p.x, line.predict(p.x))).collect();
        fit.sort_by(|a, b| a.0.total_cmp(&b.0));

        let x_bounds = padded_bounds(points.iter().map(|p| p.0));
        let y_bounds = padded_bounds(points.iter().chain(&fit).map(|p| p.1));

        Self {
            title,
            x_label,
            y_label,
            points,
            fit,
            x_bounds,
            y_bounds,
            size,
            draw_text: font_available(),
        }
    }
}

/// Render the chart and return the encoded PNG bytes.
pub fn render_png(spec: &ChartSpec<'_>) -> Result<Vec<u8>, PipelineError> {
    if spec.points.is_empty() {
        return Err(PipelineError::RenderFailure("no points to plot".to_string()));
    }
    let (width, height) = spec.size;
    if width == 0 || height == 0 {
        return Err(PipelineError::RenderFailure(format!(
            "invalid image size {width}x{height}"
        )));
    }

    let mut rgb = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        draw_chart(&root, spec).map_err(|e| PipelineError::RenderFailure(e.to_string()))?;
        root.present()
            .map_err(|e| PipelineError::RenderFailure(e.to_string()))?;
    }

    encode_png(&rgb, width, height)
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec<'_>,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let [x0, x1] = spec.x_bounds;
    let [y0, y1] = spec.y_bounds;

    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(root);
    builder.margin(15);
    if spec.draw_text {
        builder
            .caption(spec.title, (FONT_FAMILY, 20))
            .x_label_area_size(45)
            .y_label_area_size(60);
    }
    let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1)?;

    if spec.draw_text {
        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_desc(spec.x_label)
            .y_desc(spec.y_label)
            .x_labels(6)
            .y_labels(6)
            .label_style((FONT_FAMILY, 12))
            .axis_desc_style((FONT_FAMILY, 14))
            .draw()?;
    } else {
        // Without a font only the frame of the plotting area is drawn.
        chart
            .plotting_area()
            .draw(&Rectangle::new([(x0, y0), (x1, y1)], BLACK.stroke_width(1)))?;
    }

    chart.draw_series(
        spec.points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), MARKER_RADIUS, BLACK.filled())),
    )?;
    chart.draw_series(LineSeries::new(
        spec.fit.iter().copied(),
        LINE_COLOR.stroke_width(2),
    ))?;

    Ok(())
}

fn encode_png(rgb: &[u8], width: u32, height: u32) -> Result<Vec<u8>, PipelineError> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| PipelineError::RenderFailure(format!("PNG encoding failed: {e}")))?;
    Ok(png)
}

/// Finite `[min, max]` of `values`, padded and widened when degenerate.
fn padded_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (mut lo, mut hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !(lo.is_finite() && hi.is_finite()) {
        return [0.0, 1.0];
    }
    if (hi - lo).abs() < 1e-9 {
        let half = (lo.abs() * PADDING).max(0.5);
        lo -= half;
        hi += half;
    }

    let pad = (hi - lo) * PADDING;
    [lo - pad, hi + pad]
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 4] = [0x89, b'P', b'N', b'G'];

    fn line() -> FittedLine {
        FittedLine {
            slope: 2.0,
            intercept: -1.0,
            r_squared: 1.0,
            n: 3,
        }
    }

    fn pairs() -> Vec<CoordinatePair> {
        vec![
            CoordinatePair { x: 3.0, y: 5.0 },
            CoordinatePair { x: 1.0, y: 1.0 },
            CoordinatePair { x: 2.0, y: 3.0 },
        ]
    }

    #[test]
    fn fit_series_is_sorted_and_predicted() {
        let pairs = pairs();
        let spec = ChartSpec::new("t", ("x", "y"), &pairs, &line(), (100, 100));
        assert_eq!(spec.fit, vec![(1.0, 1.0), (2.0, 3.0), (3.0, 5.0)]);
        assert_eq!(spec.points[0], (3.0, 5.0));
        assert!(spec.x_bounds[0] < 1.0 && spec.x_bounds[1] > 3.0);
        assert!(spec.y_bounds[0] < 1.0 && spec.y_bounds[1] > 5.0);
    }

    #[test]
    fn degenerate_bounds_are_widened() {
        let [lo, hi] = padded_bounds([4.0, 4.0].into_iter());
        assert!(lo < 4.0 && hi > 4.0);
        assert_eq!(padded_bounds(std::iter::empty()), [0.0, 1.0]);
    }

    #[test]
    fn renders_png_without_text() {
        let pairs = pairs();
        let mut spec = ChartSpec::new("t", ("x", "y"), &pairs, &line(), (200, 150));
        spec.draw_text = false;

        let png = render_png(&spec).unwrap();
        assert_eq!(&png[..4], &PNG_MAGIC);

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 150));
    }

    #[test]
    fn registered_font_draws_title_and_axis_text() {
        if !crate::plot::ensure_font(None) {
            // No TTF on this machine; text rendering cannot be exercised.
            return;
        }
        let pairs = pairs();
        let spec = ChartSpec::new(
            "24h - DAPI vs DIC Count",
            ("DIC Count", "DAPI Count"),
            &pairs,
            &line(),
            (300, 300),
        );
        assert!(spec.draw_text);

        let bare = ChartSpec {
            draw_text: false,
            ..spec.clone()
        };
        let with_text = image::load_from_memory(&render_png(&spec).unwrap()).unwrap().to_rgb8();
        let without_text = image::load_from_memory(&render_png(&bare).unwrap()).unwrap().to_rgb8();
        assert_ne!(with_text.as_raw(), without_text.as_raw());
    }

    #[test]
    fn empty_chart_is_a_render_failure() {
        let mut spec = ChartSpec::new("t", ("x", "y"), &[], &line(), (100, 100));
        spec.draw_text = false;
        assert!(matches!(render_png(&spec), Err(PipelineError::RenderFailure(_))));
    }
}
