//! Raster rendering of chart series into PNG bytes.
//!
//! Charts are drawn with the plotters bitmap backend into an in-memory RGB
//! buffer, then PNG-encoded. Text uses an embedded DejaVu Sans registered as
//! the `sans-serif` family, so rendering never depends on system fonts.

use std::fmt::Display;
use std::sync::OnceLock;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::register_font;

use super::RenderOptions;
use crate::distribution::{Histogram, Kde};
use crate::error::AnalysisError;
use crate::spc::ChartSeries;

static SANS_SERIF: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

const CAPTION_SIZE: u32 = 18;

const SERIES_COLOR: RGBColor = RGBColor(31, 119, 180);
const CENTER_COLOR: RGBColor = RGBColor(44, 160, 44);
const LIMIT_COLOR: RGBColor = RGBColor(214, 39, 40);

fn render_err<E: Display>(err: E) -> AnalysisError {
    AnalysisError::Render(err.to_string())
}

/// Registers the embedded font with plotters, once per process.
fn ensure_font() -> Result<(), AnalysisError> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED
        .get_or_init(|| register_font("sans-serif", FontStyle::Normal, SANS_SERIF).is_ok());
    if ok {
        Ok(())
    } else {
        Err(AnalysisError::Render("embedded font could not be loaded".to_string()))
    }
}

/// Allocates an RGB buffer, runs `draw` on it, and PNG-encodes the result.
fn rasterize<F>(options: &RenderOptions, draw: F) -> Result<Vec<u8>, AnalysisError>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), AnalysisError>,
{
    let (width, height) = (options.width, options.height);
    if width == 0 || height == 0 {
        return Err(AnalysisError::Render(format!(
            "image size must be non-zero, got {width}x{height}"
        )));
    }
    ensure_font()?;

    let mut buf = vec![0_u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        draw(&root)?;
        root.present().map_err(render_err)?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&buf, width, height, ExtendedColorType::Rgb8)
        .map_err(render_err)?;
    Ok(png)
}

/// Y-axis bounds covering `values`, padded by 5%; flat data gets a unit pad.
fn padded_bounds(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return (0.0, 1.0);
    }
    let span = hi - lo;
    if span < 1e-12 {
        let pad = (lo.abs() * 0.05).max(0.5);
        return (lo - pad, hi + pad);
    }
    (lo - span * 0.05, hi + span * 0.05)
}

/// Line chart with point markers; point `i` is drawn at x = `i`.
///
/// Control limits, when present, are drawn as horizontal reference lines.
pub(super) fn line_chart(
    title: &str,
    series: &ChartSeries,
    options: &RenderOptions,
) -> Result<Vec<u8>, AnalysisError> {
    let values = series.values();
    let limits = series.limits();

    let x_range = -0.5..(values.len().max(1) as f64 - 0.5);
    let limit_values = limits
        .map(|l| vec![l.lcl, l.cl, l.ucl])
        .unwrap_or_default();
    let (y_lo, y_hi) = padded_bounds(values.iter().copied().chain(limit_values));

    rasterize(options, |root| {
        let mut chart = ChartBuilder::on(root)
            .margin(5)
            .caption(title, ("sans-serif", CAPTION_SIZE))
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range.clone(), y_lo..y_hi)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .draw()
            .map_err(render_err)?;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x_range.start, y_lo), (x_range.end, y_hi)],
                BLACK.stroke_width(1),
            )))
            .map_err(render_err)?;

        if let Some(l) = limits {
            let hline = |y: f64, color: RGBColor| {
                PathElement::new(
                    vec![(x_range.start, y), (x_range.end, y)],
                    color.stroke_width(1),
                )
            };
            chart
                .draw_series([
                    hline(l.cl, CENTER_COLOR),
                    hline(l.ucl, LIMIT_COLOR),
                    hline(l.lcl, LIMIT_COLOR),
                ])
                .map_err(render_err)?;
        }

        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64, v))
            .collect();
        chart
            .draw_series(LineSeries::new(
                points.iter().copied(),
                SERIES_COLOR.stroke_width(2),
            ))
            .map_err(render_err)?;
        chart
            .draw_series(
                points
                    .iter()
                    .map(|&p| Circle::new(p, 3, SERIES_COLOR.filled())),
            )
            .map_err(render_err)?;
        Ok(())
    })
}

/// Frequency histogram with a count-scaled KDE curve over the data range.
pub(super) fn histogram(
    title: &str,
    values: &[f64],
    options: &RenderOptions,
) -> Result<Vec<u8>, AnalysisError> {
    // The series is validated upstream; a `None` here comes from the options.
    let hist = Histogram::equal_width(values, options.histogram_bins).ok_or_else(|| {
        AnalysisError::Render(format!(
            "cannot bin {} values into {} bins",
            values.len(),
            options.histogram_bins
        ))
    })?;
    let curve = Kde::fit(values, options.bandwidth)
        .ok_or_else(|| {
            AnalysisError::Render(format!("invalid KDE bandwidth {:?}", options.bandwidth))
        })?
        .curve(options.kde_points, 0.0)
        .scaled(hist.count_scale());

    let (x_lo, x_hi) = hist.range();
    let x_pad = (x_hi - x_lo) * 0.025;
    let x_range = (x_lo - x_pad)..(x_hi + x_pad);
    let y_hi = (hist.max_count() as f64).max(curve.max_y()).max(1.0) * 1.1;

    rasterize(options, |root| {
        let mut chart = ChartBuilder::on(root)
            .margin(5)
            .caption(title, ("sans-serif", CAPTION_SIZE))
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range.clone(), 0.0..y_hi)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc("Count")
            .draw()
            .map_err(render_err)?;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x_range.start, 0.0), (x_range.end, y_hi)],
                BLACK.stroke_width(1),
            )))
            .map_err(render_err)?;

        let bars = hist.bars().map(|(lo, hi, count)| (lo, hi, count as f64));
        chart
            .draw_series(bars.clone().map(|(lo, hi, count)| {
                Rectangle::new([(lo, 0.0), (hi, count)], SERIES_COLOR.mix(0.5).filled())
            }))
            .map_err(render_err)?;
        chart
            .draw_series(bars.map(|(lo, hi, count)| {
                Rectangle::new([(lo, 0.0), (hi, count)], SERIES_COLOR.stroke_width(1))
            }))
            .map_err(render_err)?;

        chart
            .draw_series(LineSeries::new(curve.points(), SERIES_COLOR.stroke_width(2)))
            .map_err(render_err)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spc::ControlLimits;

    fn small() -> RenderOptions {
        RenderOptions {
            width: 120,
            height: 90,
            ..RenderOptions::default()
        }
    }

    fn decode(png: &[u8]) -> image::RgbImage {
        image::load_from_memory_with_format(png, image::ImageFormat::Png)
            .expect("valid png")
            .to_rgb8()
    }

    #[test]
    fn padded_bounds_cases() {
        assert_eq!(padded_bounds(Vec::<f64>::new()), (0.0, 1.0));
        assert_eq!(padded_bounds([4.0, 4.0]), (3.5, 4.5));
        let (lo, hi) = padded_bounds([0.0, 10.0]);
        assert!((lo + 0.5).abs() < 1e-12);
        assert!((hi - 10.5).abs() < 1e-12);
    }

    #[test]
    fn line_chart_has_requested_size() {
        let series = ChartSeries::new(vec![1.0, 3.0, 2.0]);
        let png = line_chart("I-Chart", &series, &small()).unwrap();
        let img = decode(&png);
        assert_eq!(img.dimensions(), (120, 90));
    }

    #[test]
    fn line_chart_draws_series_pixels() {
        let series = ChartSeries::new(vec![1.0, 3.0, 2.0, 5.0]);
        let png = line_chart("I-Chart", &series, &small()).unwrap();
        let img = decode(&png);
        let colored = img
            .pixels()
            .filter(|p| p.0 == [SERIES_COLOR.0, SERIES_COLOR.1, SERIES_COLOR.2])
            .count();
        assert!(colored > 0);
    }

    #[test]
    fn line_chart_with_limits_and_single_point() {
        let series = ChartSeries::new(vec![2.0]).with_limits(Some(ControlLimits {
            ucl: 3.0,
            cl: 2.0,
            lcl: 1.0,
        }));
        assert!(line_chart("X̄ Chart", &series, &small()).is_ok());
    }

    #[test]
    fn empty_series_still_renders() {
        assert!(line_chart("R Chart", &ChartSeries::default(), &small()).is_ok());
    }

    #[test]
    fn zero_size_is_render_error() {
        let options = RenderOptions {
            width: 0,
            ..RenderOptions::default()
        };
        let err = line_chart("I-Chart", &ChartSeries::new(vec![1.0]), &options).unwrap_err();
        assert!(matches!(err, AnalysisError::Render(_)));
    }

    #[test]
    fn histogram_renders() {
        let values: Vec<f64> = (0..50).map(|i| ((i * 37) % 17) as f64).collect();
        let png = histogram("Histogram with KDE", &values, &small()).unwrap();
        assert_eq!(decode(&png).dimensions(), (120, 90));
    }

    /// Dark pixels in the top `rows` rows, where the caption is drawn.
    fn caption_ink(img: &image::RgbImage, rows: u32) -> usize {
        img.enumerate_pixels()
            .filter(|(_, y, p)| *y < rows && p.0.iter().all(|&c| c < 100))
            .count()
    }

    #[test]
    fn histogram_caption_is_drawn() {
        let values: Vec<f64> = (0..50).map(|i| ((i * 37) % 17) as f64).collect();
        let png = histogram("Histogram with KDE", &values, &RenderOptions::default()).unwrap();
        let img = decode(&png);
        assert!(caption_ink(&img, 20) > 20, "no caption text in the top band");
    }

    #[test]
    fn line_chart_caption_and_tick_labels_are_drawn() {
        let series = ChartSeries::new(vec![1.0, 3.0, 2.0, 5.0, 4.0]);
        let png = line_chart("I-Chart", &series, &RenderOptions::default()).unwrap();
        let img = decode(&png);
        assert!(caption_ink(&img, 20) > 20, "no caption text in the top band");

        // Tick labels sit left of the plot frame.
        let left_ink = img
            .enumerate_pixels()
            .filter(|(x, y, p)| *x < 48 && *y > 30 && p.0.iter().all(|&c| c < 100))
            .count();
        assert!(left_ink > 0, "no y-axis tick labels");
    }

    #[test]
    fn histogram_with_zero_bins_is_a_render_error() {
        let options = RenderOptions {
            histogram_bins: 0,
            ..small()
        };
        let err = histogram("Histogram with KDE", &[1.0, 2.0, 3.0], &options).unwrap_err();
        assert!(matches!(err, AnalysisError::Render(_)), "{err:?}");
        assert_eq!(err.http_status(), 500);
    }
}
