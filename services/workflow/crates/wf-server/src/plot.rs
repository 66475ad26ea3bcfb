//! Chart rendering for the `/plot_data` endpoint.
//!
//! Draws one panel per requested measurement (electron density on the left,
//! frequency on the right) with one line-and-marker series per product, and
//! encodes the result as an in-memory PNG.

use std::io::Cursor;
use std::sync::OnceLock;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;
use thiserror::Error;

use ionwf_common::{Measurement, Product, WorkflowOutput};

/// Width of one chart panel in pixels.
const PANEL_WIDTH: u32 = 700;
/// Height of the image in pixels, caption strip included.
const PANEL_HEIGHT: u32 = 600;
/// Height reserved at the bottom for the caption line.
const CAPTION_HEIGHT: u32 = 36;

/// DejaVu Sans, embedded so text rendering never depends on system fonts.
static FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("embedded font could not be registered")]
    Font,
}

fn draw_err<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Draw(e.to_string())
}

fn ensure_font() -> Result<(), PlotError> {
    let ok = FONT_REGISTERED.get_or_init(|| {
        plotters::style::register_font("sans-serif", FontStyle::Normal, FONT_BYTES).is_ok()
    });
    if *ok {
        Ok(())
    } else {
        Err(PlotError::Font)
    }
}

fn series_color(product: Product) -> RGBColor {
    match product {
        Product::Nequick => RGBColor(31, 119, 180),
        Product::Tadm => RGBColor(255, 127, 14),
        Product::Nedm2020 => RGBColor(44, 160, 44),
    }
}

/// Which panels to draw, in fixed left-to-right order.
fn panel_order(measurements: &[Measurement]) -> Vec<Measurement> {
    let mut panels = Vec::new();
    for measurement in [Measurement::Edensity, Measurement::Frequency] {
        if measurements.contains(&measurement) {
            panels.push(measurement);
        }
    }
    panels
}

/// Render the workflow output as a PNG image.
///
/// # Errors
///
/// Returns [`PlotError`] if no measurement was requested, drawing fails, or
/// the bitmap cannot be encoded.
pub fn render_png(output: &WorkflowOutput) -> Result<Vec<u8>, PlotError> {
    ensure_font()?;

    let panels = panel_order(&output.measurements);
    if panels.is_empty() {
        return Err(PlotError::Draw("no measurements to plot".to_string()));
    }

    #[allow(clippy::cast_possible_truncation)]
    let width = PANEL_WIDTH * panels.len() as u32;
    let height = PANEL_HEIGHT;

    let mut buf = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let (chart_strip, caption_strip) = root.split_vertically(height - CAPTION_HEIGHT);

        caption_strip
            .draw(&Text::new(
                caption_line(output),
                (20, 8),
                ("sans-serif", 16).into_font().color(&BLACK),
            ))
            .map_err(draw_err)?;

        // Panels share the height axis, matplotlib sharey-style.
        let y_max = height_axis_max(output);
        for (area, measurement) in chart_strip
            .split_evenly((1, panels.len()))
            .iter()
            .zip(&panels)
        {
            draw_panel(area, *measurement, output, y_max)?;
        }

        root.present().map_err(draw_err)?;
    }

    let img = image::RgbImage::from_raw(width, height, buf)
        .ok_or_else(|| PlotError::Draw("bitmap buffer size mismatch".to_string()))?;
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}

/// Caption below the panels: query parameters and grid conditions.
fn caption_line(output: &WorkflowOutput) -> String {
    format!(
        "{}, [Lat: {},Lon: {}], ssn: {}, f10.7: {}, kp: {}",
        output.timestamp.format("%Y-%m-%d %H:%M:%S"),
        output.location[0],
        output.location[1],
        output.ssn,
        output.f10_7,
        output.kp
    )
}

/// Shared y-axis upper bound: highest sample plus 5% headroom.
fn height_axis_max(output: &WorkflowOutput) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let max = output
        .plot_data
        .values()
        .flat_map(|p| p.theight.iter().copied())
        .max()
        .unwrap_or(1000) as f64;
    (max * 1.05).max(1.0)
}

/// Measurement values of one profile, scaled for plotting.
/// Electron density is plotted in units of 10^6 el/cm^3.
fn series_points(
    profile: &ionwf_common::VerticalProfile,
    measurement: Measurement,
) -> Option<Vec<(f64, f64)>> {
    let values = match measurement {
        Measurement::Frequency => profile.frequency.as_ref()?,
        Measurement::Edensity => profile.edensity.as_ref()?,
    };
    let scale = match measurement {
        Measurement::Frequency => 1.0,
        Measurement::Edensity => 1e-6,
    };
    #[allow(clippy::cast_precision_loss)]
    Some(
        values
            .iter()
            .zip(&profile.theight)
            .map(|(&v, &h)| (v * scale, h as f64))
            .collect(),
    )
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    measurement: Measurement,
    output: &WorkflowOutput,
    y_max: f64,
) -> Result<(), PlotError> {
    let series: Vec<(Product, Vec<(f64, f64)>)> = output
        .plot_data
        .iter()
        .filter_map(|(product, profile)| {
            series_points(profile, measurement).map(|points| (*product, points))
        })
        .collect();

    let x_max = series
        .iter()
        .flat_map(|(_, points)| points.iter().map(|&(x, _)| x))
        .fold(0.0f64, f64::max)
        .max(f64::MIN_POSITIVE)
        * 1.05;

    let product_list = output
        .products
        .iter()
        .map(|product| product.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let (title, x_desc) = match measurement {
        Measurement::Edensity => (
            format!("Electron Density vs Height - {product_list}"),
            "Electron Density (el/cm^3)",
        ),
        Measurement::Frequency => (
            format!("Frequency vs Height - {product_list}"),
            "Frequency (MHz)",
        ),
    };

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)
        .map_err(draw_err)?;

    let sci_fmt = |v: &f64| format!("{v:.2}\u{d7}10\u{2076}");
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(x_desc).y_desc("Height (km)");
    if measurement == Measurement::Edensity {
        mesh.x_label_formatter(&sci_fmt);
    }
    mesh.draw().map_err(draw_err)?;

    for (product, points) in &series {
        let color = series_color(*product);
        chart
            .draw_series(LineSeries::new(points.iter().copied(), &color))
            .map_err(draw_err)?
            .label(product.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color));
        chart
            .draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
            )
            .map_err(draw_err)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use ionwf_common::VerticalProfile;
    use std::collections::BTreeMap;

    fn sample_output(measurements: Vec<Measurement>) -> WorkflowOutput {
        let mut plot_data = BTreeMap::new();
        plot_data.insert(
            Product::Nequick,
            VerticalProfile {
                theight: vec![100, 300, 600, 900],
                frequency: Some(vec![2.5, 8.1, 5.5, 3.2]),
                edensity: Some(vec![7.7e4, 8.1e5, 3.7e5, 1.3e5]),
            },
        );
        plot_data.insert(
            Product::Tadm,
            VerticalProfile {
                theight: vec![100, 300, 600],
                frequency: Some(vec![2.2, 7.4, 5.0]),
                edensity: Some(vec![6.0e4, 6.8e5, 3.1e5]),
            },
        );
        WorkflowOutput {
            timestamp: NaiveDateTime::parse_from_str("2025-02-01T10:45:00", "%Y-%m-%dT%H:%M:%S")
                .unwrap(),
            location: [45.0, 12.0],
            ssn: 120.0,
            f10_7: 153.2,
            kp: 2.3,
            products: vec![Product::Nequick, Product::Tadm],
            measurements,
            plot_data,
        }
    }

    #[test]
    fn render_produces_png_bytes() {
        let png = render_png(&sample_output(vec![Measurement::Edensity])).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[test]
    fn single_measurement_renders_one_panel() {
        let png = render_png(&sample_output(vec![Measurement::Frequency])).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!(img.width(), PANEL_WIDTH);
        assert_eq!(img.height(), PANEL_HEIGHT);
    }

    #[test]
    fn both_measurements_render_side_by_side() {
        let png = render_png(&sample_output(vec![
            Measurement::Frequency,
            Measurement::Edensity,
        ]))
        .unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!(img.width(), PANEL_WIDTH * 2);
    }

    #[test]
    fn no_measurements_is_an_error() {
        assert!(render_png(&sample_output(Vec::new())).is_err());
    }

    #[test]
    fn panel_order_puts_edensity_first() {
        let panels = panel_order(&[Measurement::Frequency, Measurement::Edensity]);
        assert_eq!(panels, vec![Measurement::Edensity, Measurement::Frequency]);
    }

    #[test]
    fn caption_carries_grid_conditions() {
        let caption = caption_line(&sample_output(vec![Measurement::Edensity]));
        assert!(caption.contains("2025-02-01 10:45:00"));
        assert!(caption.contains("ssn: 120"));
        assert!(caption.contains("kp: 2.3"));
    }

    #[test]
    fn height_axis_has_headroom_above_tallest_sample() {
        let y_max = height_axis_max(&sample_output(vec![Measurement::Edensity]));
        assert!(y_max > 900.0);
    }
}
