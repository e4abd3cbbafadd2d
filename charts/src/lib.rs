use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::ranged1d::Ranged;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use thiserror::Error;

use regression::RegressionErrors;
use report::Series;

mod scale;

pub use scale::{FixedTicks, int_to_human};

pub type BackendError = <BitMapBackend<'static> as DrawingBackend>::ErrorType;

#[derive(Debug, Error)]
pub enum ChartErrors {
    #[error("no chart layout defined for algorithm {0:?}")]
    UnknownAlgorithm(String),
    #[error("no data points for algorithm {0:?}")]
    Empty(String),
    #[error("{0}")]
    Regression(#[from] RegressionErrors),
    #[error("drawing failed: {0}")]
    Draw(#[from] DrawingAreaErrorKind<BackendError>),
}

// 11.5x5 in and 10x6 in figures at 192 dpi
const TWO_PANEL_SIZE: (u32, u32) = (2208, 960);
const SINGLE_PANEL_SIZE: (u32, u32) = (1920, 1152);

const CAPTION_FONT: (&str, u32) = ("sans-serif", 28);
const LABEL_FONT: (&str, u32) = ("sans-serif", 16);

/// Hue wheel gradient keyed by density percentage: 0% is red, climbing
/// through the wheel and wrapping back to red at 100%.
pub fn series_color(perc: u32) -> HSLColor {
    HSLColor(f64::from(perc) / 100.0, 1.0, 0.5)
}

/// `{metric}_{algorithm}.png`, lowercased, spaces as underscores.
pub fn file_name(metric: &str, algo: &str) -> String {
    format!("{metric}_{}.png", algo.to_lowercase().replace(' ', "_"))
}

/// Renders the two-panel timing chart for one algorithm and writes it as
/// `time_<algo>.png` into `out_dir`. Returns the written path.
pub fn plot_time(
    algo: &str,
    data: &BTreeMap<u32, Series>,
    out_dir: &Path,
) -> Result<PathBuf, ChartErrors> {
    let path = out_dir.join(file_name("time", algo));
    {
        let root = BitMapBackend::new(&path, TWO_PANEL_SIZE).into_drawing_area();
        draw_time(&root, algo, data)?;
        root.present()?;
    }
    Ok(path)
}

/// Renders the memory chart for one algorithm and writes it as
/// `mem_<algo>.png` into `out_dir`. LEX M gets a single panel; every other
/// algorithm the two-panel layout.
pub fn plot_mem(
    algo: &str,
    data: &BTreeMap<u32, Series>,
    out_dir: &Path,
) -> Result<PathBuf, ChartErrors> {
    let size = if algo == "LEX M" {
        SINGLE_PANEL_SIZE
    } else {
        TWO_PANEL_SIZE
    };
    let path = out_dir.join(file_name("mem", algo));
    {
        let root = BitMapBackend::new(&path, size).into_drawing_area();
        draw_mem(&root, algo, data)?;
        root.present()?;
    }
    Ok(path)
}

fn time_captions(algo: &str) -> Result<(&'static str, &'static str), ChartErrors> {
    match algo {
        "FILL" | "LEX P" => Ok((
            "T = f(V) w/ quadratic regression",
            "T = f(V + E) w/ linear regression",
        )),
        "LEX M" => Ok((
            "T = f(V) w/ cubic regression",
            "T = f(V + E) w/ linear regression",
        )),
        other => Err(ChartErrors::UnknownAlgorithm(other.to_owned())),
    }
}

enum MemLayout {
    Single(&'static str),
    Pair(&'static str, &'static str),
}

fn mem_captions(algo: &str) -> Result<MemLayout, ChartErrors> {
    match algo {
        "FILL" | "LEX P" => Ok(MemLayout::Pair(
            "S = f(V) w/ quadratic regression",
            "S = f(V + E) w/ linear regression",
        )),
        "LEX M" => Ok(MemLayout::Single("S = f(V) w/ linear regression")),
        other => Err(ChartErrors::UnknownAlgorithm(other.to_owned())),
    }
}

/// Pixel offset of the slope annotation, tuned per algorithm and density so
/// neighbouring labels do not overlap. Negative vertical offsets move the
/// label up; the bitmap y axis points down.
fn time_label_offset(algo: &str, perc: u32) -> (i32, i32) {
    match (algo, perc) {
        ("FILL", 100) => (-30, -5),
        ("FILL", 66) => (5, -5),
        ("FILL", _) => (5, 0),
        ("LEX P", 75) => (-30, 10),
        _ => (-30, -5),
    }
}

fn mem_label_offset(algo: &str, perc: u32) -> (i32, i32) {
    if perc == 100 || (algo == "LEX P" && perc == 66) {
        (-35, -5)
    } else {
        (5, 0)
    }
}

fn draw_time(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    algo: &str,
    data: &BTreeMap<u32, Series>,
) -> Result<(), ChartErrors> {
    let (left_caption, right_caption) = time_captions(algo)?;
    let degree = if algo == "LEX M" { 3 } else { 2 };

    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 2));

    // Left panel: time against the vertex count with a polynomial overlay,
    // ticks sitting at the vertex counts the benchmark ran at.
    {
        let x_range = padded_range(data.values().map(|s| s.v.as_slice()), algo)?;
        let y_range = padded_range(data.values().map(|s| s.values.as_slice()), algo)?;
        let ticks = first_series(data, algo)?.v.clone();

        let mut chart = ChartBuilder::on(&panels[0])
            .caption(left_caption, CAPTION_FONT)
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(FixedTicks::new(x_range, ticks), y_range)?;

        chart
            .configure_mesh()
            .x_desc("V")
            .y_desc("CPU Time (ms)")
            .x_labels(20)
            .x_label_formatter(&|v| int_to_human(*v))
            .label_style(LABEL_FONT)
            .draw()?;

        for (&perc, series) in data {
            let fit = regression::polynomial(&series.v, &series.values, degree)?;
            draw_points_and_fit(&mut chart, &series.v, &series.values, &fit, perc, false)?;
        }
    }

    // Right panel: time against the combined size counter with a linear
    // overlay. Carries the shared density legend and the per-series slope
    // (scaled to ns) next to the last fitted point.
    {
        let x_range = padded_range(data.values().map(|s| s.n.as_slice()), algo)?;
        let y_range = padded_range(data.values().map(|s| s.values.as_slice()), algo)?;

        let mut chart = ChartBuilder::on(&panels[1])
            .caption(right_caption, CAPTION_FONT)
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc(if algo == "LEX M" { "VE" } else { "V + E" })
            .x_label_formatter(&|v| int_to_human(*v))
            .label_style(LABEL_FONT)
            .draw()?;

        for (&perc, series) in data {
            let fit = regression::linear(&series.n, &series.values)?;
            draw_points_and_fit(&mut chart, &series.n, &series.values, &fit.predicted, perc, true)?;
            annotate_slope(
                &mut chart,
                &series.n,
                &fit.predicted,
                fit.slope * 1e6,
                time_label_offset(algo, perc),
            )?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::MiddleRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(LABEL_FONT)
            .draw()?;
    }

    Ok(())
}

fn draw_mem(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    algo: &str,
    data: &BTreeMap<u32, Series>,
) -> Result<(), ChartErrors> {
    let layout = mem_captions(algo)?;
    root.fill(&WHITE)?;

    match layout {
        // LEX M memory grows linearly, so it gets one panel over the vertex
        // count with a pinned x range instead of the quadratic/linear pair.
        MemLayout::Single(caption) => {
            let y_range = padded_range(data.values().map(|s| s.values.as_slice()), algo)?;
            let ticks = first_series(data, algo)?.v.clone();

            let mut chart = ChartBuilder::on(root)
                .caption(caption, CAPTION_FONT)
                .margin(10)
                .x_label_area_size(50)
                .y_label_area_size(80)
                .build_cartesian_2d(FixedTicks::new(50.0..1100.0, ticks), y_range)?;

            chart
                .configure_mesh()
                .x_desc("V")
                .y_desc("Allocated memory (bytes)")
                .x_labels(20)
                .x_label_formatter(&|v| int_to_human(*v))
                .y_label_formatter(&|v| int_to_human(*v))
                .label_style(LABEL_FONT)
                .draw()?;

            for (&perc, series) in data {
                let fit = regression::linear(&series.v, &series.values)?;
                draw_points_and_fit(&mut chart, &series.v, &series.values, &fit.predicted, perc, true)?;
                annotate_slope(&mut chart, &series.v, &fit.predicted, fit.slope, (5, 0))?;
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .label_font(LABEL_FONT)
                .draw()?;
        }
        MemLayout::Pair(left_caption, right_caption) => {
            let panels = root.split_evenly((1, 2));

            {
                let x_range = padded_range(data.values().map(|s| s.v.as_slice()), algo)?;
                let y_range = padded_range(data.values().map(|s| s.values.as_slice()), algo)?;
                let ticks = first_series(data, algo)?.v.clone();

                let mut chart = ChartBuilder::on(&panels[0])
                    .caption(left_caption, CAPTION_FONT)
                    .margin(10)
                    .x_label_area_size(50)
                    .y_label_area_size(80)
                    .build_cartesian_2d(FixedTicks::new(x_range, ticks), y_range)?;

                chart
                    .configure_mesh()
                    .x_desc("V")
                    .y_desc("Allocated memory (bytes)")
                    .x_labels(20)
                    .x_label_formatter(&|v| int_to_human(*v))
                    .y_label_formatter(&|v| int_to_human(*v))
                    .label_style(LABEL_FONT)
                    .draw()?;

                for (&perc, series) in data {
                    let fit = regression::polynomial(&series.v, &series.values, 2)?;
                    draw_points_and_fit(&mut chart, &series.v, &series.values, &fit, perc, false)?;
                }
            }

            {
                let x_range = padded_range(data.values().map(|s| s.n.as_slice()), algo)?;
                let y_range = padded_range(data.values().map(|s| s.values.as_slice()), algo)?;

                let mut chart = ChartBuilder::on(&panels[1])
                    .caption(right_caption, CAPTION_FONT)
                    .margin(10)
                    .x_label_area_size(50)
                    .y_label_area_size(50)
                    .build_cartesian_2d(x_range, y_range)?;

                chart
                    .configure_mesh()
                    .x_desc("V + E")
                    .x_label_formatter(&|v| int_to_human(*v))
                    .y_label_formatter(&|v| int_to_human(*v))
                    .label_style(LABEL_FONT)
                    .draw()?;

                for (&perc, series) in data {
                    let fit = regression::linear(&series.n, &series.values)?;
                    draw_points_and_fit(
                        &mut chart,
                        &series.n,
                        &series.values,
                        &fit.predicted,
                        perc,
                        true,
                    )?;
                    annotate_slope(
                        &mut chart,
                        &series.n,
                        &fit.predicted,
                        fit.slope,
                        mem_label_offset(algo, perc),
                    )?;
                }

                chart
                    .configure_series_labels()
                    .position(SeriesLabelPosition::MiddleRight)
                    .background_style(WHITE.mix(0.8))
                    .border_style(BLACK)
                    .label_font(LABEL_FONT)
                    .draw()?;
            }
        }
    }

    Ok(())
}

/// Scatter points plus the fitted curve for one density series. The legend
/// entry is only attached on the panel that carries the shared legend.
fn draw_points_and_fit<X, Y>(
    chart: &mut ChartContext<'_, BitMapBackend<'_>, Cartesian2d<X, Y>>,
    xs: &[f64],
    ys: &[f64],
    fit: &[f64],
    perc: u32,
    with_label: bool,
) -> Result<(), ChartErrors>
where
    X: Ranged<ValueType = f64>,
    Y: Ranged<ValueType = f64>,
{
    let color = series_color(perc);

    chart.draw_series(
        xs.iter()
            .zip(ys)
            .map(|(&x, &y)| Circle::new((x, y), 3, color.filled())),
    )?;

    let line = chart.draw_series(LineSeries::new(
        xs.iter().copied().zip(fit.iter().copied()),
        color.mix(0.5).stroke_width(2),
    ))?;

    if with_label {
        line.label(format!("{perc}%")).legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], color.mix(0.5).stroke_width(2))
        });
    }

    Ok(())
}

fn annotate_slope<X, Y>(
    chart: &mut ChartContext<'_, BitMapBackend<'_>, Cartesian2d<X, Y>>,
    xs: &[f64],
    predicted: &[f64],
    slope: f64,
    offset: (i32, i32),
) -> Result<(), ChartErrors>
where
    X: Ranged<ValueType = f64>,
    Y: Ranged<ValueType = f64>,
{
    let (Some(&x), Some(&y)) = (xs.last(), predicted.last()) else {
        return Ok(());
    };

    chart.draw_series(std::iter::once(
        EmptyElement::at((x, y))
            + Text::new(format!("m={slope:.2}"), offset, LABEL_FONT.into_font()),
    ))?;

    Ok(())
}

/// Data extent across every series of an algorithm, padded by 5% on both
/// sides. An empty extent is a hard error; a single point still gets a
/// drawable range.
fn padded_range<'a>(
    slices: impl Iterator<Item = &'a [f64]>,
    algo: &str,
) -> Result<Range<f64>, ChartErrors> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for slice in slices {
        for &x in slice {
            lo = lo.min(x);
            hi = hi.max(x);
        }
    }

    if lo > hi {
        return Err(ChartErrors::Empty(algo.to_owned()));
    }

    let margin = (hi - lo) * 0.05;
    if margin == 0.0 {
        Ok(lo - 1.0..hi + 1.0)
    } else {
        Ok(lo - margin..hi + margin)
    }
}

fn first_series<'a>(
    data: &'a BTreeMap<u32, Series>,
    algo: &str,
) -> Result<&'a Series, ChartErrors> {
    data.values()
        .next()
        .ok_or_else(|| ChartErrors::Empty(algo.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: &[f64], v: &[f64], values: &[f64]) -> Series {
        Series {
            n: n.to_vec(),
            v: v.to_vec(),
            values: values.to_vec(),
        }
    }

    fn sample_data() -> BTreeMap<u32, Series> {
        let mut data = BTreeMap::new();
        data.insert(
            50,
            series(
                &[2575.0, 10150.0, 22725.0, 40300.0],
                &[100.0, 200.0, 300.0, 400.0],
                &[0.5, 2.1, 4.9, 8.7],
            ),
        );
        data.insert(
            100,
            series(
                &[5050.0, 20100.0, 45150.0, 80200.0],
                &[100.0, 200.0, 300.0, 400.0],
                &[0.9, 4.2, 9.5, 17.1],
            ),
        );
        data
    }

    fn render_time(algo: &str, data: &BTreeMap<u32, Series>) -> Vec<u8> {
        let mut buffer = vec![0u8; 800 * 400 * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (800, 400)).into_drawing_area();
            draw_time(&root, algo, data).unwrap();
            root.present().unwrap();
        }
        buffer
    }

    fn render_mem(algo: &str, data: &BTreeMap<u32, Series>) -> Vec<u8> {
        let mut buffer = vec![0u8; 800 * 400 * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (800, 400)).into_drawing_area();
            draw_mem(&root, algo, data).unwrap();
            root.present().unwrap();
        }
        buffer
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("time", "FILL"), "time_fill.png");
        assert_eq!(file_name("time", "LEX M"), "time_lex_m.png");
        assert_eq!(file_name("mem", "LEX P"), "mem_lex_p.png");
    }

    #[test]
    fn test_series_color_gradient() {
        assert_eq!(series_color(0).to_rgba(), RED.to_rgba());
        assert_ne!(series_color(50).to_rgba(), series_color(0).to_rgba());
        assert_ne!(series_color(50).to_rgba(), series_color(75).to_rgba());
    }

    #[test]
    fn test_unknown_algorithm_is_fatal() {
        let data = sample_data();
        let mut buffer = vec![0u8; 400 * 300 * 3];
        let root = BitMapBackend::with_buffer(&mut buffer, (400, 300)).into_drawing_area();

        assert!(matches!(
            draw_time(&root, "QUICK", &data),
            Err(ChartErrors::UnknownAlgorithm(name)) if name == "QUICK"
        ));
    }

    #[test]
    fn test_empty_data_is_fatal() {
        let data = BTreeMap::new();
        let mut buffer = vec![0u8; 400 * 300 * 3];
        let root = BitMapBackend::with_buffer(&mut buffer, (400, 300)).into_drawing_area();

        assert!(matches!(
            draw_time(&root, "FILL", &data),
            Err(ChartErrors::Empty(_))
        ));
    }

    #[test]
    fn test_time_chart_renders() {
        let data = sample_data();
        let buffer = render_time("FILL", &data);
        assert!(buffer.iter().any(|&b| b != 0xFF));
    }

    #[test]
    fn test_lex_m_time_chart_renders_cubic() {
        let data = sample_data();
        let buffer = render_time("LEX M", &data);
        assert!(buffer.iter().any(|&b| b != 0xFF));
    }

    #[test]
    fn test_mem_chart_renders_two_panels() {
        let data = sample_data();
        let buffer = render_mem("LEX P", &data);
        assert!(buffer.iter().any(|&b| b != 0xFF));
    }

    #[test]
    fn test_lex_m_mem_chart_renders_single_panel() {
        let data = sample_data();
        let buffer = render_mem("LEX M", &data);
        assert!(buffer.iter().any(|&b| b != 0xFF));
    }

    #[test]
    fn test_single_point_series_renders() {
        let mut data = BTreeMap::new();
        data.insert(50, series(&[2575.0], &[100.0], &[0.5]));
        let buffer = render_time("FILL", &data);
        assert!(buffer.iter().any(|&b| b != 0xFF));
    }

    #[test]
    fn test_padded_range_rejects_empty() {
        assert!(matches!(
            padded_range(std::iter::empty(), "FILL"),
            Err(ChartErrors::Empty(_))
        ));
    }

    #[test]
    fn test_padded_range_pads_both_sides() {
        let data = [100.0, 200.0];
        let range = padded_range(std::iter::once(&data[..]), "FILL").unwrap();
        assert_eq!(range.start, 95.0);
        assert_eq!(range.end, 205.0);
    }
}
