use crate::analysis::{Distribution, Trend};
use crate::config::{AnnotationConfig, FigureConfig};
use crate::stats::{Histogram, LinearFit, compute_range};
use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeDelta};
use plotters::coord::{CoordTranslate, Shift};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::{FontDesc, FontFamily, FontStyle};
use std::path::Path;

const TITLE_PT: f64 = 18.0;
const AXIS_PT: f64 = 15.0;
const TICK_PT: f64 = 13.0;

const GREEN_BAR: RGBColor = RGBColor(0, 128, 0);
const BLUE_CURVE: RGBColor = RGBColor(0, 0, 255);

/// Renders the trend and distribution charts as SVG files.
pub struct Plotter {
    figure: FigureConfig,
    annotation: AnnotationConfig,
}

impl Plotter {
    pub fn new(figure: FigureConfig, annotation: AnnotationConfig) -> Self {
        Self { figure, annotation }
    }

    /// Chart of summit elevation against hike date with the fitted line.
    pub fn plot_trend<P: AsRef<Path>>(
        &self,
        dates: &[NaiveDate],
        elevations: &[f64],
        trend: &Trend,
        file: P,
    ) -> Result<()> {
        let file = file.as_ref();
        let root = SVGBackend::new(file, self.figure.size_px()).into_drawing_area();
        self.draw_trend(&root, dates, elevations, trend)
            .with_context(|| format!("failed to draw {file:?}"))?;
        root.present()
            .with_context(|| format!("failed to write {file:?}"))?;
        log::info!("wrote {file:?}");
        Ok(())
    }

    /// Histogram of summit elevations with the fitted normal curve.
    pub fn plot_distribution<P: AsRef<Path>>(
        &self,
        distribution: &Distribution,
        file: P,
    ) -> Result<()> {
        let file = file.as_ref();
        let root = SVGBackend::new(file, self.figure.size_px()).into_drawing_area();
        self.draw_distribution(&root, distribution)
            .with_context(|| format!("failed to draw {file:?}"))?;
        root.present()
            .with_context(|| format!("failed to write {file:?}"))?;
        log::info!("wrote {file:?}");
        Ok(())
    }

    fn font(&self, pt: f64, style: FontStyle) -> FontDesc<'static> {
        FontDesc::new(FontFamily::SansSerif, self.figure.pt_to_px(pt), style)
    }

    fn stroke_px(&self, pt: f64) -> u32 {
        self.figure.pt_to_px(pt).round().max(1.0) as u32
    }

    fn draw_trend<DB>(
        &self,
        area: &DrawingArea<DB, Shift>,
        dates: &[NaiveDate],
        elevations: &[f64],
        trend: &Trend,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        area.fill(&WHITE)?;

        let t_min = trend.t_min;
        let days: Vec<f64> = dates
            .iter()
            .map(|date| date.signed_duration_since(t_min).num_days() as f64)
            .collect();

        let (x_lo, x_hi) = pad_range(compute_range(&days));
        let (y_lo, y_hi) = pad_range(compute_range(
            &elevations
                .iter()
                .chain(&trend.fitted)
                .copied()
                .collect::<Vec<_>>(),
        ));

        let mut chart = ChartBuilder::on(area)
            .caption("Elevation v. Time", self.font(TITLE_PT, FontStyle::Bold))
            .margin(20)
            .set_label_area_size(LabelAreaPosition::Left, self.figure.pt_to_px(60.0) as u32)
            .set_label_area_size(LabelAreaPosition::Bottom, self.figure.pt_to_px(30.0) as u32)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

        let format_day = |day: &f64| {
            t_min
                .checked_add_signed(TimeDelta::days(day.round() as i64))
                .map(|date| date.format("%b %d").to_string())
                .unwrap_or_default()
        };
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(8)
            .x_label_formatter(&format_day)
            .y_label_formatter(&|v| format!("{v:.0}"))
            .y_desc("Elevation (ft)")
            .axis_desc_style(self.font(AXIS_PT, FontStyle::Normal))
            .label_style(self.font(TICK_PT, FontStyle::Normal))
            .draw()?;

        let radius = self.figure.pt_to_px(75.0_f64.sqrt() / 2.0).round() as u32;
        chart
            .draw_series(
                days.iter()
                    .zip(elevations)
                    .map(|(&x, &y)| Circle::new((x, y), radius, BLACK.filled())),
            )?
            .label("Summit Elevation")
            .legend(move |(x, y)| Circle::new((x + 10, y), radius, BLACK.filled()));

        let mut fitted: Vec<(f64, f64)> = days
            .iter()
            .copied()
            .zip(trend.fitted.iter().copied())
            .collect();
        fitted.sort_by(|a, b| a.0.total_cmp(&b.0));
        let line_style = GREEN_BAR.stroke_width(self.stroke_px(3.0));
        chart
            .draw_series(LineSeries::new(fitted, line_style))?
            .label("Line of Best Fit")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .label_font(self.font(TICK_PT, FontStyle::Normal))
            .position(SeriesLabelPosition::UpperLeft)
            .draw()?;

        self.draw_annotation(chart.plotting_area(), &trend.fit)?;

        Ok(())
    }

    /// Boxed fit summary anchored at a fraction of the plot area.
    fn draw_annotation<DB, CT>(
        &self,
        plot_area: &DrawingArea<DB, CT>,
        fit: &LinearFit,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
        CT: CoordTranslate,
    {
        let (width, height) = plot_area.dim_in_pixel();
        let pixels = plot_area.strip_coord_spec();

        let text_style = self.font(TICK_PT, FontStyle::Normal).color(&BLACK);
        let lines = annotation_lines(fit);

        let mut text_w = 0;
        for line in &lines {
            let (w, _) = pixels.estimate_text_size(line, &text_style)?;
            text_w = text_w.max(w as i32);
        }
        let line_h = (self.figure.pt_to_px(TICK_PT) * 1.25).round() as i32;
        let pad = self.figure.pt_to_px(4.0).round() as i32;
        let box_w = text_w + 2 * pad;
        let box_h = line_h * lines.len() as i32 + 2 * pad;

        let left = (self.annotation.x_frac * width as f64).round() as i32;
        let bottom = ((1.0 - self.annotation.y_frac) * height as f64).round() as i32;
        let top = bottom - box_h;

        pixels.draw(&Rectangle::new(
            [(left, top), (left + box_w, bottom)],
            WHITE.mix(0.8).filled(),
        ))?;
        pixels.draw(&Rectangle::new(
            [(left, top), (left + box_w, bottom)],
            BLACK.stroke_width(1),
        ))?;
        for (idx, line) in lines.iter().enumerate() {
            pixels.draw(&Text::new(
                line.as_str(),
                (left + pad, top + pad + line_h * idx as i32),
                text_style.clone(),
            ))?;
        }

        Ok(())
    }

    fn draw_distribution<DB>(
        &self,
        area: &DrawingArea<DB, Shift>,
        dist: &Distribution,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        area.fill(&WHITE)?;

        let hist = &dist.histogram;
        let edges = &hist.bin_edges;
        let (x_lo, x_hi) = pad_range((edges[0], edges[edges.len() - 1]));
        let curve_max = dist
            .normal_curve
            .iter()
            .map(|&(_, y)| y)
            .fold(0.0, f64::max);
        let y_hi = (hist.max_count() as f64).max(curve_max) * 1.05;

        let mut chart = ChartBuilder::on(area)
            .caption("Summit Histogram", self.font(TITLE_PT, FontStyle::Bold))
            .margin(20)
            .set_label_area_size(LabelAreaPosition::Left, self.figure.pt_to_px(40.0) as u32)
            .set_label_area_size(LabelAreaPosition::Bottom, self.figure.pt_to_px(40.0) as u32)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_label_formatter(&|v| format!("{v:.0}"))
            .y_label_formatter(&|v| format!("{v:.0}"))
            .x_desc("Elevation (ft)")
            .y_desc("N")
            .axis_desc_style(self.font(AXIS_PT, FontStyle::Normal))
            .label_style(self.font(TICK_PT, FontStyle::Normal))
            .draw()?;

        chart.draw_series(
            bar_corners(hist).map(|corners| Rectangle::new(corners, GREEN_BAR.filled())),
        )?;
        let edge_style = BLACK.stroke_width(self.stroke_px(1.2));
        chart.draw_series(bar_corners(hist).map(|corners| Rectangle::new(corners, edge_style)))?;

        let mean = dist.fit.mean;
        let dash_style = BLACK.stroke_width(self.stroke_px(1.5));
        let dash_px = self.figure.pt_to_px(5.5).round() as u32;
        let gap_px = self.figure.pt_to_px(2.4).round() as u32;
        chart
            .draw_series(DashedLineSeries::new(
                vec![(mean, 0.0), (mean, y_hi)],
                dash_px,
                gap_px,
                dash_style,
            ))?
            .label("Mean Elevation (ft)")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], dash_style));

        let curve_style = BLUE_CURVE.stroke_width(self.stroke_px(2.5));
        chart
            .draw_series(LineSeries::new(dist.normal_curve.iter().copied(), curve_style))?
            .label("Normal Curve")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], curve_style));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .label_font(self.font(TICK_PT, FontStyle::Normal))
            .position(SeriesLabelPosition::UpperLeft)
            .draw()?;

        Ok(())
    }
}

/// Lines of the trend annotation box.
pub fn annotation_lines(fit: &LinearFit) -> [String; 3] {
    [
        format!("Intercept: {:.2} ft", fit.intercept),
        format!("R-value: {:.3}", fit.r),
        format!("P-value: {}", format_sci(fit.p_value, 3)),
    ]
}

/// Scientific notation with a signed, zero-padded two-digit exponent (`1.819e-05`).
pub fn format_sci(val: f64, prec: usize) -> String {
    let repr = format!("{val:.prec$e}");
    match repr.split_once('e') {
        Some((mantissa, exp)) => match exp.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.abs())
            }
            Err(_) => repr,
        },
        None => repr,
    }
}

fn bar_corners(hist: &Histogram) -> impl Iterator<Item = [(f64, f64); 2]> + '_ {
    let edges = &hist.bin_edges;
    hist.counts
        .iter()
        .enumerate()
        .map(move |(idx, &count)| [(edges[idx], 0.0), (edges[idx + 1], count as f64)])
}

/// Widen a range by 5% on each side, or by 1 if it is empty.
fn pad_range((lo, hi): (f64, f64)) -> (f64, f64) {
    let pad = if hi > lo { 0.05 * (hi - lo) } else { 1.0 };
    (lo - pad, hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sci_format_pads_exponent() {
        assert_eq!(format_sci(1.8189e-5, 3), "1.819e-05");
        assert_eq!(format_sci(0.5, 3), "5.000e-01");
        assert_eq!(format_sci(12345.0, 2), "1.23e+04");
        assert_eq!(format_sci(0.0, 3), "0.000e+00");
    }

    #[test]
    fn annotation_has_fit_summary() {
        let fit = LinearFit {
            slope: 1.9e-3,
            intercept: 7160.748,
            r: 0.79283,
            p_value: 1.8189e-5,
            std_err: 3.4e-4,
            intercept_std_err: 500.0,
            n_points: 21,
        };
        let lines = annotation_lines(&fit);
        assert_eq!(lines[0], "Intercept: 7160.75 ft");
        assert_eq!(lines[1], "R-value: 0.793");
        assert_eq!(lines[2], "P-value: 1.819e-05");
    }

    #[test]
    fn histogram_chart_has_mean_line_and_curve() {
        let dataset = crate::dataset::Dataset::hikes().unwrap();
        let dist = crate::analysis::analyze_distribution(
            &dataset,
            &crate::config::HistogramConfig::default(),
        )
        .unwrap();
        let plotter = Plotter::new(FigureConfig::default(), AnnotationConfig::default());

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (1000, 700)).into_drawing_area();
            plotter.draw_distribution(&root, &dist).unwrap();
            root.present().unwrap();
        }
        assert!(svg.contains("Summit Histogram"));
        assert!(svg.contains("Mean Elevation (ft)"));
        assert!(svg.contains("Normal Curve"));
    }

    #[test]
    fn pad_range_handles_empty_range() {
        assert_eq!(pad_range((0.0, 10.0)), (-0.5, 10.5));
        assert_eq!(pad_range((3.0, 3.0)), (2.0, 4.0));
    }
}
