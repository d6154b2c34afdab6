use crate::config::HistogramConfig;
use crate::dataset::{Dataset, Record};
use crate::stats::{Histogram, LinearFit, NormalFit, compute_range};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::{fs::File, io::BufWriter, path::Path};

/// Linear trend of elevation over time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    /// Earliest hike date, origin of the time axis.
    pub t_min: NaiveDate,
    /// Seconds since `t_min`, in table order.
    pub elapsed_seconds: Vec<f64>,
    pub fit: LinearFit,
    /// Fitted elevation of every record, in table order.
    pub fitted: Vec<f64>,
}

/// Distribution of summit elevations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub fit: NormalFit,
    pub histogram: Histogram,
    /// Normal density in histogram count units.
    pub normal_curve: Vec<(f64, f64)>,
}

pub fn analyze_trend(dataset: &Dataset) -> Result<Trend> {
    let elapsed_seconds = dataset.elapsed_seconds();
    let elevations = dataset.elevations();

    let fit = LinearFit::from_points(&elapsed_seconds, &elevations)
        .context("failed to fit elevation trend")?;
    let fitted = elapsed_seconds.iter().map(|&x| fit.predict(x)).collect();

    Ok(Trend {
        t_min: dataset.t_min(),
        elapsed_seconds,
        fit,
        fitted,
    })
}

pub fn analyze_distribution(dataset: &Dataset, cfg: &HistogramConfig) -> Result<Distribution> {
    let elevations = dataset.elevations();

    let fit = NormalFit::from_values(&elevations).context("failed to fit elevation normal")?;

    let n_bins = cfg.n_bins.unwrap_or(dataset.len());
    let histogram =
        Histogram::from_values(&elevations, n_bins).context("failed to bin elevations")?;
    log::info!(
        "binned {} elevations into {} bins of {:.1} ft",
        elevations.len(),
        histogram.n_bins(),
        histogram.bin_width()
    );

    let (lo, hi) = compute_range(&elevations);
    let scale = elevations.len() as f64 * histogram.bin_width();
    let normal_curve = fit
        .scaled_pdf_curve(lo, hi, cfg.curve_points, scale)
        .context("failed to evaluate normal curve")?;

    Ok(Distribution {
        fit,
        histogram,
        normal_curve,
    })
}

/// Results of the full analysis, written to the results file.
#[derive(Debug, Serialize)]
pub struct Analysis<'a> {
    pub records: &'a [Record],
    pub trend: Trend,
    pub distribution: Distribution,
}

impl<'a> Analysis<'a> {
    pub fn new(dataset: &'a Dataset, cfg: &HistogramConfig) -> Result<Self> {
        let trend = analyze_trend(dataset).context("failed to analyze trend")?;
        log::info!("{:#?}", trend.fit);

        let distribution =
            analyze_distribution(dataset, cfg).context("failed to analyze distribution")?;
        log::info!("{:#?}", distribution.fit);

        Ok(Self {
            records: dataset.records(),
            trend,
            distribution,
        })
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, self).context("failed to serialize results")?;
        Ok(())
    }
}
