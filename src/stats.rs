use crate::error::SummitError;
use anyhow::{Context, Result, bail};
use serde::Serialize;
use statrs::distribution::{Continuous, ContinuousCDF, Normal, StudentsT};

/// Guards the t statistic against division by zero when |r| = 1.
const TINY: f64 = 1.0e-20;

/// Online mean and spread of a stream of values (Welford's algorithm).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    /// Maximum-likelihood normal parameters of the values added so far.
    ///
    /// The standard deviation divides by N, not N - 1.
    pub fn normal_fit(&self) -> Result<NormalFit> {
        if self.n_vals == 0 {
            bail!(SummitError::DegenerateFit(
                "normal fit needs at least one value".to_string()
            ));
        }
        let std_dev = (self.diff_2_sum / self.n_vals as f64).sqrt();
        if std_dev.is_nan() || std_dev <= 0.0 {
            bail!(SummitError::DegenerateFit(format!(
                "normal fit needs spread in the values, but standard deviation is {std_dev}"
            )));
        }
        Ok(NormalFit {
            mean: self.mean,
            std_dev,
        })
    }
}

/// Normal distribution fitted to a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalFit {
    pub mean: f64,
    pub std_dev: f64,
}

impl NormalFit {
    /// Fit a normal distribution to `vals` by maximum likelihood.
    pub fn from_values(vals: &[f64]) -> Result<Self> {
        let mut acc = Accumulator::new();
        for &val in vals {
            acc.add(val);
        }
        acc.normal_fit()
    }

    /// Probability density curve at `n_points` evenly spaced points of `[lo, hi]`,
    /// multiplied by `scale`.
    ///
    /// With `scale = N * bin_width` the curve is in histogram count units.
    pub fn scaled_pdf_curve(
        &self,
        lo: f64,
        hi: f64,
        n_points: usize,
        scale: f64,
    ) -> Result<Vec<(f64, f64)>> {
        let dist = Normal::new(self.mean, self.std_dev).context("failed to build normal")?;
        let curve = linspace(lo, hi, n_points)
            .into_iter()
            .map(|x| (x, dist.pdf(x) * scale))
            .collect();
        Ok(curve)
    }
}

/// Ordinary least-squares fit of `y` against `x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient.
    pub r: f64,
    /// Two-sided p-value of the null hypothesis slope = 0.
    pub p_value: f64,
    /// Standard error of the slope.
    pub std_err: f64,
    pub intercept_std_err: f64,
    pub n_points: usize,
}

impl LinearFit {
    pub fn from_points(x: &[f64], y: &[f64]) -> Result<Self> {
        let n_vals = x.len();
        if y.len() != n_vals {
            bail!(SummitError::DataIntegrity(format!(
                "regression needs paired values, but got {} x and {} y",
                n_vals,
                y.len()
            )));
        }
        if n_vals < 2 {
            bail!(SummitError::DegenerateFit(format!(
                "regression needs at least 2 points, but has {n_vals}"
            )));
        }

        let n = n_vals as f64;
        let x_mean = compute_mean(x);
        let y_mean = compute_mean(y);

        let (mut ssxm, mut ssym, mut ssxym) = (0.0, 0.0, 0.0);
        for (&xi, &yi) in x.iter().zip(y) {
            let dx = xi - x_mean;
            let dy = yi - y_mean;
            ssxm += dx * dx;
            ssym += dy * dy;
            ssxym += dx * dy;
        }
        ssxm /= n;
        ssym /= n;
        ssxym /= n;

        if ssxm == 0.0 {
            bail!(SummitError::DegenerateFit(
                "regression needs at least 2 distinct x values".to_string()
            ));
        }

        let r = if ssym == 0.0 {
            0.0
        } else {
            (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
        };

        let slope = ssxym / ssxm;
        let intercept = y_mean - slope * x_mean;

        let (p_value, std_err, intercept_std_err) = if n_vals == 2 {
            let p_value = if y[0] == y[1] { 1.0 } else { 0.0 };
            (p_value, 0.0, 0.0)
        } else {
            let df = n - 2.0;
            let t = r * (df / ((1.0 - r + TINY) * (1.0 + r + TINY))).sqrt();
            let t_dist = StudentsT::new(0.0, 1.0, df).context("failed to build t distribution")?;
            let p_value = 2.0 * t_dist.sf(t.abs());

            let std_err = ((1.0 - r * r) * ssym / ssxm / df).sqrt();
            let intercept_std_err = std_err * (ssxm + x_mean * x_mean).sqrt();
            (p_value, std_err, intercept_std_err)
        };

        Ok(Self {
            slope,
            intercept,
            r,
            p_value,
            std_err,
            intercept_std_err,
            n_points: n_vals,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bin_edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `vals` into `n_bins` equal-width bins spanning their range.
    ///
    /// Every bin is half-open except the last, which also holds the maximum.
    /// A zero-width range is widened to `[v - 0.5, v + 0.5]`.
    pub fn from_values(vals: &[f64], n_bins: usize) -> Result<Self> {
        if n_bins == 0 {
            bail!(SummitError::DegenerateFit(
                "histogram needs at least one bin".to_string()
            ));
        }
        if vals.is_empty() {
            bail!(SummitError::DegenerateFit(
                "histogram needs at least one value".to_string()
            ));
        }

        let (mut lo, mut hi) = compute_range(vals);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let bin_edges = linspace(lo, hi, n_bins + 1);
        let bin_width = (hi - lo) / n_bins as f64;
        let mut counts = vec![0; n_bins];
        for &val in vals {
            let i_bin = (((val - lo) / bin_width) as usize).min(n_bins - 1);
            // Correct for rounding right at an edge.
            let i_bin = if val < bin_edges[i_bin] {
                i_bin.saturating_sub(1)
            } else if i_bin + 1 < n_bins && val >= bin_edges[i_bin + 1] {
                i_bin + 1
            } else {
                i_bin
            };
            counts[i_bin] += 1;
        }

        Ok(Self { bin_edges, counts })
    }

    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_edges[1] - self.bin_edges[0]
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Minimum and maximum of a non-empty slice.
pub fn compute_range(vals: &[f64]) -> (f64, f64) {
    vals.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &val| {
            (lo.min(val), hi.max(val))
        })
}

fn compute_mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

/// `n_points` evenly spaced values from `lo` to `hi`, both included.
fn linspace(lo: f64, hi: f64, n_points: usize) -> Vec<f64> {
    match n_points {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n_points - 1) as f64;
            (0..n_points)
                .map(|idx| {
                    if idx == n_points - 1 {
                        hi
                    } else {
                        lo + step * idx as f64
                    }
                })
                .collect()
        }
    }
}
