use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Chart configuration parameters.
///
/// Every field has a default, so an empty or partial TOML file is valid.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub figure: FigureConfig,
    pub histogram: HistogramConfig,
    pub annotation: AnnotationConfig,
}

/// Figure size and resolution.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FigureConfig {
    /// Figure width in inches.
    pub width_in: f64,
    /// Figure height in inches.
    pub height_in: f64,
    /// Pixels per inch; font point sizes scale with it.
    pub dpi: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width_in: 10.0,
            height_in: 7.0,
            dpi: 100.0,
        }
    }
}

impl FigureConfig {
    /// Figure size in pixels.
    pub fn size_px(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi).round() as u32,
            (self.height_in * self.dpi).round() as u32,
        )
    }

    /// Convert a font size in points to pixels.
    pub fn pt_to_px(&self, pt: f64) -> f64 {
        pt * self.dpi / 72.0
    }
}

/// Histogram binning and normal curve sampling.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistogramConfig {
    /// Number of bins; one bin per record when unset.
    pub n_bins: Option<usize>,
    /// Number of points of the normal curve.
    pub curve_points: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            n_bins: None,
            curve_points: 200,
        }
    }
}

/// Position of the fit annotation box, in fractions of the plot area
/// measured from its bottom-left corner.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotationConfig {
    pub x_frac: f64,
    pub y_frac: f64,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            x_frac: 0.73,
            y_frac: 0.05,
        }
    }
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.figure.width_in, 1.0..=100.0).context("invalid figure width")?;
        check_num(self.figure.height_in, 1.0..=100.0).context("invalid figure height")?;
        check_num(self.figure.dpi, 10.0..=1000.0).context("invalid figure dpi")?;

        if let Some(n_bins) = self.histogram.n_bins {
            check_num(n_bins, 1..10_000).context("invalid number of bins")?;
        }
        check_num(self.histogram.curve_points, 2..100_000)
            .context("invalid number of curve points")?;

        check_num(self.annotation.x_frac, 0.0..=1.0).context("invalid annotation x fraction")?;
        check_num(self.annotation.y_frac, 0.0..=1.0).context("invalid annotation y fraction")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
