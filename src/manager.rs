use crate::analysis::Analysis;
use crate::config::Config;
use crate::dataset::Dataset;
use crate::plot::Plotter;
use anyhow::{Context, Result};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

pub struct Manager {
    out_dir: PathBuf,
    cfg: Config,
    dataset: Dataset,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(out_dir: P, cfg_file: Option<P>) -> Result<Self> {
        let out_dir = out_dir.as_ref().to_path_buf();

        let cfg = match cfg_file {
            Some(cfg_file) => Config::from_file(cfg_file).context("failed to construct cfg")?,
            None => Config::default(),
        };
        log::info!("{cfg:#?}");

        let dataset = Dataset::hikes().context("failed to construct dataset")?;
        log::info!("loaded {} records", dataset.len());

        Ok(Self {
            out_dir,
            cfg,
            dataset,
        })
    }

    pub fn print_table(&self) -> Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.dataset
            .write_table(&mut handle)
            .context("failed to print table")?;
        handle.flush().context("failed to flush stdout")?;
        Ok(())
    }

    pub fn run_analysis(&self) -> Result<Analysis<'_>> {
        self.print_table()?;

        let analysis =
            Analysis::new(&self.dataset, &self.cfg.histogram).context("failed to analyze data")?;

        self.create_out_dir()?;
        let results_file = self.results_file();
        analysis
            .save_results(&results_file)
            .context("failed to save results")?;
        log::info!("wrote {results_file:?}");

        Ok(analysis)
    }

    pub fn run_plots(&self) -> Result<()> {
        let analysis = self.run_analysis()?;

        let plotter = Plotter::new(self.cfg.figure.clone(), self.cfg.annotation.clone());
        plotter
            .plot_trend(
                &self.dataset.dates(),
                &self.dataset.elevations(),
                &analysis.trend,
                self.trend_file(),
            )
            .context("failed to plot trend")?;
        plotter
            .plot_distribution(&analysis.distribution, self.distribution_file())
            .context("failed to plot distribution")?;

        Ok(())
    }

    /// Remove the files written by `analyze` and `plot`, leaving anything else alone.
    pub fn clean_outputs(&self) -> Result<()> {
        for file in [
            self.results_file(),
            self.trend_file(),
            self.distribution_file(),
        ] {
            if !file.is_file() {
                continue;
            }
            fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            log::info!("removed {file:?}");
        }
        Ok(())
    }

    fn create_out_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("failed to create {:?}", self.out_dir))
    }

    fn results_file(&self) -> PathBuf {
        self.out_dir.join("results.json")
    }

    fn trend_file(&self) -> PathBuf {
        self.out_dir.join("elevation_vs_time.svg")
    }

    fn distribution_file(&self) -> PathBuf {
        self.out_dir.join("summit_histogram.svg")
    }
}
