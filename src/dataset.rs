//! Summit hike dataset.

use crate::error::SummitError;
use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::io::Write;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

/// Peak names of the summer hikes.
pub const PEAKS: &[&str] = &[
    "Bear Peak",
    "1st and 2nd Flatirons",
    "Twinsisters Peak",
    "Black Elk Peak",
    "Flagstaff Mountain",
    "Mt Sanitas",
    "Green Mountain",
    "Mt Neva",
    "Quarter to 5 (unnamed)",
    "Battle Mountain",
    "Mt Lady Washington",
    "South Boulder Peak",
    "Mt Lincoln",
    "Mt Bross",
    "Mt Cameron",
    "Mt Democrat",
    "Grays Peak",
    "Torrey’s Peak",
    "The Sawtooth",
    "Mt Bierstadt",
    "Mt Blue Sky",
];

/// Summit elevations in feet, index-aligned with [`PEAKS`].
pub const ELEVATIONS_FT: &[u32] = &[
    8459, 7191, 11418, 7244, //
    6983, 6863, 8148, 12849, //
    12290, 12044, 13277, //
    8549, 14295, 14178, 14238, //
    14152, 14278, 14267, 13786, //
    14065, 14265,
];

/// Hike dates, index-aligned with [`PEAKS`].
pub const DATES: &[&str] = &[
    "2024-05-26",
    "2024-06-16",
    "2024-06-07",
    "2024-06-14",
    "2024-05-28",
    "2024-06-09",
    "2024-05-31",
    "2024-06-19",
    "2024-06-19",
    "2024-06-21",
    "2024-06-21",
    "2024-06-22",
    "2024-06-28",
    "2024-06-28",
    "2024-06-28",
    "2024-06-28",
    "2024-07-04",
    "2024-07-04",
    "2024-07-12",
    "2024-07-12",
    "2024-07-12",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single summit hike.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Peak name.
    pub name: String,
    /// Summit elevation in feet.
    pub elevation_ft: u32,
    /// Date of the hike.
    pub date: NaiveDate,
}

/// Ordered, immutable table of hikes.
///
/// Always contains at least one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Build the dataset of the summer hikes.
    pub fn hikes() -> Result<Self> {
        Self::from_columns(PEAKS, ELEVATIONS_FT, DATES).context("failed to build hike dataset")
    }

    /// Build a dataset from three index-aligned columns.
    ///
    /// # Errors
    /// Returns [`SummitError::DataIntegrity`] if the columns differ in length,
    /// are empty, contain a non-positive elevation or an unparseable date.
    pub fn from_columns(names: &[&str], elevations_ft: &[u32], dates: &[&str]) -> Result<Self> {
        let n_names = names.len();
        if elevations_ft.len() != n_names || dates.len() != n_names {
            bail!(SummitError::DataIntegrity(format!(
                "column lengths differ: {} names, {} elevations, {} dates",
                n_names,
                elevations_ft.len(),
                dates.len()
            )));
        }
        if n_names == 0 {
            bail!(SummitError::DataIntegrity("dataset is empty".to_string()));
        }

        let mut records = Vec::with_capacity(n_names);
        for ((&name, &elevation_ft), &date) in names.iter().zip(elevations_ft).zip(dates) {
            if elevation_ft == 0 {
                bail!(SummitError::DataIntegrity(format!(
                    "elevation of {name:?} must be positive"
                )));
            }
            let date = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|err| {
                SummitError::DataIntegrity(format!("invalid date {date:?} for {name:?}: {err}"))
            })?;
            records.push(Record {
                name: name.to_string(),
                elevation_ft,
                date,
            });
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Earliest hike date.
    pub fn t_min(&self) -> NaiveDate {
        self.records
            .iter()
            .map(|rec| rec.date)
            .min()
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|rec| rec.date).collect()
    }

    pub fn elevations(&self) -> Vec<f64> {
        self.records
            .iter()
            .map(|rec| rec.elevation_ft as f64)
            .collect()
    }

    /// Seconds elapsed since [`Dataset::t_min`] for every record, in table order.
    pub fn elapsed_seconds(&self) -> Vec<f64> {
        let t_min = self.t_min();
        self.records
            .iter()
            .map(|rec| rec.date.signed_duration_since(t_min).num_seconds() as f64)
            .collect()
    }

    /// Write the dataset as a text table.
    ///
    /// Columns: index, peak name, elevation, date, date as a timestamp,
    /// seconds elapsed since the earliest date.
    pub fn write_table<W: Write>(&self, writer: &mut W) -> Result<()> {
        let rows: Vec<_> = self
            .records
            .iter()
            .zip(self.elapsed_seconds())
            .enumerate()
            .map(|(idx, (rec, secs))| TableRow {
                idx,
                peak: rec.name.clone(),
                elevation_ft: rec.elevation_ft,
                date: rec.date.format(DATE_FORMAT).to_string(),
                time: timestamp(rec.date).format("%Y-%m-%d %H:%M:%S").to_string(),
                numeric: format!("{secs:.1}"),
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::blank())
            .with(Modify::new(Columns::new(1..)).with(Alignment::right()));

        writeln!(writer, "{table}").context("failed to write table")?;
        Ok(())
    }
}

// One printed row of the hike table.
#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "")]
    idx: usize,
    #[tabled(rename = "Peak")]
    peak: String,
    #[tabled(rename = "Elevation_ft")]
    elevation_ft: u32,
    #[tabled(rename = "Date")]
    date: String,
    time: String,
    numeric: String,
}

fn timestamp(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}
