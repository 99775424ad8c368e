//! JSON and CSV export of the workout collection.
//!
//! CSV fields are joined with commas and never quoted, so a type label
//! containing a comma shifts the columns of its row. Consumers of the
//! existing files rely on that layout.

use crate::stats::format_pace;
use crate::{Error, Result, Workout};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const CSV_HEADER: [&str; 6] = [
    "Date",
    "Distance (km)",
    "Duration (min)",
    "Type",
    "Pace (min/km)",
    "Kudos",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(Error::InvalidInput(format!(
                "unknown export format: {}",
                other
            ))),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    workouts: &'a [Workout],
    export_date: String,
    total_workouts: usize,
}

/// e.g. `running-tracker-2024-05-10.csv`
pub fn default_file_name(format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "running-tracker-{}.{}",
        crate::stats::date_key(date),
        format.extension()
    )
}

/// Pretty-printed JSON document with the workouts, export time and count
pub fn to_json(workouts: &[Workout], exported_at: DateTime<Utc>) -> Result<String> {
    let document = ExportDocument {
        workouts,
        export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        total_workouts: workouts.len(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// One header row plus one unquoted row per workout
pub fn to_csv(workouts: &[Workout]) -> Result<String> {
    if workouts.is_empty() {
        return Err(Error::InvalidInput("No workouts to export".into()));
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for workout in workouts {
        let pace = workout
            .pace()
            .map(format_pace)
            .unwrap_or_else(|| "--:--".into());
        writer.write_record([
            workout.date.clone(),
            workout.distance.to_string(),
            workout.duration.to_string(),
            workout.workout_type.clone().unwrap_or_default(),
            pace,
            workout.kudos.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidInput(format!("non UTF-8 export: {}", e)))
}

/// Render the collection in `format`
pub fn render(
    format: ExportFormat,
    workouts: &[Workout],
    exported_at: DateTime<Utc>,
) -> Result<String> {
    match format {
        ExportFormat::Json => to_json(workouts, exported_at),
        ExportFormat::Csv => to_csv(workouts),
    }
}
