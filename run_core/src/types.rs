//! Core domain types for the Run Log system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workout records and partial edits
//! - Workout classification and suggestions
//! - Live session state and snapshots
//! - Display settings

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Workout Records
// ============================================================================

/// One completed run.
///
/// Serialized with the field names of the persisted JSON array
/// (`date`, `distance`, `duration`, `type`, `kudos`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    /// Calendar date as `YYYY-MM-DD`, compared by exact string equality
    pub date: String,
    /// Kilometres
    pub distance: f64,
    /// Minutes
    pub duration: f64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<String>,
    #[serde(default)]
    pub kudos: u32,
}

impl Workout {
    pub fn new(date: impl Into<String>, distance: f64, duration: f64) -> Self {
        Self {
            date: date.into(),
            distance,
            duration,
            workout_type: None,
            kudos: 0,
        }
    }

    pub fn with_type(mut self, workout_type: impl Into<String>) -> Self {
        self.workout_type = Some(workout_type.into());
        self
    }

    /// Check the creation/edit invariants.
    pub fn validate(&self) -> Result<()> {
        if self.date.trim().is_empty() {
            return Err(Error::InvalidInput("date is required".into()));
        }
        if !(self.distance.is_finite() && self.distance > 0.0) {
            return Err(Error::InvalidInput(format!(
                "distance must be greater than 0 (got {})",
                self.distance
            )));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(Error::InvalidInput(format!(
                "duration must be greater than 0 (got {})",
                self.duration
            )));
        }
        Ok(())
    }

    /// Minutes per kilometre, if both distance and duration are positive
    pub fn pace(&self) -> Option<f64> {
        (self.distance > 0.0 && self.duration > 0.0).then(|| self.duration / self.distance)
    }

    pub fn classify(&self) -> WorkoutType {
        WorkoutType::classify(self.workout_type.as_deref().unwrap_or(""))
    }
}

/// A partial workout used for edits. Absent fields keep their current value.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkoutPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kudos: Option<u32>,
}

impl WorkoutPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Shallow merge of `self` over `base`
    pub fn merge_onto(&self, base: &Workout) -> Workout {
        Workout {
            date: self.date.clone().unwrap_or_else(|| base.date.clone()),
            distance: self.distance.unwrap_or(base.distance),
            duration: self.duration.unwrap_or(base.duration),
            workout_type: self
                .workout_type
                .clone()
                .or_else(|| base.workout_type.clone()),
            kudos: self.kudos.unwrap_or(base.kudos),
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Training category derived from a free-text workout label
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    Easy,
    Tempo,
    Speed,
    Other,
}

impl WorkoutType {
    /// Keyword heuristic over a raw label.
    ///
    /// Checks `easy`, then `tempo`, then `speed`/`interval`; the first hit
    /// wins, so "easy tempo" is Easy.
    pub fn classify(raw: &str) -> Self {
        let label = raw.to_lowercase();
        if label.contains("easy") {
            WorkoutType::Easy
        } else if label.contains("tempo") {
            WorkoutType::Tempo
        } else if label.contains("speed") || label.contains("interval") {
            WorkoutType::Speed
        } else {
            WorkoutType::Other
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkoutType::Easy => "easy",
            WorkoutType::Tempo => "tempo",
            WorkoutType::Speed => "speed",
            WorkoutType::Other => "other",
        };
        f.write_str(name)
    }
}

/// Recommended next workout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suggestion {
    EasyRun,
    TempoRun,
    SpeedWork,
}

impl Suggestion {
    pub fn label(&self) -> &'static str {
        match self {
            Suggestion::EasyRun => "Easy Run",
            Suggestion::TempoRun => "Tempo Run",
            Suggestion::SpeedWork => "Speed Work",
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Live Session Types
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LiveState {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl fmt::Display for LiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LiveState::Idle => "idle",
            LiveState::Running => "running",
            LiveState::Paused => "paused",
            LiveState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What the display polls after every tick
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct LiveSnapshot {
    pub state: LiveState,
    pub elapsed_seconds: u64,
    pub distance_km: f64,
}

impl LiveSnapshot {
    /// Elapsed time as `HH:MM:SS`
    pub fn elapsed_display(&self) -> String {
        let hrs = self.elapsed_seconds / 3600;
        let mins = (self.elapsed_seconds % 3600) / 60;
        let secs = self.elapsed_seconds % 60;
        format!("{:02}:{:02}:{:02}", hrs, mins, secs)
    }

    /// Current pace in min/km, `--:--` before any distance is covered
    pub fn pace_display(&self) -> String {
        if self.distance_km <= 0.0 {
            return "--:--".into();
        }
        let minutes = self.elapsed_seconds as f64 / 60.0;
        crate::stats::format_pace(minutes / self.distance_km)
    }
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(Error::InvalidInput(format!("unknown theme: {}", other))),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

const MILES_PER_KM: f64 = 0.621371;

impl Units {
    /// Convert kilometres into this unit system
    pub fn from_km(self, km: f64) -> f64 {
        match self {
            Units::Metric => km,
            Units::Imperial => km * MILES_PER_KM,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Units::Metric => "km",
            Units::Imperial => "mi",
        }
    }

    /// e.g. `5.00 km` or `3.11 mi`
    pub fn format_distance(self, km: f64) -> String {
        format!("{:.2} {}", self.from_km(km), self.suffix())
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        })
    }
}

impl FromStr for Units {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            other => Err(Error::InvalidInput(format!("unknown units: {}", other))),
        }
    }
}

/// Display preferences, persisted under their own key
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub units: Units,
}
