//! Derived statistics over a workout collection.
//!
//! Everything here is a pure function of the slice it is given (plus a
//! reference date where a window is involved). Nothing reads the store
//! directly.

use crate::{Suggestion, Units, Workout, WorkoutType};
use chrono::{Days, NaiveDate};
use serde::Serialize;

/// Format used for workout dates and day keys
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Trailing number of workouts the suggestion looks at
pub const DEFAULT_RECENT_WINDOW: usize = 7;

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Classify an optional free-text label
pub fn classify_type(raw: Option<&str>) -> WorkoutType {
    WorkoutType::classify(raw.unwrap_or(""))
}

/// Format minutes-per-unit as `m:ss`.
///
/// Seconds are rounded; a round up to 60 carries into the minute.
pub fn format_pace(minutes_per_unit: f64) -> String {
    if !minutes_per_unit.is_finite() || minutes_per_unit < 0.0 {
        return "--:--".into();
    }
    let total_seconds = (minutes_per_unit * 60.0).round() as u64;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

// ============================================================================
// Summary and personal records
// ============================================================================

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Summary {
    pub total_distance: f64,
    pub total_runs: usize,
    /// `m:ss` per km, or `N/A`
    pub best_pace: String,
}

/// Lowest duration/distance ratio among workouts where both are positive
fn best_pace(workouts: &[Workout]) -> Option<f64> {
    workouts
        .iter()
        .filter_map(Workout::pace)
        .fold(None, |best, pace| match best {
            Some(b) if b <= pace => Some(b),
            _ => Some(pace),
        })
}

/// Sum starting from `+0.0`; `Iterator::sum` on an empty f64 iterator gives `-0.0`
fn sum_distance(distances: impl Iterator<Item = f64>) -> f64 {
    distances.fold(0.0, |acc, d| acc + d)
}

pub fn compute_summary(workouts: &[Workout]) -> Summary {
    Summary {
        total_distance: sum_distance(workouts.iter().map(|w| w.distance)),
        total_runs: workouts.len(),
        best_pace: best_pace(workouts)
            .filter(|p| *p > 0.0)
            .map(format_pace)
            .unwrap_or_else(|| "N/A".into()),
    }
}

/// Extremal values across the whole history. Absent fields did not qualify.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct PersonalRecords {
    pub fastest_pace: Option<String>,
    pub longest_distance: Option<f64>,
    pub longest_duration: Option<f64>,
}

impl PersonalRecords {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Labelled rows for display, distances in the given units
    pub fn entries(&self, units: Units) -> Vec<(&'static str, String)> {
        let mut rows = Vec::new();
        if let Some(pace) = &self.fastest_pace {
            rows.push(("Fastest Pace", format!("{} min/km", pace)));
        }
        if let Some(distance) = self.longest_distance {
            rows.push(("Longest Run", units.format_distance(distance)));
        }
        if let Some(duration) = self.longest_duration {
            rows.push(("Longest Duration", format!("{} min", duration)));
        }
        rows
    }
}

pub fn compute_personal_records(workouts: &[Workout]) -> PersonalRecords {
    if workouts.is_empty() {
        return PersonalRecords::default();
    }

    let summary = compute_summary(workouts);
    let longest_distance = workouts.iter().map(|w| w.distance).fold(0.0_f64, f64::max);
    let longest_duration = workouts.iter().map(|w| w.duration).fold(0.0_f64, f64::max);

    PersonalRecords {
        fastest_pace: (summary.best_pace != "N/A").then_some(summary.best_pace),
        longest_distance: (longest_distance > 0.0).then_some(longest_distance),
        longest_duration: (longest_duration > 0.0).then_some(longest_duration),
    }
}

/// Sum of kudos across all workouts
pub fn total_kudos(workouts: &[Workout]) -> u64 {
    workouts.iter().map(|w| u64::from(w.kudos)).sum()
}

// ============================================================================
// Suggestion heuristic
// ============================================================================

/// Suggest the least-trained of Easy/Tempo/Speed over the trailing window.
///
/// Ties go to Easy, then Tempo, then Speed. Workouts classified `Other`
/// don't count toward any bucket.
pub fn suggest_next_workout(workouts: &[Workout], recent_window: usize) -> Suggestion {
    let start = workouts.len().saturating_sub(recent_window);
    let (mut easy, mut tempo, mut speed) = (0usize, 0usize, 0usize);

    for workout in &workouts[start..] {
        match workout.classify() {
            WorkoutType::Easy => easy += 1,
            WorkoutType::Tempo => tempo += 1,
            WorkoutType::Speed => speed += 1,
            WorkoutType::Other => {}
        }
    }

    let min = easy.min(tempo).min(speed);
    let suggestion = if easy == min {
        Suggestion::EasyRun
    } else if tempo == min {
        Suggestion::TempoRun
    } else {
        Suggestion::SpeedWork
    };

    tracing::debug!(
        "Recent mix easy={} tempo={} speed={} -> {}",
        easy,
        tempo,
        speed,
        suggestion
    );
    suggestion
}

// ============================================================================
// Day, week and calendar aggregates
// ============================================================================

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub distance: f64,
}

/// The workouts dated exactly `date_str`.
///
/// Plain string equality: `2024-5-1` does not match `2024-05-01`.
pub fn calendar_membership<'a>(workouts: &'a [Workout], date_str: &str) -> Vec<&'a Workout> {
    workouts.iter().filter(|w| w.date == date_str).collect()
}

/// Trailing `days` calendar days ending at `reference`, oldest first
fn trailing_days(days: u32, reference: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    (0..days)
        .rev()
        .filter_map(move |back| reference.checked_sub_days(Days::new(u64::from(back))))
}

/// Distance per day for the trailing `window_days` ending at `reference`
pub fn aggregate_by_day(
    workouts: &[Workout],
    window_days: u32,
    reference: NaiveDate,
) -> Vec<DayTotal> {
    trailing_days(window_days, reference)
        .map(|date| {
            let key = date_key(date);
            let distance = sum_distance(
                calendar_membership(workouts, &key)
                    .iter()
                    .map(|w| w.distance),
            );
            DayTotal { date, distance }
        })
        .collect()
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WeekTotal {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub distance: f64,
}

impl WeekTotal {
    /// Window-end date, e.g. `Nov 4`
    pub fn label(&self) -> String {
        self.end.format("%b %-d").to_string()
    }
}

/// Distance per 7-day window for `week_count` windows ending at `reference`,
/// most recent window last.
///
/// Workouts whose date isn't `YYYY-MM-DD` are left out.
pub fn aggregate_by_week(
    workouts: &[Workout],
    week_count: u32,
    reference: NaiveDate,
) -> Vec<WeekTotal> {
    let dated: Vec<(NaiveDate, f64)> = workouts
        .iter()
        .filter_map(|w| match parse_date(&w.date) {
            Some(date) => Some((date, w.distance)),
            None => {
                tracing::debug!("Skipping undated workout {:?} in weekly totals", w.date);
                None
            }
        })
        .collect();

    (0..week_count)
        .rev()
        .filter_map(|back| {
            let end = reference.checked_sub_days(Days::new(u64::from(back) * 7))?;
            let start = end.checked_sub_days(Days::new(6))?;
            let distance = sum_distance(
                dated
                    .iter()
                    .filter(|(date, _)| *date >= start && *date <= end)
                    .map(|(_, distance)| *distance),
            );
            Some(WeekTotal {
                start,
                end,
                distance,
            })
        })
        .collect()
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub workouts: usize,
    /// Classification of the first workout on that day
    pub representative: Option<WorkoutType>,
}

impl CalendarDay {
    pub fn is_active(&self) -> bool {
        self.workouts > 0
    }
}

/// Activity grid for the trailing `days` ending at `reference`
pub fn calendar(workouts: &[Workout], days: u32, reference: NaiveDate) -> Vec<CalendarDay> {
    trailing_days(days, reference)
        .map(|date| {
            let members = calendar_membership(workouts, &date_key(date));
            CalendarDay {
                date,
                workouts: members.len(),
                representative: members.first().map(|w| w.classify()),
            }
        })
        .collect()
}
