//! Live session state machine.
//!
//! A session estimates distance from elapsed time at an assumed pace; no
//! position sensor is involved. Stopping a session with any distance
//! commits it to the workout store as a "Live Tracked Run".
//!
//! ```text
//!   Idle --start--> Running --pause--> Paused
//!                     ^                  |
//!                     +-----pause--------+
//!   Running/Paused --stop--> Stopped --(reset)--> Idle
//! ```

use crate::config::{LiveConfig, ResumePolicy};
use crate::storage::KeyValueStore;
use crate::store::{SaveStatus, WorkoutStore};
use crate::{Error, LiveSnapshot, LiveState, Result, Workout};
use chrono::{DateTime, Utc};
use std::cell::Cell;
use std::rc::Rc;

/// Label given to workouts committed from a live session
pub const LIVE_WORKOUT_TYPE: &str = "Live Tracked Run";

/// Source of the current time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-advanced clock. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.now.set(self.now.get() + chrono::Duration::seconds(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// What happened to the run when the session stopped
#[derive(Debug)]
pub enum Commit {
    /// No distance was covered, nothing to record
    Skipped,
    /// Appended to the store
    Saved(Workout, SaveStatus),
    /// The store refused the workout (e.g. duration rounded to 0 minutes)
    Rejected(Workout, Error),
}

#[derive(Debug)]
pub struct StopOutcome {
    /// Values at the moment of stopping, before the reset
    pub final_snapshot: LiveSnapshot,
    pub commit: Commit,
}

pub struct LiveSession<C: Clock> {
    state: LiveState,
    start_time: Option<DateTime<Utc>>,
    /// Elapsed seconds carried over from before the last resume
    carried_seconds: u64,
    elapsed_seconds: u64,
    distance_km: f64,
    tick_armed: bool,
    seconds_per_km: f64,
    resume: ResumePolicy,
    clock: C,
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl<C: Clock> LiveSession<C> {
    pub fn new(clock: C, config: &LiveConfig) -> Self {
        Self {
            state: LiveState::Idle,
            start_time: None,
            carried_seconds: 0,
            elapsed_seconds: 0,
            distance_km: 0.0,
            tick_armed: false,
            seconds_per_km: config.assumed_seconds_per_km,
            resume: config.resume,
            clock,
        }
    }

    pub fn state(&self) -> LiveState {
        self.state
    }

    /// Whether the repeating tick should currently be scheduled
    pub fn is_tick_armed(&self) -> bool {
        self.tick_armed
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        LiveSnapshot {
            state: self.state,
            elapsed_seconds: self.elapsed_seconds,
            distance_km: self.distance_km,
        }
    }

    /// Begin a fresh run. Valid from Idle only.
    pub fn start(&mut self) -> Result<LiveSnapshot> {
        match self.state {
            LiveState::Idle | LiveState::Stopped => {
                self.begin_running(0);
                tracing::info!("Live session started");
                Ok(self.snapshot())
            }
            state => Err(Error::InvalidTransition {
                action: "start",
                state,
            }),
        }
    }

    /// Pause a running session, or resume a paused one.
    ///
    /// Resuming follows the configured [`ResumePolicy`]: `Restart` takes a
    /// new baseline so elapsed time and distance start again from zero,
    /// `Continue` picks up from the paused values.
    pub fn pause(&mut self) -> Result<LiveSnapshot> {
        match self.state {
            LiveState::Running => {
                self.catch_up();
                self.cancel_tick();
                self.state = LiveState::Paused;
                tracing::info!(
                    "Live session paused at {}s, {:.2} km",
                    self.elapsed_seconds,
                    self.distance_km
                );
                Ok(self.snapshot())
            }
            LiveState::Paused => {
                let carried = match self.resume {
                    ResumePolicy::Restart => 0,
                    ResumePolicy::Continue => self.elapsed_seconds,
                };
                self.begin_running(carried);
                tracing::info!("Live session resumed ({:?})", self.resume);
                Ok(self.snapshot())
            }
            state => Err(Error::InvalidTransition {
                action: "pause",
                state,
            }),
        }
    }

    /// Recompute elapsed time and distance. Ignored unless running.
    pub fn tick(&mut self) -> Option<LiveSnapshot> {
        if self.state != LiveState::Running || !self.tick_armed || self.start_time.is_none() {
            return None;
        }
        self.catch_up();
        Some(self.snapshot())
    }

    /// End the session, committing the run if any distance was covered.
    ///
    /// A rejected commit is reported in the outcome; the session resets to
    /// Idle either way.
    pub fn stop<S: KeyValueStore>(&mut self, store: &mut WorkoutStore<S>) -> Result<StopOutcome> {
        if self.state == LiveState::Idle {
            return Err(Error::InvalidTransition {
                action: "stop",
                state: self.state,
            });
        }

        if self.state == LiveState::Running {
            self.catch_up();
        }
        self.cancel_tick();
        self.state = LiveState::Stopped;
        let final_snapshot = self.snapshot();

        let commit = if self.distance_km > 0.0 {
            let workout = self.finished_workout();
            match store.append(workout.clone()) {
                Ok(status) => {
                    tracing::info!(
                        "Live run saved: {} km in {} min",
                        workout.distance,
                        workout.duration
                    );
                    Commit::Saved(workout, status)
                }
                Err(e) => {
                    tracing::warn!("Live run not saved: {}", e);
                    Commit::Rejected(workout, e)
                }
            }
        } else {
            tracing::info!("Live session stopped with no distance, nothing saved");
            Commit::Skipped
        };

        self.reset();
        Ok(StopOutcome {
            final_snapshot,
            commit,
        })
    }

    fn begin_running(&mut self, carried_seconds: u64) {
        self.state = LiveState::Running;
        self.start_time = Some(self.clock.now());
        self.carried_seconds = carried_seconds;
        self.elapsed_seconds = carried_seconds;
        self.distance_km = self.estimate_distance(carried_seconds);
        self.tick_armed = true;
    }

    /// Bring elapsed time and distance up to the clock
    fn catch_up(&mut self) {
        if let Some(start) = self.start_time {
            let since_start = (self.clock.now() - start).num_seconds().max(0) as u64;
            self.elapsed_seconds = self.carried_seconds + since_start;
            self.distance_km = self.estimate_distance(self.elapsed_seconds);
        }
    }

    /// Idempotent
    fn cancel_tick(&mut self) {
        self.tick_armed = false;
    }

    fn reset(&mut self) {
        self.state = LiveState::Idle;
        self.start_time = None;
        self.carried_seconds = 0;
        self.elapsed_seconds = 0;
        self.distance_km = 0.0;
        self.tick_armed = false;
    }

    fn estimate_distance(&self, elapsed_seconds: u64) -> f64 {
        round_hundredths(elapsed_seconds as f64 / self.seconds_per_km)
    }

    fn finished_workout(&self) -> Workout {
        let date = crate::stats::date_key(self.clock.now().date_naive());
        let duration = (self.elapsed_seconds as f64 / 60.0).round();
        Workout::new(date, self.distance_km, duration).with_type(LIVE_WORKOUT_TYPE)
    }
}
