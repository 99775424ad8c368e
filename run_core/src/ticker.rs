//! Repeating tick for live sessions on a single-threaded tokio runtime.
//!
//! The [`Ticker`] is armed while the session runs and dropped the moment
//! it pauses or stops. [`drive_session`] owns the loop: it admits one
//! command or one tick at a time, so a tick handler always completes before
//! the next pause/stop is applied.

use crate::live::{Clock, LiveSession, StopOutcome};
use crate::storage::KeyValueStore;
use crate::store::WorkoutStore;
use crate::{LiveSnapshot, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Commands accepted by a running session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveCommand {
    /// Pause, or resume when already paused
    Pause,
    Stop,
}

/// A cancellable repeating timer
pub struct Ticker {
    period: Duration,
    interval: Option<Interval>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    /// Schedule ticks every `period`, the first one `period` from now.
    /// No-op if already armed.
    pub fn arm(&mut self) {
        if self.interval.is_none() {
            let mut interval = time::interval_at(Instant::now() + self.period, self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            self.interval = Some(interval);
        }
    }

    /// Drop the schedule. Cancelling an unarmed ticker is a no-op.
    pub fn cancel(&mut self) {
        self.interval = None;
    }

    /// Wait for the next tick; never resolves while disarmed
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    fn sync_with<C: Clock>(&mut self, session: &LiveSession<C>) {
        if session.is_tick_armed() {
            self.arm();
        } else {
            self.cancel();
        }
    }
}

/// Wall-clock time that advances with the tokio clock.
///
/// Under a paused test runtime this moves only when tokio time does.
#[derive(Clone, Debug)]
pub struct TokioClock {
    base_utc: DateTime<Utc>,
    base_instant: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            base_utc: Utc::now(),
            base_instant: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.base_instant.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.base_utc + elapsed
    }
}

/// Run a started session until it is stopped.
///
/// `on_snapshot` sees the session after every tick and every command. When
/// the command channel closes the session is stopped as if `Stop` had been
/// sent.
pub async fn drive_session<C, S, F>(
    session: &mut LiveSession<C>,
    store: &mut WorkoutStore<S>,
    period: Duration,
    mut commands: mpsc::UnboundedReceiver<LiveCommand>,
    mut on_snapshot: F,
) -> Result<StopOutcome>
where
    C: Clock,
    S: KeyValueStore,
    F: FnMut(&LiveSnapshot),
{
    let mut ticker = Ticker::new(period);
    ticker.sync_with(session);

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => {
                match command {
                    Some(LiveCommand::Pause) => match session.pause() {
                        Ok(snapshot) => on_snapshot(&snapshot),
                        Err(e) => tracing::warn!("{}", e),
                    },
                    Some(LiveCommand::Stop) | None => {
                        ticker.cancel();
                        return session.stop(store);
                    }
                }
                ticker.sync_with(session);
            }

            _ = ticker.tick() => {
                if let Some(snapshot) = session.tick() {
                    on_snapshot(&snapshot);
                }
            }
        }
    }
}
