//! Application context.
//!
//! Built once at start-up and handed to whatever drives the engine. It owns
//! the single workout store and the single live session, so there is no
//! global state to reach for.

use crate::live::{Clock, LiveSession};
use crate::storage::KeyValueStore;
use crate::store::WorkoutStore;
use crate::{Config, Result, Settings, Theme, Units};

pub struct AppContext<S: KeyValueStore + Clone, C: Clock> {
    pub config: Config,
    pub settings: Settings,
    pub workouts: WorkoutStore<S>,
    pub live: LiveSession<C>,
    backend: S,
}

impl<S: KeyValueStore + Clone, C: Clock> AppContext<S, C> {
    /// Load workouts and settings from `backend`
    pub fn open(config: Config, backend: S, clock: C) -> Self {
        let settings = Settings::load(&backend);
        let workouts = WorkoutStore::load(backend.clone());
        let live = LiveSession::new(clock, &config.live);

        tracing::debug!(
            "Context ready: {} workouts, theme={}, units={}",
            workouts.len(),
            settings.theme,
            settings.units
        );

        Self {
            config,
            settings,
            workouts,
            live,
            backend,
        }
    }

    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let theme = self.settings.toggle_theme();
        self.settings.save(&mut self.backend)?;
        Ok(theme)
    }

    pub fn set_units(&mut self, units: Units) -> Result<()> {
        self.settings.set_units(units);
        self.settings.save(&mut self.backend)
    }

    /// Split into the pieces a live session driver needs at the same time
    pub fn live_parts(&mut self) -> (&mut LiveSession<C>, &mut WorkoutStore<S>) {
        (&mut self.live, &mut self.workouts)
    }
}
