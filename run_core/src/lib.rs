#![forbid(unsafe_code)]

//! Core domain model and business logic for Run Log.
//!
//! This crate provides:
//! - Domain types (workouts, classifications, live snapshots, settings)
//! - The persistent workout store
//! - Derived statistics and the next-workout suggestion
//! - The live session state machine and its tick driver
//! - Persistence backends, export formatting, configuration

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod storage;
pub mod store;
pub mod settings;
pub mod stats;
pub mod live;
pub mod ticker;
pub mod export;
pub mod context;

// Re-export commonly used types
pub use error::{Error, ParseFailure, Result};
pub use types::*;
pub use config::{Config, ResumePolicy};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{SaveStatus, WorkoutStore};
pub use live::{Clock, Commit, LiveSession, StopOutcome, SystemClock};
pub use ticker::{drive_session, LiveCommand, TokioClock};
pub use context::AppContext;
