//! MOT Tracker - a multiple object tracking cognitive task
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion, selection, trial phases)
//! - `session`: Guide, practice and scored blocks
//! - `platform`: Input, rendering and pacing seams
//! - `persistence`: Response log
//! - `settings`: Session-wide configuration

pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

pub use persistence::{CsvSink, MemorySink, PersistenceError, PersistenceSink, ResponseRecord};
pub use session::{ExperimentSession, SessionOutcome, SessionSummary};
pub use settings::{ConfigError, ExperimentConfig, Palette, SessionInfo};

/// Task defaults (standard MOT protocol timings)
pub mod consts {
    /// Object radius in pixels
    pub const OBJECT_RADIUS: f32 = 35.0;
    pub const NUM_DISTRACTORS: usize = 6;
    pub const NUM_TARGETS: usize = 2;

    /// Velocity components are drawn from the nonzero integers in [MIN_SPEED, MAX_SPEED)
    pub const MIN_SPEED: i32 = -2;
    pub const MAX_SPEED: i32 = 2;

    /// Phase thresholds, seconds since trial start
    pub const T_FIXATION: f64 = 1.5;
    pub const T_FLASH: f64 = T_FIXATION + 1.0;
    pub const T_ANIMATE: f64 = T_FLASH + 30.0;
    pub const T_ANSWER: f64 = T_ANIMATE + 60.0;

    pub const FEEDBACK_SECS: f64 = 1.0;

    /// Logical ticks per second
    pub const TICK_RATE: u32 = 144;

    /// Flash timer increment per tick; highlight toggles when the timer reaches the tick rate
    pub const FLASH_STEP: u32 = 3;

    pub const WINDOW_WIDTH: f32 = 1920.0;
    pub const WINDOW_HEIGHT: f32 = 1080.0;

    pub const PRACTICE_TRIALS: usize = 2;
    pub const REAL_TRIALS: usize = 50;
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the task runner
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convert polar (magnitude, angle in degrees) to a cartesian vector
#[inline]
pub fn polar_degrees(magnitude: f32, degrees: f32) -> glam::Vec2 {
    let theta = degrees.to_radians();
    glam::Vec2::new(magnitude * theta.cos(), magnitude * theta.sin())
}
