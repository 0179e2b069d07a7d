//! Experiment settings
//!
//! One immutable `ExperimentConfig` is built at startup (defaults or a JSON
//! file) and passed by reference to the session and trial controller.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// RGBA colour
pub type Color = [u8; 4];

pub const BLACK: Color = [0, 0, 0, 255];
pub const WHITE: Color = [255, 255, 255, 255];
pub const GREY: Color = [128, 128, 128, 255];
pub const DARK_SLATE_GREY: Color = [47, 79, 79, 255];
pub const GREEN: Color = [0, 128, 0, 255];
pub const GREEN_YELLOW: Color = [173, 255, 47, 255];
pub const YELLOW: Color = [255, 255, 0, 255];

/// Invalid configuration values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("phase thresholds must satisfy 0 < t_fixation < t_flash < t_animate < t_answer (got {0}, {1}, {2}, {3})")]
    Thresholds(f64, f64, f64, f64),

    #[error("feedback duration must be positive (got {0})")]
    Feedback(f64),

    #[error("tick rate must be nonzero")]
    TickRate,

    #[error("at least one target is required")]
    NoTargets,

    #[error("object radius must be positive (got {0})")]
    Radius(f32),

    #[error("window {width}x{height} cannot hold an object of radius {radius}")]
    Window { width: f32, height: f32, radius: f32 },

    #[error("speed range [{0}, {1}) has no nonzero step")]
    SpeedRange(i32, i32),
}

/// Colours handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub fixation: Color,
    pub default: Color,
    pub flash: Color,
    pub hovered: Color,
    pub clicked: Color,
    pub selected: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: GREY,
            text: BLACK,
            fixation: BLACK,
            default: WHITE,
            flash: GREEN,
            hovered: DARK_SLATE_GREY,
            clicked: GREEN_YELLOW,
            selected: YELLOW,
        }
    }
}

/// Session-wide task configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub num_distractors: usize,
    pub num_targets: usize,
    pub window_width: f32,
    pub window_height: f32,
    pub object_radius: f32,
    pub min_speed: i32,
    pub max_speed: i32,

    /// End of fixation (seconds since trial start)
    pub t_fixation: f64,
    /// End of target flashing
    pub t_flash: f64,
    /// End of animation
    pub t_animate: f64,
    /// Response deadline
    pub t_answer: f64,
    pub feedback_secs: f64,

    pub tick_rate: u32,
    pub practice_trials: usize,
    pub real_trials: usize,

    /// Run the guided walkthrough before practice
    pub run_guide: bool,
    /// RNG seed (random when absent)
    pub seed: Option<u64>,
    pub palette: Palette,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            num_distractors: NUM_DISTRACTORS,
            num_targets: NUM_TARGETS,
            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,
            object_radius: OBJECT_RADIUS,
            min_speed: MIN_SPEED,
            max_speed: MAX_SPEED,
            t_fixation: T_FIXATION,
            t_flash: T_FLASH,
            t_animate: T_ANIMATE,
            t_answer: T_ANSWER,
            feedback_secs: FEEDBACK_SECS,
            tick_rate: TICK_RATE,
            practice_trials: PRACTICE_TRIALS,
            real_trials: REAL_TRIALS,
            run_guide: false,
            seed: None,
            palette: Palette::default(),
        }
    }
}

impl ExperimentConfig {
    /// Load from a JSON file; missing fields fall back to defaults
    pub fn load(path: &Path) -> crate::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        log::info!("Loaded experiment config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (fix, fl, ani, ans) = (self.t_fixation, self.t_flash, self.t_animate, self.t_answer);
        if !(fix > 0.0 && fix < fl && fl < ani && ani < ans) {
            return Err(ConfigError::Thresholds(fix, fl, ani, ans));
        }
        if self.feedback_secs <= 0.0 {
            return Err(ConfigError::Feedback(self.feedback_secs));
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::TickRate);
        }
        if self.num_targets == 0 {
            return Err(ConfigError::NoTargets);
        }
        if self.object_radius <= 0.0 {
            return Err(ConfigError::Radius(self.object_radius));
        }
        let diameter = 2.0 * self.object_radius;
        if self.window_width <= diameter || self.window_height <= diameter {
            return Err(ConfigError::Window {
                width: self.window_width,
                height: self.window_height,
                radius: self.object_radius,
            });
        }
        if self.speed_steps().is_empty() {
            return Err(ConfigError::SpeedRange(self.min_speed, self.max_speed));
        }
        Ok(())
    }

    /// Total objects per trial
    pub fn num_objects(&self) -> usize {
        self.num_distractors + self.num_targets
    }

    /// Fixed logical timestep in seconds
    pub fn tick_dt(&self) -> f64 {
        1.0 / self.tick_rate as f64
    }

    /// Nonzero velocity components a new object may receive
    pub fn speed_steps(&self) -> Vec<f32> {
        (self.min_speed..self.max_speed)
            .filter(|&v| v != 0)
            .map(|v| v as f32)
            .collect()
    }

    /// Fixation marker position (window centre)
    pub fn fixation_point(&self) -> Vec2 {
        Vec2::new(self.window_width / 2.0, self.window_height / 2.0)
    }

    /// Seconds allowed for answering once motion stops
    pub fn answer_window_secs(&self) -> f64 {
        self.t_answer - self.t_animate
    }
}

/// Participant metadata used to name the response log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub participant: String,
    pub observer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExperimentConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.num_objects(), 8);
        assert_eq!(config.speed_steps(), vec![-2.0, -1.0, 1.0]);
        assert!((config.answer_window_secs() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let config = ExperimentConfig {
            t_flash: 1.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Thresholds(..))));
    }

    #[test]
    fn test_rejects_zero_only_speed_range() {
        let config = ExperimentConfig {
            min_speed: 0,
            max_speed: 1,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::SpeedRange(0, 1)));
    }

    #[test]
    fn test_rejects_tiny_window() {
        let config = ExperimentConfig {
            window_width: 60.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Window { .. })));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{ "num_targets": 3, "real_trials": 10 }"#).unwrap();
        assert_eq!(config.num_targets, 3);
        assert_eq!(config.real_trials, 10);
        assert_eq!(config.num_distractors, NUM_DISTRACTORS);
        assert_eq!(config.palette, Palette::default());
    }
}
