//! Tracked object state
//!
//! One `TrackedObject` per circle on screen. Objects are spawned once per
//! block and reshuffled between trials.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::settings::ExperimentConfig;

/// Spawn attempts per axis before falling back to an unchecked position
const MAX_SPAWN_ATTEMPTS: u32 = 1000;

/// What the participant is supposed to track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Target,
    Distractor,
}

/// Pointer selection state of a single object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionState {
    #[default]
    Neutral,
    /// Pointer is over the object
    Hovered,
    /// Button pressed on the object, not yet released
    Clicked,
    /// Button released on a clicked object
    Selected,
}

/// A moving circle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedObject {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub role: Role,
    pub selection: SelectionState,
    /// Target is currently drawn in the flash colour
    pub flash_visible: bool,
}

impl TrackedObject {
    pub fn new(id: u32, role: Role, pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            vel,
            radius,
            role,
            selection: SelectionState::Neutral,
            flash_visible: false,
        }
    }

    /// Spawn at a random position with a random nonzero velocity
    pub fn spawn<R: Rng>(id: u32, role: Role, config: &ExperimentConfig, rng: &mut R) -> Self {
        let pos = random_position(config, rng);
        let vel = random_velocity(config, rng);
        Self::new(id, role, pos, vel, config.object_radius)
    }

    pub fn is_target(&self) -> bool {
        self.role == Role::Target
    }

    /// Counted by a submission (selected and not mid-click)
    pub fn is_selected(&self) -> bool {
        self.selection == SelectionState::Selected
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Pointer is strictly inside the circle
    pub fn contains(&self, point: Vec2) -> bool {
        self.pos.distance(point) < self.radius
    }

    /// Move to a fresh random position and clear all selection/flash state
    pub fn shuffle_position<R: Rng>(&mut self, config: &ExperimentConfig, rng: &mut R) {
        self.pos = random_position(config, rng);
        self.reset_selection();
    }

    pub fn reset_selection(&mut self) {
        self.selection = SelectionState::Neutral;
        self.flash_visible = false;
    }
}

/// Generate the full object set: distractors first, then targets
pub fn spawn_objects<R: Rng>(config: &ExperimentConfig, rng: &mut R) -> Vec<TrackedObject> {
    let distractors = (0..config.num_distractors).map(|_| Role::Distractor);
    let targets = (0..config.num_targets).map(|_| Role::Target);
    distractors
        .chain(targets)
        .enumerate()
        .map(|(id, role)| TrackedObject::spawn(id as u32, role, config, rng))
        .collect()
}

/// Random position inside the window, keeping each axis clear of the
/// fixation marker by one radius
pub fn random_position<R: Rng>(config: &ExperimentConfig, rng: &mut R) -> Vec2 {
    let r = config.object_radius;
    let reference = config.fixation_point();
    let x = random_axis(r, config.window_width - r, reference.x, r, rng);
    let y = random_axis(r, config.window_height - r, reference.y, r, rng);
    Vec2::new(x, y)
}

fn random_axis<R: Rng>(min: f32, max: f32, exclude: f32, half_width: f32, rng: &mut R) -> f32 {
    let excluded = |v: f32| v >= exclude - half_width && v < exclude + half_width;
    for _ in 0..MAX_SPAWN_ATTEMPTS {
        let v = rng.random_range(min..=max);
        if !excluded(v) {
            return v;
        }
    }
    log::warn!("No spawn coordinate clear of {exclude} in [{min}, {max}]");
    rng.random_range(min..=max)
}

/// Random velocity with both components drawn from the configured nonzero steps
pub fn random_velocity<R: Rng>(config: &ExperimentConfig, rng: &mut R) -> Vec2 {
    let steps = config.speed_steps();
    let dx = steps.choose(rng).copied().unwrap_or(1.0);
    let dy = steps.choose(rng).copied().unwrap_or(1.0);
    Vec2::new(dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_spawn_objects_roles_and_ids() {
        let config = ExperimentConfig::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let objects = spawn_objects(&config, &mut rng);

        assert_eq!(objects.len(), config.num_objects());
        assert_eq!(objects.iter().filter(|o| o.is_target()).count(), config.num_targets);
        for (i, obj) in objects.iter().enumerate() {
            assert_eq!(obj.id, i as u32);
            assert_eq!(obj.selection, SelectionState::Neutral);
            assert!(!obj.flash_visible);
        }
    }

    #[test]
    fn test_spawn_within_window_and_clear_of_fixation() {
        let config = ExperimentConfig::default();
        let r = config.object_radius;
        let centre = config.fixation_point();
        let mut rng = Pcg32::seed_from_u64(42);

        for _ in 0..500 {
            let pos = random_position(&config, &mut rng);
            assert!(pos.x >= r && pos.x <= config.window_width - r);
            assert!(pos.y >= r && pos.y <= config.window_height - r);
            assert!(!(pos.x >= centre.x - r && pos.x < centre.x + r));
            assert!(!(pos.y >= centre.y - r && pos.y < centre.y + r));
        }
    }

    #[test]
    fn test_velocity_components_nonzero() {
        let config = ExperimentConfig::default();
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..200 {
            let vel = random_velocity(&config, &mut rng);
            assert!(vel.x != 0.0 && vel.y != 0.0);
            assert!(config.speed_steps().contains(&vel.x));
            assert!(config.speed_steps().contains(&vel.y));
        }
    }

    #[test]
    fn test_contains_is_strict() {
        let obj = TrackedObject::new(0, Role::Target, Vec2::new(100.0, 100.0), Vec2::ONE, 10.0);
        assert!(obj.contains(Vec2::new(105.0, 100.0)));
        assert!(!obj.contains(Vec2::new(110.0, 100.0)));
    }

    #[test]
    fn test_shuffle_resets_selection() {
        let config = ExperimentConfig::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut obj = TrackedObject::spawn(0, Role::Target, &config, &mut rng);
        obj.selection = SelectionState::Selected;
        obj.flash_visible = true;
        let speed = obj.speed();

        obj.shuffle_position(&config, &mut rng);
        assert_eq!(obj.selection, SelectionState::Neutral);
        assert!(!obj.flash_visible);
        assert_eq!(obj.speed(), speed);
    }
}
