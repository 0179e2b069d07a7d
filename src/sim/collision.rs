//! Motion and collision response
//!
//! Objects move in straight lines, bounce off the window edges, and are
//! deflected away from any object they touch. Every response changes the
//! direction of travel only; speed is never altered.

use glam::Vec2;

use super::state::TrackedObject;
use crate::polar_degrees;
use crate::settings::ExperimentConfig;

/// Advances objects inside a `width` x `height` window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionEngine {
    pub width: f32,
    pub height: f32,
}

impl MotionEngine {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self::new(config.window_width, config.window_height)
    }

    /// One animation step: move every object, reflect at the window edges,
    /// then deflect touching pairs.
    ///
    /// `objects` must be the combined target + distractor set so that every
    /// pair is checked; splitting it lets objects pass through each other.
    pub fn tick(&self, objects: &mut [TrackedObject]) {
        for obj in objects.iter_mut() {
            obj.pos += obj.vel;
            self.reflect_at_bounds(obj);
        }
        deflect_touching(objects);
    }

    /// Flip the velocity component of any axis that left
    /// `[radius, extent - radius]` and put the object back on the edge
    pub fn reflect_at_bounds(&self, obj: &mut TrackedObject) {
        let r = obj.radius;
        if obj.pos.x < r || obj.pos.x > self.width - r {
            obj.vel.x = -obj.vel.x;
            obj.pos.x = obj.pos.x.clamp(r, self.width - r);
        }
        if obj.pos.y < r || obj.pos.y > self.height - r {
            obj.vel.y = -obj.vel.y;
            obj.pos.y = obj.pos.y.clamp(r, self.height - r);
        }
    }
}

/// Deflect every object away from each object it touches.
///
/// Ordered pairs: for (a, b) only `a` is redirected. The reverse pair is
/// visited separately, so after a full pass both members of a touching pair
/// have usually turned.
pub fn deflect_touching(objects: &mut [TrackedObject]) {
    let n = objects.len();
    for a in 0..n {
        for b in 0..n {
            if a == b {
                continue;
            }
            let other = &objects[b];
            let (other_pos, other_radius) = (other.pos, other.radius);
            let mover = &mut objects[a];
            if mover.pos.distance(other_pos) <= mover.radius + other_radius {
                mover.vel = deflection_velocity(mover.pos, mover.vel, other_pos);
            }
        }
    }
}

/// New velocity for `mover` after touching an object at `other_pos`.
///
/// The general case points the velocity along `mover - other`. The
/// axis-aligned cases pick a fixed angle and use the opposite sign
/// convention; both are kept exactly as the task has always computed them.
pub fn deflection_velocity(mover_pos: Vec2, mover_vel: Vec2, other_pos: Vec2) -> Vec2 {
    let speed = mover_vel.length();
    let dx = -(mover_pos.x - other_pos.x);
    let dy = -(mover_pos.y - other_pos.y);

    if dx == 0.0 {
        let angle = if dy > 0.0 { -90.0 } else { 90.0 };
        polar_degrees(speed, angle)
    } else if dy == 0.0 {
        let angle = if dx < 0.0 { 0.0 } else { 180.0 };
        polar_degrees(speed, angle)
    } else {
        let mut angle = (dy / dx).atan().to_degrees();
        if dx < 0.0 {
            angle += 180.0;
        }
        -polar_degrees(speed, angle)
    }
}
