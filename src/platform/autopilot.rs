//! Scripted participant
//!
//! Watches the frames it is shown like a participant would: it remembers
//! which objects flashed, waits a moment once motion stops, clicks its
//! picks and submits. Used for headless runs and end-to-end tests.

use glam::Vec2;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::input::InputSource;
use super::render::Frame;
use crate::polar_degrees;
use crate::sim::{InputEvent, Key, TrackedObject, TrialPhase};

/// Click offsets tried inside an object, as fractions of its radius
const CLICK_RINGS: [f32; 3] = [0.0, 0.6, 0.9];

#[derive(Debug, Clone)]
pub struct Autopilot {
    rng: Pcg32,
    required: usize,
    /// Response frames to wait before acting
    think_ticks: u32,
    /// Chance per trial of swapping one pick for a wrong object
    error_rate: f64,
    tracked: Vec<u32>,
    decided: bool,
    response_ticks: u32,
    last_phase: Option<TrialPhase>,
}

impl Autopilot {
    pub fn new(required: usize, seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            required,
            think_ticks: 0,
            error_rate: 0.0,
            tracked: Vec::new(),
            decided: false,
            response_ticks: 0,
            last_phase: None,
        }
    }

    pub fn with_think_ticks(mut self, ticks: u32) -> Self {
        self.think_ticks = ticks;
        self
    }

    pub fn with_error_rate(mut self, rate: f64) -> Self {
        self.error_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Ids currently believed to be targets
    pub fn tracked(&self) -> &[u32] {
        &self.tracked
    }

    fn begin_trial(&mut self) {
        self.tracked.clear();
        self.decided = false;
        self.response_ticks = 0;
    }

    fn observe_flash(&mut self, objects: &[TrackedObject]) {
        for obj in objects.iter().filter(|o| o.flash_visible) {
            if !self.tracked.contains(&obj.id) {
                self.tracked.push(obj.id);
            }
        }
    }

    /// Settle on exactly `required` picks, possibly with one mistake
    fn decide(&mut self, objects: &[TrackedObject]) {
        self.tracked.truncate(self.required);
        while self.tracked.len() < self.required {
            let spare: Vec<u32> = self.untracked(objects);
            match spare.choose(&mut self.rng) {
                Some(&id) => self.tracked.push(id),
                None => break,
            }
        }

        if !self.tracked.is_empty() && self.rng.random::<f64>() < self.error_rate {
            let spare = self.untracked(objects);
            if let Some(&wrong) = spare.choose(&mut self.rng) {
                let slot = self.rng.random_range(0..self.tracked.len());
                log::debug!("Autopilot swaps {} for {}", self.tracked[slot], wrong);
                self.tracked[slot] = wrong;
            }
        }
        self.decided = true;
    }

    fn untracked(&self, objects: &[TrackedObject]) -> Vec<u32> {
        objects
            .iter()
            .map(|o| o.id)
            .filter(|id| !self.tracked.contains(id))
            .collect()
    }

    fn respond(&mut self, objects: &[TrackedObject]) -> Vec<InputEvent> {
        self.response_ticks += 1;
        if self.response_ticks <= self.think_ticks {
            return Vec::new();
        }
        if !self.decided {
            self.decide(objects);
        }

        // One correction per tick
        let mismatched = objects
            .iter()
            .filter(|o| o.is_selected() != self.tracked.contains(&o.id));
        for obj in mismatched {
            if let Some(point) = exclusive_point(obj, objects) {
                return vec![
                    InputEvent::PointerMove(point),
                    InputEvent::ButtonDown(point),
                    InputEvent::ButtonUp(point),
                ];
            }
            log::trace!("Autopilot cannot reach object {}", obj.id);
        }

        vec![InputEvent::KeyPress(Key::Space)]
    }
}

/// A point inside `obj` and no other object
fn exclusive_point(obj: &TrackedObject, objects: &[TrackedObject]) -> Option<Vec2> {
    CLICK_RINGS
        .iter()
        .flat_map(|&ring| {
            let steps = if ring == 0.0 { 1 } else { 8 };
            (0..steps).map(move |k| obj.pos + polar_degrees(obj.radius * ring, k as f32 * 45.0))
        })
        .find(|&p| {
            obj.contains(p) && objects.iter().filter(|o| o.id != obj.id).all(|o| !o.contains(p))
        })
}

impl InputSource for Autopilot {
    fn poll(&mut self, frame: &Frame<'_>) -> Vec<InputEvent> {
        let entered = frame.phase != self.last_phase;
        self.last_phase = frame.phase;

        if frame.awaits_continue() {
            return vec![InputEvent::KeyPress(Key::Char('f'))];
        }

        match frame.phase {
            Some(TrialPhase::Fixation) if entered => {
                self.begin_trial();
                Vec::new()
            }
            Some(TrialPhase::Flash) => {
                self.observe_flash(frame.objects);
                Vec::new()
            }
            Some(TrialPhase::Response) => self.respond(frame.objects),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Palette;
    use crate::sim::{Role, SelectionState};

    fn objects() -> Vec<TrackedObject> {
        let place = |id, role, x, y| TrackedObject::new(id, role, Vec2::new(x, y), Vec2::ZERO, 35.0);
        vec![
            place(0, Role::Distractor, 100.0, 100.0),
            place(1, Role::Distractor, 300.0, 100.0),
            place(2, Role::Target, 100.0, 400.0),
            place(3, Role::Target, 300.0, 400.0),
        ]
    }

    fn frame<'a>(phase: TrialPhase, objects: &'a [TrackedObject], palette: &'a Palette) -> Frame<'a> {
        Frame {
            phase: Some(phase),
            objects,
            show_fixation: false,
            message: None,
            palette,
        }
    }

    #[test]
    fn test_remembers_flashed_targets_and_clicks_them() {
        let palette = Palette::default();
        let mut pilot = Autopilot::new(2, 5);
        let mut objs = objects();

        pilot.poll(&frame(TrialPhase::Fixation, &objs, &palette));
        objs[2].flash_visible = true;
        objs[3].flash_visible = true;
        pilot.poll(&frame(TrialPhase::Flash, &objs, &palette));
        assert_eq!(pilot.tracked(), &[2, 3]);

        objs[2].flash_visible = false;
        objs[3].flash_visible = false;
        let events = pilot.poll(&frame(TrialPhase::Response, &objs, &palette));
        assert_eq!(events.len(), 3);
        assert!(objs[2].contains(events[1].pointer().map(|p| p.pos()).unwrap_or(Vec2::ZERO)));

        objs[2].selection = SelectionState::Selected;
        objs[3].selection = SelectionState::Selected;
        let events = pilot.poll(&frame(TrialPhase::Response, &objs, &palette));
        assert_eq!(events, vec![InputEvent::KeyPress(Key::Space)]);
    }

    #[test]
    fn test_waits_before_answering() {
        let palette = Palette::default();
        let mut pilot = Autopilot::new(2, 5).with_think_ticks(3);
        let objs = objects();

        for _ in 0..3 {
            assert!(pilot.poll(&frame(TrialPhase::Response, &objs, &palette)).is_empty());
        }
        assert!(!pilot.poll(&frame(TrialPhase::Response, &objs, &palette)).is_empty());
    }

    #[test]
    fn test_presses_continue_on_instructions() {
        let palette = Palette::default();
        let mut pilot = Autopilot::new(2, 5);
        let frame = Frame::instructions(crate::platform::Instruction::Focus, &[], true, &palette);

        let events = pilot.poll(&frame);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_continue());
    }

    #[test]
    fn test_error_rate_one_swaps_a_pick() {
        let palette = Palette::default();
        let mut pilot = Autopilot::new(2, 9).with_error_rate(1.0);
        let mut objs = objects();

        pilot.poll(&frame(TrialPhase::Fixation, &objs, &palette));
        objs[2].flash_visible = true;
        objs[3].flash_visible = true;
        pilot.poll(&frame(TrialPhase::Flash, &objs, &palette));
        pilot.poll(&frame(TrialPhase::Response, &objs, &palette));

        let wrong = pilot.tracked().iter().filter(|&&id| id < 2).count();
        assert_eq!(wrong, 1);
        assert_eq!(pilot.tracked().len(), 2);
    }

    #[test]
    fn test_exclusive_point_avoids_overlap() {
        let place = |id, x| TrackedObject::new(id, Role::Distractor, Vec2::new(x, 100.0), Vec2::ZERO, 35.0);
        let objs = vec![place(0, 100.0), place(1, 110.0)];

        let point = exclusive_point(&objs[0], &objs).unwrap();
        assert!(objs[0].contains(point));
        assert!(!objs[1].contains(point));
    }
}
