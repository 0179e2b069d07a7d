//! Fixed timestep trial controller
//!
//! Sequences one trial at a time through its phases and runs the block's
//! trial counter. The controller owns the object set for the whole block.
//!
//! Phase changes follow elapsed seconds; the target flash cadence follows the
//! tick counter. The two clocks are independent on purpose.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::MotionEngine;
use super::selection::{PointerEvent, SelectionStateMachine};
use super::state::{Role, TrackedObject, spawn_objects};
use crate::consts::FLASH_STEP;
use crate::settings::ExperimentConfig;

/// Slack for comparing accumulated tick time against thresholds
const TIME_EPSILON: f64 = 1e-9;

/// Keyboard keys the task reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Escape,
    Char(char),
}

/// One input event, in arrival order within a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMove(Vec2),
    ButtonDown(Vec2),
    ButtonUp(Vec2),
    KeyPress(Key),
    /// Window close request
    Quit,
}

impl InputEvent {
    /// Window close or Escape
    pub fn is_quit(&self) -> bool {
        matches!(self, InputEvent::Quit | InputEvent::KeyPress(Key::Escape))
    }

    /// Space submits the current selection
    pub fn is_submit(&self) -> bool {
        matches!(self, InputEvent::KeyPress(Key::Space))
    }

    /// F dismisses instruction screens
    pub fn is_continue(&self) -> bool {
        matches!(self, InputEvent::KeyPress(Key::Char(c)) if c.eq_ignore_ascii_case(&'f'))
    }

    pub fn pointer(&self) -> Option<PointerEvent> {
        match *self {
            InputEvent::PointerMove(p) => Some(PointerEvent::Move(p)),
            InputEvent::ButtonDown(p) => Some(PointerEvent::ButtonDown(p)),
            InputEvent::ButtonUp(p) => Some(PointerEvent::ButtonUp(p)),
            _ => None,
        }
    }
}

/// Stage of a single trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrialPhase {
    /// Fixation marker and static objects
    Fixation,
    /// Targets blink
    Flash,
    /// Objects move
    Animate,
    /// Objects stopped, waiting for a submission
    Response,
    /// Showing the submission result
    Feedback,
    /// Answer deadline passed without a valid submission
    TimedOut,
}

impl TrialPhase {
    /// Phase for a given time into the trial (before any submission)
    pub fn at(elapsed: f64, config: &ExperimentConfig) -> Self {
        let reached = |t: f64| elapsed + TIME_EPSILON >= t;
        if reached(config.t_answer) {
            TrialPhase::TimedOut
        } else if reached(config.t_animate) {
            TrialPhase::Response
        } else if reached(config.t_flash) {
            TrialPhase::Animate
        } else if reached(config.t_fixation) {
            TrialPhase::Flash
        } else {
            TrialPhase::Fixation
        }
    }

    /// Pointer events reach the selection state machine
    pub fn allows_selection(&self) -> bool {
        matches!(self, TrialPhase::Animate | TrialPhase::Response)
    }

    /// Trial has an outcome and is counting down its feedback display
    pub fn is_resolved(&self) -> bool {
        matches!(self, TrialPhase::Feedback | TrialPhase::TimedOut)
    }

    pub fn shows_fixation(&self) -> bool {
        matches!(self, TrialPhase::Fixation | TrialPhase::Flash)
    }
}

/// Clock and phase of the running trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialState {
    pub phase: TrialPhase,
    /// Seconds since trial start
    pub elapsed: f64,
    pub tick_count: u64,
}

impl Default for TrialState {
    fn default() -> Self {
        Self {
            phase: TrialPhase::Fixation,
            elapsed: 0.0,
            tick_count: 0,
        }
    }
}

/// How a trial ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TrialOutcome {
    Submitted {
        /// Selected objects that were targets
        score: usize,
        /// Objects selected at submission
        selected: usize,
        /// Seconds from the end of animation to the submission
        latency_secs: f64,
    },
    TimedOut,
}

/// Notifications produced by a tick, in the order they happened
#[derive(Debug, Clone, PartialEq)]
pub enum TrialSignal {
    TrialStarted(usize),
    PhaseChanged(TrialPhase),
    /// Submission rejected; the participant must select exactly `required` objects
    WrongCount { selected: usize, required: usize },
    Resolved(TrialOutcome),
    /// Feedback finished and objects were reset
    TrialFinished(usize),
    BlockComplete,
    /// Quit requested; the block must be abandoned
    Quit,
}

/// Master state machine for a block of trials
#[derive(Debug, Clone)]
pub struct TrialController<'a> {
    config: &'a ExperimentConfig,
    motion: MotionEngine,
    selection: SelectionStateMachine,
    objects: Vec<TrackedObject>,
    rng: Pcg32,
    state: TrialState,
    flash_timer: u32,
    flash_on: bool,
    feedback_elapsed: f64,
    outcome: Option<TrialOutcome>,
    wrong_count: bool,
    trial_index: usize,
    block_trials: usize,
    block_complete: bool,
}

impl<'a> TrialController<'a> {
    /// Spawn a fresh object set from `seed`.
    ///
    /// `config` must pass `ExperimentConfig::validate`; spawning panics on a
    /// window too small for one object.
    pub fn new(config: &'a ExperimentConfig, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let objects = spawn_objects(config, &mut rng);
        Self::build(config, objects, rng)
    }

    /// Use a prepared object set (scripted runs and tests)
    pub fn with_objects(config: &'a ExperimentConfig, objects: Vec<TrackedObject>, seed: u64) -> Self {
        Self::build(config, objects, Pcg32::seed_from_u64(seed))
    }

    fn build(config: &'a ExperimentConfig, objects: Vec<TrackedObject>, rng: Pcg32) -> Self {
        Self {
            config,
            motion: MotionEngine::from_config(config),
            selection: SelectionStateMachine,
            objects,
            rng,
            state: TrialState::default(),
            flash_timer: 0,
            flash_on: false,
            feedback_elapsed: 0.0,
            outcome: None,
            wrong_count: false,
            trial_index: 0,
            block_trials: 0,
            block_complete: true,
        }
    }

    /// Start a block of `trials` trials at trial 0
    pub fn begin_block(&mut self, trials: usize) -> Vec<TrialSignal> {
        self.trial_index = 0;
        self.block_trials = trials;
        if trials == 0 {
            self.block_complete = true;
            return vec![TrialSignal::BlockComplete];
        }
        self.block_complete = false;
        self.start_trial();
        vec![TrialSignal::TrialStarted(0)]
    }

    fn start_trial(&mut self) {
        self.state = TrialState::default();
        self.flash_timer = 0;
        self.flash_on = false;
        self.feedback_elapsed = 0.0;
        self.outcome = None;
        self.wrong_count = false;
        log::debug!("Trial {} of {} started", self.trial_index + 1, self.block_trials);
    }

    /// Advance by one fixed timestep with this tick's input batch
    pub fn tick(&mut self, dt: f64, events: &[InputEvent]) -> Vec<TrialSignal> {
        if events.iter().any(InputEvent::is_quit) {
            log::info!("Quit requested during {:?}", self.state.phase);
            return vec![TrialSignal::Quit];
        }
        if self.block_complete {
            return Vec::new();
        }

        let mut signals = Vec::new();

        if self.state.phase.is_resolved() {
            self.state.tick_count += 1;
            self.feedback_elapsed += dt;
            if self.feedback_elapsed + TIME_EPSILON >= self.config.feedback_secs {
                self.finish_trial(&mut signals);
            }
            return signals;
        }

        for event in events {
            if let Some(pointer) = event.pointer() {
                if self.state.phase.allows_selection() {
                    self.selection.handle(&mut self.objects, &pointer);
                }
            } else if event.is_submit() && self.state.phase == TrialPhase::Response {
                self.submit(dt, &mut signals);
                if self.state.phase.is_resolved() {
                    return signals;
                }
            }
        }

        self.state.elapsed += dt;
        self.state.tick_count += 1;

        let next = TrialPhase::at(self.state.elapsed, self.config);
        if next != self.state.phase {
            self.enter_phase(next, &mut signals);
        }

        match self.state.phase {
            TrialPhase::Flash => self.update_flash(),
            TrialPhase::Animate => self.motion.tick(&mut self.objects),
            _ => {}
        }

        signals
    }

    fn enter_phase(&mut self, next: TrialPhase, signals: &mut Vec<TrialSignal>) {
        let prev = self.state.phase;
        log::debug!("Phase {:?} -> {:?} at {:.3}s", prev, next, self.state.elapsed);

        // Targets stop standing out once motion begins. Reset once on entry:
        // selections made later during Animate are kept, unlike a per-frame reset
        if prev < TrialPhase::Animate && next >= TrialPhase::Animate {
            for obj in self.objects.iter_mut().filter(|o| o.role == Role::Target) {
                obj.reset_selection();
            }
        }

        self.state.phase = next;
        signals.push(TrialSignal::PhaseChanged(next));

        if next == TrialPhase::TimedOut {
            log::info!("Trial {} timed out", self.trial_index + 1);
            self.resolve(TrialOutcome::TimedOut, signals);
        }
    }

    /// Toggle the target highlight on the tick-count cadence
    fn update_flash(&mut self) {
        if self.flash_timer >= self.config.tick_rate {
            self.flash_timer = 0;
            self.flash_on = !self.flash_on;
        }
        self.flash_timer += FLASH_STEP;

        let flash_on = self.flash_on;
        for obj in self.objects.iter_mut().filter(|o| o.role == Role::Target) {
            obj.flash_visible = flash_on;
        }
    }

    /// Evaluate a Space press. The press arrived during this tick, so it is
    /// timed at the end of the tick rather than at the previous tick's clock.
    fn submit(&mut self, dt: f64, signals: &mut Vec<TrialSignal>) {
        let (count, score) = {
            let selected: Vec<&TrackedObject> = self.selection.selected(&self.objects).collect();
            (selected.len(), selected.iter().filter(|o| o.is_target()).count())
        };
        let required = self.config.num_targets;

        if count != required {
            log::debug!("Submission rejected: {} selected, {} required", count, required);
            self.wrong_count = true;
            signals.push(TrialSignal::WrongCount {
                selected: count,
                required,
            });
            return;
        }

        let latency_secs = self.state.elapsed + dt - self.config.t_animate;
        log::info!(
            "Trial {} submitted: {}/{} correct, latency {:.3}s",
            self.trial_index + 1,
            score,
            required,
            latency_secs
        );

        self.state.phase = TrialPhase::Feedback;
        signals.push(TrialSignal::PhaseChanged(TrialPhase::Feedback));
        self.resolve(
            TrialOutcome::Submitted {
                score,
                selected: required,
                latency_secs,
            },
            signals,
        );
    }

    fn resolve(&mut self, outcome: TrialOutcome, signals: &mut Vec<TrialSignal>) {
        self.outcome = Some(outcome);
        self.wrong_count = false;
        self.feedback_elapsed = 0.0;
        signals.push(TrialSignal::Resolved(outcome));
    }

    fn finish_trial(&mut self, signals: &mut Vec<TrialSignal>) {
        for obj in self.objects.iter_mut() {
            obj.shuffle_position(self.config, &mut self.rng);
        }
        let finished = self.trial_index;
        signals.push(TrialSignal::TrialFinished(finished));

        self.trial_index += 1;
        if self.trial_index < self.block_trials {
            self.start_trial();
            signals.push(TrialSignal::TrialStarted(self.trial_index));
        } else {
            log::info!("Block of {} trials complete", self.block_trials);
            self.block_complete = true;
            signals.push(TrialSignal::BlockComplete);
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.state.phase
    }

    pub fn state(&self) -> &TrialState {
        &self.state
    }

    pub fn objects(&self) -> &[TrackedObject] {
        &self.objects
    }

    /// Outcome of the current trial, once resolved
    pub fn outcome(&self) -> Option<TrialOutcome> {
        self.outcome
    }

    /// A rejected submission is waiting to be corrected
    pub fn wrong_count_pending(&self) -> bool {
        self.wrong_count
    }

    pub fn trial_index(&self) -> usize {
        self.trial_index
    }

    pub fn block_trials(&self) -> usize {
        self.block_trials
    }

    pub fn is_block_complete(&self) -> bool {
        self.block_complete
    }

    pub fn config(&self) -> &'a ExperimentConfig {
        self.config
    }
}
