//! Experiment session
//!
//! Runs the optional guide, the unscored practice block and the scored real
//! block in order. Each tick: wait for the clock, present a frame, poll input,
//! advance the trial controller. Only real-block outcomes reach the sink.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::persistence::{PersistenceSink, ResponseRecord};
use crate::platform::{Frame, InputSource, Instruction, Message, Renderer, TickClock};
use crate::settings::ExperimentConfig;
use crate::sim::{InputEvent, TrackedObject, TrialController, TrialOutcome, TrialPhase, TrialSignal};

/// Trial block kinds, in session order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Block {
    /// One walkthrough trial with extra instructions
    Guide,
    Practice,
    /// Scored; one record per trial
    Real,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    Completed,
    /// Quit requested
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub outcome: SessionOutcome,
    pub guide_completed: bool,
    pub practice_trials: usize,
    pub real_trials: usize,
    pub records_written: usize,
}

impl Default for SessionSummary {
    fn default() -> Self {
        Self {
            outcome: SessionOutcome::Aborted,
            guide_completed: false,
            practice_trials: 0,
            real_trials: 0,
            records_written: 0,
        }
    }
}

/// Whether the session keeps going after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct ExperimentSession<'a, I, R, S, C>
where
    I: InputSource,
    R: Renderer,
    S: PersistenceSink,
    C: TickClock,
{
    config: &'a ExperimentConfig,
    input: I,
    renderer: R,
    sink: S,
    clock: C,
    rng: Pcg32,
    summary: SessionSummary,
    ticks: u64,
}

impl<'a, I, R, S, C> ExperimentSession<'a, I, R, S, C>
where
    I: InputSource,
    R: Renderer,
    S: PersistenceSink,
    C: TickClock,
{
    pub fn new(config: &'a ExperimentConfig, input: I, renderer: R, sink: S, clock: C) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!("Session seed {seed}");
        Self {
            config,
            input,
            renderer,
            sink,
            clock,
            rng: Pcg32::seed_from_u64(seed),
            summary: SessionSummary::default(),
            ticks: 0,
        }
    }

    /// Run every block to completion or until quit.
    ///
    /// The config is validated first. The sink is closed on both paths.
    /// Persistence failures abort the run.
    pub fn run(&mut self) -> crate::Result<SessionSummary> {
        self.config.validate()?;
        let flow = self.run_blocks();
        self.sink.close()?;

        self.summary.outcome = match flow? {
            Flow::Continue => SessionOutcome::Completed,
            Flow::Quit => SessionOutcome::Aborted,
        };
        log::info!(
            "Session {:?}: {} practice, {} real trials, {} records in {} ticks",
            self.summary.outcome,
            self.summary.practice_trials,
            self.summary.real_trials,
            self.summary.records_written,
            self.ticks
        );
        Ok(self.summary)
    }

    fn run_blocks(&mut self) -> crate::Result<Flow> {
        if self.config.run_guide && self.run_guide()? == Flow::Quit {
            return Ok(Flow::Quit);
        }

        if self.run_block(Block::Practice, self.config.practice_trials)? == Flow::Quit {
            return Ok(Flow::Quit);
        }
        if self.wait_for_continue(Instruction::PracticeFinished, &[], false) == Flow::Quit {
            return Ok(Flow::Quit);
        }

        if self.run_block(Block::Real, self.config.real_trials)? == Flow::Quit {
            return Ok(Flow::Quit);
        }
        // Data is complete once the last real trial is logged
        self.sink.close()?;

        // Quitting the closing screen still counts as a finished session
        self.wait_for_continue(Instruction::ExperimentFinished, &[], false);
        Ok(Flow::Continue)
    }

    fn run_guide(&mut self) -> crate::Result<Flow> {
        log::info!("Starting guide");
        let config = self.config;
        let mut controller = TrialController::new(config, self.rng.random());

        for (instruction, show_fixation) in [(Instruction::Start, false), (Instruction::Focus, true)] {
            if self.wait_for_continue(instruction, &[], show_fixation) == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
        if self.wait_for_continue(Instruction::Present, controller.objects(), true) == Flow::Quit {
            return Ok(Flow::Quit);
        }

        if self.run_trials(&mut controller, Block::Guide, 1)? == Flow::Quit {
            return Ok(Flow::Quit);
        }
        self.summary.guide_completed = true;

        Ok(self.wait_for_continue(Instruction::GuideFinished, &[], false))
    }

    fn run_block(&mut self, block: Block, trials: usize) -> crate::Result<Flow> {
        log::info!("Starting {block:?} block of {trials} trials");
        let config = self.config;
        let mut controller = TrialController::new(config, self.rng.random());
        self.run_trials(&mut controller, block, trials)
    }

    fn run_trials(&mut self, controller: &mut TrialController<'_>, block: Block, trials: usize) -> crate::Result<Flow> {
        controller.begin_block(trials);

        while !controller.is_block_complete() {
            let dt = self.clock.wait_for_tick();
            self.ticks += 1;

            let frame = trial_frame(controller, block);
            self.renderer.present(&frame);
            let events = self.input.poll(&frame);

            for signal in controller.tick(dt, &events) {
                match signal {
                    TrialSignal::Quit => return Ok(Flow::Quit),
                    TrialSignal::Resolved(outcome) => self.record(block, &outcome)?,
                    TrialSignal::WrongCount { selected, required } => {
                        log::debug!("{block:?}: {selected} selected, {required} required");
                    }
                    TrialSignal::TrialFinished(_) => match block {
                        Block::Guide => {}
                        Block::Practice => self.summary.practice_trials += 1,
                        Block::Real => self.summary.real_trials += 1,
                    },
                    TrialSignal::BlockComplete => log::info!("{block:?} block complete"),
                    TrialSignal::TrialStarted(_) | TrialSignal::PhaseChanged(_) => {}
                }
            }
        }

        Ok(Flow::Continue)
    }

    fn record(&mut self, block: Block, outcome: &TrialOutcome) -> crate::Result<()> {
        if block != Block::Real {
            return Ok(());
        }
        let record = ResponseRecord::from(outcome);
        self.sink.append(&record)?;
        self.summary.records_written += 1;
        log::info!("Recorded {:?}", record.fields());
        Ok(())
    }

    /// Show an instruction screen until Continue or quit
    fn wait_for_continue(&mut self, instruction: Instruction, objects: &[TrackedObject], show_fixation: bool) -> Flow {
        let config = self.config;
        let frame = Frame::instructions(instruction, objects, show_fixation, &config.palette);
        loop {
            self.clock.wait_for_tick();
            self.ticks += 1;
            self.renderer.present(&frame);
            let events = self.input.poll(&frame);

            if events.iter().any(InputEvent::is_quit) {
                log::info!("Quit requested on {instruction:?} screen");
                return Flow::Quit;
            }
            if events.iter().any(InputEvent::is_continue) {
                return Flow::Continue;
            }
        }
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn input(&self) -> &I {
        &self.input
    }
}

/// What the participant sees during a trial tick
fn trial_frame<'f>(controller: &'f TrialController<'_>, block: Block) -> Frame<'f> {
    let config = controller.config();
    let phase = controller.phase();

    let message = match (phase, controller.outcome()) {
        (TrialPhase::Response, _) if controller.wrong_count_pending() => Some(Message::WrongCount {
            required: config.num_targets,
        }),
        (TrialPhase::Response, _) if block == Block::Guide => Some(Message::Answer),
        (TrialPhase::Feedback, Some(TrialOutcome::Submitted { score, selected, .. })) => Some(match block {
            Block::Guide => Message::GuideScore { correct: score },
            _ => Message::Score {
                correct: score,
                selected,
            },
        }),
        (TrialPhase::TimedOut, _) => Some(match block {
            Block::Guide => Message::GuideTimeUp,
            _ => Message::TimeUp,
        }),
        _ => None,
    };

    let objects: &[TrackedObject] = if phase.is_resolved() { &[] } else { controller.objects() };

    Frame {
        phase: Some(phase),
        objects,
        show_fixation: phase.shows_fixation(),
        message,
        palette: &config.palette,
    }
}
