//! Frame description handed to the renderer
//!
//! The core describes what is on screen; drawing is the renderer's business.

use crate::settings::{Color, ExperimentConfig, Palette};
use crate::sim::{SelectionState, TrackedObject, TrialPhase};

/// Instruction screens that wait for the Continue key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    Start,
    Focus,
    Present,
    GuideFinished,
    PracticeFinished,
    ExperimentFinished,
}

/// Text shown on top of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message {
    Instructions(Instruction),
    /// Guide reminder of how to answer
    Answer,
    WrongCount { required: usize },
    Score { correct: usize, selected: usize },
    GuideScore { correct: usize },
    TimeUp,
    GuideTimeUp,
}

impl Message {
    pub fn text(&self, config: &ExperimentConfig) -> String {
        let targets = config.num_targets;
        match *self {
            Message::Instructions(Instruction::Start) => format!(
                "You will first see a cross at the center of the screen. Please focus your gaze to that cross.\n\n\
                 There will be {} circles appearing on the screen, {} of them will flash in GREEN.\n\
                 The cross will disappear, and all circles will start to move. Keep track of those {} flashed circles.\n\n\
                 When the circles stop moving, select which circles you've been tracking by clicking them.\n\
                 When you have made your selection, press the SPACEBAR to submit your selection.\n\n\
                 Press F to start when you are ready.\n\nIf you need to stop, let the experimenter know.",
                config.num_distractors, targets, targets
            ),
            Message::Instructions(Instruction::Focus) => {
                "First, you will see this cross. Please focus your gaze here. \nPress F to continue.".to_string()
            }
            Message::Instructions(Instruction::Present) => format!(
                "Then, {} circles will appear randomly around the screen. {} random circles will flash briefly. \
                 Remember which circles flashed. The cross will disappear, and all circles will start moving \
                 when the flashing stops.\n\nPress F to continue.",
                config.num_objects(),
                targets
            ),
            Message::Instructions(Instruction::GuideFinished) => {
                "The guide is now complete, and will move to practice rounds, where you will go through the \
                 experiment in normal order, but your answers will not be recorded.\n\nAfter the practice is \
                 finished, you will move to the real experiments where your responses will be recorded.\n\n\
                 Press F to move to the practice rounds."
                    .to_string()
            }
            Message::Instructions(Instruction::PracticeFinished) => format!(
                "The practice is now over.\n\nPress the F when you are ready to continue to the real experiment.\n\
                 Remember to keep track of the {} targets and submit your result by pressing the SPACEBAR.\n\n\
                 Be as quick and accurate as you can!\n\nPress F to continue.",
                targets
            ),
            Message::Instructions(Instruction::ExperimentFinished) => {
                "The experiment is now over; let the experimenter know.\n\nThank you for participating!\n\nPress F to exit."
                    .to_string()
            }
            Message::Answer => format!(
                "When the circles stop moving, select the circles that you've been tracking.\n\
                 You will have {} seconds to make your choice.\n\nPress SPACEBAR to submit your answer.",
                config.answer_window_secs() as u64
            ),
            Message::WrongCount { required } => format!("Select {required} circles!"),
            Message::Score { correct, selected } => format!("{correct} out of {selected} correct"),
            Message::GuideScore { correct } => format!("You've selected {correct} targets correctly."),
            Message::TimeUp => "Time's up! Now resetting".to_string(),
            Message::GuideTimeUp => {
                "Time is up! Once the time is up, the experiment will automatically move on.".to_string()
            }
        }
    }
}

/// Everything visible for one tick
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// `None` on instruction screens
    pub phase: Option<TrialPhase>,
    pub objects: &'a [TrackedObject],
    pub show_fixation: bool,
    pub message: Option<Message>,
    pub palette: &'a Palette,
}

impl<'a> Frame<'a> {
    pub fn instructions(
        instruction: Instruction,
        objects: &'a [TrackedObject],
        show_fixation: bool,
        palette: &'a Palette,
    ) -> Self {
        Self {
            phase: None,
            objects,
            show_fixation,
            message: Some(Message::Instructions(instruction)),
            palette,
        }
    }

    /// Instruction screen waiting for the Continue key
    pub fn awaits_continue(&self) -> bool {
        matches!(self.message, Some(Message::Instructions(_)))
    }
}

/// Fill colour for an object
pub fn object_color(obj: &TrackedObject, palette: &Palette) -> Color {
    if obj.flash_visible {
        return palette.flash;
    }
    match obj.selection {
        SelectionState::Neutral => palette.default,
        SelectionState::Hovered => palette.hovered,
        SelectionState::Clicked => palette.clicked,
        SelectionState::Selected => palette.selected,
    }
}

/// Produces a visible frame
pub trait Renderer {
    fn present(&mut self, frame: &Frame<'_>);
}

/// Headless renderer that logs screen and message changes
#[derive(Debug, Clone)]
pub struct LogRenderer {
    config: ExperimentConfig,
    last_phase: Option<TrialPhase>,
    last_message: Option<Message>,
    pub frames: u64,
}

impl LogRenderer {
    pub fn new(config: &ExperimentConfig) -> Self {
        Self {
            config: config.clone(),
            last_phase: None,
            last_message: None,
            frames: 0,
        }
    }
}

impl Renderer for LogRenderer {
    fn present(&mut self, frame: &Frame<'_>) {
        self.frames += 1;
        if frame.phase != self.last_phase {
            log::debug!("Screen: {:?} ({} objects)", frame.phase, frame.objects.len());
            self.last_phase = frame.phase;
        }
        if frame.message != self.last_message {
            if let Some(message) = frame.message {
                log::info!("{}", message.text(&self.config));
            }
            self.last_message = frame.message;
        }
        log::trace!(
            "frame {} colours {:?}",
            self.frames,
            frame
                .objects
                .iter()
                .map(|o| object_color(o, frame.palette))
                .collect::<Vec<_>>()
        );
    }
}

/// Keeps a summary of presented frames (tests)
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub frames: usize,
    /// Distinct consecutive messages
    pub messages: Vec<Message>,
    /// Distinct consecutive phases
    pub phases: Vec<Option<TrialPhase>>,
}

impl Renderer for RecordingRenderer {
    fn present(&mut self, frame: &Frame<'_>) {
        self.frames += 1;
        if let Some(message) = frame.message {
            if self.messages.last() != Some(&message) {
                self.messages.push(message);
            }
        }
        if self.phases.last() != Some(&frame.phase) {
            self.phases.push(frame.phase);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Role;
    use glam::Vec2;

    #[test]
    fn test_object_color_precedence() {
        let palette = Palette::default();
        let mut obj = TrackedObject::new(0, Role::Target, Vec2::new(50.0, 50.0), Vec2::ONE, 35.0);

        assert_eq!(object_color(&obj, &palette), palette.default);
        obj.selection = SelectionState::Selected;
        assert_eq!(object_color(&obj, &palette), palette.selected);
        obj.flash_visible = true;
        assert_eq!(object_color(&obj, &palette), palette.flash);
    }

    #[test]
    fn test_message_text() {
        let config = ExperimentConfig::default();
        assert_eq!(Message::WrongCount { required: 2 }.text(&config), "Select 2 circles!");
        assert_eq!(
            Message::Score { correct: 1, selected: 2 }.text(&config),
            "1 out of 2 correct"
        );
        assert!(Message::Answer.text(&config).contains("60 seconds"));
        assert!(Message::Instructions(Instruction::Start).text(&config).contains("There will be 6 circles"));
    }

    #[test]
    fn test_recording_renderer_dedupes() {
        let palette = Palette::default();
        let mut renderer = RecordingRenderer::default();
        let frame = Frame::instructions(Instruction::Start, &[], false, &palette);

        renderer.present(&frame);
        renderer.present(&frame);

        assert_eq!(renderer.frames, 2);
        assert_eq!(renderer.messages, vec![Message::Instructions(Instruction::Start)]);
        assert!(frame.awaits_continue());
    }
}
