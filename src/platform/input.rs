//! Input sources

use std::collections::VecDeque;

use super::render::Frame;
use crate::sim::InputEvent;

/// Supplies one ordered batch of events per tick.
///
/// `frame` is what the participant currently sees.
pub trait InputSource {
    fn poll(&mut self, frame: &Frame<'_>) -> Vec<InputEvent>;
}

/// Replays fixed batches, then reports no input
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    batches: VecDeque<Vec<InputEvent>>,
}

impl ScriptedInput {
    pub fn new<I>(batches: I) -> Self
    where
        I: IntoIterator<Item = Vec<InputEvent>>,
    {
        Self {
            batches: batches.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.batches.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, _frame: &Frame<'_>) -> Vec<InputEvent> {
        self.batches.pop_front().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Instruction;
    use crate::settings::Palette;
    use crate::sim::Key;

    #[test]
    fn test_scripted_batches_then_silence() {
        let palette = Palette::default();
        let frame = Frame::instructions(Instruction::Start, &[], false, &palette);
        let mut input = ScriptedInput::new([vec![InputEvent::KeyPress(Key::Space)], vec![]]);
        assert_eq!(input.remaining(), 2);

        assert_eq!(input.poll(&frame), vec![InputEvent::KeyPress(Key::Space)]);
        assert!(input.poll(&frame).is_empty());
        assert_eq!(input.remaining(), 0);
        assert!(input.poll(&frame).is_empty());
    }
}
