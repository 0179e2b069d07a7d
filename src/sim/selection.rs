//! Pointer selection state machine
//!
//! Every object runs the same four-state machine. Each pointer event is
//! applied to every object independently, using whether the pointer lies
//! inside that object.

use glam::Vec2;

use super::state::{SelectionState, TrackedObject};

/// Pointer event with its window position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move(Vec2),
    ButtonDown(Vec2),
    ButtonUp(Vec2),
}

impl PointerEvent {
    pub fn pos(&self) -> Vec2 {
        match *self {
            PointerEvent::Move(p) | PointerEvent::ButtonDown(p) | PointerEvent::ButtonUp(p) => p,
        }
    }
}

impl SelectionState {
    /// Transition for one event; unmatched combinations keep the state
    pub fn next(self, event: &PointerEvent, over: bool) -> Self {
        use PointerEvent::*;
        use SelectionState::*;

        match (self, event, over) {
            (Neutral, Move(_), true) => Hovered,
            (Hovered, Move(_), false) => Neutral,
            (Neutral | Hovered, ButtonDown(_), true) => Clicked,
            (Selected, ButtonDown(_), true) => Neutral,
            (Clicked, ButtonUp(_), true) => Selected,
            (Clicked, ButtonUp(_), false) => Neutral,
            (state, _, _) => state,
        }
    }
}

/// Drives `SelectionState` for a whole object set
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionStateMachine;

impl SelectionStateMachine {
    /// Apply one pointer event to every object
    pub fn handle(&self, objects: &mut [TrackedObject], event: &PointerEvent) {
        let pos = event.pos();
        for obj in objects.iter_mut() {
            let over = obj.contains(pos);
            let next = obj.selection.next(event, over);
            if next != obj.selection {
                log::trace!("object {} {:?} -> {:?}", obj.id, obj.selection, next);
                obj.selection = next;
            }
        }
    }

    /// Force every object back to `Neutral`
    pub fn reset(&self, objects: &mut [TrackedObject]) {
        for obj in objects.iter_mut() {
            obj.reset_selection();
        }
    }

    /// Objects counted by a submission
    pub fn selected<'a>(&self, objects: &'a [TrackedObject]) -> impl Iterator<Item = &'a TrackedObject> {
        objects.iter().filter(|o| o.is_selected())
    }
}
