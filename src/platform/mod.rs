//! Platform abstraction layer
//!
//! Seams between the deterministic core and the host:
//! - Input events
//! - Frame presentation
//! - Tick pacing
//! - A scripted participant for headless runs

pub mod autopilot;
pub mod input;
pub mod render;
pub mod time;

pub use autopilot::Autopilot;
pub use input::{InputSource, ScriptedInput};
pub use render::{Frame, Instruction, LogRenderer, Message, RecordingRenderer, Renderer, object_color};
pub use time::{RealtimeClock, TickClock, UnpacedClock};
