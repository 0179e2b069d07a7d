//! Deterministic simulation module
//!
//! All task logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by object ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod selection;
pub mod state;
pub mod tick;

pub use collision::{MotionEngine, deflection_velocity};
pub use selection::{PointerEvent, SelectionStateMachine};
pub use state::{Role, SelectionState, TrackedObject, spawn_objects};
pub use tick::{InputEvent, Key, TrialController, TrialOutcome, TrialPhase, TrialSignal, TrialState};
