//! Session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions. The
//! session controller and the conversation manager are both arms of
//! [`transition`]; the runtime owns the state and executes the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::{Event, TextEdit};
pub use state::{AppState, Origin, Phase, Transcript, TranscriptId};
pub use transition::{transition, TransitionError};
