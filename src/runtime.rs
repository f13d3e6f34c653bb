//! Runtime driving the session state machine
//!
//! The runtime is the only owner of [`AppState`]. Front ends talk to it
//! through a [`RuntimeHandle`]: events go in over an mpsc channel, state
//! snapshots and scroll requests come back over a broadcast channel.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::gateway::Backend;
use crate::state_machine::{AppState, Event, TranscriptId};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Events sent to the front end
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// State after a transition was applied
    StateChanged { state: AppState },
    /// A message was appended; bring it into view
    ScrollToLatest {
        transcript: TranscriptId,
        sequence: u64,
    },
    /// An action was refused because it isn't available right now
    Rejected { message: String },
}

#[derive(Debug, Error)]
#[error("Session runtime has stopped")]
pub struct RuntimeClosed;

/// Handle to interact with a running session runtime
///
/// The runtime stops once every handle is dropped.
#[derive(Clone)]
pub struct RuntimeHandle {
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<UiEvent>,
}

impl RuntimeHandle {
    /// Send an event to the runtime
    pub async fn send(&self, event: Event) -> Result<(), RuntimeClosed> {
        self.event_tx.send(event).await.map_err(|_| RuntimeClosed)
    }

    /// Subscribe to state and scroll updates
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.broadcast_tx.subscribe()
    }
}

/// Start a runtime for a fresh session on the current tokio runtime
pub fn spawn<B: Backend + 'static>(backend: B) -> (RuntimeHandle, JoinHandle<()>) {
    let (event_tx, event_rx) = mpsc::channel(32);
    let (broadcast_tx, _) = broadcast::channel(128);

    let runtime = SessionRuntime::new(
        AppState::default(),
        backend,
        event_rx,
        event_tx.downgrade(),
        broadcast_tx.clone(),
    );
    let task = tokio::spawn(runtime.run());

    (
        RuntimeHandle {
            event_tx,
            broadcast_tx,
        },
        task,
    )
}
