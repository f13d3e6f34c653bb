//! Session runtime executor

use super::UiEvent;
use crate::gateway::{self, Backend};
use crate::state_machine::{transition, AppState, Effect, Event, TransitionError, TranscriptId};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Owns the session state and executes the effects of each transition
///
/// Events are handled one at a time, so every settlement is applied to the
/// state left by the previous one. Backend calls run as spawned tasks and
/// report back through the event channel.
pub struct SessionRuntime<B: Backend + 'static> {
    state: AppState,
    backend: Arc<B>,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so the loop ends once all handles are gone
    event_tx: mpsc::WeakSender<Event>,
    broadcast_tx: broadcast::Sender<UiEvent>,
    /// Token for the question in flight, keyed by the transcript that asked it
    query_cancel: Option<(TranscriptId, CancellationToken)>,
}

impl<B: Backend + 'static> SessionRuntime<B> {
    pub fn new(
        state: AppState,
        backend: B,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
        broadcast_tx: broadcast::Sender<UiEvent>,
    ) -> Self {
        Self {
            state,
            backend: Arc::new(backend),
            event_rx,
            event_tx,
            broadcast_tx,
            query_cancel: None,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Starting session runtime");
        self.publish_state();

        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event);
        }

        if let Some((transcript, token)) = self.query_cancel.take() {
            tracing::info!(transcript = %transcript, "Aborting question on shutdown");
            token.cancel();
        }
        tracing::info!("Session runtime stopped");
    }

    fn process_event(&mut self, event: Event) {
        let settlement = event.is_settlement();
        let result = match transition(&self.state, event) {
            Ok(r) => r,
            Err(e) => {
                self.reject(&e, settlement);
                return;
            }
        };

        let old_phase = self.state.session.phase.name();
        self.state = result.new_state;
        let new_phase = self.state.session.phase.name();
        if old_phase != new_phase {
            tracing::info!(from = old_phase, to = new_phase, "Session phase changed");
        }

        // Snapshot first so scroll targets already exist in the front end's copy
        self.publish_state();
        for effect in result.effects {
            self.execute_effect(effect);
        }
        self.release_settled_query();
    }

    fn reject(&self, error: &TransitionError, settlement: bool) {
        match error {
            TransitionError::StaleResponse { transcript } => {
                tracing::debug!(transcript = %transcript, "Discarding stale response");
            }
            e if e.is_user_facing() => {
                tracing::debug!(error = %e, "Rejected event");
                let _ = self.broadcast_tx.send(UiEvent::Rejected {
                    message: e.to_string(),
                });
            }
            e if settlement => {
                tracing::warn!(error = %e, "Ignoring backend settlement");
            }
            e => {
                tracing::debug!(error = %e, "Ignoring input");
            }
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RequestIngest { url } => {
                tracing::info!(url = %url, "Requesting article ingestion");
                let backend = Arc::clone(&self.backend);
                let events = self.event_tx.clone();
                tokio::spawn(async move {
                    let event = match gateway::ingest_article(backend.as_ref(), &url).await {
                        Ok(response) => Event::IngestSucceeded {
                            doc_id: response.doc_id,
                        },
                        Err(error) => Event::IngestFailed { error },
                    };
                    deliver(&events, event).await;
                });
            }

            Effect::RequestQuery {
                transcript,
                document,
                question,
            } => {
                tracing::info!(transcript = %transcript, doc_id = %document, "Sending question");
                let token = CancellationToken::new();
                if let Some((previous, stale)) = self.query_cancel.replace((transcript, token.clone()))
                {
                    tracing::warn!(transcript = %previous, "Replacing unsettled question");
                    stale.cancel();
                }

                let backend = Arc::clone(&self.backend);
                let events = self.event_tx.clone();
                tokio::spawn(async move {
                    let outcome = tokio::select! {
                        () = token.cancelled() => None,
                        result = gateway::ask_question(backend.as_ref(), &question, document.as_str()) => Some(result),
                    };
                    let event = match outcome {
                        Some(Ok(answer)) => Event::AnswerReceived { transcript, answer },
                        Some(Err(error)) => Event::QueryFailed { transcript, error },
                        None => {
                            tracing::info!(transcript = %transcript, "Question aborted");
                            return;
                        }
                    };
                    deliver(&events, event).await;
                });
            }

            Effect::AbortQuery { transcript } => match self.query_cancel.take() {
                Some((id, token)) if id == transcript => token.cancel(),
                other => self.query_cancel = other,
            },

            Effect::ScrollToLatest {
                transcript,
                sequence,
            } => {
                let _ = self.broadcast_tx.send(UiEvent::ScrollToLatest {
                    transcript,
                    sequence,
                });
            }
        }
    }

    /// Forget the token once its question has settled
    fn release_settled_query(&mut self) {
        let still_pending = match (&self.query_cancel, &self.state.transcript) {
            (Some((id, _)), Some(live)) => live.id == *id && live.pending,
            _ => false,
        };
        if !still_pending {
            self.query_cancel = None;
        }
    }

    fn publish_state(&self) {
        // No subscribers is fine, e.g. before the front end attaches
        let _ = self.broadcast_tx.send(UiEvent::StateChanged {
            state: self.state.clone(),
        });
    }
}

async fn deliver(events: &mpsc::WeakSender<Event>, event: Event) {
    let Some(tx) = events.upgrade() else {
        tracing::debug!("Runtime gone, dropping settlement");
        return;
    };
    if tx.send(event).await.is_err() {
        tracing::debug!("Runtime gone, dropping settlement");
    }
}
