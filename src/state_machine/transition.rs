//! Pure state transition function
//!
//! Given the same state and event this always produces the same result. No
//! I/O happens here; network calls and view updates are returned as effects.

use super::state::{
    AppState, DocumentHandle, Origin, Phase, Session, TranscriptId, ERROR_PLACEHOLDER,
};
use super::{Effect, Event};
use crate::error::{Operation, RemoteError, ValidationError};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: AppState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: AppState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Events the current state cannot accept. State is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("An article is already loading")]
    IngestInFlight,
    #[error("Still waiting for the previous answer")]
    QuestionPending,
    #[error("No article is loaded yet")]
    NotReady,
    #[error("Discarded response for closed transcript {transcript}")]
    StaleResponse { transcript: TranscriptId },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Whether the front end should tell the user about it
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            TransitionError::IngestInFlight
                | TransitionError::QuestionPending
                | TransitionError::NotReady
        )
    }
}

pub fn transition(state: &AppState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (&state.session.phase, event) {
        // ============================================================
        // Input editing
        // ============================================================
        (Phase::AwaitingInput, Event::InputEdited(edit)) => {
            let mut next = state.clone();
            edit.apply(&mut next.session.input_url);
            Ok(TransitionResult::new(next))
        }

        (Phase::Ready { .. }, Event::InputEdited(edit)) => {
            let mut next = state.clone();
            let transcript = next.transcript.as_mut().ok_or_else(missing_transcript)?;
            if transcript.pending {
                return Err(TransitionError::QuestionPending);
            }
            edit.apply(&mut transcript.input);
            Ok(TransitionResult::new(next))
        }

        (Phase::Ingesting, Event::InputEdited(_) | Event::SubmitInput | Event::SubmitUrl { .. }) => {
            Err(TransitionError::IngestInFlight)
        }

        // ============================================================
        // Session controller
        // ============================================================
        (Phase::AwaitingInput, Event::SubmitInput) => {
            let url = state.session.input_url.clone();
            transition(state, Event::SubmitUrl { url })
        }

        (Phase::AwaitingInput, Event::SubmitUrl { url }) => {
            let mut next = state.clone();
            next.session.last_error = None;
            let trimmed = url.trim().to_string();
            next.session.input_url = url;

            if trimmed.is_empty() {
                next.session.last_error = Some(ValidationError::EmptyUrl.into());
                return Ok(TransitionResult::new(next));
            }

            next.session.phase = Phase::Ingesting;
            Ok(TransitionResult::new(next).with_effect(Effect::RequestIngest { url: trimmed }))
        }

        (Phase::Ready { .. }, Event::SubmitUrl { .. }) => Err(TransitionError::InvalidTransition(
            "an article is already loaded; reset first".to_string(),
        )),

        (Phase::Ingesting, Event::IngestSucceeded { doc_id }) => {
            if doc_id.trim().is_empty() {
                return Ok(ingest_failed(
                    state,
                    RemoteError::fallback(Operation::Ingest),
                ));
            }
            let mut next = state.clone();
            next.session.phase = Phase::Ready {
                document: DocumentHandle::new(doc_id),
            };
            next.session.last_error = None;
            let (transcript, sequence) = next.open_transcript();
            Ok(TransitionResult::new(next).with_effect(Effect::scroll_to(transcript, sequence)))
        }

        (Phase::Ingesting, Event::IngestFailed { error }) => Ok(ingest_failed(state, error)),

        (_, Event::IngestSucceeded { .. } | Event::IngestFailed { .. }) => Err(
            TransitionError::InvalidTransition("no ingestion in flight".to_string()),
        ),

        (Phase::Ready { .. }, Event::Reset) => {
            let mut next = state.clone();
            let abort = next
                .transcript
                .take()
                .filter(|t| t.pending)
                .map(|t| Effect::AbortQuery { transcript: t.id });
            next.session = Session::default();
            Ok(TransitionResult::new(next).with_effects(abort))
        }

        (_, Event::Reset) => Err(TransitionError::InvalidTransition(
            "reset is only available once an article is loaded".to_string(),
        )),

        // ============================================================
        // Conversation manager
        // ============================================================
        (Phase::Ready { .. }, Event::SubmitInput) => {
            let question = state
                .transcript
                .as_ref()
                .ok_or_else(missing_transcript)?
                .input
                .clone();
            transition(state, Event::Ask { question })
        }

        (Phase::Ready { document }, Event::Ask { question }) => {
            ask(state, document.clone(), &question)
        }

        (_, Event::Ask { .. }) => Err(TransitionError::NotReady),

        (Phase::Ready { .. }, Event::AnswerReceived { transcript, answer })
            if awaiting_answer(state, transcript) =>
        {
            let mut next = state.clone();
            let sequence = next.append(Origin::Bot, answer);
            if let Some(live) = next.transcript.as_mut() {
                live.pending = false;
                live.error = None;
            }
            Ok(TransitionResult::new(next).with_effect(Effect::scroll_to(transcript, sequence)))
        }

        (Phase::Ready { .. }, Event::QueryFailed { transcript, error })
            if awaiting_answer(state, transcript) =>
        {
            let mut next = state.clone();
            let sequence = next.append(Origin::Bot, ERROR_PLACEHOLDER.to_string());
            if let Some(live) = next.transcript.as_mut() {
                live.pending = false;
                live.error = Some(error.into());
            }
            Ok(TransitionResult::new(next).with_effect(Effect::scroll_to(transcript, sequence)))
        }

        (
            _,
            Event::AnswerReceived { transcript, .. } | Event::QueryFailed { transcript, .. },
        ) => Err(TransitionError::StaleResponse { transcript }),
    }
}

fn ask(
    state: &AppState,
    document: DocumentHandle,
    question: &str,
) -> Result<TransitionResult, TransitionError> {
    let mut next = state.clone();
    let transcript = next.transcript.as_mut().ok_or_else(missing_transcript)?;
    if transcript.pending {
        return Err(TransitionError::QuestionPending);
    }
    transcript.error = None;

    let question = question.trim();
    if question.is_empty() {
        transcript.error = Some(ValidationError::EmptyQuestion.into());
        return Ok(TransitionResult::new(next));
    }

    transcript.input.clear();
    transcript.pending = true;
    let id = transcript.id;
    let sequence = next.append(Origin::User, question.to_string());

    Ok(TransitionResult::new(next)
        .with_effect(Effect::scroll_to(id, sequence))
        .with_effect(Effect::RequestQuery {
            transcript: id,
            document,
            question: question.to_string(),
        }))
}

fn ingest_failed(state: &AppState, error: RemoteError) -> TransitionResult {
    let mut next = state.clone();
    next.session.phase = Phase::AwaitingInput;
    next.session.last_error = Some(error.into());
    TransitionResult::new(next)
}

/// The live transcript is `id` and has a question in flight
fn awaiting_answer(state: &AppState, id: TranscriptId) -> bool {
    state
        .transcript
        .as_ref()
        .is_some_and(|t| t.id == id && t.pending)
}

fn missing_transcript() -> TransitionError {
    TransitionError::InvalidTransition("session is ready but has no transcript".to_string())
}
