//! Effects produced by state transitions

use crate::state_machine::state::{DocumentHandle, TranscriptId};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the backend to ingest an article
    RequestIngest { url: String },

    /// Ask the backend a question on behalf of a transcript
    RequestQuery {
        transcript: TranscriptId,
        document: DocumentHandle,
        question: String,
    },

    /// Abort the in-flight question of a discarded transcript
    AbortQuery { transcript: TranscriptId },

    /// Bring the most recently appended message into view
    ScrollToLatest {
        transcript: TranscriptId,
        sequence: u64,
    },
}

impl Effect {
    pub fn scroll_to(transcript: TranscriptId, sequence: u64) -> Self {
        Effect::ScrollToLatest {
            transcript,
            sequence,
        }
    }

    /// Whether executing this effect starts a network call
    #[cfg(test)]
    pub fn is_request(&self) -> bool {
        matches!(self, Effect::RequestIngest { .. } | Effect::RequestQuery { .. })
    }
}
