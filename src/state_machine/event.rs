//! Events that can occur in a session

use crate::error::RemoteError;
use crate::state_machine::state::TranscriptId;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    /// Edit whichever input is active (URL before ingestion, question after)
    InputEdited(TextEdit),
    /// Submit the active input's current contents
    SubmitInput,
    SubmitUrl {
        url: String,
    },
    Ask {
        question: String,
    },
    Reset,

    // Backend events
    IngestSucceeded {
        doc_id: String,
    },
    IngestFailed {
        error: RemoteError,
    },
    AnswerReceived {
        transcript: TranscriptId,
        answer: String,
    },
    QueryFailed {
        transcript: TranscriptId,
        error: RemoteError,
    },
}

impl Event {
    /// Whether this event is the settlement of a backend call
    pub fn is_settlement(&self) -> bool {
        matches!(
            self,
            Event::IngestSucceeded { .. }
                | Event::IngestFailed { .. }
                | Event::AnswerReceived { .. }
                | Event::QueryFailed { .. }
        )
    }
}

/// A single edit to an input buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEdit {
    Insert(char),
    /// Insert a pasted string
    InsertStr(String),
    Backspace,
    Clear,
}

impl TextEdit {
    pub fn apply(&self, buffer: &mut String) {
        match self {
            TextEdit::Insert(c) => buffer.push(*c),
            TextEdit::InsertStr(text) => buffer.push_str(text),
            TextEdit::Backspace => {
                buffer.pop();
            }
            TextEdit::Clear => buffer.clear(),
        }
    }
}
