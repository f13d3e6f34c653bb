//! Session and transcript state types

use crate::error::ClientError;
use std::fmt;

pub const WELCOME_MESSAGE: &str = "Article loaded successfully. What would you like to know?";
pub const ERROR_PLACEHOLDER: &str = "Sorry, an error occurred.";

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque identifier the backend assigns to an ingested article
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentHandle(String);

impl DocumentHandle {
    pub fn new(doc_id: impl Into<String>) -> Self {
        Self(doc_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one transcript instance; never reused within a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TranscriptId(pub u64);

impl fmt::Display for TranscriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Ingestion phase. The document handle lives inside `Ready`, so it exists
/// exactly when the session is ready.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    AwaitingInput,
    Ingesting,
    Ready { document: DocumentHandle },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::AwaitingInput => "awaiting_input",
            Phase::Ingesting => "ingesting",
            Phase::Ready { .. } => "ready",
        }
    }
}

/// Top-level ingestion state for one article
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub phase: Phase,
    /// Article locator; only edited while awaiting input
    pub input_url: String,
    /// Cleared on every new attempt
    pub last_error: Option<ClientError>,
}

impl Session {
    pub fn document(&self) -> Option<&DocumentHandle> {
        match &self.phase {
            Phase::Ready { document } => Some(document),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready { .. })
    }
}

// ============================================================================
// Transcript
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub origin: Origin,
    pub text: String,
    pub sequence: u64,
}

/// Append-only message history for one ingested article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub id: TranscriptId,
    messages: Vec<Message>,
    /// Question input buffer
    pub input: String,
    /// A question is in flight
    pub pending: bool,
    /// Transient error, cleared at the start of the next attempt
    pub error: Option<ClientError>,
}

impl Transcript {
    fn new(id: TranscriptId) -> Self {
        Self {
            id,
            messages: Vec::new(),
            input: String::new(),
            pending: false,
            error: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

// ============================================================================
// Application state
// ============================================================================

/// The active session and, once ready, its transcript
///
/// The counters outlive any single session so sequence numbers and
/// transcript ids are never handed out twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub session: Session,
    pub transcript: Option<Transcript>,
    next_sequence: u64,
    next_transcript: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: Session::default(),
            transcript: None,
            next_sequence: 1,
            next_transcript: 1,
        }
    }
}

impl AppState {
    /// Open a fresh transcript seeded with the welcome message
    pub(super) fn open_transcript(&mut self) -> (TranscriptId, u64) {
        let id = TranscriptId(self.next_transcript);
        self.next_transcript += 1;
        self.transcript = Some(Transcript::new(id));
        let sequence = self.append(Origin::Bot, WELCOME_MESSAGE.to_string());
        (id, sequence)
    }

    /// Append to the live transcript, returning the new message's sequence
    ///
    /// Callers must have checked a transcript exists; with none the counter
    /// is still advanced so numbering stays monotonic.
    pub(super) fn append(&mut self, origin: Origin, text: String) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.messages.push(Message {
                origin,
                text,
                sequence,
            });
        }
        sequence
    }

    /// Next sequence number that will be assigned
    #[cfg(test)]
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.session.phase, Phase::Ingesting)
            || self.transcript.as_ref().is_some_and(|t| t.pending)
    }

    /// Error to show next to whichever input is active
    pub fn visible_error(&self) -> Option<&ClientError> {
        match &self.transcript {
            Some(transcript) => transcript.error.as_ref(),
            None => self.session.last_error.as_ref(),
        }
    }
}
