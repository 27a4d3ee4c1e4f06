use crate::providers::{Email, EventRequest};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DraftMode {
    #[default]
    Idle,
    Drafting,
    /// Waiting for the user to answer `pending_question`
    AwaitingAnswer,
    /// `draft_text` is set and waiting for send / revise / discard
    AwaitingReview,
    /// Waiting for the requested change
    Revising,
}

/// An in-progress reply draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftState {
    pub mode: DraftMode,
    pub draft_text: Option<String>,
    /// Id of the email being replied to
    pub subject_context: Option<String>,
    /// Answers gathered for clarifying questions, by question key
    pub knowledge: BTreeMap<String, String>,
    /// Key and text of the question the user was asked
    pub pending_question: Option<(String, String)>,
}

impl DraftState {
    pub fn is_live(&self) -> bool {
        self.mode != DraftMode::Idle
    }

    /// `AwaitingReview` always carries draft text; `AwaitingAnswer` always a question.
    pub fn is_consistent(&self) -> bool {
        match self.mode {
            DraftMode::AwaitingReview | DraftMode::Revising => self
                .draft_text
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty()),
            DraftMode::AwaitingAnswer => self.pending_question.is_some(),
            DraftMode::Idle | DraftMode::Drafting => true,
        }
    }
}

/// A synthesized calendar command awaiting yes/no.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    /// The `/calendar add ...` line shown to the user
    pub command: String,
    pub request: EventRequest,
}

/// Everything the assistant remembers about one conversation between turns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub draft: DraftState,
    pub pending: Option<PendingConfirmation>,
    /// Email most recently read
    pub email_context: Option<Email>,
    /// Result of the last `/email list`, for read-by-number
    pub last_listing: Vec<Email>,
}
