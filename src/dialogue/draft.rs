//! Reply-drafting state machine.
//!
//! Every transition works on a copy of the session and commits it only
//! when the transition succeeds, so a failed external call leaves the
//! session exactly as it was.

use super::rules::{QuestionRule, next_question};
use super::state::{DraftMode, DraftState, SessionState};
use crate::error::{ProviderError, StewardError};
use crate::memory::MemoryManager;
use crate::providers::{Email, EmailProvider, LanguageModel, guarded};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const REVISE_PROMPT: &str = "What changes would you like to make to the draft?\n\n\
Please respond with: /email revise \"your requested changes\"";

pub const DISCARDED: &str = "Draft discarded. Read an email and use /email draft reply to start over.";

pub const SENT: &str = "Reply sent successfully!";

/// Outcome of `/email answer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The answer was recorded; the text is the next question or the draft for review
    Answered(String),
    /// No question was pending, nothing changed
    NoPendingQuestion,
}

/// Collaborators a draft transition needs.
pub struct Drafter<'a> {
    pub memory: &'a MemoryManager,
    pub model: &'a dyn LanguageModel,
    pub email: &'a dyn EmailProvider,
    pub rules: &'a [QuestionRule],
    pub llm_timeout: Duration,
    pub email_timeout: Duration,
    pub cancel: &'a CancellationToken,
}

impl Drafter<'_> {
    /// Begin drafting a reply to the email in context.
    ///
    /// Rejects a second draft while one is live.
    pub async fn start(&self, session: &mut SessionState) -> Result<String, StewardError> {
        if session.draft.is_live() {
            return Err(StewardError::DraftInProgress);
        }
        let Some(email) = session.email_context.clone() else {
            return Err(StewardError::NoActiveContext);
        };

        let mut next = session.clone();
        next.draft = DraftState {
            mode: DraftMode::Drafting,
            subject_context: Some(email.id.clone()),
            knowledge: self.memory.knowledge().await,
            ..DraftState::default()
        };
        let reply = self.advance(&mut next.draft, &email).await?;
        commit(session, next);
        Ok(reply)
    }

    /// Record the answer to the pending question and continue drafting.
    pub async fn answer(
        &self,
        session: &mut SessionState,
        answer: &str,
    ) -> Result<AnswerOutcome, StewardError> {
        if session.draft.mode != DraftMode::AwaitingAnswer {
            return Ok(AnswerOutcome::NoPendingQuestion);
        }
        let (Some((key, _)), Some(email)) = (
            session.draft.pending_question.clone(),
            session.email_context.clone(),
        ) else {
            return Ok(AnswerOutcome::NoPendingQuestion);
        };

        let mut next = session.clone();
        let answer = answer.trim().to_string();
        next.draft.knowledge.insert(key.clone(), answer.clone());
        next.draft.pending_question = None;
        next.draft.mode = DraftMode::Drafting;

        let reply = self.advance(&mut next.draft, &email).await?;
        // persisted only once the draft has moved on
        if !self.memory.remember_knowledge(&key, &answer).await {
            tracing::warn!(%key, "answer kept for this draft only");
        }
        commit(session, next);
        Ok(AnswerOutcome::Answered(reply))
    }

    /// Send the reviewed draft as the reply; clears the draft and context.
    pub async fn send(&self, session: &mut SessionState) -> Result<String, StewardError> {
        let (DraftMode::AwaitingReview, Some(draft), Some(email)) = (
            session.draft.mode,
            session.draft.draft_text.as_deref(),
            session.email_context.as_ref(),
        ) else {
            return Err(StewardError::NoActiveContext);
        };

        let accepted = guarded(
            "email.reply",
            self.email_timeout,
            self.cancel,
            self.email.reply(&email.id, draft),
        )
        .await?;
        if !accepted {
            return Err(ProviderError::failed("email.reply", "reply was not accepted").into());
        }

        tracing::info!(email_id = %email.id, "reply sent");
        session.draft = DraftState::default();
        session.email_context = None;
        Ok(SENT.to_string())
    }

    /// Revise the draft.
    ///
    /// Without a request this only asks what to change; with one the draft
    /// is regenerated and returned for review.
    pub async fn revise(
        &self,
        session: &mut SessionState,
        request: Option<&str>,
    ) -> Result<String, StewardError> {
        if !matches!(
            session.draft.mode,
            DraftMode::AwaitingReview | DraftMode::Revising
        ) {
            return Err(StewardError::NoActiveContext);
        }
        let request = request.map(str::trim).filter(|r| !r.is_empty());
        let Some(request) = request else {
            session.draft.mode = DraftMode::Revising;
            return Ok(REVISE_PROMPT.to_string());
        };
        let Some(current) = session.draft.draft_text.clone() else {
            return Err(StewardError::NoActiveContext);
        };

        let mut next = session.clone();
        next.draft.mode = DraftMode::Drafting;
        let prompt = revision_prompt(&current, request);
        let revised = self.generate(&prompt).await?;
        next.draft.draft_text = Some(revised.clone());
        next.draft.mode = DraftMode::AwaitingReview;
        commit(session, next);
        Ok(review_text(&revised))
    }

    /// Drop the draft and the email it answered.
    pub fn discard(&self, session: &mut SessionState) -> Result<String, StewardError> {
        if !session.draft.is_live() {
            return Err(StewardError::NoActiveContext);
        }
        session.draft = DraftState::default();
        session.email_context = None;
        Ok(DISCARDED.to_string())
    }

    /// Answer a free-form question about the draft under review.
    pub async fn ask_about_draft(
        &self,
        session: &SessionState,
        question: &str,
    ) -> Result<String, StewardError> {
        let Some(draft) = session.draft.draft_text.as_deref() else {
            return Err(StewardError::NoActiveContext);
        };
        let prompt = format!(
            "Here is an email reply draft:\n\n{draft}\n\nAnswer this question about it:\n{question}"
        );
        self.generate(&prompt).await
    }

    /// Ask the next clarifying question, or synthesize the draft.
    async fn advance(&self, draft: &mut DraftState, email: &Email) -> Result<String, StewardError> {
        if let Some(rule) = next_question(self.rules, &email.subject, &draft.knowledge) {
            tracing::debug!(key = %rule.key, "asking clarifying question");
            draft.pending_question = Some((rule.key.clone(), rule.question.clone()));
            draft.mode = DraftMode::AwaitingAnswer;
            return Ok(question_text(&rule.question));
        }

        let text = self.generate(&draft_prompt(email, &draft.knowledge)).await?;
        draft.draft_text = Some(text.clone());
        draft.pending_question = None;
        draft.mode = DraftMode::AwaitingReview;
        Ok(review_text(&text))
    }

    async fn generate(&self, prompt: &str) -> Result<String, StewardError> {
        let text = guarded(
            "llm.generate",
            self.llm_timeout,
            self.cancel,
            self.model.generate(prompt),
        )
        .await?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(ProviderError::failed("llm.generate", "empty response").into());
        }
        Ok(text)
    }
}

fn commit(session: &mut SessionState, next: SessionState) {
    debug_assert!(next.draft.is_consistent());
    if session.draft.mode != next.draft.mode {
        tracing::debug!(from = %session.draft.mode, to = %next.draft.mode, "draft transition");
    }
    *session = next;
}

pub fn question_text(question: &str) -> String {
    format!(
        "To help draft a better reply, could you tell me: {question}\n\n\
         Please respond with: /email answer \"your response\""
    )
}

pub fn review_text(draft: &str) -> String {
    format!(
        "Here's the drafted reply:\n\n{draft}\n\n\
         What would you like to do?\n\
         1. /email send - Send this reply\n\
         2. /email revise \"your requested changes\" - Make changes to the draft\n\
         3. /email discard - Discard this draft\n\n\
         Or ask any questions about the draft."
    )
}

pub fn draft_prompt(email: &Email, knowledge: &BTreeMap<String, String>) -> String {
    let context = if knowledge.is_empty() {
        "No additional context available.".to_string()
    } else {
        knowledge
            .iter()
            .map(|(key, value)| format!("- {key}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "Please help draft a professional reply to this email:\n\n\
         From: {}\nSubject: {}\nContent: {}\n\n\
         Additional Context:\n{context}\n\n\
         The reply should:\n\
         1. Address all questions/points in the original email\n\
         2. Maintain a professional tone\n\
         3. Be clear and concise\n\
         4. Include a proper greeting and signature\n\
         5. Use the additional context provided when relevant",
        email.from, email.subject, email.body
    )
}

fn revision_prompt(draft: &str, request: &str) -> String {
    format!(
        "Please revise this email draft:\n\n{draft}\n\n\
         Requested changes:\n{request}\n\n\
         Please maintain the professional tone and ensure all original points are still addressed."
    )
}
