//! Entry point for every inbound message.

mod chat;
mod handlers;
pub mod intent;
pub mod precedence;

pub use precedence::{Inbound, Route, classify};

use crate::config::{AssistantConfig, Config, ProvidersConfig};
use crate::dialogue::{Drafter, QuestionRule, SessionRegistry};
use crate::error::{ProviderErrorKind, StewardError};
use crate::files::FileBrowser;
use crate::memory::{FileContext, MemoryManager};
use crate::providers::{CalendarProvider, EmailProvider, LanguageModel, NaturalTimeParser};
use crate::todos::TodoManager;
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// External collaborators the assistant talks to.
#[derive(Clone)]
pub struct Providers {
    pub email: Arc<dyn EmailProvider>,
    pub calendar: Arc<dyn CalendarProvider>,
    pub llm: Arc<dyn LanguageModel>,
}

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// The assistant: memory, todos, dialogue sessions and providers behind
/// one message entry point.
pub struct Assistant {
    memory: MemoryManager,
    todos: TodoManager,
    sessions: SessionRegistry,
    providers: Providers,
    files: FileBrowser,
    time: NaturalTimeParser,
    rules: Vec<QuestionRule>,
    assistant: AssistantConfig,
    limits: ProvidersConfig,
    llm_timeout: Duration,
    clock: Clock,
}

impl Assistant {
    pub fn new(config: &Config, memory: MemoryManager, providers: Providers) -> Self {
        Self {
            todos: TodoManager::new(Arc::clone(memory.store())),
            memory,
            sessions: SessionRegistry::new(),
            providers,
            files: FileBrowser::from_config(&config.files),
            time: NaturalTimeParser::new(),
            rules: config.dialogue.rules.clone(),
            assistant: config.assistant.clone(),
            limits: config.providers.clone(),
            llm_timeout: config.llm.timeout(),
            clock: Arc::new(|| chrono::Local::now().naive_local()),
        }
    }

    /// Replace the wall clock used for relative times.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    fn drafter<'a>(&'a self, cancel: &'a CancellationToken) -> Drafter<'a> {
        Drafter {
            memory: &self.memory,
            model: self.providers.llm.as_ref(),
            email: self.providers.email.as_ref(),
            rules: &self.rules,
            llm_timeout: self.llm_timeout,
            email_timeout: self.limits.email_timeout(),
            cancel,
        }
    }

    /// Handle one message for `session_id` and return the reply text.
    ///
    /// Messages for the same session are processed one at a time.
    pub async fn handle(
        &self,
        session_id: &str,
        message: &str,
        file: Option<&FileContext>,
        cancel: &CancellationToken,
    ) -> String {
        let input = Inbound::new(message);
        let session = self.sessions.get_or_create(session_id).await;
        let mut state = session.lock().await;

        let route = classify(&state, &input);
        tracing::debug!(session_id, %route, "routing message");

        match route {
            Route::Review => self.on_review(&mut state, &input, cancel).await,
            Route::Revising => self.on_revising(&mut state, &input, cancel).await,
            Route::PendingAnswer => self.on_answer(&mut state, &input, cancel).await,
            Route::DraftStart => self.on_draft_start(&mut state, cancel).await,
            Route::Confirmation => self.on_confirmation(&mut state, &input, cancel).await,
            Route::SlashCommand => match input.command.clone() {
                Some(command) => self.on_command(&mut state, command, cancel).await,
                None => self.chat(&input.text, file, cancel).await,
            },
            Route::CalendarIntent => self.on_calendar_intent(&mut state, &input, cancel).await,
            Route::Chat => self.chat(&input.text, file, cancel).await,
        }
    }

    /// `handle` with a fresh cancellation token and no file context.
    pub async fn respond(&self, session_id: &str, message: &str) -> String {
        self.handle(session_id, message, None, &CancellationToken::new())
            .await
    }
}

/// Short user-facing text for a failed operation.
pub(crate) fn failure_message(action: &str, error: &StewardError) -> String {
    match error {
        StewardError::ExternalProvider(e) => match &e.kind {
            ProviderErrorKind::Timeout => format!("Sorry, {action} timed out. Please try again."),
            ProviderErrorKind::Cancelled => format!("Request cancelled while {action}."),
            ProviderErrorKind::Failed(reason) => format!("Sorry, {action} failed: {reason}"),
        },
        StewardError::UnparsableTime(input) => format!(
            "Could not understand the time \"{input}\". Try forms like \"tomorrow 3pm\", \"next friday at 10:30\" or \"2025-03-14 15:00\"."
        ),
        StewardError::InvalidRecurrence(input) => format!(
            "Invalid recurrence \"{input}\". Use daily, weekly, monthly or yearly."
        ),
        StewardError::NoActiveContext => {
            "Please read an email first using /email read <email_id>".to_string()
        }
        StewardError::DraftInProgress => {
            "A draft is already in progress. Send, revise or discard it first.".to_string()
        }
        other => format!("Sorry, {action} failed: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;

    #[test]
    fn timeout_names_the_action() {
        let err = StewardError::from(ProviderError::new(
            "email.reply",
            ProviderErrorKind::Timeout,
        ));
        assert_eq!(
            failure_message("sending the reply", &err),
            "Sorry, sending the reply timed out. Please try again."
        );
    }

    #[test]
    fn unparsable_time_quotes_input() {
        let msg = failure_message(
            "creating the event",
            &StewardError::UnparsableTime("someday".into()),
        );
        assert!(msg.contains("\"someday\""));
    }
}
