use super::intent::{self, CalendarIntent};
use super::precedence::{Inbound, ReviewVerb, is_confirmation_reply, review_verb};
use super::{Assistant, failure_message};
use crate::commands::help::{HELP, malformed_hint, unknown_hint};
use crate::commands::{
    CalendarAddArgs, Command, EmailCommand, EmailTarget, FileCommand, TodoAddArgs, parse_command,
};
use crate::dialogue::{AnswerOutcome, PendingConfirmation, SessionState};
use crate::error::StewardError;
use crate::memory::{FactInsert, FactSource, InteractionKind, ReferenceItem, ReferenceSource};
use crate::providers::{Email, EventRequest, Recurrence, guarded};
use crate::todos::{NewTodo, format_todo};
use tokio_util::sync::CancellationToken;

const NO_DRAFT_TO_SEND: &str = "No draft available to send.";
const NO_DRAFT_TO_REVISE: &str = "No draft available to revise.";
const NO_DRAFT_TO_DISCARD: &str = "No draft to discard.";
const NO_PENDING_QUESTION: &str = "There is no question waiting for an answer.";

fn draft_failure(action: &str, fallback: &str, error: &StewardError) -> String {
    match error {
        StewardError::NoActiveContext => fallback.to_string(),
        other => failure_message(action, other),
    }
}

impl Assistant {
    // ── Draft dialogue ───────────────────────────────────────

    async fn apply_review_verb(
        &self,
        state: &mut SessionState,
        verb: ReviewVerb,
        cancel: &CancellationToken,
    ) -> String {
        let drafter = self.drafter(cancel);
        match verb {
            ReviewVerb::Send => drafter
                .send(state)
                .await
                .unwrap_or_else(|e| draft_failure("sending the reply", NO_DRAFT_TO_SEND, &e)),
            ReviewVerb::Revise(request) => drafter
                .revise(state, request.as_deref())
                .await
                .unwrap_or_else(|e| draft_failure("revising the draft", NO_DRAFT_TO_REVISE, &e)),
            ReviewVerb::Discard => drafter
                .discard(state)
                .unwrap_or_else(|e| draft_failure("discarding the draft", NO_DRAFT_TO_DISCARD, &e)),
        }
    }

    pub(super) async fn on_review(
        &self,
        state: &mut SessionState,
        input: &Inbound,
        cancel: &CancellationToken,
    ) -> String {
        if let Some(verb) = review_verb(input) {
            return self.apply_review_verb(state, verb, cancel).await;
        }
        self.drafter(cancel)
            .ask_about_draft(state, &input.text)
            .await
            .unwrap_or_else(|e| failure_message("answering your question", &e))
    }

    pub(super) async fn on_revising(
        &self,
        state: &mut SessionState,
        input: &Inbound,
        cancel: &CancellationToken,
    ) -> String {
        let verb = review_verb(input).unwrap_or_else(|| ReviewVerb::Revise(Some(input.text.clone())));
        self.apply_review_verb(state, verb, cancel).await
    }

    pub(super) async fn on_answer(
        &self,
        state: &mut SessionState,
        input: &Inbound,
        cancel: &CancellationToken,
    ) -> String {
        let answer = match &input.command {
            Some(Command::Email(EmailCommand::Answer { text })) => text.clone(),
            _ => input.text.clone(),
        };
        match self.drafter(cancel).answer(state, &answer).await {
            Ok(AnswerOutcome::Answered(reply)) => reply,
            Ok(AnswerOutcome::NoPendingQuestion) => NO_PENDING_QUESTION.to_string(),
            Err(e) => failure_message("drafting the reply", &e),
        }
    }

    pub(super) async fn on_draft_start(
        &self,
        state: &mut SessionState,
        cancel: &CancellationToken,
    ) -> String {
        self.drafter(cancel)
            .start(state)
            .await
            .unwrap_or_else(|e| failure_message("drafting the reply", &e))
    }

    // ── Calendar confirmation ────────────────────────────────

    pub(super) async fn on_confirmation(
        &self,
        state: &mut SessionState,
        input: &Inbound,
        cancel: &CancellationToken,
    ) -> String {
        let Some(pending) = state.pending.take() else {
            return NO_PENDING_QUESTION.to_string();
        };
        if is_confirmation_reply(&input.lower) != Some(true) {
            tracing::debug!(command = %pending.command, "calendar event declined");
            return "Okay, I won't create that event.".to_string();
        }
        self.create_event(&pending.request, cancel).await
    }

    async fn create_event(&self, request: &EventRequest, cancel: &CancellationToken) -> String {
        let created = guarded(
            "calendar.create_event",
            self.limits.calendar_timeout(),
            cancel,
            self.providers.calendar.create_event(request),
        )
        .await;
        match created {
            Ok(id) => {
                tracing::info!(event_id = %id, summary = %request.summary, "calendar event created");
                let recurrence = request
                    .recurrence
                    .map(|r| format!(" ({r})"))
                    .unwrap_or_default();
                format!(
                    "Created calendar event: {}{recurrence} (ID: {id})",
                    request.summary
                )
            }
            Err(e) => failure_message("creating the event", &StewardError::from(e)),
        }
    }

    fn event_request(&self, args: &CalendarAddArgs) -> Result<EventRequest, StewardError> {
        let now = self.now();
        let start = self.time.parse(&args.start, now)?;
        // a bare end time like "10am" belongs to the start's day
        let end = match &args.end {
            Some(text) => {
                let end = self.time.parse(text, now)?;
                Some(if end > start { end } else { self.time.parse(text, start)? })
            }
            None => None,
        };
        let recurrence = args
            .recurrence
            .as_deref()
            .map(Recurrence::parse)
            .transpose()?;
        Ok(EventRequest {
            summary: args.summary.clone(),
            start,
            end,
            description: args.description.clone(),
            location: args.location.clone(),
            recurrence,
            timezone: self.assistant.timezone.clone(),
        })
    }

    // ── Natural-language calendar ────────────────────────────

    pub(super) async fn on_calendar_intent(
        &self,
        state: &mut SessionState,
        input: &Inbound,
        cancel: &CancellationToken,
    ) -> String {
        let reply = match intent::detect_calendar(&input.lower) {
            Some(CalendarIntent::Query) => self.list_events(None, cancel).await,
            _ => self.propose_event(state, input, cancel).await,
        };
        self.memory
            .record_turn(&input.text, &reply, Some(InteractionKind::Calendar))
            .await;
        reply
    }

    async fn propose_event(
        &self,
        state: &mut SessionState,
        input: &Inbound,
        cancel: &CancellationToken,
    ) -> String {
        let now = self.now().format("%A, %Y-%m-%d %H:%M").to_string();
        let prompt = intent::calendar_command_prompt(&input.text, &now);
        let reply = match guarded(
            "llm.generate",
            self.llm_timeout,
            cancel,
            self.providers.llm.generate(&prompt),
        )
        .await
        {
            Ok(reply) => reply,
            Err(e) => return failure_message("understanding the event", &StewardError::from(e)),
        };

        let Some(line) = intent::extract_command_line(&reply) else {
            tracing::debug!(%reply, "model reply had no calendar command");
            return "I couldn't work out the event details. Try /calendar add \"title\" \"start time\".".to_string();
        };
        let Some(Command::CalendarAdd(args)) = parse_command(line) else {
            return "I couldn't work out the event details. Try /calendar add \"title\" \"start time\".".to_string();
        };
        let request = match self.event_request(&args) {
            Ok(request) => request,
            Err(e) => return failure_message("understanding the event", &e),
        };

        let command = line.to_string();
        let reply = format!(
            "I'll create this event:\n{command}\n\n{} on {}\n\nShould I proceed? (yes/no)",
            request.summary,
            request.start.format("%a %b %d, %Y %I:%M %p")
        );
        state.pending = Some(PendingConfirmation { command, request });
        reply
    }

    async fn list_events(&self, limit: Option<usize>, cancel: &CancellationToken) -> String {
        let limit = limit.unwrap_or(self.limits.calendar_list_limit);
        let events = match guarded(
            "calendar.list_upcoming",
            self.limits.calendar_timeout(),
            cancel,
            self.providers.calendar.list_upcoming(limit),
        )
        .await
        {
            Ok(events) => events,
            Err(e) => return failure_message("listing events", &StewardError::from(e)),
        };
        if events.is_empty() {
            return "No upcoming events found.".to_string();
        }

        let mut lines = Vec::with_capacity(events.len());
        for event in &events {
            let line = event.listing_line();
            self.memory
                .cache_reference(&ReferenceItem::new(
                    ReferenceSource::CalendarEvent,
                    &event.id,
                    format!("Calendar event {line}"),
                ))
                .await;
            lines.push(line);
        }
        format!("Upcoming events:\n{}", lines.join("\n"))
    }

    // ── Slash commands ───────────────────────────────────────

    pub(super) async fn on_command(
        &self,
        state: &mut SessionState,
        command: Command,
        cancel: &CancellationToken,
    ) -> String {
        match command {
            Command::AddFact { text, category } => self.add_fact(&text, category.as_deref()).await,
            Command::ListFacts { category } => self.list_facts(category.as_deref()).await,
            Command::DeleteFact { id } => {
                if self.memory.delete_fact(&id).await {
                    format!("Deleted fact with ID: {id}")
                } else {
                    format!("Could not find fact with ID: {id}")
                }
            }
            Command::CalendarAdd(args) => match self.event_request(&args) {
                Ok(request) => self.create_event(&request, cancel).await,
                Err(e) => failure_message("creating the event", &e),
            },
            Command::CalendarList { limit } => self.list_events(limit, cancel).await,
            Command::TodoAdd(args) => self.add_todo(args).await,
            Command::TodoList { category, priority } => {
                let todos = self.todos.list(category.as_deref(), priority).await;
                if todos.is_empty() {
                    return "No todos found.".to_string();
                }
                let lines: Vec<_> = todos.iter().map(format_todo).collect();
                format!("Todo List:\n{}", lines.join("\n"))
            }
            Command::TodoDone { id } => match self.todos.complete(&id).await {
                Some(_) => format!("Marked todo {id} as completed"),
                None => format!("Could not find todo with ID: {id}"),
            },
            Command::TodoDelete { id } => {
                if self.todos.delete(&id).await {
                    format!("Deleted todo {id}")
                } else {
                    format!("Could not find todo with ID: {id}")
                }
            }
            Command::Email(email) => self.on_email(state, email, cancel).await,
            Command::File(file) => self.on_file(file).await,
            Command::Help => HELP.to_string(),
            Command::Malformed { usage } => malformed_hint(usage),
            Command::Unknown { name } => {
                let error = StewardError::UnknownCommand(name.clone());
                tracing::debug!(%error, "unrecognised slash command");
                unknown_hint(&name)
            }
        }
    }

    async fn add_fact(&self, text: &str, category: Option<&str>) -> String {
        let inserted = self
            .memory
            .add_long_term_fact(text, category.unwrap_or("general"), FactSource::Explicit)
            .await;
        match (inserted, category) {
            (FactInsert::Added(fact), Some(category)) => {
                format!("Added fact to {category}: {} (ID: {})", fact.text, fact.id)
            }
            (FactInsert::Added(fact), None) => format!("Added fact: {} (ID: {})", fact.text, fact.id),
            (FactInsert::Exists(id), _) => format!("That fact is already stored (ID: {id})."),
            (FactInsert::Unavailable, _) => "Could not store the fact right now.".to_string(),
        }
    }

    async fn list_facts(&self, category: Option<&str>) -> String {
        let facts = self.memory.list_facts(category).await;
        if facts.is_empty() {
            return match category {
                Some(category) => format!("No facts found in category: {category}"),
                None => "No facts found.".to_string(),
            };
        }
        let lines: Vec<_> = facts
            .iter()
            .map(|f| format!("[{}] ({}) {}", f.id, f.category, f.text))
            .collect();
        format!("Stored facts:\n{}", lines.join("\n"))
    }

    async fn add_todo(&self, args: TodoAddArgs) -> String {
        let due_date = match args.due.as_deref() {
            Some(due) => match self.time.parse(due, self.now()) {
                Ok(due) => Some(due),
                Err(e) => return failure_message("adding the todo", &e),
            },
            None => None,
        };
        let task = args.task.clone();
        let added = self
            .todos
            .add(NewTodo {
                task: args.task,
                notes: args.notes,
                priority: args.priority.unwrap_or_default(),
                category: args.category,
                due_date,
            })
            .await;
        match added {
            Some(todo) => format!("Added todo: {task} (ID: {})", todo.id),
            None => "Could not save the todo right now.".to_string(),
        }
    }

    // ── Email ────────────────────────────────────────────────

    async fn resolve_email(
        &self,
        state: &SessionState,
        target: &EmailTarget,
        cancel: &CancellationToken,
    ) -> Result<Email, String> {
        let id = match target {
            EmailTarget::Number(n) => match n.checked_sub(1).and_then(|i| state.last_listing.get(i)) {
                Some(email) => email.id.clone(),
                None => {
                    return Err(
                        "Invalid email number. Please use /email list to see available emails."
                            .to_string(),
                    );
                }
            },
            EmailTarget::Id(id) => id.clone(),
        };
        match guarded(
            "email.get",
            self.limits.email_timeout(),
            cancel,
            self.providers.email.get(&id),
        )
        .await
        {
            Ok(Some(email)) => Ok(email),
            Ok(None) => Err(format!("Could not find email with ID {id}")),
            Err(e) => Err(failure_message("fetching the email", &StewardError::from(e))),
        }
    }

    async fn on_email(
        &self,
        state: &mut SessionState,
        command: EmailCommand,
        cancel: &CancellationToken,
    ) -> String {
        let timeout = self.limits.email_timeout();
        match command {
            EmailCommand::List { limit } => {
                let limit = limit.unwrap_or(self.limits.email_list_limit);
                let emails = match guarded(
                    "email.list_unread",
                    timeout,
                    cancel,
                    self.providers.email.list_unread(limit),
                )
                .await
                {
                    Ok(emails) => emails,
                    Err(e) => return failure_message("listing emails", &StewardError::from(e)),
                };
                if emails.is_empty() {
                    state.last_listing.clear();
                    return "No unread emails found.".to_string();
                }
                let lines: Vec<_> = emails
                    .iter()
                    .enumerate()
                    .map(|(i, email)| email.listing_line(i + 1))
                    .collect();
                state.last_listing = emails;
                format!(
                    "Unread emails:\n\n{}\n\nTo read an email, use either:\n/email read <number>\n/email read <email_id>",
                    lines.join("\n\n")
                )
            }
            EmailCommand::Read { target } => {
                if state.draft.is_live() {
                    return "A draft is already in progress. Send, revise or discard it first."
                        .to_string();
                }
                let email = match self.resolve_email(state, &target, cancel).await {
                    Ok(email) => email,
                    Err(message) => return message,
                };
                if let Err(error) =
                    guarded("email.mark_read", timeout, cancel, self.providers.email.mark_read(&email.id)).await
                {
                    tracing::warn!(email_id = %email.id, %error, "could not mark email read");
                }
                self.memory
                    .cache_reference(&ReferenceItem::new(
                        ReferenceSource::Email,
                        &email.id,
                        format!("Email from {} about \"{}\": {}", email.from, email.subject, email.snippet),
                    ))
                    .await;
                let reply = format!(
                    "{}\n\nTo draft a reply, use: /email draft reply",
                    email.detail()
                );
                state.email_context = Some(email);
                reply
            }
            EmailCommand::MarkRead { id } => {
                match guarded("email.mark_read", timeout, cancel, self.providers.email.mark_read(&id)).await {
                    Ok(true) => format!("Email {id} marked as read."),
                    Ok(false) => format!("Failed to mark email {id} as read."),
                    Err(e) => failure_message("marking the email read", &StewardError::from(e)),
                }
            }
            EmailCommand::Reply { id, body } => {
                match guarded("email.reply", timeout, cancel, self.providers.email.reply(&id, &body)).await {
                    Ok(true) => format!("Reply sent successfully to email {id}."),
                    Ok(false) => format!("Failed to send reply to email {id}."),
                    Err(e) => failure_message("sending the reply", &StewardError::from(e)),
                }
            }
            EmailCommand::DraftReply => self.on_draft_start(state, cancel).await,
            EmailCommand::Answer { text } => match self.drafter(cancel).answer(state, &text).await {
                Ok(AnswerOutcome::Answered(reply)) => reply,
                Ok(AnswerOutcome::NoPendingQuestion) => NO_PENDING_QUESTION.to_string(),
                Err(e) => failure_message("drafting the reply", &e),
            },
            EmailCommand::Send => self.apply_review_verb(state, ReviewVerb::Send, cancel).await,
            EmailCommand::Revise { request } => {
                self.apply_review_verb(state, ReviewVerb::Revise(request), cancel)
                    .await
            }
            EmailCommand::Discard => self.apply_review_verb(state, ReviewVerb::Discard, cancel).await,
            EmailCommand::Unsubscribe { target } => {
                let email = match self.resolve_email(state, &target, cancel).await {
                    Ok(email) => email,
                    Err(message) => return message,
                };
                match email.unsubscribe_link() {
                    Some(link) => format!("Unsubscribe link for \"{}\":\n{link}", email.subject),
                    None => format!("No unsubscribe link found in \"{}\".", email.subject),
                }
            }
        }
    }

    // ── Files ────────────────────────────────────────────────

    async fn on_file(&self, command: FileCommand) -> String {
        match command {
            FileCommand::List { path } => match self.files.list(path.as_deref()).await {
                Ok(entries) if entries.is_empty() => "No files found.".to_string(),
                Ok(entries) => entries
                    .iter()
                    .map(|e| e.listing_line())
                    .collect::<Vec<_>>()
                    .join("\n"),
                Err(e) => format!("Could not list {}: {e}", path.as_deref().unwrap_or("~")),
            },
            FileCommand::Read { path } => match self.files.read(&path).await {
                Ok(content) => format!("Contents of {path}:\n\n{content}"),
                Err(e) => format!("Could not read {path}: {e}"),
            },
            FileCommand::Search { query } => match self.files.search(&query).await {
                Ok(hits) if hits.is_empty() => format!("No files matching \"{query}\"."),
                Ok(hits) => {
                    let lines: Vec<_> = hits.iter().map(|e| e.listing_line()).collect();
                    format!("Files matching \"{query}\":\n{}", lines.join("\n"))
                }
                Err(e) => format!("Could not search for \"{query}\": {e}"),
            },
        }
    }
}
