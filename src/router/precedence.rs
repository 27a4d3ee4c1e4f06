//! Which branch handles an inbound message.
//!
//! The branches are tried in table order; the first predicate that holds
//! wins. Each predicate only reads the session, never mutates it.

use super::intent;
use crate::commands::{Command, EmailCommand, parse_command};
use crate::dialogue::{DraftMode, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Route {
    /// send / revise / discard, or a question about the draft under review
    Review,
    /// The requested change for a draft being revised
    Revising,
    /// Answer to the pending clarifying question
    PendingAnswer,
    DraftStart,
    /// yes / no for a pending calendar event
    Confirmation,
    SlashCommand,
    CalendarIntent,
    Chat,
}

/// An inbound message, parsed once.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub text: String,
    pub lower: String,
    pub command: Option<Command>,
}

impl Inbound {
    pub fn new(message: &str) -> Self {
        let text = message.trim().to_string();
        Self {
            lower: text.to_lowercase(),
            command: parse_command(&text),
            text,
        }
    }

    pub fn is_slash(&self) -> bool {
        self.command.is_some()
    }
}

/// A draft-review verb given either bare or as `/email ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewVerb {
    Send,
    Discard,
    Revise(Option<String>),
}

pub fn review_verb(input: &Inbound) -> Option<ReviewVerb> {
    match &input.command {
        Some(Command::Email(EmailCommand::Send)) => return Some(ReviewVerb::Send),
        Some(Command::Email(EmailCommand::Discard)) => return Some(ReviewVerb::Discard),
        Some(Command::Email(EmailCommand::Revise { request })) => {
            return Some(ReviewVerb::Revise(request.clone()));
        }
        Some(_) => return None,
        None => {}
    }
    match input.lower.as_str() {
        "send" => Some(ReviewVerb::Send),
        "discard" => Some(ReviewVerb::Discard),
        "revise" => Some(ReviewVerb::Revise(None)),
        _ => input
            .lower
            .starts_with("revise ")
            .then(|| ReviewVerb::Revise(Some(input.text["revise ".len()..].trim().to_string()))),
    }
}

pub fn is_confirmation_reply(lower: &str) -> Option<bool> {
    match lower.trim_end_matches(['.', '!']) {
        "yes" | "y" => Some(true),
        "no" | "n" => Some(false),
        _ => None,
    }
}

fn in_review(state: &SessionState, input: &Inbound) -> bool {
    state.draft.mode == DraftMode::AwaitingReview
        && (review_verb(input).is_some() || !input.is_slash())
}

fn in_revision(state: &SessionState, input: &Inbound) -> bool {
    state.draft.mode == DraftMode::Revising && (review_verb(input).is_some() || !input.is_slash())
}

fn answers_question(state: &SessionState, input: &Inbound) -> bool {
    state.draft.mode == DraftMode::AwaitingAnswer
        && (matches!(
            input.command,
            Some(Command::Email(EmailCommand::Answer { .. }))
        ) || !input.is_slash())
}

fn starts_draft(_: &SessionState, input: &Inbound) -> bool {
    matches!(input.command, Some(Command::Email(EmailCommand::DraftReply)))
        || input.lower == "draft reply"
}

fn confirms_pending(state: &SessionState, input: &Inbound) -> bool {
    state.pending.is_some() && is_confirmation_reply(&input.lower).is_some()
}

fn is_command(_: &SessionState, input: &Inbound) -> bool {
    input.is_slash()
}

fn mentions_calendar(_: &SessionState, input: &Inbound) -> bool {
    intent::detect_calendar(&input.lower).is_some()
}

fn always(_: &SessionState, _: &Inbound) -> bool {
    true
}

type Predicate = fn(&SessionState, &Inbound) -> bool;

pub const PRECEDENCE: &[(Route, Predicate)] = &[
    (Route::Review, in_review),
    (Route::Revising, in_revision),
    (Route::PendingAnswer, answers_question),
    (Route::DraftStart, starts_draft),
    (Route::Confirmation, confirms_pending),
    (Route::SlashCommand, is_command),
    (Route::CalendarIntent, mentions_calendar),
    (Route::Chat, always),
];

pub fn classify(state: &SessionState, input: &Inbound) -> Route {
    PRECEDENCE
        .iter()
        .find(|(_, applies)| applies(state, input))
        .map_or(Route::Chat, |(route, _)| *route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::PendingConfirmation;
    use crate::providers::EventRequest;
    use chrono::NaiveDate;

    fn state(mode: DraftMode) -> SessionState {
        let mut state = SessionState::default();
        state.draft.mode = mode;
        if mode == DraftMode::AwaitingReview {
            state.draft.draft_text = Some("Hi".into());
        }
        state
    }

    fn pending() -> SessionState {
        SessionState {
            pending: Some(PendingConfirmation {
                command: "/calendar add \"Lunch\" \"tomorrow noon\"".into(),
                request: EventRequest {
                    summary: "Lunch".into(),
                    start: NaiveDate::from_ymd_opt(2025, 3, 13)
                        .unwrap()
                        .and_hms_opt(12, 0, 0)
                        .unwrap(),
                    end: None,
                    description: None,
                    location: None,
                    recurrence: None,
                    timezone: "UTC".into(),
                },
            }),
            ..SessionState::default()
        }
    }

    fn route(state: &SessionState, message: &str) -> Route {
        classify(state, &Inbound::new(message))
    }

    #[test]
    fn review_mode_captures_verbs_and_questions() {
        let s = state(DraftMode::AwaitingReview);
        assert_eq!(route(&s, "send"), Route::Review);
        assert_eq!(route(&s, "/email discard"), Route::Review);
        assert_eq!(route(&s, "is this too formal?"), Route::Review);
        assert_eq!(route(&s, "/todo list"), Route::SlashCommand);
    }

    #[test]
    fn revising_takes_free_text() {
        let s = state(DraftMode::Revising);
        assert_eq!(route(&s, "make it friendlier"), Route::Revising);
        assert_eq!(route(&s, "/listfacts"), Route::SlashCommand);
    }

    #[test]
    fn pending_answer_takes_answer_command_and_text() {
        let s = state(DraftMode::AwaitingAnswer);
        assert_eq!(route(&s, "/email answer \"Tue 2-4\""), Route::PendingAnswer);
        assert_eq!(route(&s, "Tuesdays 2-4pm"), Route::PendingAnswer);
        assert_eq!(route(&s, "/email list"), Route::SlashCommand);
    }

    #[test]
    fn draft_start_bare_or_slash() {
        let s = SessionState::default();
        assert_eq!(route(&s, "/email draft reply"), Route::DraftStart);
        assert_eq!(route(&s, "draft reply"), Route::DraftStart);
    }

    #[test]
    fn confirmation_only_with_pending() {
        assert_eq!(route(&pending(), "yes"), Route::Confirmation);
        assert_eq!(route(&pending(), "N"), Route::Confirmation);
        assert_eq!(route(&SessionState::default(), "yes"), Route::Chat);
    }

    #[test]
    fn calendar_intent_before_chat() {
        let s = SessionState::default();
        assert_eq!(
            route(&s, "schedule a meeting with Dana tomorrow at 3pm"),
            Route::CalendarIntent
        );
        assert_eq!(route(&s, "tell me a joke"), Route::Chat);
    }

    #[test]
    fn review_verb_keeps_revision_text_case() {
        let input = Inbound::new("revise Make It Shorter");
        assert_eq!(
            review_verb(&input),
            Some(ReviewVerb::Revise(Some("Make It Shorter".into())))
        );
    }
}
