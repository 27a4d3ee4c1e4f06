//! Natural-language calendar intent.

use regex::Regex;
use std::sync::LazyLock;

const CALENDAR_KEYWORDS: &[&str] = &[
    "calendar",
    "schedule",
    "scheduled",
    "meeting",
    "meetings",
    "appointment",
    "appointments",
    "event",
    "events",
    "busy",
    "free",
    "remind",
];

const TIME_WORDS: &[&str] = &[
    "today",
    "tomorrow",
    "tonight",
    "morning",
    "afternoon",
    "evening",
    "noon",
    "midnight",
    "week",
    "weekend",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const QUERY_WORDS: &[&str] = &["what", "when", "show", "list", "upcoming", "any", "check"];

const QUERY_PHRASES: &[&str] = &["do i have", "am i", "is there", "are there"];

static CLOCK_TIME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}(:\d{2})?\s*(am|pm)\b|\b\d{1,2}:\d{2}\b").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarIntent {
    /// Asking what is on the calendar
    Query,
    /// Asking to put something on it
    Create,
}

fn words(lower: &str) -> Vec<&str> {
    lower
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .collect()
}

/// A calendar keyword together with a time indicator.
///
/// Expects lowercase input.
pub fn detect_calendar(lower: &str) -> Option<CalendarIntent> {
    let words = words(lower);
    let has_keyword = words.iter().any(|w| CALENDAR_KEYWORDS.contains(w));
    let has_time = words.iter().any(|w| TIME_WORDS.contains(w))
        || CLOCK_TIME.as_ref().is_some_and(|re| re.is_match(lower));
    if !(has_keyword && has_time) {
        return None;
    }

    let is_query = words.first().is_some_and(|w| QUERY_WORDS.contains(w))
        || QUERY_PHRASES.iter().any(|p| lower.contains(p))
        || lower.trim_end().ends_with('?');
    Some(if is_query {
        CalendarIntent::Query
    } else {
        CalendarIntent::Create
    })
}

/// Prompt asking the model to turn a request into one `/calendar add` line.
pub fn calendar_command_prompt(message: &str, now: &str) -> String {
    format!(
        "Convert this request into a single calendar command.\n\
         The current date and time is {now}.\n\n\
         Use exactly this format, with every value in double quotes:\n\
         /calendar add \"title\" \"start time\" [\"end time\"] [\"description\"] [\"location\"] [--recurring daily|weekly|monthly|yearly]\n\n\
         Times may be written like \"tomorrow 3pm\", \"next friday at 10:30\" or \"2025-03-14 15:00\".\n\
         Reply with the command only.\n\n\
         Request: {message}"
    )
}

/// The first `/calendar add` line in a model reply.
pub fn extract_command_line(reply: &str) -> Option<&str> {
    reply
        .lines()
        .map(|line| line.trim().trim_matches('`').trim())
        .find(|line| line.to_lowercase().starts_with("/calendar add"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_and_time_make_create() {
        assert_eq!(
            detect_calendar("schedule a dentist appointment tomorrow at 3pm"),
            Some(CalendarIntent::Create)
        );
    }

    #[test]
    fn questions_are_queries() {
        assert_eq!(
            detect_calendar("what meetings do i have today"),
            Some(CalendarIntent::Query)
        );
        assert_eq!(
            detect_calendar("am i free friday afternoon?"),
            Some(CalendarIntent::Query)
        );
    }

    #[test]
    fn keyword_without_time_is_not_intent() {
        assert_eq!(detect_calendar("that meeting was long"), None);
        assert_eq!(detect_calendar("see you tomorrow"), None);
    }

    #[test]
    fn clock_time_counts_as_indicator() {
        assert!(detect_calendar("meeting with sam 14:30").is_some());
        assert!(detect_calendar("meeting at 9 am").is_some());
    }

    #[test]
    fn extracts_command_from_chatty_reply() {
        let reply = "Sure! Here you go:\n`/calendar add \"Dentist\" \"tomorrow 3pm\"`\nAnything else?";
        assert_eq!(
            extract_command_line(reply),
            Some("/calendar add \"Dentist\" \"tomorrow 3pm\"")
        );
        assert_eq!(extract_command_line("I can't help with that"), None);
    }
}
