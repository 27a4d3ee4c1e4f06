use crate::error::StewardError;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    /// RFC 5545 recurrence rule.
    pub fn rrule(self) -> &'static str {
        match self {
            Self::Daily => "RRULE:FREQ=DAILY",
            Self::Weekly => "RRULE:FREQ=WEEKLY",
            Self::Monthly => "RRULE:FREQ=MONTHLY",
            Self::Yearly => "RRULE:FREQ=YEARLY",
        }
    }

    pub fn parse(value: &str) -> Result<Self, StewardError> {
        Self::from_str(value.trim()).map_err(|_| StewardError::InvalidRecurrence(value.to_string()))
    }
}

/// Parameters of an event to create; times are wall-clock in `timezone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRequest {
    pub summary: String,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub recurrence: Option<Recurrence>,
    pub timezone: String,
}

impl EventRequest {
    /// End time, one hour after start when not given.
    pub fn effective_end(&self) -> NaiveDateTime {
        self.end.unwrap_or(self.start + Duration::hours(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub summary: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Event {
    pub fn listing_line(&self) -> String {
        let mut line = format!(
            "- {}: {} to {}",
            self.summary,
            self.start.format("%a %b %d, %Y %I:%M %p"),
            self.end.format("%I:%M %p")
        );
        if let Some(location) = &self.location {
            line.push_str(&format!(" @ {location}"));
        }
        line
    }
}

/// Calendar operations the assistant relies on.
pub trait CalendarProvider: Send + Sync {
    /// Returns the id of the created event.
    fn create_event<'a>(
        &'a self,
        request: &'a EventRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;

    fn list_upcoming<'a>(
        &'a self,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Event>>> + Send + 'a>>;
}
