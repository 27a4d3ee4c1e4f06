use super::calendar::{CalendarProvider, Event, EventRequest};
use super::email::{Email, EmailProvider};
use std::future::Future;
use std::pin::Pin;

/// Placeholder mailbox used until a real client is injected.
pub struct UnconfiguredEmail;

impl EmailProvider for UnconfiguredEmail {
    fn list_unread<'a>(
        &'a self,
        _limit: usize,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Email>>> + Send + 'a>> {
        Box::pin(async { anyhow::bail!("email provider not configured") })
    }

    fn get<'a>(
        &'a self,
        _id: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<Email>>> + Send + 'a>> {
        Box::pin(async { anyhow::bail!("email provider not configured") })
    }

    fn mark_read<'a>(
        &'a self,
        _id: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>> {
        Box::pin(async { anyhow::bail!("email provider not configured") })
    }

    fn reply<'a>(
        &'a self,
        _id: &'a str,
        _body: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>> {
        Box::pin(async { anyhow::bail!("email provider not configured") })
    }
}

/// Placeholder calendar used until a real client is injected.
pub struct UnconfiguredCalendar;

impl CalendarProvider for UnconfiguredCalendar {
    fn create_event<'a>(
        &'a self,
        _request: &'a EventRequest,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async { anyhow::bail!("calendar provider not configured") })
    }

    fn list_upcoming<'a>(
        &'a self,
        _limit: usize,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Event>>> + Send + 'a>> {
        Box::pin(async { anyhow::bail!("calendar provider not configured") })
    }
}
