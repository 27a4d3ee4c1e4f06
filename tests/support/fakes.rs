#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};

use steward::Config;
use steward::memory::{Document, DocumentStore, InMemoryStore, MemoryManager, MetadataFilter, Partition};
use steward::providers::{CalendarProvider, Email, EmailProvider, Event, EventRequest, LanguageModel};
use steward::router::{Assistant, Providers};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Monday 2025-03-10 09:00, the wall clock every test assistant sees.
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap()
}

pub fn email(id: &str, from: &str, subject: &str, body: &str) -> Email {
    Email {
        id: id.into(),
        from: from.into(),
        subject: subject.into(),
        date: "Mon, 10 Mar 2025 08:15:00".into(),
        body: body.into(),
        snippet: body.chars().take(40).collect(),
        labels: vec!["UNREAD".into()],
    }
}

// ── Email ────────────────────────────────────────────────────

/// How `reply` answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplyMode {
    #[default]
    Accept,
    /// The server refuses the reply (`Ok(false)`)
    Reject,
    /// The call itself errors
    Fail,
}

#[derive(Default)]
pub struct RecordingEmail {
    inbox: Vec<Email>,
    reply_mode: ReplyMode,
    pub replies: Mutex<Vec<(String, String)>>,
    pub marked_read: Mutex<Vec<String>>,
}

impl RecordingEmail {
    pub fn with_inbox(inbox: Vec<Email>) -> Self {
        Self {
            inbox,
            ..Self::default()
        }
    }

    pub fn replying(mut self, mode: ReplyMode) -> Self {
        self.reply_mode = mode;
        self
    }

    pub fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().unwrap().clone()
    }
}

impl EmailProvider for RecordingEmail {
    fn list_unread<'a>(&'a self, limit: usize) -> BoxFuture<'a, anyhow::Result<Vec<Email>>> {
        Box::pin(async move { Ok(self.inbox.iter().take(limit).cloned().collect()) })
    }

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, anyhow::Result<Option<Email>>> {
        Box::pin(async move { Ok(self.inbox.iter().find(|e| e.id == id).cloned()) })
    }

    fn mark_read<'a>(&'a self, id: &'a str) -> BoxFuture<'a, anyhow::Result<bool>> {
        Box::pin(async move {
            self.marked_read.lock().unwrap().push(id.to_string());
            Ok(true)
        })
    }

    fn reply<'a>(&'a self, id: &'a str, body: &'a str) -> BoxFuture<'a, anyhow::Result<bool>> {
        Box::pin(async move {
            match self.reply_mode {
                ReplyMode::Fail => anyhow::bail!("smtp connection reset"),
                ReplyMode::Reject => Ok(false),
                ReplyMode::Accept => {
                    self.replies
                        .lock()
                        .unwrap()
                        .push((id.to_string(), body.to_string()));
                    Ok(true)
                }
            }
        })
    }
}

// ── Calendar ─────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingCalendar {
    events: Vec<Event>,
    fail_creates: bool,
    pub created: Mutex<Vec<EventRequest>>,
}

impl RecordingCalendar {
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    /// Every `create_event` errors.
    pub fn failing() -> Self {
        Self {
            fail_creates: true,
            ..Self::default()
        }
    }

    pub fn created(&self) -> Vec<EventRequest> {
        self.created.lock().unwrap().clone()
    }
}

impl CalendarProvider for RecordingCalendar {
    fn create_event<'a>(&'a self, request: &'a EventRequest) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(async move {
            if self.fail_creates {
                anyhow::bail!("calendar api returned 503");
            }
            let mut created = self.created.lock().unwrap();
            created.push(request.clone());
            Ok(format!("evt_{}", created.len()))
        })
    }

    fn list_upcoming<'a>(&'a self, limit: usize) -> BoxFuture<'a, anyhow::Result<Vec<Event>>> {
        Box::pin(async move { Ok(self.events.iter().take(limit).cloned().collect()) })
    }
}

// ── Language model ───────────────────────────────────────────

/// Replies from a script, then with a fixed fallback; records every prompt.
pub struct ScriptedModel {
    script: Mutex<VecDeque<String>>,
    fallback: String,
    /// Calls after this many successful ones fail
    fail_after: Option<usize>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(script: &[&str]) -> Self {
        Self {
            script: Mutex::new(script.iter().map(|s| (*s).to_string()).collect()),
            fallback: "Thanks for reaching out. I'll get back to you shortly.".into(),
            fail_after: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(fallback: &str) -> Self {
        Self {
            fallback: fallback.into(),
            ..Self::new(&[])
        }
    }

    /// Answer the first `n` calls, then fail every later one.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(async move {
            let calls = {
                let mut prompts = self.prompts.lock().unwrap();
                prompts.push(prompt.to_string());
                prompts.len()
            };
            if self.fail_after.is_some_and(|n| calls > n) {
                anyhow::bail!("model server unavailable");
            }
            let next = self.script.lock().unwrap().pop_front();
            Ok(next.unwrap_or_else(|| self.fallback.clone()))
        })
    }
}

/// Never answers; only cancellation or a timeout ends the call.
pub struct StalledModel;

impl LanguageModel for StalledModel {
    fn name(&self) -> &str {
        "stalled"
    }

    fn generate<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(std::future::pending())
    }
}

// ── Store ────────────────────────────────────────────────────

/// Store whose every operation fails.
pub struct FailingStore;

impl DocumentStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    fn health_check(&self) -> BoxFuture<'_, bool> {
        Box::pin(async { false })
    }

    fn upsert<'a>(&'a self, _: Partition, _: Document) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async { anyhow::bail!("disk unavailable") })
    }

    fn get<'a>(&'a self, _: Partition, _: &'a str) -> BoxFuture<'a, anyhow::Result<Option<Document>>> {
        Box::pin(async { anyhow::bail!("disk unavailable") })
    }

    fn query_similar<'a>(
        &'a self,
        _: Partition,
        _: &'a str,
        _: usize,
        _: Option<&'a MetadataFilter>,
    ) -> BoxFuture<'a, anyhow::Result<Vec<Document>>> {
        Box::pin(async { anyhow::bail!("disk unavailable") })
    }

    fn get_all<'a>(
        &'a self,
        _: Partition,
        _: Option<&'a MetadataFilter>,
    ) -> BoxFuture<'a, anyhow::Result<Vec<Document>>> {
        Box::pin(async { anyhow::bail!("disk unavailable") })
    }

    fn delete<'a>(&'a self, _: Partition, _: &'a str) -> BoxFuture<'a, anyhow::Result<bool>> {
        Box::pin(async { anyhow::bail!("disk unavailable") })
    }
}

// ── Assembly ─────────────────────────────────────────────────

pub struct Harness {
    pub assistant: Assistant,
    pub email: Arc<RecordingEmail>,
    pub calendar: Arc<RecordingCalendar>,
    pub model: Arc<ScriptedModel>,
}

impl Harness {
    pub fn new(email: RecordingEmail, calendar: RecordingCalendar, model: ScriptedModel) -> Self {
        Self::with_store(Arc::new(InMemoryStore::new()), email, calendar, model)
    }

    pub fn with_store(
        store: Arc<dyn DocumentStore>,
        email: RecordingEmail,
        calendar: RecordingCalendar,
        model: ScriptedModel,
    ) -> Self {
        let config = Config::default();
        let email = Arc::new(email);
        let calendar = Arc::new(calendar);
        let model = Arc::new(model);
        let providers = Providers {
            email: Arc::clone(&email) as Arc<dyn EmailProvider>,
            calendar: Arc::clone(&calendar) as Arc<dyn CalendarProvider>,
            llm: Arc::clone(&model) as Arc<dyn LanguageModel>,
        };
        let memory = MemoryManager::new(store, &config.memory);
        let assistant = Assistant::new(&config, memory, providers).with_clock(fixed_now);
        Self {
            assistant,
            email,
            calendar,
            model,
        }
    }

    pub async fn say(&self, message: &str) -> String {
        self.assistant.respond("default", message).await
    }
}
