use crate::memory::Priority;

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddFact {
        text: String,
        category: Option<String>,
    },
    ListFacts {
        category: Option<String>,
    },
    DeleteFact {
        id: String,
    },
    CalendarAdd(CalendarAddArgs),
    CalendarList {
        limit: Option<usize>,
    },
    TodoAdd(TodoAddArgs),
    TodoList {
        category: Option<String>,
        priority: Option<Priority>,
    },
    TodoDone {
        id: String,
    },
    TodoDelete {
        id: String,
    },
    Email(EmailCommand),
    File(FileCommand),
    Help,
    /// Known command with unusable arguments
    Malformed {
        usage: &'static str,
    },
    Unknown {
        name: String,
    },
}

/// Arguments of `/calendar add`. Times stay raw until parsed against "now".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarAddArgs {
    pub summary: String,
    pub start: String,
    pub end: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub recurrence: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoAddArgs {
    pub task: String,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub due: Option<String>,
}

/// An email by position in the last listing or by provider id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTarget {
    Number(usize),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailCommand {
    List { limit: Option<usize> },
    Read { target: EmailTarget },
    MarkRead { id: String },
    Reply { id: String, body: String },
    DraftReply,
    Answer { text: String },
    Send,
    Revise { request: Option<String> },
    Discard,
    Unsubscribe { target: EmailTarget },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCommand {
    List { path: Option<String> },
    Read { path: String },
    Search { query: String },
}
