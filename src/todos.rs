//! Todo list kept in the `todos` partition of the document store.

use crate::memory::types::decode_records;
use crate::memory::{DocumentStore, MetadataFilter, Partition, Priority, Record, Todo, TodoStatus};
use chrono::{NaiveDateTime, Utc};
use std::sync::Arc;

/// Fields of a new todo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodo {
    pub task: String,
    pub notes: Option<String>,
    pub priority: Priority,
    pub category: Option<String>,
    pub due_date: Option<NaiveDateTime>,
}

pub const DEFAULT_CATEGORY: &str = "general";

pub struct TodoManager {
    store: Arc<dyn DocumentStore>,
}

impl TodoManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn add(&self, new: NewTodo) -> Option<Todo> {
        let todo = Todo {
            id: format!("todo_{}", &uuid::Uuid::new_v4().simple().to_string()[..8]),
            task: new.task,
            priority: new.priority,
            category: new.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            due_date: new.due_date,
            notes: new.notes,
            status: TodoStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.save(&todo).await.then_some(todo)
    }

    async fn save(&self, todo: &Todo) -> bool {
        let result = match todo.to_document() {
            Ok(doc) => self.store.upsert(Partition::Todos, doc).await,
            Err(error) => Err(error),
        };
        match result {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(id = %todo.id, %error, "failed to save todo");
                false
            }
        }
    }

    /// Pending todos, highest priority first, then earliest due.
    pub async fn list(&self, category: Option<&str>, priority: Option<Priority>) -> Vec<Todo> {
        let mut filter = MetadataFilter::new().eq("status", TodoStatus::Pending.to_string());
        if let Some(category) = category {
            filter = filter.eq("category", category);
        }
        if let Some(priority) = priority {
            filter = filter.eq("priority", priority.to_string());
        }

        let mut todos: Vec<Todo> = match self.store.get_all(Partition::Todos, Some(&filter)).await
        {
            Ok(docs) => decode_records(docs),
            Err(error) => {
                tracing::warn!(%error, "failed to list todos");
                return Vec::new();
            }
        };
        todos.sort_by(|a, b| {
            priority_rank(b.priority)
                .cmp(&priority_rank(a.priority))
                .then_with(|| match (a.due_date, b.due_date) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        todos
    }

    /// Mark a pending todo completed; `None` when no such pending todo exists.
    pub async fn complete(&self, id: &str) -> Option<Todo> {
        let doc = match self.store.get(Partition::Todos, id).await {
            Ok(doc) => doc?,
            Err(error) => {
                tracing::warn!(%id, %error, "failed to load todo");
                return None;
            }
        };
        let mut todo = Todo::from_document(doc).ok()?;
        if todo.status != TodoStatus::Pending {
            return None;
        }
        todo.status = TodoStatus::Completed;
        todo.completed_at = Some(Utc::now());
        self.save(&todo).await.then_some(todo)
    }

    pub async fn delete(&self, id: &str) -> bool {
        match self.store.delete(Partition::Todos, id).await {
            Ok(deleted) => deleted,
            Err(error) => {
                tracing::warn!(%id, %error, "failed to delete todo");
                false
            }
        }
    }
}

fn priority_rank(priority: Priority) -> u8 {
    match priority {
        Priority::Low => 0,
        Priority::Medium => 1,
        Priority::High => 2,
    }
}

/// `[id] (priority) task - Due: ... - Category: ...`
pub fn format_todo(todo: &Todo) -> String {
    let mut line = format!("[{}] ({}) {}", todo.id, todo.priority, todo.task);
    if let Some(due) = todo.due_date {
        line.push_str(&format!(" - Due: {}", due.format("%Y-%m-%d %H:%M")));
    }
    if todo.category != DEFAULT_CATEGORY {
        line.push_str(&format!(" - Category: {}", todo.category));
    }
    line
}
