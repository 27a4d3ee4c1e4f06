use regex::Regex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::LazyLock;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub date: String,
    pub body: String,
    pub snippet: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Email {
    /// One numbered line of an inbox listing.
    pub fn listing_line(&self, number: usize) -> String {
        format!(
            "{number}. From: {}\n   Subject: {}\n   Date: {}\n   Preview: {}",
            self.from, self.subject, self.date, self.snippet
        )
    }

    /// Full view shown by `/email read`.
    pub fn detail(&self) -> String {
        format!(
            "From: {}\nSubject: {}\nDate: {}\n\n{}",
            self.from, self.subject, self.date, self.body
        )
    }

    /// First unsubscribe link in the body, if any.
    pub fn unsubscribe_link(&self) -> Option<&str> {
        static LINK: LazyLock<Option<Regex>> =
            LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).ok());
        let re = LINK.as_ref()?;
        // Prefer a URL that itself mentions unsubscribing, then the first URL on or
        // right after a line that does.
        if let Some(m) = re
            .find_iter(&self.body)
            .find(|m| m.as_str().to_lowercase().contains("unsubscribe"))
        {
            return Some(m.as_str());
        }
        let lines: Vec<&str> = self.body.lines().collect();
        let at = lines
            .iter()
            .position(|l| l.to_lowercase().contains("unsubscribe"))?;
        lines[at..lines.len().min(at + 2)]
            .iter()
            .copied()
            .find_map(|line| re.find(line))
            .map(|m| m.as_str())
    }
}

/// Mailbox operations the assistant relies on.
pub trait EmailProvider: Send + Sync {
    fn list_unread<'a>(
        &'a self,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Email>>> + Send + 'a>>;

    fn get<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<Email>>> + Send + 'a>>;

    fn mark_read<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>>;

    fn reply<'a>(
        &'a self,
        id: &'a str,
        body: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(body: &str) -> Email {
        Email {
            id: "m1".into(),
            from: "news@example.com".into(),
            subject: "Weekly digest".into(),
            body: body.into(),
            ..Email::default()
        }
    }

    #[test]
    fn finds_link_containing_unsubscribe() {
        let e = email("Read more at https://example.com/a\nhttps://example.com/unsubscribe?u=1");
        assert_eq!(
            e.unsubscribe_link(),
            Some("https://example.com/unsubscribe?u=1")
        );
    }

    #[test]
    fn finds_link_following_unsubscribe_text() {
        let e = email("Don't want these? Unsubscribe here: https://example.com/opt-out");
        assert_eq!(e.unsubscribe_link(), Some("https://example.com/opt-out"));
    }

    #[test]
    fn no_link_without_unsubscribe_mention() {
        assert_eq!(email("see https://example.com").unsubscribe_link(), None);
    }

    #[test]
    fn listing_line_is_numbered() {
        let line = email("x").listing_line(2);
        assert!(line.starts_with("2. From: news@example.com"));
    }
}
