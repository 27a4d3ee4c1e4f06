use regex::Regex;
use std::sync::LazyLock;

/// A personal detail pulled out of a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalDetail {
    pub category: &'static str,
    pub value: String,
}

impl PersonalDetail {
    /// Text stored in the facts partition.
    pub fn fact_text(&self) -> String {
        format!("{}: {}", self.category, self.value)
    }
}

static RULES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("name", r"(?i)\bmy name is\s+([^.,!?;\n]+)"),
        ("location", r"(?i)\bi am from\s+([^.,!?;\n]+)"),
        ("residence", r"(?i)\bi live in\s+([^.,!?;\n]+)"),
        ("employer", r"(?i)\bi work at\s+([^.,!?;\n]+)"),
        ("birthday", r"(?i)\bmy birthday is\s+([^.!?;\n]+)"),
    ]
    .into_iter()
    .filter_map(|(category, pattern)| match Regex::new(pattern) {
        Ok(re) => Some((category, re)),
        Err(error) => {
            tracing::error!(category, %error, "invalid personal-info pattern");
            None
        }
    })
    .collect()
});

/// Rule-based extraction of self-descriptions ("my name is ...", "i live in ...").
pub fn extract(message: &str) -> Vec<PersonalDetail> {
    RULES
        .iter()
        .filter_map(|&(category, ref re)| {
            let value = re.captures(message)?.get(1)?.as_str().trim();
            (!value.is_empty()).then(|| PersonalDetail {
                category,
                value: value.to_string(),
            })
        })
        .collect()
}
