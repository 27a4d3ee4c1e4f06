use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A clarifying question asked before drafting a reply.
///
/// Applies when the email subject contains any trigger (case-insensitive)
/// and no answer is recorded under `key` yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRule {
    pub triggers: Vec<String>,
    pub key: String,
    pub question: String,
}

impl QuestionRule {
    pub fn new(triggers: &[&str], key: &str, question: &str) -> Self {
        Self {
            triggers: triggers.iter().map(|t| (*t).to_string()).collect(),
            key: key.to_string(),
            question: question.to_string(),
        }
    }

    pub fn applies_to(&self, subject: &str) -> bool {
        let subject = subject.to_lowercase();
        self.triggers
            .iter()
            .any(|t| !t.is_empty() && subject.contains(&t.to_lowercase()))
    }
}

pub fn default_rules() -> Vec<QuestionRule> {
    vec![
        QuestionRule::new(
            &["psych", "class"],
            "lecture_recording_policy",
            "What is your policy on recording lectures for your classes?",
        ),
        QuestionRule::new(
            &["psych", "class"],
            "syllabus_sharing_policy",
            "What is your policy on sharing syllabi with prospective students?",
        ),
        QuestionRule::new(
            &["meeting", "appointment"],
            "office_hours",
            "What are your usual office hours or meeting availability?",
        ),
    ]
}

/// First unanswered rule for `subject`, in table order.
pub fn next_question<'a>(
    rules: &'a [QuestionRule],
    subject: &str,
    knowledge: &BTreeMap<String, String>,
) -> Option<&'a QuestionRule> {
    rules
        .iter()
        .find(|rule| rule.applies_to(subject) && !knowledge.contains_key(&rule.key))
}
