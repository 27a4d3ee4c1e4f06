use super::types::InteractionKind;

/// Terms that mark a turn as worth remembering.
pub const DOMAIN_TERMS: [&str; 7] = [
    "remember",
    "important",
    "schedule",
    "deadline",
    "appointment",
    "family",
    "work",
];

const LENGTH_CAP: f64 = 0.5;
const KEYWORD_WEIGHT: f64 = 0.2;

/// Weight contributed by the kind of turn alone.
pub fn kind_weight(kind: InteractionKind) -> f64 {
    match kind {
        InteractionKind::Command => 0.3,
        InteractionKind::Question => 0.5,
        InteractionKind::Statement => 0.4,
        InteractionKind::Email => 0.6,
        InteractionKind::Calendar => 0.7,
        InteractionKind::Conversation => 0.3,
    }
}

fn length_factor(content: &str) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let words = content.split_whitespace().count() as f64;
    (words / 100.0).min(LENGTH_CAP)
}

fn keyword_factor(content: &str) -> f64 {
    let lowered = content.to_lowercase();
    #[allow(clippy::cast_precision_loss)]
    let matched = DOMAIN_TERMS
        .iter()
        .filter(|term| lowered.contains(*term))
        .count() as f64;
    KEYWORD_WEIGHT * matched
}

/// Importance of a turn in `[0, 1]`.
pub fn score(content: &str, kind: InteractionKind) -> f64 {
    (length_factor(content) + keyword_factor(content) + kind_weight(kind)).min(1.0)
}

/// Infer the kind of a free-form user message.
pub fn classify(message: &str) -> InteractionKind {
    const INTERROGATIVES: [&str; 12] = [
        "what", "when", "where", "who", "why", "how", "which", "can", "could", "would", "is",
        "do",
    ];
    let trimmed = message.trim();
    if trimmed.starts_with('/') {
        return InteractionKind::Command;
    }
    let first = trimmed
        .split_whitespace()
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default();
    if trimmed.ends_with('?') || INTERROGATIVES.contains(&first.as_str()) {
        InteractionKind::Question
    } else {
        InteractionKind::Statement
    }
}

/// Whether a turn clears the persistence gate.
pub fn is_significant(score: f64, threshold: f64) -> bool {
    score >= threshold
}
