use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// Minimal list used when no stopword file is available.
const BUILTIN_STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "do", "for", "from", "had", "has",
    "have", "he", "her", "his", "i", "if", "in", "is", "it", "its", "me", "my", "no", "not", "of",
    "on", "or", "our", "she", "so", "that", "the", "their", "them", "they", "this", "to", "was",
    "we", "were", "what", "when", "which", "who", "will", "with", "you", "your",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tokenizer {
    /// Split on every non-alphanumeric character
    Word,
    /// Split on whitespace only and trim surrounding punctuation
    Whitespace,
}

/// Lower-cased, stopword-filtered content words of a text.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    stopwords: HashSet<String>,
    tokenizer: Tokenizer,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self {
            stopwords: BUILTIN_STOPWORDS.iter().map(|s| (*s).to_string()).collect(),
            tokenizer: Tokenizer::Word,
        }
    }
}

impl KeywordExtractor {
    /// Load stopwords from a newline-separated file.
    ///
    /// Any failure degrades to the built-in list with whitespace splitting.
    pub fn from_path(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let stopwords: HashSet<String> = content
                    .lines()
                    .map(|l| l.trim().to_lowercase())
                    .filter(|l| !l.is_empty() && !l.starts_with('#'))
                    .collect();
                if stopwords.is_empty() {
                    tracing::warn!(path = %path.display(), "stopword file is empty; using built-in list");
                    return Self::fallback();
                }
                Self {
                    stopwords,
                    tokenizer: Tokenizer::Word,
                }
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to load stopwords; using built-in list");
                Self::fallback()
            }
        }
    }

    fn fallback() -> Self {
        Self {
            tokenizer: Tokenizer::Whitespace,
            ..Self::default()
        }
    }

    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = match self.tokenizer {
            Tokenizer::Word => lowered.split(|c: char| !c.is_alphanumeric()).collect(),
            Tokenizer::Whitespace => lowered
                .split_whitespace()
                .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
                .collect(),
        };
        tokens
            .into_iter()
            .filter(|t| !t.is_empty() && !self.stopwords.contains(*t))
            .map(str::to_string)
            .collect()
    }
}
