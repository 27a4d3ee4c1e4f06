use crate::dialogue::rules::{QuestionRule, default_rules};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Clarifying questions asked before drafting, in table order
    #[serde(default = "default_rules")]
    pub rules: Vec<QuestionRule>,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}
