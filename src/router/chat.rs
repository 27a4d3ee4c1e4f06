use super::{Assistant, failure_message};
use crate::error::StewardError;
use crate::memory::FileContext;
use crate::providers::guarded;
use tokio_util::sync::CancellationToken;

impl Assistant {
    /// Free-form chat: answer with memory context, then remember the turn.
    pub(super) async fn chat(
        &self,
        message: &str,
        file: Option<&FileContext>,
        cancel: &CancellationToken,
    ) -> String {
        let bundle = self.memory.assemble_context(message).await;
        let prompt = bundle.render_prompt(message, file);

        let response = match guarded(
            "llm.generate",
            self.llm_timeout,
            cancel,
            self.providers.llm.generate(&prompt),
        )
        .await
        {
            Ok(text) => text.trim().to_string(),
            Err(e) => return failure_message("generating a response", &StewardError::from(e)),
        };

        if let Some(turn) = self.memory.record_turn(message, &response, None).await {
            tracing::debug!(id = %turn.id, significance = turn.significance, "turn remembered");
        }
        response
    }
}
