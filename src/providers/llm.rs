use std::future::Future;
use std::pin::Pin;

/// Single-shot text generation.
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;
}
