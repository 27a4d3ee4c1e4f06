use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Converts text to vectors for the similarity half of a query.
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Zero means "no vectors"; the store falls back to keyword search.
    fn dimensions(&self) -> usize;

    fn embed<'a>(
        &'a self,
        texts: &'a [&'a str],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Vec<f32>>>> + Send + 'a>>;

    fn embed_one<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<f32>>> + Send + 'a>> {
        Box::pin(async move {
            let texts = [text];
            let mut results = self.embed(&texts).await?;
            results
                .pop()
                .ok_or_else(|| anyhow::anyhow!("Empty embedding result"))
        })
    }
}

// ── Noop provider (keyword-only fallback) ────────────────────

pub struct NoopEmbedding;

impl EmbeddingProvider for NoopEmbedding {
    fn name(&self) -> &str {
        "none"
    }

    fn dimensions(&self) -> usize {
        0
    }

    fn embed<'a>(
        &'a self,
        _texts: &'a [&'a str],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Vec<f32>>>> + Send + 'a>> {
        Box::pin(async move { Ok(Vec::new()) })
    }
}

// ── Ollama embedding provider ────────────────────────────────

pub struct OllamaEmbedding {
    client: Client,
    embed_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedding {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            embed_url: format!("{}/api/embed", base_url.trim_end_matches('/')),
            model: model.to_string(),
        }
    }
}

impl EmbeddingProvider for OllamaEmbedding {
    fn name(&self) -> &str {
        "ollama"
    }

    // Reported lazily: the model decides the width, the store only needs non-zero.
    fn dimensions(&self) -> usize {
        1
    }

    fn embed<'a>(
        &'a self,
        texts: &'a [&'a str],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Vec<f32>>>> + Send + 'a>> {
        Box::pin(async move {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let response = self
                .client
                .post(&self.embed_url)
                .json(&EmbedRequest {
                    model: &self.model,
                    input: texts,
                })
                .send()
                .await
                .context("send Ollama embed request")?;

            if !response.status().is_success() {
                anyhow::bail!("Ollama embed request failed with {}", response.status());
            }

            let body: EmbedResponse = response
                .json()
                .await
                .context("decode Ollama embed response")?;
            Ok(body.embeddings)
        })
    }
}

pub fn create_embedding_provider(
    provider: &str,
    base_url: &str,
    model: &str,
) -> Box<dyn EmbeddingProvider> {
    match provider {
        "ollama" => Box::new(OllamaEmbedding::new(base_url, model)),
        "none" => Box::new(NoopEmbedding),
        other => {
            tracing::warn!(provider = other, "unknown embedding provider; using keyword search only");
            Box::new(NoopEmbedding)
        }
    }
}

#[cfg(test)]
pub(crate) struct DeterministicEmbedding {
    dims: usize,
}

#[cfg(test)]
impl DeterministicEmbedding {
    pub(crate) fn new(dims: usize) -> Self {
        Self { dims }
    }

    fn fnv1a64(bytes: &[u8]) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for &b in bytes {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        hash
    }
}

#[cfg(test)]
impl EmbeddingProvider for DeterministicEmbedding {
    fn name(&self) -> &str {
        "deterministic_test"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    // Bag-of-words hashing: texts sharing words land close together.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn embed<'a>(
        &'a self,
        texts: &'a [&'a str],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Vec<f32>>>> + Send + 'a>> {
        Box::pin(async move {
            Ok(texts
                .iter()
                .map(|text| {
                    let mut v = vec![0.0_f32; self.dims];
                    for word in text.to_lowercase().split_whitespace() {
                        let slot = (Self::fnv1a64(word.as_bytes()) % self.dims as u64) as usize;
                        v[slot] += 1.0;
                    }
                    v
                })
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn noop_returns_nothing() {
        let texts = ["hello"];
        assert!(NoopEmbedding.embed(&texts).await.unwrap().is_empty());
        assert!(NoopEmbedding.embed_one("hello").await.is_err());
    }

    #[test]
    fn factory_falls_back_to_noop() {
        let provider = create_embedding_provider("mystery", "http://localhost:11434", "m");
        assert_eq!(provider.name(), "none");
        assert_eq!(provider.dimensions(), 0);
    }

    #[tokio::test]
    async fn ollama_embedding_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embeddings": [[0.1, 0.2, 0.3]]})),
            )
            .mount(&server)
            .await;

        let provider = OllamaEmbedding::new(&server.uri(), "nomic-embed-text");
        let vector = provider.embed_one("calendar").await.unwrap();
        assert_eq!(vector.len(), 3);
    }

    #[tokio::test]
    async fn deterministic_embedding_groups_shared_words() {
        let provider = DeterministicEmbedding::new(64);
        let texts = ["team meeting notes", "team meeting agenda", "grocery list"];
        let vectors = provider.embed(&texts).await.unwrap();
        let close = crate::memory::vector::cosine_similarity(&vectors[0], &vectors[1]);
        let far = crate::memory::vector::cosine_similarity(&vectors[0], &vectors[2]);
        assert!(close > far);
    }
}
