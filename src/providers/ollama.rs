use super::llm::LanguageModel;
use crate::config::LlmConfig;
use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Local Ollama server speaking `/api/chat`.
pub struct OllamaModel {
    base_url: String,
    model: String,
    temperature: f64,
    system_prompt: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    options: Options,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct Options {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OllamaModel {
    pub fn new(base_url: &str, model: &str, temperature: f64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
            system_prompt: None,
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(300)) // Ollama runs locally, may be slow
                .connect_timeout(std::time::Duration::from_secs(10))
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(std::time::Duration::from_secs(90))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(&config.base_url, &config.model, config.temperature)
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    fn build_request(&self, prompt: &str) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(Message {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(Message {
            role: "user",
            content: prompt.to_string(),
        });

        ChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            options: Options {
                temperature: self.temperature,
            },
        }
    }

    async fn call_api(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&self.build_request(prompt))
            .send()
            .await
            .context("send Ollama chat request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            anyhow::bail!("Ollama API error ({status}): {body}. Is Ollama running? (ollama serve)");
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("decode Ollama chat response")?;
        Ok(chat.message.content)
    }
}

impl LanguageModel for OllamaModel {
    fn name(&self) -> &str {
        "ollama"
    }

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(self.call_api(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn trailing_slash_is_trimmed() {
        let model = OllamaModel::new("http://192.168.1.100:11434/", "mistral", 0.7);
        assert_eq!(model.base_url, "http://192.168.1.100:11434");
    }

    #[test]
    fn request_serializes_without_system() {
        let req = OllamaModel::new("http://x", "mistral:7b-instruct", 0.0).build_request("test");
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"stream\":false"));
        assert!(!json.contains("\"role\":\"system\""));
        assert!(json.contains("mistral:7b-instruct"));
    }

    #[test]
    fn request_includes_system_prompt() {
        let req = OllamaModel::new("http://x", "m", 0.7)
            .with_system_prompt("You are Steward")
            .build_request("hello");
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, "system");
    }

    #[tokio::test]
    async fn generate_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({"stream": false, "model": "mistral"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": "Hello from Ollama!"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = OllamaModel::new(&server.uri(), "mistral", 0.7);
        assert_eq!(model.generate("hi").await.unwrap(), "Hello from Ollama!");
    }

    #[tokio::test]
    async fn http_errors_are_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let model = OllamaModel::new(&server.uri(), "missing", 0.7);
        let err = model.generate("hi").await.unwrap_err().to_string();
        assert!(err.contains("404"));
        assert!(err.contains("model not found"));
    }
}
