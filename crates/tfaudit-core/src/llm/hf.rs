use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{AuditModel, InferenceSettings};

const DEFAULT_ENDPOINT: &str = "https://router.huggingface.co";

/// Chat-completion client for the Hugging Face inference router.
#[derive(Debug, Clone)]
pub struct HfChatClient {
    http: Client,
    url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl HfChatClient {
    pub fn new(settings: &InferenceSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            bail!("inference API key must be provided via TFAUDIT_API_KEY or HF_TOKEN");
        }
        let base = settings
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let url = format!("{}/v1/chat/completions", base.trim_end_matches('/'));
        let http = Client::builder()
            .user_agent("tfaudit/0.2")
            .timeout(Duration::from_secs(settings.timeout_secs.unwrap_or(60)))
            .build()
            .context("failed to build inference HTTP client")?;
        Ok(Self {
            http,
            url,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
        })
    }
}

#[async_trait]
impl AuditModel for HfChatClient {
    async fn audit(&self, system_prompt: &str, content: &str) -> Result<String> {
        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: content.to_string(),
                },
            ],
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("failed to call inference chat completions API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("inference API error ({}): {}", status, body);
        }

        let chat: ChatCompletionResponse = response
            .json()
            .await
            .context("failed to parse inference API response")?;
        let content = chat
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("inference API response missing message content"))?;

        Ok(content.trim().to_string())
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
