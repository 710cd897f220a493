//! Generative-text client.
//!
//! [`TextGenerator`] is the seam the code generator talks to; [`OpenAiClient`]
//! implements it against an OpenAI-compatible chat completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CodegenConfig;
use crate::error::{CodegenError, CodegenResult};

/// One completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Black-box generative-text capability.
///
/// Any transport error or non-2xx status must surface as a single
/// [`CodegenError::RequestFailed`].
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> CodegenResult<String>;
}

/// Chat completions request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat completions response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible API client.
pub struct OpenAiClient {
    api_key: String,
    endpoint: String,
    model: String,
    client: Client,
}

impl OpenAiClient {
    /// Create a new client.
    pub fn new(config: &CodegenConfig) -> CodegenResult<Self> {
        if config.api_key.is_empty() {
            return Err(CodegenError::config_error("API key is empty"));
        }

        Ok(Self {
            api_key: config.api_key.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            client: Client::new(),
        })
    }

    /// Model used for completions.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> CodegenResult<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &request.system_prompt,
                },
                Message {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(model = %self.model, "Calling chat completions API");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CodegenError::request_failed(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CodegenError::request_failed(format!(
                "API returned {}: {}",
                status, error_text
            )));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            CodegenError::request_failed(format!("failed to parse response: {}", e))
        })?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(CodegenError::EmptyResponse)
    }
}
