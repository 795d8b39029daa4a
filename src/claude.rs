//! Claude API client for single-turn text generation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::ClaudeConfig;

/// Token budget for a chat reply.
pub const CHAT_MAX_TOKENS: u32 = 500;
/// Token budget for a work review, which runs longer than chat replies.
pub const REVIEW_MAX_TOKENS: u32 = 800;

#[derive(Clone)]
pub struct Claude {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl Claude {
    /// Create a client from config.
    #[must_use]
    pub fn from_config(config: &ClaudeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Send a single composed prompt and return the first text block of the
    /// response.
    ///
    /// No retries: any upstream failure (network, auth, rate limit) surfaces
    /// as an error with the API's detail message when one can be parsed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API responds with a
    /// non-success status, or the response carries no text block.
    pub async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to connect to Claude API")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Try to parse error message
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
                anyhow::bail!("Claude API error: {}", api_error.error.message);
            }
            anyhow::bail!("Claude API error ({status}): {body}");
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).context("Failed to parse Claude response")?;

        parsed
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .context("Claude response contained no text")
    }
}
