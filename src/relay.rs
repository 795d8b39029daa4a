//! Client-side boundary to the prompt relay.
//!
//! The conversation session drives everything through the [`Relay`] trait so
//! its transition logic can be tested against a stub. [`HttpRelay`] is the
//! real implementation, speaking the server's JSON/multipart endpoints.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Reply to a chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    /// Display name of the mentor that answered.
    pub mentor: String,
    pub response: String,
}

/// Reply to a work submission review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewReply {
    pub success: bool,
    pub review: String,
    pub approved: bool,
    pub phase: u8,
}

/// Reply to a curriculum upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumReply {
    pub success: bool,
    pub title: String,
    pub content: String,
}

/// Error payload the relay returns on failures.
#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

/// Operations the conversation session performs against the relay.
pub trait Relay {
    fn chat(
        &self,
        message: &str,
        mentor_id: &str,
    ) -> impl Future<Output = Result<ChatReply>> + Send;

    fn review_work(
        &self,
        file: &Path,
        phase: u8,
        challenge_type: &str,
        mentor_id: &str,
    ) -> impl Future<Output = Result<ReviewReply>> + Send;

    fn upload_curriculum(
        &self,
        file: &Path,
        mentor_id: &str,
    ) -> impl Future<Output = Result<CurriculumReply>> + Send;
}

/// HTTP client for a running relay server.
#[derive(Clone)]
pub struct HttpRelay {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRelay {
    /// Create a relay client for the given base URL.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read relay response")?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<ErrorReply>(&body) {
                match err.details {
                    Some(details) => bail!("{}: {details}", err.error),
                    None => bail!("{}", err.error),
                }
            }
            bail!("Relay error ({status}): {body}");
        }

        serde_json::from_str(&body).context("Failed to parse relay response")
    }

    fn file_part(file: &Path) -> Result<reqwest::multipart::Part> {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .context("Upload path has no filename")?
            .to_string();
        let bytes = std::fs::read(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        Ok(reqwest::multipart::Part::bytes(bytes).file_name(name))
    }
}

impl Relay for HttpRelay {
    async fn chat(&self, message: &str, mentor_id: &str) -> Result<ChatReply> {
        let response = self
            .client
            .post(self.endpoint("/api/chat"))
            .json(&serde_json::json!({ "message": message, "mentor": mentor_id }))
            .send()
            .await
            .context("Failed to reach relay")?;

        Self::decode(response).await
    }

    async fn review_work(
        &self,
        file: &Path,
        phase: u8,
        challenge_type: &str,
        mentor_id: &str,
    ) -> Result<ReviewReply> {
        let form = reqwest::multipart::Form::new()
            .part("file", Self::file_part(file)?)
            .text("phase", phase.to_string())
            .text("challengeType", challenge_type.to_string())
            .text("mentor", mentor_id.to_string());

        let response = self
            .client
            .post(self.endpoint("/api/review-work"))
            .multipart(form)
            .send()
            .await
            .context("Failed to reach relay")?;

        Self::decode(response).await
    }

    async fn upload_curriculum(&self, file: &Path, mentor_id: &str) -> Result<CurriculumReply> {
        let form = reqwest::multipart::Form::new()
            .part("curriculum", Self::file_part(file)?)
            .text("mentor", mentor_id.to_string());

        let response = self
            .client
            .post(self.endpoint("/api/upload-curriculum"))
            .multipart(form)
            .send()
            .await
            .context("Failed to reach relay")?;

        Self::decode(response).await
    }
}
