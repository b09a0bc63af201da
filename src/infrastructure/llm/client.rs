//! # Ollama Client
//!
//! Streams `/api/generate` responses as line chunks and fetches model details.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::domain::config::OllamaConfig;
use crate::domain::traits::{ChunkStream, CompletionRequest, LlmProvider};
use crate::infrastructure::llm::lines::lines;
use crate::infrastructure::llm::types::{GenerateRequest, ShowModelRequest, ShowModelResponse};

pub struct OllamaClient {
    http: Client,
    base_url: String,
}

impl OllamaClient {
    /// No overall request timeout: streamed responses run until done or aborted.
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn show_model(&self, name: &str) -> Result<ShowModelResponse> {
        let response = self
            .http
            .post(self.endpoint("/api/show"))
            .json(&ShowModelRequest { name })
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("unexpected status code: {}, body: {body}", status.as_u16());
        }

        response
            .json()
            .await
            .context("Failed to decode model details")
    }
}

#[async_trait]
impl LlmProvider for OllamaClient {
    async fn stream(&self, request: &CompletionRequest) -> Result<ChunkStream> {
        let body = GenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            stream: true,
        };

        tracing::debug!(model = %request.model, url = %self.base_url, "Starting generation");
        let response = self
            .http
            .post(self.endpoint("/api/generate"))
            .json(&body)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            bail!("unexpected status code: {}, body: {body}", status.as_u16());
        }

        Ok(Box::pin(lines(response.bytes_stream())))
    }
}
