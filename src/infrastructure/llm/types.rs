//! Wire types for the Ollama HTTP API.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<&'a str>,
    pub stream: bool,
}

/// Body of `POST /api/show`.
#[derive(Debug, Serialize)]
pub struct ShowModelRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ShowModelResponse {
    pub license: String,
    pub modelfile: String,
    /// Newline-separated `key value` pairs.
    pub parameters: String,
    pub template: String,
    pub system: String,
    pub details: ModelDetails,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelDetails {
    pub format: String,
    pub family: String,
    pub families: Vec<String>,
    pub parameter_size: String,
    pub quantization_level: String,
}
