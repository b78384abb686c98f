// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Tag inference: label image bytes with a local vision model

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::EngineConfig;
use crate::{GalleryError, Result};

/// Something that can label the contents of an image
#[async_trait]
pub trait TagInference: Send + Sync {
    /// Label raw image bytes
    async fn infer(&self, image: &[u8]) -> Result<Vec<String>>;
}

/// Ollama-backed tagger using a vision model
pub struct OllamaTagger {
    client: Client,
    base_url: String,
    model: String,
    prompt: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    images: Vec<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaTagger {
    /// Create a tagger from the engine configuration
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        // Normalize URL
        let base_url = config
            .url
            .trim_end_matches('/')
            .replace("/api/generate", "")
            .replace("/api/chat", "");

        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
            prompt: config.prompt.clone(),
        })
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);

        self.client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                GalleryError::InferenceUnavailable(format!(
                    "Cannot connect to Ollama at {}: {}",
                    self.base_url, e
                ))
            })?;

        Ok(())
    }
}

#[async_trait]
impl TagInference for OllamaTagger {
    async fn infer(&self, image: &[u8]) -> Result<Vec<String>> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: &self.model,
            prompt: &self.prompt,
            stream: false,
            images: vec![general_purpose::STANDARD.encode(image)],
        };

        debug!("Sending tagging request to Ollama: model={}", self.model);

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(GalleryError::InferenceUnavailable(format!(
                "Ollama returned status {}",
                response.status()
            )));
        }

        let result: GenerateResponse = response.json().await?;
        Ok(parse_tags(&result.response))
    }
}

/// Turn a free-form model answer into a clean, de-duplicated tag list
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    for part in raw.split([',', '\n', ';']) {
        let tag: String = strip_list_marker(part.trim())
            .trim()
            .trim_matches('"')
            .trim_matches('\'')
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
            .collect::<String>()
            .to_lowercase();

        let tag = tag.split_whitespace().collect::<Vec<_>>().join(" ");
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    tags
}

/// Strip "1.", "2)", "-" or "*" list markers
fn strip_list_marker(s: &str) -> &str {
    let s = s.trim_start_matches(['-', '*']).trim_start();
    let digits = s.len() - s.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        if let Some(rest) = s[digits..].strip_prefix(['.', ')']) {
            return rest;
        }
    }
    s
}

/// Tagger that never finds anything
///
/// Used when no inference engine is configured.
pub struct NoopTagger;

#[async_trait]
impl TagInference for NoopTagger {
    async fn infer(&self, _image: &[u8]) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
