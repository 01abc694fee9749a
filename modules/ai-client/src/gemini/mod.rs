mod client;
pub(crate) mod types;

use crate::traits::TextModel;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::debug;

use client::GeminiClient;
use types::*;

// =============================================================================
// Gemini Agent
// =============================================================================

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    pub(crate) model: String,
    temperature: f32,
    max_output_tokens: u32,
    google_search: bool,
    base_url: Option<String>,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.3,
            max_output_tokens: 8192,
            google_search: true,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Disable Google Search grounding (answers come from model knowledge only).
    pub fn without_search(mut self) -> Self {
        self.google_search = false;
        self
    }

    pub(crate) fn client(&self) -> GeminiClient {
        let client = GeminiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    pub(crate) fn request(&self, prompt: &str) -> GenerateRequest {
        let request = GenerateRequest::new(prompt)
            .temperature(self.temperature)
            .max_output_tokens(self.max_output_tokens);
        if self.google_search {
            request.google_search()
        } else {
            request
        }
    }
}

/// Pull the answer text out of a response, rejecting empty and filtered output.
pub(crate) fn answer_text(response: GenerateResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Gemini returned no candidates (possible safety block or empty response)"))?;

    if candidate.blocked() {
        return Err(anyhow!(
            "Gemini blocked response: {}",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        ));
    }

    let chunks = candidate.grounding_chunks();
    if chunks > 0 {
        debug!(chunks, "Gemini searched web sources");
    }

    candidate
        .text()
        .ok_or_else(|| anyhow!("No text in Gemini response"))
}

// =============================================================================
// TextModel Implementation
// =============================================================================

#[async_trait]
impl TextModel for Gemini {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = self.request(prompt);
        let response = self.client().generate(&self.model, &request).await?;
        answer_text(response)
    }
}
