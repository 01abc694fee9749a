use std::sync::Arc;
use std::time::{Duration, Instant};

use ai_client::util::preview;
use ai_client::TextModel;
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Answers shorter than this (after trimming) are treated as degenerate.
pub const MIN_RESPONSE_CHARS: usize = 50;

/// Why a single research call produced no usable text.
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("research call timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("response too short to be usable ({chars} chars): '{preview}'")]
    TooShort { chars: usize, preview: String },

    #[error("remote call failed: {0:#}")]
    Remote(#[from] anyhow::Error),
}

// =============================================================================
// Prompt
// =============================================================================

/// Role/objective block and scoring rubric shared by every entity in a run.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub role_objective: String,
    pub scoring_definitions: String,
}

impl PromptTemplate {
    pub fn new(role_objective: impl Into<String>, scoring_definitions: impl Into<String>) -> Self {
        Self {
            role_objective: role_objective.into(),
            scoring_definitions: scoring_definitions.into(),
        }
    }

    pub fn render(&self, entity: &str) -> String {
        format!(
            "{}\n\nDefinitions of Situations and Scoring:\n{}\n\nCompany to Analyze:\n{}\n",
            self.role_objective, self.scoring_definitions, entity
        )
    }
}

// =============================================================================
// Researcher
// =============================================================================

/// One research call per entity. No retries.
#[async_trait]
pub trait Researcher: Send + Sync {
    async fn research(&self, entity: &str) -> Result<String, ResearchError>;
}

/// Production researcher: renders the prompt, calls the model under a hard
/// timeout and rejects degenerate answers.
pub struct ResearchClient {
    model: Arc<dyn TextModel>,
    prompt: PromptTemplate,
    timeout: Duration,
    min_chars: usize,
}

impl ResearchClient {
    pub fn new(model: Arc<dyn TextModel>, prompt: PromptTemplate, timeout: Duration) -> Self {
        Self {
            model,
            prompt,
            timeout,
            min_chars: MIN_RESPONSE_CHARS,
        }
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }
}

#[async_trait]
impl Researcher for ResearchClient {
    async fn research(&self, entity: &str) -> Result<String, ResearchError> {
        let prompt = self.prompt.render(entity);
        let started = Instant::now();

        debug!(entity, model = self.model.model(), prompt_chars = prompt.len(), "Sending research request");

        let text = tokio::time::timeout(self.timeout, self.model.generate(&prompt))
            .await
            .map_err(|_| ResearchError::Timeout(self.timeout))??;

        let chars = text.trim().chars().count();
        if chars < self.min_chars {
            return Err(ResearchError::TooShort {
                chars,
                preview: preview(&text, 100),
            });
        }

        debug!(entity, chars, elapsed_ms = started.elapsed().as_millis() as u64, "Research response received");
        Ok(text)
    }
}
