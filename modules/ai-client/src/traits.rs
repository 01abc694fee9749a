use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// TextModel Trait
// =============================================================================

/// A single-shot text generator: one prompt in, one free-text answer out.
///
/// Implementations make exactly one remote call per `generate` and never
/// retry; callers decide what a failure means for their run.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Model identifier, used for logging.
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}
