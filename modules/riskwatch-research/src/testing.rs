// Test mocks for the research pipeline.
//
// Two mocks matching the two trait boundaries:
// - MockTextModel (TextModel): fixed answer or error, optional delay, records prompts
// - MockResearcher (Researcher): entity-keyed answers or errors, records call order
//
// Plus fixture builders for well-formed research answers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use ai_client::TextModel;
use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::research::{ResearchError, Researcher};

// ---------------------------------------------------------------------------
// MockTextModel
// ---------------------------------------------------------------------------

pub struct MockTextModel {
    answer: Result<String, String>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl MockTextModel {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            answer: Err(error.to_string()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextModel for MockTextModel {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer.clone().map_err(|e| anyhow!(e))
    }
}

// ---------------------------------------------------------------------------
// MockResearcher
// ---------------------------------------------------------------------------

/// Entity-keyed researcher. Unregistered entities fail with a remote error.
/// Builder pattern: `.on_entity()`, `.fail_entity()`, `.time_out()`.
#[derive(Default)]
pub struct MockResearcher {
    answers: HashMap<String, Answer>,
    calls: Mutex<Vec<String>>,
}

enum Answer {
    Text(String),
    Fail(String),
    Timeout(Duration),
}

impl MockResearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_entity(mut self, entity: &str, answer: impl Into<String>) -> Self {
        self.answers.insert(entity.to_string(), Answer::Text(answer.into()));
        self
    }

    pub fn fail_entity(mut self, entity: &str, error: &str) -> Self {
        self.answers.insert(entity.to_string(), Answer::Fail(error.to_string()));
        self
    }

    pub fn time_out(mut self, entity: &str, after: Duration) -> Self {
        self.answers.insert(entity.to_string(), Answer::Timeout(after));
        self
    }

    /// Entities researched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Researcher for MockResearcher {
    async fn research(&self, entity: &str) -> Result<String, ResearchError> {
        self.calls.lock().unwrap().push(entity.to_string());
        match self.answers.get(entity) {
            Some(Answer::Text(text)) => Ok(text.clone()),
            Some(Answer::Fail(error)) => Err(ResearchError::Remote(anyhow!(error.clone()))),
            Some(Answer::Timeout(after)) => Err(ResearchError::Timeout(*after)),
            None => Err(ResearchError::Remote(anyhow!("no mock answer for {entity}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixture builders
// ---------------------------------------------------------------------------

/// One well-formed category block with two evidence bullets and two sources.
pub fn category_block(ordinal: u32, score: u32) -> String {
    format!(
        "SITUATION {ordinal}: Category {ordinal}\n\
         Score: {score}\n\
         Key Signals:\n\
         - Evidence one for situation {ordinal} is detailed\n\
         - Evidence two for situation {ordinal} is detailed\n\
         Evidence Links:\n\
         - 12.01.2026 - https://news.example.com/s{ordinal}/a\n\
         - https://news.example.com/s{ordinal}/b.\n"
    )
}

/// A full answer for one company with all four categories well-formed.
pub fn well_formed_answer(company: &str, scores: [u32; 4]) -> String {
    let mut answer = format!("---COMPANY START---\nCompany: {company}\n\n");
    for (i, score) in scores.iter().enumerate() {
        answer.push_str(&category_block(i as u32 + 1, *score));
        answer.push('\n');
    }
    answer.push_str("---COMPANY END---\n");
    answer
}
