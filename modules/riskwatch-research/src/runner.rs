use std::time::{Duration, Instant};

use tracing::{info, warn};

use riskwatch_common::BatchOutcome;

use crate::research::Researcher;

/// Separator appended after each successful answer in the raw text.
pub const ANSWER_DELIMITER: &str = "\n\n";

/// Concatenated answers for one batch, in entity order. Append-only while the
/// runner owns it; immutable once handed out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResearchText(String);

impl RawResearchText {
    fn append(&mut self, answer: &str) {
        self.0.push_str(answer);
        self.0.push_str(ANSWER_DELIMITER);
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// What happened to a single entity, for the run log.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub entity: String,
    pub elapsed: Duration,
    pub result: Result<usize, String>,
}

pub struct BatchRun {
    pub raw: RawResearchText,
    pub outcome: BatchOutcome,
    pub attempts: Vec<Attempt>,
}

/// Drives the researcher once per entity, strictly in order, pausing between calls.
pub struct BatchRunner<'a> {
    researcher: &'a dyn Researcher,
    inter_call_delay: Duration,
}

impl<'a> BatchRunner<'a> {
    pub fn new(researcher: &'a dyn Researcher, inter_call_delay: Duration) -> Self {
        Self {
            researcher,
            inter_call_delay,
        }
    }

    /// Research every entity in `batch`. A failed entity is recorded and skipped;
    /// it never aborts the batch. The caller decides whether an outcome with no
    /// successes is fatal.
    pub async fn run(&self, batch: &[String]) -> BatchRun {
        let mut raw = RawResearchText::default();
        let mut outcome = BatchOutcome::default();
        let mut attempts = Vec::with_capacity(batch.len());
        let total = batch.len();

        for (i, entity) in batch.iter().enumerate() {
            info!(position = i + 1, total, entity = entity.as_str(), "Researching");
            let started = Instant::now();

            let result = match self.researcher.research(entity).await {
                Ok(answer) => {
                    let chars = answer.chars().count();
                    info!(entity = entity.as_str(), chars, "Research succeeded");
                    raw.append(&answer);
                    outcome.record_success(entity);
                    Ok(chars)
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(entity = entity.as_str(), error = %message, "Research failed");
                    outcome.record_failure(entity, message.clone());
                    Err(message)
                }
            };

            attempts.push(Attempt {
                entity: entity.clone(),
                elapsed: started.elapsed(),
                result,
            });

            if i + 1 < total && !self.inter_call_delay.is_zero() {
                tokio::time::sleep(self.inter_call_delay).await;
            }
        }

        info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            raw_chars = raw.len(),
            "Batch complete"
        );
        if !outcome.failed.is_empty() {
            warn!(failed = ?outcome.failed_names(), "Some entities failed");
        }

        BatchRun {
            raw,
            outcome,
            attempts,
        }
    }
}
