use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use riskwatch_common::{RiskWatchError, RotationConfig};

use crate::extractor;
use crate::report::{self, WrittenReports};
use crate::research::Researcher;
use crate::run_log::{self, EventKind, RunLog};
use crate::runner::BatchRunner;
use crate::scheduler::RotationScheduler;

/// Counters for one weekly run, logged at the end and persisted in the run log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobStats {
    pub batch_index: usize,
    pub total_batches: usize,
    pub entities_requested: usize,
    pub entities_succeeded: usize,
    pub entities_failed: usize,
    pub records_extracted: usize,
    pub segments_skipped: usize,
    pub categories_parsed: usize,
    pub failed_entities: Vec<String>,
}

impl fmt::Display for JobStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Weekly Run Complete ===")?;
        writeln!(f, "Batch:              {} of {}", self.batch_index, self.total_batches)?;
        writeln!(f, "Entities requested: {}", self.entities_requested)?;
        writeln!(f, "Entities succeeded: {}", self.entities_succeeded)?;
        writeln!(f, "Entities failed:    {}", self.entities_failed)?;
        writeln!(f, "Records extracted:  {}", self.records_extracted)?;
        writeln!(f, "Segments skipped:   {}", self.segments_skipped)?;
        writeln!(
            f,
            "Categories parsed:  {} of {}",
            self.categories_parsed,
            self.records_extracted * 4
        )?;
        if !self.failed_entities.is_empty() {
            writeln!(f, "\nFailed:")?;
            for name in &self.failed_entities {
                writeln!(f, "  {name}")?;
            }
        }
        Ok(())
    }
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct JobRun {
    pub run_id: String,
    pub stats: JobStats,
    pub raw_text: Option<PathBuf>,
    pub reports: Option<WrittenReports>,
    pub run_log: PathBuf,
}

/// Select this week's batch, research it, extract records and write reports.
pub struct WeeklyJob<'a> {
    researcher: &'a dyn Researcher,
    scheduler: RotationScheduler,
    inter_call_delay: Duration,
    data_dir: PathBuf,
}

impl<'a> WeeklyJob<'a> {
    pub fn new(researcher: &'a dyn Researcher, rotation: &RotationConfig, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            researcher,
            scheduler: RotationScheduler::from_config(rotation),
            inter_call_delay: rotation.inter_call_delay,
            data_dir: data_dir.into(),
        }
    }

    /// Run once. Partial failure is not an error; only a non-empty batch in
    /// which every entity failed returns `RiskWatchError::FatalRun`.
    pub async fn run(
        &self,
        entities: &[String],
        requested: Option<usize>,
        now: DateTime<Utc>,
    ) -> Result<JobRun, RiskWatchError> {
        let run_id = Uuid::new_v4().to_string();
        let stamp = now.format("%Y-%m-%d_%H-%M-%S").to_string();
        let mut log = RunLog::new(run_id.clone());
        let mut stats = JobStats::default();

        let selection = self.scheduler.select(entities, requested, now);
        stats.batch_index = selection.index;
        stats.total_batches = selection.total_batches;
        stats.entities_requested = selection.entities.len();
        log.log(EventKind::BatchSelected {
            batch_index: selection.index,
            total_batches: selection.total_batches,
            entities: selection.entities.to_vec(),
        });

        if selection.entities.is_empty() {
            info!(batch = selection.index, "Empty batch, nothing to research");
            let run_log = log.save(&self.data_dir, &stats)?;
            return Ok(JobRun {
                run_id,
                stats,
                raw_text: None,
                reports: None,
                run_log,
            });
        }

        info!(
            run_id = run_id.as_str(),
            batch = selection.index,
            entities = selection.entities.len(),
            "Starting weekly research run"
        );

        let batch = BatchRunner::new(self.researcher, self.inter_call_delay)
            .run(selection.entities)
            .await;

        for attempt in &batch.attempts {
            let elapsed_ms = attempt.elapsed.as_millis() as u64;
            log.log(match &attempt.result {
                Ok(chars) => EventKind::ResearchSucceeded {
                    entity: attempt.entity.clone(),
                    chars: *chars,
                    elapsed_ms,
                },
                Err(error) => EventKind::ResearchFailed {
                    entity: attempt.entity.clone(),
                    error: error.clone(),
                    elapsed_ms,
                },
            });
        }

        stats.entities_succeeded = batch.outcome.succeeded.len();
        stats.entities_failed = batch.outcome.failed.len();
        stats.failed_entities = batch
            .outcome
            .failed_names()
            .into_iter()
            .map(String::from)
            .collect();

        // Raw text is kept even when everything failed, for debugging.
        let raw_path = run_log::save_raw(&self.data_dir, selection.index, &stamp, batch.raw.as_str())?;
        log.log(EventKind::RawTextSaved {
            path: raw_path.display().to_string(),
            bytes: batch.raw.len(),
        });

        if batch.outcome.nothing_succeeded() {
            error!(
                batch = selection.index,
                attempted = batch.outcome.attempted(),
                "No entity was researched successfully"
            );
            log.save(&self.data_dir, &stats)?;
            return Err(RiskWatchError::FatalRun {
                batch_index: selection.index,
                attempted: batch.outcome.attempted(),
            });
        }

        let extraction = extractor::extract_report(batch.raw.as_str());
        stats.records_extracted = extraction.records.len();
        stats.segments_skipped = extraction.segments_skipped;
        stats.categories_parsed = extraction.categories_parsed();
        log.log(EventKind::ExtractionComplete {
            segments: extraction.segments_seen,
            records: extraction.records.len(),
            skipped: extraction.segments_skipped,
            categories_parsed: extraction.categories_parsed(),
        });
        if extraction.is_empty() {
            warn!(
                succeeded = stats.entities_succeeded,
                "Research succeeded but no records could be extracted"
            );
        }

        let reports = report::write_reports(&self.data_dir, selection.index, &stamp, &extraction.records, now)?;
        log.log(EventKind::ReportWritten {
            format: "csv".into(),
            path: reports.table.display().to_string(),
            rows: reports.table_rows,
        });
        log.log(EventKind::ReportWritten {
            format: "html".into(),
            path: reports.digest.display().to_string(),
            rows: reports.table_rows,
        });

        let run_log = log.save(&self.data_dir, &stats)?;
        info!("{stats}");

        Ok(JobRun {
            run_id,
            stats,
            raw_text: Some(raw_path),
            reports: Some(reports),
            run_log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_display_lists_failures() {
        let stats = JobStats {
            batch_index: 2,
            total_batches: 3,
            entities_requested: 3,
            entities_succeeded: 2,
            entities_failed: 1,
            records_extracted: 2,
            segments_skipped: 0,
            categories_parsed: 7,
            failed_entities: vec!["Beta".into()],
        };
        let text = stats.to_string();
        assert!(text.contains("Batch:              2 of 3"));
        assert!(text.contains("Categories parsed:  7 of 8"));
        assert!(text.contains("Failed:\n  Beta"));
    }

    #[test]
    fn stats_display_omits_empty_failure_list() {
        assert!(!JobStats::default().to_string().contains("Failed:"));
    }
}
