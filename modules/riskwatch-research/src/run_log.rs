//! Run log: persisted timeline of every action taken during a weekly run.
//!
//! Each run produces one JSON file under `{data_dir}/runs/`. Raw research
//! text is written separately under `{data_dir}/raw/` for debugging and is
//! never read back.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::job::JobStats;

// ---------------------------------------------------------------------------
// RunLog
// ---------------------------------------------------------------------------

pub struct RunLog {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    events: Vec<RunEvent>,
    seq: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u32,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    BatchSelected {
        batch_index: usize,
        total_batches: usize,
        entities: Vec<String>,
    },
    ResearchSucceeded {
        entity: String,
        chars: usize,
        elapsed_ms: u64,
    },
    ResearchFailed {
        entity: String,
        error: String,
        elapsed_ms: u64,
    },
    RawTextSaved {
        path: String,
        bytes: usize,
    },
    ExtractionComplete {
        segments: usize,
        records: usize,
        skipped: usize,
        categories_parsed: usize,
    },
    ReportWritten {
        format: String,
        path: String,
        rows: usize,
    },
}

impl RunLog {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            events: Vec::new(),
            seq: 0,
        }
    }

    pub fn log(&mut self, kind: EventKind) {
        self.events.push(RunEvent {
            seq: self.seq,
            ts: Utc::now(),
            kind,
        });
        self.seq += 1;
    }

    pub fn events(&self) -> &[RunEvent] {
        &self.events
    }

    /// Serialize the run log to JSON and write to disk.
    /// Returns the file path on success.
    pub fn save(&self, data_dir: &Path, stats: &JobStats) -> Result<PathBuf> {
        let dir = data_dir.join("runs");
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.json", self.run_id));

        let output = SerializedRunLog {
            run_id: &self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            stats,
            events: &self.events,
        };

        std::fs::write(&path, serde_json::to_string_pretty(&output)?)?;
        info!(path = %path.display(), events = self.events.len(), "Run log saved");

        Ok(path)
    }
}

/// Write the batch's raw research text verbatim, keyed by batch index and timestamp.
pub fn save_raw(data_dir: &Path, batch_index: usize, stamp: &str, raw: &str) -> Result<PathBuf> {
    let dir = data_dir.join("raw");
    std::fs::create_dir_all(&dir)?;

    let path = dir.join(format!("report_week{batch_index}_{stamp}.txt"));
    std::fs::write(&path, raw)?;
    info!(path = %path.display(), bytes = raw.len(), "Raw research text saved");

    Ok(path)
}

// ---------------------------------------------------------------------------
// Serialization wrappers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SerializedRunLog<'a> {
    run_id: &'a str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    stats: &'a JobStats,
    events: &'a [RunEvent],
}
