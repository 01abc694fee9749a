//! Report materializers: consume extracted records, never modify them.

pub mod html;
pub mod table;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use riskwatch_common::AnalysisRecord;

pub use html::{escape_html, render_digest};
pub use table::write_table;

/// Paths and row counts of the artifacts written for one run.
#[derive(Debug, Clone)]
pub struct WrittenReports {
    pub table: PathBuf,
    pub table_rows: usize,
    pub digest: PathBuf,
}

/// Write the CSV export and the HTML digest under `{data_dir}/reports/`.
/// Both are produced even when `records` is empty.
pub fn write_reports(
    data_dir: &Path,
    batch_index: usize,
    stamp: &str,
    records: &[AnalysisRecord],
    generated_at: DateTime<Utc>,
) -> Result<WrittenReports> {
    let dir = data_dir.join("reports");
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let table = dir.join(format!("analysis_week{batch_index}_{stamp}.csv"));
    let table_rows = table::write_table_file(&table, records)?;
    info!(path = %table.display(), rows = table_rows, "Table export written");

    let digest = dir.join(format!("email_preview_week{batch_index}_{stamp}.html"));
    std::fs::write(&digest, render_digest(records, batch_index, generated_at))
        .with_context(|| format!("writing {}", digest.display()))?;
    info!(path = %digest.display(), records = records.len(), "HTML digest written");

    Ok(WrittenReports {
        table,
        table_rows,
        digest,
    })
}
