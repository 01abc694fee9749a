use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use riskwatch_common::AnalysisRecord;

pub const HEADER: [&str; 7] = [
    "Company",
    "Situation",
    "Score",
    "Key Point 1",
    "Key Point 2",
    "Key Point 3",
    "Sources",
];

pub const SOURCE_SEPARATOR: &str = " | ";

/// Write one row per (record, category). The header is always written, so an
/// empty record sequence still produces a valid file. Returns the row count.
pub fn write_table<W: Write>(writer: W, records: &[AnalysisRecord]) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;

    let mut rows = 0;
    for record in records {
        for result in record.categories() {
            let points = result.evidence_points();
            let point = |i: usize| points.get(i).map(String::as_str).unwrap_or("");
            let score = if result.is_set() {
                result.score().to_string()
            } else {
                String::new()
            };
            csv.write_record([
                record.entity_name(),
                result.category().label(),
                score.as_str(),
                point(0),
                point(1),
                point(2),
                result.source_urls().join(SOURCE_SEPARATOR).as_str(),
            ])?;
            rows += 1;
        }
    }

    csv.flush()?;
    Ok(rows)
}

pub fn write_table_file(path: &Path, records: &[AnalysisRecord]) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_table(file, records)
}
