//! Structured extraction: recovers fixed-schema records from research answers.
//!
//! The model's formatting is not contractually stable, so parsing is strict
//! only at the record boundary (a record needs a name) and lenient inside it:
//! a category that does not match stays unset and the record is still kept.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use riskwatch_common::{AnalysisRecord, Category, CategoryResult, RUBRIC_MAX, RUBRIC_MIN};

pub const RECORD_START: &str = "---COMPANY START---";
pub const RECORD_END: &str = "---COMPANY END---";

/// Evidence lines at or below this many characters are noise.
pub const MIN_EVIDENCE_CHARS: usize = 10;

/// Optional list decoration before a label: bullets, quote markers, bold/heading
/// markers or a "1." / "2)" numbering.
const LINE_PREFIX: &str = r"(?:[ \t*#>\-]|\d{1,2}[.)])*";

static NAME_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?im)^{LINE_PREFIX}Company[ \t*]*:(.+)$")).expect("valid regex")
});

static CATEGORY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?im)^{LINE_PREFIX}SITUATION[ \t]+(\d+)\b[^\n]*$")).expect("valid regex")
});

static SCORE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?im)^{LINE_PREFIX}Score[ \t*]*:[ \t*]*(\d+)")).expect("valid regex")
});

static BULLET_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[\s\-•*·]+|\d{1,2}[.)]\s+)+").expect("valid regex")
});

static URL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'`|]+"#).expect("valid regex"));

/// Label pairs that introduce the evidence and sources blocks, tried in order.
static BLOCK_SHAPES: LazyLock<Vec<BlockShape>> = LazyLock::new(|| {
    vec![
        BlockShape::new(
            "labeled",
            &format!(r"(?im)^{LINE_PREFIX}Key[ \t]+(?:Signals|Points)\b[^\n]*$"),
            // A label line, not a sentence that happens to start with "Sources".
            &format!(r"(?im)^{LINE_PREFIX}(?:Evidence[ \t]+Links|Sources)[ \t*]*(?:\([^)\n]*\))?[ \t*]*(?::|$)"),
        ),
        BlockShape::new(
            "bare",
            &format!(r"(?im)^{LINE_PREFIX}Evidence[ \t*]*:[^\n]*$"),
            &format!(r"(?im)^{LINE_PREFIX}(?:Links|URLs)[ \t*]*:[^\n]*$"),
        ),
    ]
});

/// One way the model may label a category's evidence and sources.
struct BlockShape {
    name: &'static str,
    evidence_label: Regex,
    sources_label: Regex,
}

impl BlockShape {
    fn new(name: &'static str, evidence_label: &str, sources_label: &str) -> Self {
        Self {
            name,
            evidence_label: Regex::new(evidence_label).expect("valid regex"),
            sources_label: Regex::new(sources_label).expect("valid regex"),
        }
    }

    /// Split a category body (text after the header) into its evidence and
    /// sources blocks. Both labels must appear after the score line, evidence first.
    fn split<'a>(&self, body: &'a str, after: usize) -> Option<(&'a str, &'a str)> {
        let evidence = self.evidence_label.find_at(body, after)?;
        let sources = self.sources_label.find_at(body, evidence.end())?;
        Some((&body[evidence.end()..sources.start()], &body[sources.end()..]))
    }
}

// =============================================================================
// Report
// =============================================================================

/// Extraction output plus the counters the job logs and persists.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub records: Vec<AnalysisRecord>,
    /// Start markers found in the input.
    pub segments_seen: usize,
    /// Segments dropped because no name line was found.
    pub segments_skipped: usize,
}

impl ExtractionReport {
    pub fn categories_parsed(&self) -> usize {
        self.records.iter().map(|r| r.categories_parsed()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// Extract every named record from `raw`, in the order they appear.
pub fn extract(raw: &str) -> Vec<AnalysisRecord> {
    extract_report(raw).records
}

pub fn extract_report(raw: &str) -> ExtractionReport {
    let mut report = ExtractionReport::default();

    if !raw.contains(RECORD_START) {
        warn!(chars = raw.len(), "No record start marker found in research text");
        return report;
    }

    // The text before the first marker is preamble.
    for segment in raw.split(RECORD_START).skip(1) {
        report.segments_seen += 1;
        let segment = match segment.find(RECORD_END) {
            Some(end) => &segment[..end],
            None => segment,
        };

        match parse_record(segment) {
            Some(record) => {
                debug!(
                    entity = record.entity_name(),
                    categories = record.categories_parsed(),
                    "Record extracted"
                );
                report.records.push(record);
            }
            None => {
                report.segments_skipped += 1;
                warn!(
                    segment = report.segments_seen,
                    preview = %ai_client::util::preview(segment, 80),
                    "Skipping segment without a company name"
                );
            }
        }
    }

    info!(
        segments = report.segments_seen,
        records = report.records.len(),
        skipped = report.segments_skipped,
        categories = report.categories_parsed(),
        "Extraction complete"
    );
    report
}

/// Parse one segment. `None` when no name line is present.
fn parse_record(segment: &str) -> Option<AnalysisRecord> {
    let mut record = NAME_LINE
        .captures_iter(segment)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| AnalysisRecord::new(m.as_str().trim_matches(|c: char| c == '*' || c.is_whitespace())))?;

    let headers = category_headers(segment);
    for category in Category::ALL {
        // Each category only ever matches a header carrying its own ordinal.
        let Some(pos) = headers.iter().position(|h| h.ordinal == Some(category.ordinal())) else {
            debug!(entity = record.entity_name(), category = %category, "Category header not found");
            continue;
        };
        let body_start = headers[pos].end;
        let body_end = headers.get(pos + 1).map_or(segment.len(), |next| next.start);

        match parse_category(category, &segment[body_start..body_end]) {
            Some(result) => {
                if !result.in_rubric() {
                    warn!(
                        entity = record.entity_name(),
                        category = %category,
                        score = result.score(),
                        "Score outside {RUBRIC_MIN}-{RUBRIC_MAX} rubric, passing through"
                    );
                }
                record.set(result);
            }
            None => {
                debug!(entity = record.entity_name(), category = %category, "Category block did not match");
            }
        }
    }

    Some(record)
}

struct Header {
    ordinal: Option<u32>,
    start: usize,
    end: usize,
}

fn category_headers(segment: &str) -> Vec<Header> {
    CATEGORY_HEADER
        .captures_iter(segment)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Header {
                ordinal: caps.get(1).and_then(|m| m.as_str().parse().ok()),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Parse a category body. Requires a score line followed by labeled evidence
/// and sources blocks; anything less leaves the category unset.
fn parse_category(category: Category, body: &str) -> Option<CategoryResult> {
    let score_caps = SCORE_LINE.captures(body)?;
    let score: u32 = score_caps.get(1)?.as_str().parse().ok()?;
    let after_score = score_caps.get(0)?.end();

    let (shape, (evidence_block, sources_block)) = BLOCK_SHAPES
        .iter()
        .find_map(|shape| shape.split(body, after_score).map(|blocks| (shape.name, blocks)))?;
    debug!(category = %category, shape, "Category block matched");

    Some(CategoryResult::extracted(
        category,
        score,
        evidence_points(evidence_block),
        source_urls(sources_block),
    ))
}

/// Strip bullet markers and keep informative lines, in order.
pub fn evidence_points(block: &str) -> Vec<String> {
    block
        .lines()
        .map(|line| BULLET_PREFIX.replace(line, "").trim().to_string())
        .filter(|line| line.chars().count() > MIN_EVIDENCE_CHARS)
        .take(riskwatch_common::MAX_EVIDENCE_POINTS)
        .collect()
}

/// First http(s) URL per line or `|`-separated piece, trailing punctuation
/// removed. Tokens that do not parse as URLs are ignored.
pub fn source_urls(block: &str) -> Vec<String> {
    block
        .lines()
        .flat_map(|line| line.split('|'))
        .filter_map(|piece| {
            let token = URL_TOKEN.find(piece)?.as_str();
            let token = token.trim_end_matches(['.', ',', ';', ':', '!', '?', ')', ']', '*']);
            Url::parse(token).ok().map(|_| token.to_string())
        })
        .take(riskwatch_common::MAX_SOURCE_URLS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{category_block, well_formed_answer};

    #[test]
    fn no_marker_yields_nothing() {
        assert!(extract("free text with no markers").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn well_formed_record_has_all_four_categories() {
        let raw = well_formed_answer("Acme Corp", [2, 3, 4, 5]);
        let records = extract(&raw);
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.entity_name(), "Acme Corp");
        assert_eq!(record.categories_parsed(), 4);
        let scores: Vec<u32> = record.categories().iter().map(|c| c.score()).collect();
        assert_eq!(scores, vec![2, 3, 4, 5]);

        let margin = record.category(Category::MarginPressure);
        assert_eq!(
            margin.evidence_points(),
            &["Evidence one for situation 3 is detailed", "Evidence two for situation 3 is detailed"]
        );
        assert_eq!(
            margin.source_urls(),
            &["https://news.example.com/s3/a", "https://news.example.com/s3/b"]
        );
    }

    #[test]
    fn malformed_category_degrades_alone() {
        let mut raw = String::from("---COMPANY START---\nCompany: Beta Ltd\n");
        raw.push_str(&category_block(1, 4));
        raw.push_str("SITUATION 2: Supply Chain Disruption\nKey Signals:\n- Port closures delayed several shipments\nEvidence Links:\n- https://example.com/x\n");
        raw.push_str(&category_block(3, 2));
        raw.push_str(&category_block(4, 5));
        raw.push_str("---COMPANY END---\n");

        let records = extract(&raw);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        let supply = record.category(Category::SupplyChainDisruption);
        assert_eq!(supply.score(), 0);
        assert!(supply.evidence_points().is_empty());
        assert!(supply.source_urls().is_empty());
        for category in [Category::ResourceConstraints, Category::MarginPressure, Category::SignificantGrowth] {
            let result = record.category(category);
            assert!(result.is_set(), "{category} should be set");
            assert_eq!(result.evidence_points().len(), 2);
            assert_eq!(result.source_urls().len(), 2);
        }
    }

    #[test]
    fn missing_category_does_not_absorb_neighbor() {
        let mut raw = String::from("---COMPANY START---\nCompany: Gamma\n");
        raw.push_str(&category_block(1, 3));
        raw.push_str(&category_block(3, 4));
        let records = extract(&raw);
        let record = &records[0];
        assert_eq!(record.category(Category::SupplyChainDisruption).score(), 0);
        assert_eq!(record.category(Category::MarginPressure).score(), 4);
        assert_eq!(
            record.category(Category::MarginPressure).source_urls()[0],
            "https://news.example.com/s3/a"
        );
        assert_eq!(record.category(Category::SignificantGrowth).score(), 0);
    }

    #[test]
    fn segment_without_name_is_skipped() {
        let raw = format!(
            "preamble\n{RECORD_START}\nNo name here\n{}{RECORD_END}\n{}",
            category_block(1, 3),
            well_formed_answer("Delta", [1, 1, 1, 1])
        );
        let report = extract_report(&raw);
        assert_eq!(report.segments_seen, 2);
        assert_eq!(report.segments_skipped, 1);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].entity_name(), "Delta");
    }

    #[test]
    fn records_keep_input_order_and_tolerate_missing_end_marker() {
        let raw = format!(
            "{RECORD_START}\nCompany: Zulu\n{}{RECORD_START}\ncompany: **Alpha**\n{}",
            category_block(1, 2),
            category_block(1, 5)
        );
        let names: Vec<String> = extract(&raw).iter().map(|r| r.entity_name().to_string()).collect();
        assert_eq!(names, vec!["Zulu", "Alpha"]);
    }

    #[test]
    fn name_only_record_survives_with_everything_unset() {
        let records = extract("---COMPANY START---\nCompany: Echo\nNothing useful.\n---COMPANY END---");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].categories_parsed(), 0);
    }

    #[test]
    fn name_line_tolerates_list_decoration() {
        for line in ["- Company: Acme", "1. Company: Acme", "> **Company:** Acme", "**Company**: Acme  "] {
            let raw = format!("{RECORD_START}\n{line}\n{}", category_block(1, 3));
            let records = extract(&raw);
            assert_eq!(records.len(), 1, "{line}");
            assert_eq!(records[0].entity_name(), "Acme", "{line}");
        }
    }

    #[test]
    fn name_may_contain_asterisks() {
        let raw = format!("{RECORD_START}\nCompany: AT*T Inc\n{}", category_block(1, 3));
        assert_eq!(extract(&raw)[0].entity_name(), "AT*T Inc");
    }

    #[test]
    fn blank_name_line_falls_through_to_next() {
        let raw = format!("{RECORD_START}\nCompany: **\nCompany: Kilo\n");
        assert_eq!(extract(&raw)[0].entity_name(), "Kilo");
    }

    #[test]
    fn decorated_headers_still_bound_categories() {
        for prefix in ["- ", "1. ", "### "] {
            let raw = format!(
                "{RECORD_START}\nCompany: Lima\n{prefix}{}{prefix}{}",
                category_block(1, 4),
                category_block(2, 2)
            );
            let record = &extract(&raw)[0];
            assert_eq!(record.category(Category::ResourceConstraints).score(), 4, "{prefix:?}");
            assert_eq!(record.category(Category::SupplyChainDisruption).score(), 2, "{prefix:?}");
            assert_eq!(record.category(Category::ResourceConstraints).source_urls().len(), 2);
        }
    }

    #[test]
    fn evidence_sentence_starting_with_sources_is_not_a_label() {
        let raw = "---COMPANY START---\nCompany: Mike\nSITUATION 1: Resource Constraints\nScore: 4\nKey Signals:\n- Sources close to management confirm layoffs\n- Hiring freeze extended into the second half\nEvidence Links:\n- https://example.com/layoffs\n";
        let result = extract(raw)[0].category(Category::ResourceConstraints).clone();
        assert_eq!(
            result.evidence_points(),
            &["Sources close to management confirm layoffs", "Hiring freeze extended into the second half"]
        );
        assert_eq!(result.source_urls(), &["https://example.com/layoffs"]);
    }

    #[test]
    fn url_on_sources_label_line_is_kept() {
        let raw = "---COMPANY START---\nCompany: November\nSITUATION 3: Margin Pressure\nScore: 3\nKey Points:\n- Freight rates fell for a third month\nSources: https://example.com/rates\n";
        let result = extract(raw)[0].category(Category::MarginPressure).clone();
        assert_eq!(result.source_urls(), &["https://example.com/rates"]);
    }

    #[test]
    fn out_of_rubric_score_passes_through() {
        let raw = format!("{RECORD_START}\nCompany: Foxtrot\n{}", category_block(1, 7));
        let record = &extract(&raw)[0];
        let result = record.category(Category::ResourceConstraints);
        assert_eq!(result.score(), 7);
        assert!(!result.in_rubric());
    }

    #[test]
    fn text_after_end_marker_is_ignored() {
        let raw = format!(
            "{RECORD_START}\nCompany: Golf\n{RECORD_END}\n{}",
            category_block(1, 4)
        );
        assert_eq!(extract(&raw)[0].categories_parsed(), 0);
    }

    #[test]
    fn short_bullets_are_not_evidence() {
        let points = evidence_points("- too short\n* Hiring freeze announced in Q3\n\n• ok\n1. Plant closure reported by local press");
        assert_eq!(
            points,
            vec!["Hiring freeze announced in Q3", "Plant closure reported by local press"]
        );
    }

    #[test]
    fn evidence_capped_at_three_in_order() {
        let block: String = (1..=5).map(|i| format!("- Evidence point number {i}\n")).collect();
        let points = evidence_points(&block);
        assert_eq!(points.len(), 3);
        assert_eq!(points[2], "Evidence point number 3");
    }

    #[test]
    fn sources_split_on_pipes_and_trim_punctuation() {
        let urls = source_urls(
            "https://a.example.com/one. | see https://b.example.com/two),\n- not a url\n- https://c.example.com/3\n- https://d.example.com/4",
        );
        assert_eq!(
            urls,
            vec!["https://a.example.com/one", "https://b.example.com/two", "https://c.example.com/3"]
        );
    }

    #[test]
    fn alternate_labels_are_recognized() {
        let raw = "---COMPANY START---\nCompany: Hotel\nSITUATION 4: Significant Growth\nScore: 4\nKey Points:\n- Opened two new distribution centres\nSources:\n- https://example.org/growth\n";
        let result = extract(raw)[0].category(Category::SignificantGrowth).clone();
        assert_eq!(result.score(), 4);
        assert_eq!(result.evidence_points(), &["Opened two new distribution centres"]);
        assert_eq!(result.source_urls(), &["https://example.org/growth"]);
    }

    #[test]
    fn bare_labels_are_tried_after_labeled_shape() {
        let raw = "---COMPANY START---\nCompany: India\nSITUATION 1: Resource Constraints\nScore: 2\nEvidence: \n- Warehouse staffing shortfall reported\nLinks:\n- https://example.net/staff\n";
        let result = extract(raw)[0].category(Category::ResourceConstraints).clone();
        assert_eq!(result.score(), 2);
        assert_eq!(result.source_urls(), &["https://example.net/staff"]);
    }
}
