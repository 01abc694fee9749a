use std::fmt;

use serde::{Deserialize, Serialize};

/// Most evidence bullets kept per category.
pub const MAX_EVIDENCE_POINTS: usize = 3;
/// Most source URLs kept per category.
pub const MAX_SOURCE_URLS: usize = 3;
/// Score value meaning "not extracted".
pub const UNSET_SCORE: u32 = 0;
/// Inclusive bounds of the scoring rubric.
pub const RUBRIC_MIN: u32 = 1;
pub const RUBRIC_MAX: u32 = 5;

// =============================================================================
// Category
// =============================================================================

/// The four fixed analytical dimensions, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ResourceConstraints,
    SupplyChainDisruption,
    MarginPressure,
    SignificantGrowth,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::ResourceConstraints,
        Category::SupplyChainDisruption,
        Category::MarginPressure,
        Category::SignificantGrowth,
    ];

    /// 1-based ordinal used in the research answers ("SITUATION 2").
    pub fn ordinal(self) -> u32 {
        match self {
            Category::ResourceConstraints => 1,
            Category::SupplyChainDisruption => 2,
            Category::MarginPressure => 3,
            Category::SignificantGrowth => 4,
        }
    }

    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.ordinal() == ordinal)
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::ResourceConstraints => "Resource Constraints",
            Category::SupplyChainDisruption => "Supply Chain Disruption",
            Category::MarginPressure => "Margin Pressure",
            Category::SignificantGrowth => "Significant Growth",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Score bands
// =============================================================================

/// How a score should be presented downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// Nothing was extracted for the category.
    Unset,
    /// 1–2
    Low,
    /// 3
    Moderate,
    /// 4–5
    High,
    /// Extracted, but outside 1–5. Passed through uncorrected.
    OutOfRubric,
}

impl ScoreBand {
    pub fn of(score: u32) -> Self {
        match score {
            UNSET_SCORE => ScoreBand::Unset,
            1 | 2 => ScoreBand::Low,
            3 => ScoreBand::Moderate,
            4 | 5 => ScoreBand::High,
            _ => ScoreBand::OutOfRubric,
        }
    }
}

// =============================================================================
// CategoryResult
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    category: Category,
    score: u32,
    evidence_points: Vec<String>,
    source_urls: Vec<String>,
}

impl CategoryResult {
    /// The default for a category the extractor could not match.
    pub fn unset(category: Category) -> Self {
        Self {
            category,
            score: UNSET_SCORE,
            evidence_points: Vec::new(),
            source_urls: Vec::new(),
        }
    }

    /// Build an extracted result. Evidence and sources beyond the caps are dropped,
    /// keeping the first ones in order.
    pub fn extracted(
        category: Category,
        score: u32,
        mut evidence_points: Vec<String>,
        mut source_urls: Vec<String>,
    ) -> Self {
        evidence_points.truncate(MAX_EVIDENCE_POINTS);
        source_urls.truncate(MAX_SOURCE_URLS);
        Self {
            category,
            score,
            evidence_points,
            source_urls,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn evidence_points(&self) -> &[String] {
        &self.evidence_points
    }

    pub fn source_urls(&self) -> &[String] {
        &self.source_urls
    }

    pub fn is_set(&self) -> bool {
        self.score != UNSET_SCORE
    }

    pub fn in_rubric(&self) -> bool {
        (RUBRIC_MIN..=RUBRIC_MAX).contains(&self.score)
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::of(self.score)
    }
}

// =============================================================================
// AnalysisRecord
// =============================================================================

/// Structured research result for one entity: always exactly four categories
/// in `Category::ALL` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    entity_name: String,
    categories: [CategoryResult; 4],
}

impl AnalysisRecord {
    /// Returns `None` when the name is empty after trimming.
    pub fn new(entity_name: &str) -> Option<Self> {
        let entity_name = entity_name.trim();
        if entity_name.is_empty() {
            return None;
        }
        Some(Self {
            entity_name: entity_name.to_string(),
            categories: Category::ALL.map(CategoryResult::unset),
        })
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn categories(&self) -> &[CategoryResult; 4] {
        &self.categories
    }

    pub fn category(&self, category: Category) -> &CategoryResult {
        &self.categories[category.ordinal() as usize - 1]
    }

    /// Replace the slot matching `result.category()`.
    pub fn set(&mut self, result: CategoryResult) {
        let idx = result.category.ordinal() as usize - 1;
        self.categories[idx] = result;
    }

    /// Number of categories with an extracted score.
    pub fn categories_parsed(&self) -> usize {
        self.categories.iter().filter(|c| c.is_set()).count()
    }
}

// =============================================================================
// BatchOutcome
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEntity {
    pub entity: String,
    pub error: String,
}

/// Per-run tally of which entities produced research text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Entities whose research call succeeded, in processing order.
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedEntity>,
}

impl BatchOutcome {
    pub fn record_success(&mut self, entity: &str) {
        self.succeeded.push(entity.to_string());
    }

    pub fn record_failure(&mut self, entity: &str, error: impl Into<String>) {
        self.failed.push(FailedEntity {
            entity: entity.to_string(),
            error: error.into(),
        });
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// No entity succeeded. For a non-empty batch this is a fatal run failure.
    pub fn nothing_succeeded(&self) -> bool {
        self.succeeded.is_empty()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.entity.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_ordinals_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_ordinal(category.ordinal()), Some(category));
        }
        assert_eq!(Category::from_ordinal(0), None);
        assert_eq!(Category::from_ordinal(5), None);
    }

    #[test]
    fn record_rejects_blank_name() {
        assert!(AnalysisRecord::new("   ").is_none());
        assert_eq!(AnalysisRecord::new("  Acme Corp ").unwrap().entity_name(), "Acme Corp");
    }

    #[test]
    fn new_record_has_four_unset_categories_in_order() {
        let record = AnalysisRecord::new("Acme").unwrap();
        let order: Vec<Category> = record.categories().iter().map(|c| c.category()).collect();
        assert_eq!(order, Category::ALL.to_vec());
        assert_eq!(record.categories_parsed(), 0);
        assert!(record.categories().iter().all(|c| c.band() == ScoreBand::Unset));
    }

    #[test]
    fn extracted_result_enforces_caps() {
        let points: Vec<String> = (0..5).map(|i| format!("evidence point {i}")).collect();
        let urls: Vec<String> = (0..4).map(|i| format!("https://example.com/{i}")).collect();
        let result = CategoryResult::extracted(Category::MarginPressure, 4, points, urls);
        assert_eq!(result.evidence_points().len(), MAX_EVIDENCE_POINTS);
        assert_eq!(result.evidence_points()[0], "evidence point 0");
        assert_eq!(result.source_urls().len(), MAX_SOURCE_URLS);
        assert_eq!(result.source_urls()[2], "https://example.com/2");
    }

    #[test]
    fn set_replaces_matching_slot() {
        let mut record = AnalysisRecord::new("Acme").unwrap();
        record.set(CategoryResult::extracted(Category::MarginPressure, 3, vec![], vec![]));
        assert_eq!(record.category(Category::MarginPressure).score(), 3);
        assert_eq!(record.category(Category::ResourceConstraints).score(), UNSET_SCORE);
        assert_eq!(record.categories_parsed(), 1);
    }

    #[test]
    fn score_bands() {
        assert_eq!(ScoreBand::of(0), ScoreBand::Unset);
        assert_eq!(ScoreBand::of(2), ScoreBand::Low);
        assert_eq!(ScoreBand::of(3), ScoreBand::Moderate);
        assert_eq!(ScoreBand::of(5), ScoreBand::High);
        assert_eq!(ScoreBand::of(7), ScoreBand::OutOfRubric);
    }

    #[test]
    fn batch_outcome_tallies() {
        let mut outcome = BatchOutcome::default();
        assert!(outcome.nothing_succeeded());
        outcome.record_success("A");
        outcome.record_failure("B", "timeout");
        assert_eq!(outcome.attempted(), 2);
        assert!(!outcome.nothing_succeeded());
        assert_eq!(outcome.failed_names(), vec!["B"]);
    }

    #[test]
    fn record_serializes_category_labels() {
        let record = AnalysisRecord::new("Acme").unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["entity_name"], "Acme");
        assert_eq!(json["categories"][1]["category"], "supply_chain_disruption");
    }
}
