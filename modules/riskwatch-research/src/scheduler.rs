use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use riskwatch_common::RotationConfig;

/// Maps a point in time (or an explicit index) to a stable, cyclic batch of entities.
///
/// Batches are 1-based. With `n` entities and batch size `b` there are
/// `ceil(n / b)` batches (at least 1); index `total + 1` wraps back to 1.
#[derive(Debug, Clone)]
pub struct RotationScheduler {
    batch_size: usize,
    anchor_date: NaiveDate,
}

/// Result of scheduling: which batch this run covers and its entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSelection<'a> {
    /// Resolved 1-based batch index.
    pub index: usize,
    pub total_batches: usize,
    /// Contiguous slice of the master list, order preserved. Empty only when
    /// the master list is empty.
    pub entities: &'a [String],
}

impl RotationScheduler {
    pub fn new(batch_size: usize, anchor_date: NaiveDate) -> Self {
        Self {
            batch_size: batch_size.max(1),
            anchor_date,
        }
    }

    pub fn from_config(config: &RotationConfig) -> Self {
        Self::new(config.batch_size, config.anchor_date)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn total_batches(&self, entity_count: usize) -> usize {
        entity_count.div_ceil(self.batch_size).max(1)
    }

    /// Resolve the batch index. `requested` of `None` or `Some(0)` derives it
    /// from the weeks elapsed since the anchor date; any other value is wrapped
    /// into `1..=total_batches`.
    pub fn resolve_index(
        &self,
        requested: Option<usize>,
        entity_count: usize,
        now: DateTime<Utc>,
    ) -> usize {
        let total = self.total_batches(entity_count);
        match requested {
            Some(index) if index > 0 => (index - 1) % total + 1,
            _ => {
                let weeks = weeks_elapsed(self.anchor_date, now);
                weeks.rem_euclid(total as i64) as usize + 1
            }
        }
    }

    pub fn select<'a>(
        &self,
        entities: &'a [String],
        requested: Option<usize>,
        now: DateTime<Utc>,
    ) -> BatchSelection<'a> {
        let total_batches = self.total_batches(entities.len());
        let index = self.resolve_index(requested, entities.len(), now);

        let start = ((index - 1) * self.batch_size).min(entities.len());
        let end = (start + self.batch_size).min(entities.len());

        info!(
            batch = index,
            total_batches,
            entities = end - start,
            derived = !matches!(requested, Some(i) if i > 0),
            "Batch selected"
        );

        BatchSelection {
            index,
            total_batches,
            entities: &entities[start..end],
        }
    }
}

/// Whole weeks between the anchor date and `now` (UTC), floored. Negative
/// before the anchor.
pub fn weeks_elapsed(anchor: NaiveDate, now: DateTime<Utc>) -> i64 {
    let days = (now.date_naive() - anchor).num_days();
    days.div_euclid(7)
}
