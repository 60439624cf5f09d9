//! Combines the prediction and the cohort statistics into one report.

use serde::Serialize;

use crate::analyzers::types::{Category, CohortRates, CohortStatistics, DropTally};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub category: Category,
    pub predicted_score: f64,
    /// `None` when the selected category has no sanitized records.
    pub selected: Option<CohortRates>,
    /// Every cohort, for the comparative chart.
    pub table: CohortStatistics,
    pub dropped: Option<DropTally>,
}

/// Pairs the predicted score with the selected cohort and the full table.
pub fn assemble(category: Category, stats: &CohortStatistics, predicted_score: f64) -> Report {
    Report {
        category,
        predicted_score,
        selected: stats.get(category).copied(),
        table: stats.clone(),
        dropped: None,
    }
}

impl Report {
    /// Attach the sanitizer's drop counts.
    pub fn with_data_quality(mut self, tally: DropTally) -> Self {
        self.dropped = Some(tally);
        self
    }
}
