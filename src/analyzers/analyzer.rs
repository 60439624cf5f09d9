use tracing::info;

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::classify::classify_all;
use crate::analyzers::sanitize::sanitize_with_tally;
use crate::analyzers::types::{CohortStatistics, DropTally};
use crate::error::{Result, ScoreError};
use crate::fetch::load_source;
use crate::parser::{DatasetOptions, parse_dataset};

/// Outcome of one pass over the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub rows: usize,
    pub stats: CohortStatistics,
    pub dropped: DropTally,
}

/// Parses, classifies, sanitizes and aggregates dataset bytes. The records
/// are dropped once the statistics exist.
pub fn analyze_bytes(bytes: &[u8], options: &DatasetOptions) -> Result<DatasetSummary> {
    let records = parse_dataset(bytes, options)?;
    let rows = records.len();

    let (sanitized, dropped) = sanitize_with_tally(classify_all(records));
    let stats = aggregate(&sanitized);

    info!(rows, kept = sanitized.len(), cohorts = stats.iter().count(), "Dataset analyzed");

    Ok(DatasetSummary {
        rows,
        stats,
        dropped,
    })
}

/// Loads the dataset from a path or URL and analyzes it.
pub async fn analyze(source: &str, options: &DatasetOptions) -> Result<DatasetSummary> {
    let bytes = load_source(source)
        .await
        .map_err(|e| ScoreError::DatasetUnavailable(format!("{source}: {e:#}")))?;
    analyze_bytes(&bytes, options)
}
