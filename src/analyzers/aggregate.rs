use crate::analyzers::types::{Category, CohortRates, CohortStatistics, SanitizedRecord};
use crate::analyzers::utility::mean;
use std::collections::BTreeMap;
use tracing::debug;

/// Per-field rate series of one cohort.
#[derive(Default)]
struct RateSeries {
    approval: Vec<f64>,
    failure: Vec<f64>,
    dropout: Vec<f64>,
    retention: Vec<f64>,
}

/// Groups sanitized records by category and averages each rate field
/// independently.
///
/// Means are kept at full precision. Categories without records get no
/// entry, so a lookup yields `None` instead of zero.
pub fn aggregate(sanitized: &[SanitizedRecord]) -> CohortStatistics {
    let mut series: BTreeMap<Category, RateSeries> = BTreeMap::new();

    for record in sanitized {
        let s = series.entry(record.category).or_default();
        s.approval.push(record.rates.approval);
        s.failure.push(record.rates.failure);
        s.dropout.push(record.rates.dropout);
        s.retention.push(record.rates.retention);
    }

    let mut cohorts = BTreeMap::new();

    for (category, s) in series {
        let (Some(approval), Some(failure), Some(dropout), Some(retention)) = (
            mean(&s.approval),
            mean(&s.failure),
            mean(&s.dropout),
            mean(&s.retention),
        ) else {
            continue;
        };

        debug!(category = %category, schools = s.approval.len(), "Cohort aggregated");

        cohorts.insert(
            category,
            CohortRates {
                schools: s.approval.len(),
                approval,
                failure,
                dropout,
                retention,
            },
        );
    }

    CohortStatistics { cohorts }
}
