use tracing::{debug, info};

use crate::analyzers::types::{
    ClassifiedRecord, DropTally, Rates, SanitizedRecord, SchoolRecord, SubjectScores,
};

/// Inclusive bounds of every rate field.
pub const RATE_MIN: f64 = 0.0;
pub const RATE_MAX: f64 = 100.0;

/// Why a row did not survive sanitization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Unclassified,
    MissingField,
    RateOutOfRange,
}

/// Filters classified records down to the ones usable for statistics.
///
/// Dropping is the expected outcome for dirty rows and never an error.
pub fn sanitize(records: Vec<ClassifiedRecord>) -> Vec<SanitizedRecord> {
    sanitize_with_tally(records).0
}

/// Like [`sanitize`], also counting dropped rows per reason.
pub fn sanitize_with_tally(records: Vec<ClassifiedRecord>) -> (Vec<SanitizedRecord>, DropTally) {
    let total = records.len();
    let mut tally = DropTally::default();
    let mut kept = Vec::with_capacity(total);

    for classified in records {
        match check(classified) {
            Ok(record) => kept.push(record),
            Err(DropReason::Unclassified) => tally.unclassified += 1,
            Err(DropReason::MissingField) => tally.missing_field += 1,
            Err(DropReason::RateOutOfRange) => tally.rate_out_of_range += 1,
        }
    }

    info!(
        total,
        kept = kept.len(),
        unclassified = tally.unclassified,
        missing_field = tally.missing_field,
        rate_out_of_range = tally.rate_out_of_range,
        "Dataset sanitized"
    );

    (kept, tally)
}

/// Applies the three predicates in order and builds the sanitized record.
pub fn check(classified: ClassifiedRecord) -> Result<SanitizedRecord, DropReason> {
    let ClassifiedRecord { category, record } = classified;

    if !category.is_selectable() {
        return Err(DropReason::Unclassified);
    }

    let (subjects, rates) = complete_fields(&record).ok_or(DropReason::MissingField)?;

    if let Some(bad) = rates.as_array().into_iter().find(|r| !rate_in_range(*r)) {
        debug!(category = %category, rate = bad, "Dropping record with out-of-range rate");
        return Err(DropReason::RateOutOfRange);
    }

    Ok(SanitizedRecord {
        category,
        subjects,
        rates,
        source: record,
    })
}

pub fn rate_in_range(rate: f64) -> bool {
    (RATE_MIN..=RATE_MAX).contains(&rate)
}

/// NaN is treated as absent.
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

fn complete_fields(record: &SchoolRecord) -> Option<(SubjectScores, Rates)> {
    let subjects = SubjectScores {
        science_nature: present(record.mean_science_nature)?,
        human_sciences: present(record.mean_human_sciences)?,
        languages: present(record.mean_languages)?,
        math: present(record.mean_math)?,
        essay: present(record.mean_essay)?,
    };
    let rates = Rates {
        approval: present(record.approval_rate)?,
        failure: present(record.failure_rate)?,
        dropout: present(record.dropout_rate)?,
        retention: present(record.retention_rate)?,
    };
    Some((subjects, rates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::Category;

    #[test]
    fn test_valid_record_survives_unchanged() {
        let raw = complete_record();
        let kept = sanitize(vec![classified(Category::State, raw.clone())]);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].category, Category::State);
        assert_eq!(kept[0].source(), &raw);
        assert_eq!(kept[0].rates.approval, 90.0);
        assert_eq!(kept[0].subjects.essay, 600.0);
    }

    #[test]
    fn test_other_is_dropped() {
        let (kept, tally) = sanitize_with_tally(vec![classified(Category::Other, complete_record())]);
        assert!(kept.is_empty());
        assert_eq!(tally.unclassified, 1);
    }

    #[test]
    fn test_missing_subject_is_dropped_not_zeroed() {
        let mut raw = complete_record();
        raw.mean_essay = None;
        let (kept, tally) = sanitize_with_tally(vec![classified(Category::Federal, raw)]);
        assert!(kept.is_empty());
        assert_eq!(tally.missing_field, 1);
    }

    #[test]
    fn test_missing_rate_is_dropped() {
        let mut raw = complete_record();
        raw.retention_rate = None;
        assert!(sanitize(vec![classified(Category::Federal, raw)]).is_empty());
    }

    #[test]
    fn test_approval_above_100_is_dropped() {
        let mut raw = complete_record();
        raw.approval_rate = Some(105.0);
        let (kept, tally) = sanitize_with_tally(vec![classified(Category::Private, raw)]);
        assert!(kept.is_empty());
        assert_eq!(tally.rate_out_of_range, 1);
    }

    #[test]
    fn test_negative_rate_is_dropped() {
        let mut raw = complete_record();
        raw.dropout_rate = Some(-0.5);
        assert!(sanitize(vec![classified(Category::Private, raw)]).is_empty());
    }

    #[test]
    fn test_nan_rate_is_dropped_as_missing() {
        let mut raw = complete_record();
        raw.failure_rate = Some(f64::NAN);
        let (kept, tally) = sanitize_with_tally(vec![classified(Category::Rural, raw)]);
        assert!(kept.is_empty());
        assert_eq!(tally.missing_field, 1);
        assert_eq!(tally.rate_out_of_range, 0);
    }

    #[test]
    fn test_nan_subject_is_dropped_as_missing() {
        let mut raw = complete_record();
        raw.mean_science_nature = Some(f64::NAN);
        let (kept, tally) = sanitize_with_tally(vec![classified(Category::Private, raw)]);
        assert!(kept.is_empty());
        assert_eq!(tally.missing_field, 1);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut raw = complete_record();
        raw.approval_rate = Some(100.0);
        raw.failure_rate = Some(0.0);
        raw.dropout_rate = Some(0.0);
        raw.retention_rate = Some(0.0);
        assert_eq!(sanitize(vec![classified(Category::Rural, raw)]).len(), 1);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let mut out_of_range = complete_record();
        out_of_range.failure_rate = Some(150.0);
        let input = vec![
            classified(Category::Federal, complete_record()),
            classified(Category::Other, complete_record()),
            classified(Category::State, out_of_range),
            classified(Category::Rural, complete_record()),
        ];

        let once = sanitize(input);
        let twice = sanitize(once.iter().map(SanitizedRecord::to_classified).collect());

        assert_eq!(once.len(), 2);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sanitized_records_hold_invariant() {
        let mut records = Vec::new();
        for (i, rate) in [-1.0, 0.0, 50.0, 100.0, 100.01].into_iter().enumerate() {
            let mut raw = complete_record();
            raw.retention_rate = Some(rate);
            if i == 2 {
                raw.mean_math = None;
            }
            records.push(classified(Category::Federal, raw));
        }

        for record in sanitize(records) {
            assert!(record.rates.as_array().iter().all(|r| rate_in_range(*r)));
            assert!(record.category.is_selectable());
        }
    }

    fn classified(category: Category, record: SchoolRecord) -> ClassifiedRecord {
        ClassifiedRecord { category, record }
    }

    fn complete_record() -> SchoolRecord {
        SchoolRecord {
            location_code: Some(1),
            admin_dependency_code: Some(2),
            mean_science_nature: Some(500.0),
            mean_human_sciences: Some(550.0),
            mean_languages: Some(520.0),
            mean_math: Some(530.0),
            mean_essay: Some(600.0),
            approval_rate: Some(90.0),
            failure_rate: Some(6.0),
            dropout_rate: Some(4.0),
            retention_rate: Some(10.0),
        }
    }
}
