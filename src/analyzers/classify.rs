use crate::analyzers::types::{Category, ClassifiedRecord, SchoolCodes, SchoolRecord};

/// `TP_LOCALIZACAO_ESCOLA` value for rural schools.
pub const RURAL_CODE: i64 = 2;
/// `TP_DEPENDENCIA_ADM_ESCOLA` values.
pub const FEDERAL_CODE: i64 = 1;
pub const STATE_CODE: i64 = 2;
pub const PRIVATE_CODE: i64 = 4;

/// Maps the categorical codes of a school to its [`Category`].
///
/// First match wins: a rural school is `Rural` whatever its dependency.
/// Missing or unknown codes (municipal schools included) give `Other`.
pub fn classify(codes: &SchoolCodes) -> Category {
    if codes.location_code == Some(RURAL_CODE) {
        return Category::Rural;
    }

    match codes.admin_dependency_code {
        Some(FEDERAL_CODE) => Category::Federal,
        Some(STATE_CODE) => Category::State,
        Some(PRIVATE_CODE) => Category::Private,
        _ => Category::Other,
    }
}

/// Attaches a category to every record.
pub fn classify_all(records: Vec<SchoolRecord>) -> Vec<ClassifiedRecord> {
    records
        .into_iter()
        .map(|record| ClassifiedRecord {
            category: classify(&record.codes()),
            record,
        })
        .collect()
}
