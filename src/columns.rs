//! Raw column names for every field the pipeline reads.
//!
//! Defaults are the headers of the school exam microdata. A JSON file can
//! override any subset of them:
//! ```json
//! {
//!   "location_code": "TP_LOCALIZACAO",
//!   "approval_rate": "TX_APROV"
//! }
//! ```

use serde::Deserialize;

use crate::error::{Result, ScoreError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMap {
    pub location_code: String,
    pub admin_dependency_code: String,
    pub mean_science_nature: String,
    pub mean_human_sciences: String,
    pub mean_languages: String,
    pub mean_math: String,
    pub mean_essay: String,
    pub approval_rate: String,
    pub failure_rate: String,
    pub dropout_rate: String,
    pub retention_rate: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            location_code: "TP_LOCALIZACAO_ESCOLA".into(),
            admin_dependency_code: "TP_DEPENDENCIA_ADM_ESCOLA".into(),
            mean_science_nature: "NU_MEDIA_CN".into(),
            mean_human_sciences: "NU_MEDIA_CH".into(),
            mean_languages: "NU_MEDIA_LP".into(),
            mean_math: "NU_MEDIA_MT".into(),
            mean_essay: "NU_MEDIA_RED".into(),
            approval_rate: "NU_TAXA_APROVACAO".into(),
            failure_rate: "NU_TAXA_REPROVACAO".into(),
            dropout_rate: "NU_TAXA_ABANDONO".into(),
            retention_rate: "NU_TAXA_PERMANENCIA".into(),
        }
    }
}

impl ColumnMap {
    /// Loads overrides from a JSON file at `path`; unspecified fields keep
    /// their defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScoreError::DatasetUnavailable(format!("column map {path}: {e}")))?;
        Self::from_json(&content)
            .map_err(|e| ScoreError::DatasetUnavailable(format!("column map {path}: {e}")))
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// All required column names, in a fixed order matching [`crate::parser`].
    pub fn required(&self) -> [&str; 11] {
        [
            &self.location_code,
            &self.admin_dependency_code,
            &self.mean_science_nature,
            &self.mean_human_sciences,
            &self.mean_languages,
            &self.mean_math,
            &self.mean_essay,
            &self.approval_rate,
            &self.failure_rate,
            &self.dropout_rate,
            &self.retention_rate,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_microdata_headers() {
        let map = ColumnMap::default();
        assert_eq!(map.location_code, "TP_LOCALIZACAO_ESCOLA");
        assert_eq!(map.mean_essay, "NU_MEDIA_RED");
        assert_eq!(map.required().len(), 11);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let map = ColumnMap::from_json(r#"{"approval_rate": "TX_APROV"}"#).unwrap();
        assert_eq!(map.approval_rate, "TX_APROV");
        assert_eq!(map.failure_rate, "NU_TAXA_REPROVACAO");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(ColumnMap::from_json(r#"{"approval": "X"}"#).is_err());
    }

    #[test]
    fn test_load_missing_file_is_dataset_error() {
        let err = ColumnMap::load("/nonexistent/columns.json").unwrap_err();
        assert_eq!(err.kind(), "dataset_unavailable");
    }
}
