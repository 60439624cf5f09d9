//! The feature order shared by the scaler, the model and the adapter.
//!
//! The artifacts were fitted on columns in exactly this order. Nothing in a
//! plain coefficient vector can reveal a reordering, so artifacts that carry
//! metadata are checked against it at load time.

use serde::Deserialize;
use tracing::warn;

use crate::error::{Result, ScoreError};

pub const FEATURE_COUNT: usize = 5;

/// A feature vector in [`FEATURE_SCHEMA`] order.
pub type FeatureVector = [f64; FEATURE_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    pub version: u32,
    pub names: [&'static str; FEATURE_COUNT],
}

pub const FEATURE_SCHEMA: FeatureSchema = FeatureSchema {
    version: 1,
    names: [
        "NU_MEDIA_CN",
        "NU_MEDIA_CH",
        "NU_MEDIA_LP",
        "NU_MEDIA_MT",
        "NU_MEDIA_RED",
    ],
};

/// Optional provenance stored alongside a serialized scaler or model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl ArtifactMetadata {
    /// Verifies the metadata against `schema`. Missing metadata is accepted
    /// with a warning since older artifacts were saved without it.
    pub fn check(&self, name: &str, schema: &FeatureSchema) -> Result<()> {
        let mismatch = |reason: String| ScoreError::FeatureSchemaMismatch {
            name: name.to_string(),
            reason,
        };

        match self.schema_version {
            Some(v) if v != schema.version => {
                return Err(mismatch(format!(
                    "schema version {v}, expected {}",
                    schema.version
                )));
            }
            Some(_) => {}
            None => warn!(artifact = name, "Artifact has no schema version"),
        }

        match &self.feature_names {
            Some(names) if names.iter().map(String::as_str).ne(schema.names) => {
                Err(mismatch(format!(
                    "feature order [{}], expected [{}]",
                    names.join(", "),
                    schema.names.join(", ")
                )))
            }
            Some(_) => Ok(()),
            None => {
                warn!(artifact = name, "Artifact has no feature names, assuming schema order");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Option<Vec<String>> {
        Some(list.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_matching_metadata_passes() {
        let meta = ArtifactMetadata {
            schema_version: Some(1),
            feature_names: names(&FEATURE_SCHEMA.names),
        };
        assert!(meta.check("model", &FEATURE_SCHEMA).is_ok());
    }

    #[test]
    fn test_absent_metadata_passes() {
        assert!(ArtifactMetadata::default().check("model", &FEATURE_SCHEMA).is_ok());
    }

    #[test]
    fn test_reordered_features_fail() {
        let meta = ArtifactMetadata {
            schema_version: Some(1),
            feature_names: names(&[
                "NU_MEDIA_CH",
                "NU_MEDIA_CN",
                "NU_MEDIA_LP",
                "NU_MEDIA_MT",
                "NU_MEDIA_RED",
            ]),
        };
        let err = meta.check("scaler", &FEATURE_SCHEMA).unwrap_err();
        assert_eq!(err.kind(), "feature_schema_mismatch");
    }

    #[test]
    fn test_missing_feature_fails() {
        let meta = ArtifactMetadata {
            schema_version: None,
            feature_names: names(&["NU_MEDIA_CN", "NU_MEDIA_CH"]),
        };
        assert!(meta.check("scaler", &FEATURE_SCHEMA).is_err());
    }

    #[test]
    fn test_other_version_fails() {
        let meta = ArtifactMetadata {
            schema_version: Some(2),
            feature_names: None,
        };
        let err = meta.check("model", &FEATURE_SCHEMA).unwrap_err();
        assert!(err.to_string().contains("schema version 2"));
    }
}
