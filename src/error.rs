//! Error taxonomy shared by the pipeline, the inference adapter and the CLI.
//!
//! Dropped dataset rows are not errors and never surface here.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScoreError>;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("invalid category '{0}': expected one of Federal, State, Private, Rural")]
    InvalidCategory(String),

    #[error("invalid numeric input for {field}: '{value}' is not a finite number")]
    InvalidNumericInput { field: String, value: String },

    #[error("invalid input: feature {feature} is not finite ({value})")]
    InvalidInput { feature: &'static str, value: f64 },

    #[error("artifact unavailable: {name}: {reason}")]
    ArtifactUnavailable { name: String, reason: String },

    #[error("feature schema mismatch in {name}: {reason}")]
    FeatureSchemaMismatch { name: String, reason: String },

    #[error("inference failure: {0}")]
    InferenceFailure(String),

    #[error("dataset unavailable: {0}")]
    DatasetUnavailable(String),
}

impl ScoreError {
    /// Stable tag for the failure kind, independent of the message text.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoreError::InvalidCategory(_) => "invalid_category",
            ScoreError::InvalidNumericInput { .. } => "invalid_numeric_input",
            ScoreError::InvalidInput { .. } => "invalid_input",
            ScoreError::ArtifactUnavailable { .. } => "artifact_unavailable",
            ScoreError::FeatureSchemaMismatch { .. } => "feature_schema_mismatch",
            ScoreError::InferenceFailure(_) => "inference_failure",
            ScoreError::DatasetUnavailable(_) => "dataset_unavailable",
        }
    }

    pub(crate) fn artifact(name: &str, reason: impl ToString) -> Self {
        ScoreError::ArtifactUnavailable {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<csv::Error> for ScoreError {
    fn from(err: csv::Error) -> Self {
        ScoreError::DatasetUnavailable(err.to_string())
    }
}
