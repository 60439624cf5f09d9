//! Score prediction from five subject averages.
//!
//! [`InferenceAdapter`] owns its scaler and model, so tests can substitute
//! doubles for the serialized artifacts. The feature vector is always built
//! in [`schema::FEATURE_SCHEMA`] order.

pub mod artifact;
pub mod model;
pub mod scaler;
pub mod schema;

use tracing::debug;

use crate::error::{Result, ScoreError};
use model::ScoreModel;
use scaler::FeatureScaler;
use schema::{FEATURE_SCHEMA, FeatureVector};

/// The five subject averages of one prediction request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionInput {
    pub science_nature: f64,
    pub human_sciences: f64,
    pub languages: f64,
    pub math: f64,
    pub essay: f64,
}

impl PredictionInput {
    /// Parses the raw text of each score. The field names in errors are the
    /// user-facing ones.
    pub fn parse(
        science_nature: &str,
        human_sciences: &str,
        languages: &str,
        math: &str,
        essay: &str,
    ) -> Result<Self> {
        Ok(Self {
            science_nature: parse_score("science", science_nature)?,
            human_sciences: parse_score("humanities", human_sciences)?,
            languages: parse_score("languages", languages)?,
            math: parse_score("math", math)?,
            essay: parse_score("essay", essay)?,
        })
    }

    /// Load-bearing: must match the column order the artifacts were fitted on.
    pub fn to_features(&self) -> FeatureVector {
        [
            self.science_nature,
            self.human_sciences,
            self.languages,
            self.math,
            self.essay,
        ]
    }
}

/// Parses one score, rejecting anything that is not a finite number.
pub fn parse_score(field: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ScoreError::InvalidNumericInput {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

pub struct InferenceAdapter<S, M> {
    scaler: S,
    model: M,
}

impl<S: FeatureScaler, M: ScoreModel> InferenceAdapter<S, M> {
    pub fn new(scaler: S, model: M) -> Self {
        Self { scaler, model }
    }

    /// Scales the five averages and runs the model. The score is returned
    /// unrounded.
    ///
    /// # Errors
    ///
    /// [`ScoreError::InvalidInput`] if any value is NaN or infinite, without
    /// touching the scaler or model. Scaler or model errors pass through as
    /// [`ScoreError::InferenceFailure`].
    pub fn predict(&self, cn: f64, ch: f64, lp: f64, mt: f64, red: f64) -> Result<f64> {
        self.predict_input(&PredictionInput {
            science_nature: cn,
            human_sciences: ch,
            languages: lp,
            math: mt,
            essay: red,
        })
    }

    pub fn predict_input(&self, input: &PredictionInput) -> Result<f64> {
        let features = input.to_features();

        for (value, feature) in features.iter().zip(FEATURE_SCHEMA.names) {
            if !value.is_finite() {
                return Err(ScoreError::InvalidInput {
                    feature,
                    value: *value,
                });
            }
        }

        let scaled = self.scaler.transform(&features)?;
        let score = self.model.predict(&scaled)?;
        debug!(?features, ?scaled, score, "Prediction computed");
        Ok(score)
    }
}
