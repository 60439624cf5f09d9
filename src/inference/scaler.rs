use serde::Deserialize;

use crate::error::{Result, ScoreError};
use crate::inference::schema::{ArtifactMetadata, FEATURE_COUNT, FeatureVector};

/// Maps a raw feature vector onto the scale the model was trained on.
pub trait FeatureScaler {
    fn transform(&self, features: &FeatureVector) -> Result<FeatureVector>;
}

/// A fitted scaler as stored on disk, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    MinMax(MinMaxScaler),
    Standard(StandardScaler),
}

impl ScalerArtifact {
    pub fn metadata(&self) -> &ArtifactMetadata {
        match self {
            ScalerArtifact::MinMax(s) => &s.metadata,
            ScalerArtifact::Standard(s) => &s.metadata,
        }
    }

    /// Checks vector lengths and finiteness of the fitted statistics.
    pub fn validate(&self, name: &str) -> Result<()> {
        match self {
            ScalerArtifact::MinMax(s) => {
                check_fitted(name, "data_min", &s.data_min)?;
                check_fitted(name, "data_max", &s.data_max)?;
                let (lo, hi) = s.feature_range;
                if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                    return Err(ScoreError::artifact(
                        name,
                        format!("invalid feature_range ({lo}, {hi})"),
                    ));
                }
                Ok(())
            }
            ScalerArtifact::Standard(s) => {
                check_fitted(name, "mean", &s.mean)?;
                check_fitted(name, "scale", &s.scale)
            }
        }
    }
}

impl FeatureScaler for ScalerArtifact {
    fn transform(&self, features: &FeatureVector) -> Result<FeatureVector> {
        match self {
            ScalerArtifact::MinMax(s) => s.transform(features),
            ScalerArtifact::Standard(s) => s.transform(features),
        }
    }
}

/// Rescales each feature linearly so the fitted `[data_min, data_max]` maps
/// onto `feature_range`. Constant features scale by 1.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MinMaxScaler {
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
    #[serde(default = "unit_range")]
    pub feature_range: (f64, f64),
    #[serde(flatten)]
    pub metadata: ArtifactMetadata,
}

fn unit_range() -> (f64, f64) {
    (0.0, 1.0)
}

impl FeatureScaler for MinMaxScaler {
    fn transform(&self, features: &FeatureVector) -> Result<FeatureVector> {
        let (lo, hi) = self.feature_range;
        let mut out = [0.0; FEATURE_COUNT];

        for (i, x) in features.iter().enumerate() {
            let (min, max) = fitted_pair(&self.data_min, &self.data_max, i)?;
            let range = nonzero(max - min);
            let scale = (hi - lo) / range;
            out[i] = x * scale + lo - min * scale;
        }

        finite_output(out)
    }
}

/// Centers each feature on its fitted mean and divides by its fitted scale.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    #[serde(flatten)]
    pub metadata: ArtifactMetadata,
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: &FeatureVector) -> Result<FeatureVector> {
        let mut out = [0.0; FEATURE_COUNT];

        for (i, x) in features.iter().enumerate() {
            let (mean, scale) = fitted_pair(&self.mean, &self.scale, i)?;
            out[i] = (x - mean) / nonzero(scale);
        }

        finite_output(out)
    }
}

fn nonzero(v: f64) -> f64 {
    if v == 0.0 { 1.0 } else { v }
}

fn fitted_pair(a: &[f64], b: &[f64], i: usize) -> Result<(f64, f64)> {
    match (a.get(i), b.get(i)) {
        (Some(x), Some(y)) => Ok((*x, *y)),
        _ => Err(ScoreError::InferenceFailure(format!(
            "scaler has no statistics for feature {i}"
        ))),
    }
}

fn finite_output(out: FeatureVector) -> Result<FeatureVector> {
    match out.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ScoreError::InferenceFailure(format!(
            "scaler produced non-finite value for feature {i}"
        ))),
        None => Ok(out),
    }
}

fn check_fitted(name: &str, field: &str, values: &[f64]) -> Result<()> {
    if values.len() != FEATURE_COUNT {
        return Err(ScoreError::artifact(
            name,
            format!("{field} has {} values, expected {FEATURE_COUNT}", values.len()),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ScoreError::artifact(name, format!("{field} has non-finite values")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_min_max_maps_range_to_unit() {
        let scaler = min_max();
        let out = scaler.transform(&[0.0, 1000.0, 500.0, 250.0, 1000.0]).unwrap();
        let expected = [0.0, 1.0, 0.5, 0.25, 1.0];
        for (o, e) in out.iter().zip(expected) {
            assert!((o - e).abs() < EPS);
        }
    }

    #[test]
    fn test_min_max_custom_range_and_constant_feature() {
        let scaler = MinMaxScaler {
            data_min: vec![0.0, 0.0, 0.0, 0.0, 400.0],
            data_max: vec![10.0, 10.0, 10.0, 10.0, 400.0],
            feature_range: (-1.0, 1.0),
            metadata: ArtifactMetadata::default(),
        };
        let out = scaler.transform(&[5.0, 0.0, 10.0, 2.5, 400.0]).unwrap();
        assert!((out[0] - 0.0).abs() < EPS);
        assert!((out[1] + 1.0).abs() < EPS);
        assert!((out[2] - 1.0).abs() < EPS);
        assert!((out[3] + 0.5).abs() < EPS);
        // constant feature: (x - min) * 2 / 1 + lo
        assert!((out[4] + 1.0).abs() < EPS);
    }

    #[test]
    fn test_standard_scaler() {
        let scaler = StandardScaler {
            mean: vec![500.0; 5],
            scale: vec![100.0, 50.0, 25.0, 0.0, 10.0],
            metadata: ArtifactMetadata::default(),
        };
        let out = scaler.transform(&[600.0, 400.0, 550.0, 510.0, 500.0]).unwrap();
        assert_eq!(out, [1.0, -2.0, 2.0, 10.0, 0.0]);
    }

    #[test]
    fn test_deserialize_tagged_min_max() {
        let json = r#"{
            "kind": "min_max",
            "schema_version": 1,
            "feature_names": ["NU_MEDIA_CN", "NU_MEDIA_CH", "NU_MEDIA_LP", "NU_MEDIA_MT", "NU_MEDIA_RED"],
            "data_min": [0, 0, 0, 0, 0],
            "data_max": [1000, 1000, 1000, 1000, 1000]
        }"#;
        let artifact: ScalerArtifact = serde_json::from_str(json).unwrap();

        assert!(artifact.validate("scaler").is_ok());
        assert_eq!(artifact.metadata().schema_version, Some(1));
        let ScalerArtifact::MinMax(s) = &artifact else {
            panic!("expected min_max");
        };
        assert_eq!(s.feature_range, (0.0, 1.0));
    }

    #[test]
    fn test_validate_rejects_wrong_length() {
        let mut scaler = min_max();
        scaler.data_max.pop();
        let err = ScalerArtifact::MinMax(scaler).validate("scaler.json").unwrap_err();
        assert_eq!(err.kind(), "artifact_unavailable");
        assert!(err.to_string().contains("data_max has 4 values"));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut scaler = min_max();
        scaler.feature_range = (1.0, 0.0);
        assert!(ScalerArtifact::MinMax(scaler).validate("scaler").is_err());
    }

    #[test]
    fn test_short_statistics_fail_at_transform() {
        let scaler = StandardScaler {
            mean: vec![0.0; 3],
            scale: vec![1.0; 3],
            metadata: ArtifactMetadata::default(),
        };
        let err = scaler.transform(&[1.0; 5]).unwrap_err();
        assert_eq!(err.kind(), "inference_failure");
    }

    fn min_max() -> MinMaxScaler {
        MinMaxScaler {
            data_min: vec![0.0; 5],
            data_max: vec![1000.0; 5],
            feature_range: (0.0, 1.0),
            metadata: ArtifactMetadata::default(),
        }
    }
}
