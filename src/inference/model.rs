use serde::Deserialize;

use crate::error::{Result, ScoreError};
use crate::inference::schema::{ArtifactMetadata, FEATURE_COUNT, FeatureVector};

/// Predicts a composite score from a scaled feature vector.
pub trait ScoreModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64>;
}

/// A trained model as stored on disk, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    Forest(ForestModel),
}

impl ModelArtifact {
    pub fn metadata(&self) -> &ArtifactMetadata {
        match self {
            ModelArtifact::Linear(m) => &m.metadata,
            ModelArtifact::Forest(m) => &m.metadata,
        }
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        match self {
            ModelArtifact::Linear(m) => {
                if m.coefficients.len() != FEATURE_COUNT {
                    return Err(ScoreError::artifact(
                        name,
                        format!(
                            "coefficients has {} values, expected {FEATURE_COUNT}",
                            m.coefficients.len()
                        ),
                    ));
                }
                if !m.intercept.is_finite() || m.coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ScoreError::artifact(name, "non-finite coefficients"));
                }
                Ok(())
            }
            ModelArtifact::Forest(m) => {
                if m.trees.is_empty() {
                    return Err(ScoreError::artifact(name, "forest has no trees"));
                }
                if let Some(i) = m.trees.iter().position(|t| t.nodes.is_empty()) {
                    return Err(ScoreError::artifact(name, format!("tree {i} has no nodes")));
                }
                Ok(())
            }
        }
    }
}

impl ScoreModel for ModelArtifact {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let score = match self {
            ModelArtifact::Linear(m) => m.predict(features)?,
            ModelArtifact::Forest(m) => m.predict(features)?,
        };
        if !score.is_finite() {
            return Err(ScoreError::InferenceFailure(format!(
                "model produced non-finite score {score}"
            )));
        }
        Ok(score)
    }
}

/// Ordinary least-squares style regressor: `intercept + coefficients · x`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinearModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(flatten)]
    pub metadata: ArtifactMetadata,
}

impl ScoreModel for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(ScoreError::InferenceFailure(format!(
                "model expects {} features, got {FEATURE_COUNT}",
                self.coefficients.len()
            )));
        }
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(c, x)| c * x)
            .sum();
        Ok(self.intercept + dot)
    }
}

/// Bagged regression trees; the prediction is the mean over trees.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForestModel {
    pub trees: Vec<Tree>,
    #[serde(flatten)]
    pub metadata: ArtifactMetadata,
}

/// A regression tree stored as a flat node array rooted at index 0.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

/// Split nodes send `x[feature] <= threshold` left.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Tree {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let mut idx = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return Ok(*value),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).ok_or_else(|| {
                        ScoreError::InferenceFailure(format!(
                            "split on feature {feature}, vector has {FEATURE_COUNT}"
                        ))
                    })?;
                    idx = if *x <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ScoreError::InferenceFailure(format!(
                        "node {idx} out of bounds ({} nodes)",
                        self.nodes.len()
                    )));
                }
            }
        }
        Err(ScoreError::InferenceFailure("tree has a cycle".into()))
    }
}

impl ScoreModel for ForestModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(ScoreError::InferenceFailure("forest has no trees".into()));
        }
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.predict(features)?;
        }
        Ok(total / self.trees.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_prediction() {
        let model = LinearModel {
            coefficients: vec![100.0, 200.0, 0.0, -50.0, 10.0],
            intercept: 400.0,
            metadata: ArtifactMetadata::default(),
        };
        let score = model.predict(&[0.5, 0.5, 0.9, 1.0, 1.0]).unwrap();
        assert!((score - 510.0).abs() < 1e-9);
    }

    #[test]
    fn test_forest_averages_trees() {
        let model = ForestModel {
            trees: vec![stump(0, 0.5, 400.0, 600.0), stump(3, 0.2, 450.0, 650.0)],
            metadata: ArtifactMetadata::default(),
        };
        // tree 0 goes left (0.5 <= 0.5), tree 1 goes right (0.3 > 0.2)
        let score = model.predict(&[0.5, 0.0, 0.0, 0.3, 0.0]).unwrap();
        assert!((score - 525.0).abs() < 1e-9);
    }

    #[test]
    fn test_forest_out_of_bounds_child_is_inference_failure() {
        let model = ForestModel {
            trees: vec![Tree {
                nodes: vec![Node::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 7,
                    right: 8,
                }],
            }],
            metadata: ArtifactMetadata::default(),
        };
        let err = model.predict(&[0.0; 5]).unwrap_err();
        assert_eq!(err.kind(), "inference_failure");
    }

    #[test]
    fn test_forest_bad_feature_index_is_inference_failure() {
        let model = ForestModel {
            trees: vec![stump(9, 0.0, 1.0, 2.0)],
            metadata: ArtifactMetadata::default(),
        };
        assert_eq!(model.predict(&[0.0; 5]).unwrap_err().kind(), "inference_failure");
    }

    #[test]
    fn test_cyclic_tree_is_inference_failure() {
        let tree = Tree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 1,
                    right: 1,
                },
                Node::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 0,
                    right: 0,
                },
            ],
        };
        assert!(tree.predict(&[0.0; 5]).is_err());
    }

    #[test]
    fn test_deserialize_forest() {
        let json = r#"{
            "kind": "forest",
            "trees": [
                {"nodes": [
                    {"feature": 4, "threshold": 0.6, "left": 1, "right": 2},
                    {"value": 480.0},
                    {"value": 620.0}
                ]}
            ]
        }"#;
        let model: ModelArtifact = serde_json::from_str(json).unwrap();
        assert!(model.validate("model").is_ok());
        assert_eq!(model.predict(&[0.0, 0.0, 0.0, 0.0, 0.7]).unwrap(), 620.0);
    }

    #[test]
    fn test_validate_rejects_short_coefficients() {
        let model = ModelArtifact::Linear(LinearModel {
            coefficients: vec![1.0; 4],
            intercept: 0.0,
            metadata: ArtifactMetadata::default(),
        });
        assert_eq!(model.validate("model").unwrap_err().kind(), "artifact_unavailable");
    }

    #[test]
    fn test_validate_rejects_empty_forest() {
        let model = ModelArtifact::Forest(ForestModel {
            trees: vec![],
            metadata: ArtifactMetadata::default(),
        });
        assert!(model.validate("model").is_err());
    }

    #[test]
    fn test_non_finite_score_is_inference_failure() {
        let model = ModelArtifact::Linear(LinearModel {
            coefficients: vec![f64::MAX; 5],
            intercept: 0.0,
            metadata: ArtifactMetadata::default(),
        });
        let err = model.predict(&[f64::MAX; 5]).unwrap_err();
        assert_eq!(err.kind(), "inference_failure");
    }

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Tree {
        Tree {
            nodes: vec![
                Node::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: left },
                Node::Leaf { value: right },
            ],
        }
    }
}
