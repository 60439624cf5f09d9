//! Loading of the serialized scaler and model.
//!
//! Any failure here is [`ScoreError::ArtifactUnavailable`] or
//! [`ScoreError::FeatureSchemaMismatch`]; both abort the run.

use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{Result, ScoreError};
use crate::fetch::load_source;
use crate::inference::model::ModelArtifact;
use crate::inference::scaler::ScalerArtifact;
use crate::inference::schema::FEATURE_SCHEMA;

/// Parses and checks a scaler from JSON bytes.
pub fn scaler_from_json(name: &str, bytes: &[u8]) -> Result<ScalerArtifact> {
    let scaler: ScalerArtifact = parse(name, bytes)?;
    scaler.validate(name)?;
    scaler.metadata().check(name, &FEATURE_SCHEMA)?;
    Ok(scaler)
}

/// Parses and checks a model from JSON bytes.
pub fn model_from_json(name: &str, bytes: &[u8]) -> Result<ModelArtifact> {
    let model: ModelArtifact = parse(name, bytes)?;
    model.validate(name)?;
    model.metadata().check(name, &FEATURE_SCHEMA)?;
    Ok(model)
}

/// Loads a scaler from a local path or URL.
pub async fn load_scaler(source: &str) -> Result<ScalerArtifact> {
    let bytes = load_source(source)
        .await
        .map_err(|e| ScoreError::artifact(source, format!("{e:#}")))?;
    let scaler = scaler_from_json(source, &bytes)?;
    info!(source, kind = scaler_kind(&scaler), "Scaler loaded");
    Ok(scaler)
}

/// Loads a model from a local path or URL.
pub async fn load_model(source: &str) -> Result<ModelArtifact> {
    let bytes = load_source(source)
        .await
        .map_err(|e| ScoreError::artifact(source, format!("{e:#}")))?;
    let model = model_from_json(source, &bytes)?;
    info!(source, kind = model_kind(&model), "Model loaded");
    Ok(model)
}

pub fn scaler_kind(scaler: &ScalerArtifact) -> &'static str {
    match scaler {
        ScalerArtifact::MinMax(_) => "min_max",
        ScalerArtifact::Standard(_) => "standard",
    }
}

pub fn model_kind(model: &ModelArtifact) -> &'static str {
    match model {
        ModelArtifact::Linear(_) => "linear",
        ModelArtifact::Forest(_) => "forest",
    }
}

fn parse<T: DeserializeOwned>(name: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| ScoreError::artifact(name, e))
}
