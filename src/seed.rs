use std::collections::BTreeMap;
use std::path::Path;

use crate::mastery::{EngineError, MasteryEngine};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read skill priors {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid skill priors json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Parses `{ "<skill id>": <prior>, ... }`.
pub fn parse_skill_priors(json: &str) -> Result<BTreeMap<String, f64>, SeedError> {
    let priors: BTreeMap<String, f64> = serde_json::from_str(json)?;
    Ok(priors
        .into_iter()
        .filter(|(skill, _)| !skill.trim().is_empty())
        .collect())
}

pub async fn seed_skill_priors(engine: &MasteryEngine, path: &Path) -> Result<usize, SeedError> {
    let json = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let priors = parse_skill_priors(&json)?;
    if priors.is_empty() {
        tracing::warn!(path = %path.display(), "skill priors file is empty");
        return Ok(0);
    }
    Ok(engine.seed_priors(priors).await?)
}
