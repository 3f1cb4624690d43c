//! Graph error types

use thiserror::Error;

/// Errors raised while composing or emitting the resource graph.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("duplicate logical resource id: {0}")]
    DuplicateResource(String),

    #[error("resource {src} references unknown resource {target}")]
    UnknownReference { src: String, target: String },

    #[error("dependency cycle between stages: {from} -> {to}")]
    DependencyCycle { from: String, to: String },

    #[error("dependency on unknown stage: {0}")]
    UnknownStage(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, GraphError>;
