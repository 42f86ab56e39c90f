use thiserror::Error;

use crate::layout::CreationToken;
use crate::model::{ElementRef, VertexId};

/// Failures reported by the entity store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    #[error("schema `{0}` is not known to the entity store")]
    UnknownSchema(String),
    #[error("invalid value for `{schema}.{property}`: {reason}")]
    InvalidProperty {
        schema: String,
        property: String,
        reason: String,
    },
    #[error("entity store rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error("{0} is not part of the layout")]
    UnknownElement(ElementRef),
    #[error("vertex {vertex} still has {count} incident edge(s)")]
    IncidentEdges { vertex: VertexId, count: usize },
    #[error("no pending entity creation with token {0}")]
    UnknownCreation(CreationToken),
    #[error("malformed layout snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse settings as TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("cannot write settings as TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),
    #[error("cannot parse settings as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}
