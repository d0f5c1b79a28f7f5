//! Error types for the planner library

use crate::models::MaterialRef;

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("{0} not found in catalog")]
    NotFound(MaterialRef),

    #[error("invalid material reference: {0}")]
    InvalidReference(String),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
