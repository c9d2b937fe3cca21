//! Error taxonomy for the assistant engine.
//!
//! Conversational failures (no candidates, unparseable reservation target,
//! service outages) are never surfaced as `Err`; they become same-turn chat
//! replies. The types here cover the faults that *can* escape: bad embedded
//! configuration at construction time and store decode problems at session
//! start.

use thiserror::Error;

/// Top-level error for engine construction and session setup.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("rule table error: {0}")]
    RuleTable(#[from] serde_yaml::Error),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors loading or querying the place catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog contains no places")]
    Empty,
}

/// Errors reading persisted keyed state.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("value for key '{key}' is not valid JSON: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
