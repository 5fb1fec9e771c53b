//! Error types for the narrative graph engine.
//!
//! Guard evaluation has no error channel. Only graph loading, configuration
//! and graph integrity can fail.

use thiserror::Error;

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// The game state no longer points into the graph. Signals corrupted state,
/// as opposed to content that is merely gated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphIntegrityError {
    #[error("game state has no current node")]
    MissingCurrentNode,

    #[error("current node '{node_id}' is not present in graph '{graph_id}'")]
    DanglingCurrentNode { node_id: String, graph_id: String },
}

/// Errors raised while loading a quest graph or reading it against a state.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("failed to parse quest graph: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("graph '{graph_id}' declares node '{node_id}' more than once")]
    DuplicateNode { graph_id: String, node_id: String },

    #[error("graph '{graph_id}' starts at unknown node '{node_id}'")]
    UnknownStart { graph_id: String, node_id: String },

    #[error("graph '{graph_id}' has edge {from} -> {to} referencing unknown node '{missing}'")]
    DanglingEdge {
        graph_id: String,
        from: String,
        to: String,
        missing: String,
    },

    #[error("failed to fingerprint graph: {0}")]
    Fingerprint(#[source] serde_json::Error),

    #[error(transparent)]
    Integrity(#[from] GraphIntegrityError),
}

/// Errors raised while loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Parse(#[from] toml::de::Error),
}
