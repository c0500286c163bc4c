//! Error types for the binding engine.
//!
//! Failures are contained at the smallest scope that can continue: a
//! binding that does not apply is skipped without an error, an
//! [`ApplyError`] is captured per instance, and [`StoreError`] never
//! corrupts the in-memory binding set.

use thiserror::Error;

use crate::document::NodeId;

/// Failures reported by the host document graph.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("failed to load page {page}: {reason}")]
    PageLoad { page: NodeId, reason: String },

    #[error("main component of {instance} could not be resolved: {reason}")]
    ComponentUnresolvable { instance: NodeId, reason: String },

    #[error("failed to load fonts for {node}: {reason}")]
    FontLoad { node: NodeId, reason: String },

    #[error("failed to write text to {node}: {reason}")]
    TextWrite { node: NodeId, reason: String },

    #[error("invalid document snapshot: {0}")]
    Snapshot(String),
}

/// A binding clearly applied to an instance but could not be carried out.
#[derive(Debug, Error)]
#[error("binding for \"{text_property}\" failed: {message}")]
pub struct ApplyError {
    /// Name of the text layer the failing binding targets.
    pub text_property: String,
    pub message: String,
}

impl ApplyError {
    pub fn new(text_property: impl Into<String>, source: HostError) -> Self {
        Self {
            text_property: text_property.into(),
            message: source.to_string(),
        }
    }
}

/// Durable storage failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode bindings: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_error_message_names_the_text_layer() {
        let err = ApplyError::new(
            "Label",
            HostError::TextWrite {
                node: NodeId::from("12:4"),
                reason: "node is locked".to_string(),
            },
        );
        assert_eq!(err.message, "failed to write text to 12:4: node is locked");
        assert_eq!(
            err.to_string(),
            "binding for \"Label\" failed: failed to write text to 12:4: node is locked"
        );
    }
}
