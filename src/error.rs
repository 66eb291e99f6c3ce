//! Error types for the request dispatcher.
//!
//! Errors raised while handling a single input item are [`NodeError`]s. When a
//! batch is aborted, the failing item's error is wrapped in a [`BatchError`]
//! carrying the item index.

use thiserror::Error;

use crate::node::{Operation, Resource};

/// Failure while building or sending the request for one item.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Invalid or missing parameter, detected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The authenticated transport failed (network, HTTP status, token).
    #[error("{0}")]
    Transport(String),

    /// The (resource, operation) pair has no request builder.
    #[error("The operation \"{operation}\" is not supported for resource \"{resource}\"")]
    UnsupportedOperation {
        resource: Resource,
        operation: Operation,
    },
}

impl NodeError {
    pub fn validation(message: impl Into<String>) -> Self {
        NodeError::Validation(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        NodeError::Transport(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, NodeError::Validation(_))
    }
}

impl From<anyhow::Error> for NodeError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on a single line.
        NodeError::Transport(format!("{:#}", err))
    }
}

/// A batch aborted because one item failed and continue-on-fail was off.
#[derive(Debug, Error)]
#[error("item {item_index}: {source}")]
pub struct BatchError {
    pub item_index: usize,
    #[source]
    pub source: NodeError,
}

impl BatchError {
    pub fn new(item_index: usize, source: NodeError) -> Self {
        Self { item_index, source }
    }
}
