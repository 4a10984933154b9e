//! Capabilities the pinner needs from the outside world.
//!
//! Production implementations live in [`crate::ipfs`] and [`crate::registry`];
//! tests substitute in-memory fakes.

use crate::types::{ContentHash, ContentHashError};
use std::collections::HashSet;
use thiserror::Error;

/// Read-only view of the listings registry.
pub trait OriginSource {
    /// Distinct content hashes referenced by listings. An empty registry
    /// yields an empty set, never an error.
    fn list_origin_hashes(&self) -> Result<HashSet<ContentHash>, SourceError>;
}

/// Read-only view of the storage node's pins.
pub trait PinSource {
    fn list_pinned_hashes(&self) -> Result<HashSet<ContentHash>, SourceError>;
}

/// Removes pins from the storage node.
pub trait Unpinner {
    fn unpin(&self, hash: &ContentHash) -> Result<(), SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid content hash '{value}': {reason}")]
    InvalidHash {
        value: String,
        reason: ContentHashError,
    },
}

impl From<ureq::Error> for SourceError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => SourceError::Status {
                code,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => SourceError::Transport(transport.to_string()),
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Decode(err.to_string())
    }
}

/// Validates a hash string received from a remote system.
pub(crate) fn parse_content_hash(value: &str) -> Result<ContentHash, SourceError> {
    ContentHash::try_from(value).map_err(|reason| SourceError::InvalidHash {
        value: value.to_string(),
        reason,
    })
}
