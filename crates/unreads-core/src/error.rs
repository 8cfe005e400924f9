use crate::models::MessageId;
use std::path::PathBuf;

/// Errors raised while loading or validating unread state.
///
/// Aggregation itself never fails; these only surface at the boundary where
/// snapshots and configuration are read from disk.
#[derive(Debug, thiserror::Error)]
pub enum UnreadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid group conversation key: {key:?}")]
    InvalidHuddleKey { key: String },
    #[error("Mentioned message {message_id} is not in any unread conversation")]
    OrphanMention { message_id: MessageId },
    #[error("Message {message_id} appears in more than one unread conversation")]
    DuplicateMessage { message_id: MessageId },
    #[error("Unknown topic visibility policy: {0}")]
    InvalidVisibilityPolicy(u8),
}

impl UnreadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        UnreadError::Io {
            path: path.into(),
            source,
        }
    }
}
