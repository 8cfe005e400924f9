//! Immutable application state handed to the aggregator on every call.

use crate::error::UnreadError;
use crate::models::{
    MuteData, MuteIndex, StreamDirectory, StreamMetadata, UnreadIndex, UnreadMessagesData,
    UserId,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// The slice of application state the unread aggregations read.
///
/// Each part is shared behind an `Arc`; a state transition replaces the `Arc` of
/// whatever changed and clones the rest. Cached aggregations compare these
/// pointers, so contents must never be modified in place.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub unread: Arc<UnreadIndex>,
    pub mute: Arc<MuteIndex>,
    pub streams: Arc<StreamDirectory>,
    pub own_user_id: UserId,
}

impl Snapshot {
    pub fn new(
        unread: UnreadIndex,
        mute: MuteIndex,
        streams: StreamDirectory,
        own_user_id: UserId,
    ) -> Self {
        Self {
            unread: Arc::new(unread),
            mute: Arc::new(mute),
            streams: Arc::new(streams),
            own_user_id,
        }
    }

    pub fn with_unread(&self, unread: UnreadIndex) -> Self {
        Self {
            unread: Arc::new(unread),
            ..self.clone()
        }
    }

    pub fn with_mute(&self, mute: MuteIndex) -> Self {
        Self {
            mute: Arc::new(mute),
            ..self.clone()
        }
    }

    pub fn with_streams(&self, streams: StreamDirectory) -> Self {
        Self {
            streams: Arc::new(streams),
            ..self.clone()
        }
    }

    /// Load and validate a snapshot file.
    pub fn load(path: &Path) -> Result<Self, UnreadError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| UnreadError::io(path, e))?;
        let snapshot = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            topics = snapshot.unread.streams.topic_count(),
            pms = snapshot.unread.pms.len(),
            huddles = snapshot.unread.huddles.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    pub fn from_json(json: &str) -> Result<Self, UnreadError> {
        let file: SnapshotFile = serde_json::from_str(json)?;
        Self::try_from(file)
    }
}

/// On-disk form of a [`Snapshot`], using the server's field names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub own_user_id: UserId,
    #[serde(default)]
    pub unread_msgs: UnreadMessagesData,
    #[serde(default)]
    pub mute: MuteData,
    #[serde(default)]
    pub subscriptions: Vec<StreamMetadata>,
}

impl TryFrom<SnapshotFile> for Snapshot {
    type Error = UnreadError;

    fn try_from(file: SnapshotFile) -> Result<Self, Self::Error> {
        let unread = UnreadIndex::from(file.unread_msgs);
        unread.check_invariants()?;
        Ok(Snapshot::new(
            unread,
            MuteIndex::from(file.mute),
            file.subscriptions.into_iter().collect(),
            file.own_user_id,
        ))
    }
}
