use super::StreamId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Display metadata for a subscribed stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub stream_id: StreamId,
    pub name: String,
    pub color: String,
    /// `false` when the user muted the whole stream from their subscriptions.
    #[serde(default = "default_in_home_view")]
    pub in_home_view: bool,
    #[serde(default)]
    pub invite_only: bool,
    #[serde(default)]
    pub pin_to_top: bool,
    #[serde(default)]
    pub is_web_public: bool,
}

fn default_in_home_view() -> bool {
    true
}

impl StreamMetadata {
    /// Stand-in record for streams the directory does not know about.
    pub fn null() -> &'static StreamMetadata {
        static NULL: OnceLock<StreamMetadata> = OnceLock::new();
        NULL.get_or_init(|| StreamMetadata {
            stream_id: 0,
            name: String::new(),
            color: "white".to_string(),
            in_home_view: true,
            invite_only: false,
            pin_to_top: false,
            is_web_public: false,
        })
    }
}

/// Lookup of stream metadata by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamDirectory {
    by_id: HashMap<StreamId, StreamMetadata>,
}

impl StreamDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stream_id: StreamId) -> Option<&StreamMetadata> {
        self.by_id.get(&stream_id)
    }

    /// Metadata for `stream_id`, or [`StreamMetadata::null`] when unknown.
    pub fn get_or_null(&self, stream_id: StreamId) -> &StreamMetadata {
        self.get(stream_id).unwrap_or_else(|| StreamMetadata::null())
    }

    pub fn insert(&mut self, metadata: StreamMetadata) {
        self.by_id.insert(metadata.stream_id, metadata);
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl FromIterator<StreamMetadata> for StreamDirectory {
    fn from_iter<T: IntoIterator<Item = StreamMetadata>>(iter: T) -> Self {
        let mut directory = StreamDirectory::new();
        for metadata in iter {
            directory.insert(metadata);
        }
        directory
    }
}
