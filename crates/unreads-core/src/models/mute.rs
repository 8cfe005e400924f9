use super::StreamId;
use crate::error::UnreadError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Per-topic visibility policy set by the user.
///
/// Serialized as the server's integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TopicVisibility {
    #[default]
    Inherit,
    Muted,
    Unmuted,
    Followed,
}

impl TryFrom<u8> for TopicVisibility {
    type Error = UnreadError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Inherit),
            1 => Ok(Self::Muted),
            2 => Ok(Self::Unmuted),
            3 => Ok(Self::Followed),
            other => Err(UnreadError::InvalidVisibilityPolicy(other)),
        }
    }
}

impl From<TopicVisibility> for u8 {
    fn from(value: TopicVisibility) -> Self {
        match value {
            TopicVisibility::Inherit => 0,
            TopicVisibility::Muted => 1,
            TopicVisibility::Unmuted => 2,
            TopicVisibility::Followed => 3,
        }
    }
}

/// Mute rules: muted streams plus per-topic visibility policies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MuteIndex {
    muted_streams: HashSet<StreamId>,
    topics: HashMap<StreamId, HashMap<String, TopicVisibility>>,
    /// When set, topics of a muted stream without an explicit policy count as muted.
    streams_mute_topics: bool,
}

impl MuteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_streams_mute_topics(mut self, enabled: bool) -> Self {
        self.streams_mute_topics = enabled;
        self
    }

    pub fn with_muted_stream(mut self, stream_id: StreamId) -> Self {
        self.muted_streams.insert(stream_id);
        self
    }

    pub fn with_topic_policy(
        mut self,
        stream_id: StreamId,
        topic: &str,
        policy: TopicVisibility,
    ) -> Self {
        let topics = self.topics.entry(stream_id).or_default();
        if policy == TopicVisibility::Inherit {
            topics.remove(topic);
        } else {
            topics.insert(topic.to_string(), policy);
        }
        self
    }

    pub fn is_stream_muted(&self, stream_id: StreamId) -> bool {
        self.muted_streams.contains(&stream_id)
    }

    pub fn topic_policy(&self, stream_id: StreamId, topic: &str) -> TopicVisibility {
        self.topics
            .get(&stream_id)
            .and_then(|topics| topics.get(topic))
            .copied()
            .unwrap_or_default()
    }

    /// Whether messages in this topic are excluded from unread counts.
    pub fn is_topic_muted(&self, stream_id: StreamId, topic: &str) -> bool {
        match self.topic_policy(stream_id, topic) {
            TopicVisibility::Muted => true,
            TopicVisibility::Unmuted | TopicVisibility::Followed => false,
            TopicVisibility::Inherit => {
                self.streams_mute_topics && self.is_stream_muted(stream_id)
            }
        }
    }
}

/// One entry of the server's `user_topics` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTopic {
    pub stream_id: StreamId,
    pub topic_name: String,
    pub visibility_policy: TopicVisibility,
}

/// Serialized form of [`MuteIndex`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteData {
    #[serde(default)]
    pub muted_streams: Vec<StreamId>,
    #[serde(default)]
    pub user_topics: Vec<UserTopic>,
    #[serde(default)]
    pub streams_mute_topics: bool,
}

impl From<MuteData> for MuteIndex {
    fn from(data: MuteData) -> Self {
        let mut index = MuteIndex::new().with_streams_mute_topics(data.streams_mute_topics);
        index.muted_streams.extend(data.muted_streams);
        for entry in data.user_topics {
            index = index.with_topic_policy(
                entry.stream_id,
                &entry.topic_name,
                entry.visibility_policy,
            );
        }
        index
    }
}
