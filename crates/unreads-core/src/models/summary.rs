use super::{MessageId, StreamId};
use serde::Serialize;

/// Unread summary of one topic, as shown in the unreads list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicUnreadSummary {
    pub key: String,
    pub topic: String,
    pub unread_count: usize,
    pub is_mentioned: bool,
    /// Newest unread id in the topic; drives the recency order.
    pub last_unread_message_id: Option<MessageId>,
    pub is_muted: bool,
}

/// Unread summary of one stream and its topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamUnreadSummary {
    pub key: String,
    pub stream_id: StreamId,
    pub stream_name: String,
    pub is_muted: bool,
    pub is_private: bool,
    pub is_pinned: bool,
    pub is_web_public: bool,
    pub color: String,
    /// Unread messages in the stream's non-muted topics.
    pub unread_count: usize,
    pub topics: Vec<TopicUnreadSummary>,
}

impl StreamUnreadSummary {
    pub fn key_for(stream_id: StreamId) -> String {
        format!("stream:{}", stream_id)
    }
}
