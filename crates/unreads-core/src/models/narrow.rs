use super::{StreamId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A filtered view of messages.
///
/// Used only as a lookup key; every consumer matches on it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Narrow {
    Home,
    #[serde(rename_all = "camelCase")]
    Stream { stream_id: StreamId },
    #[serde(rename_all = "camelCase")]
    Topic { stream_id: StreamId, topic: String },
    /// Private conversation with these users (self alone for the self-conversation).
    #[serde(rename_all = "camelCase")]
    Pm { user_ids: Vec<UserId> },
    Starred,
    Mentioned,
    Search { query: String },
    AllPrivate,
}

impl Narrow {
    pub fn stream(stream_id: StreamId) -> Self {
        Narrow::Stream { stream_id }
    }

    pub fn topic(stream_id: StreamId, topic: impl Into<String>) -> Self {
        Narrow::Topic {
            stream_id,
            topic: topic.into(),
        }
    }

    /// Participant ids are sorted and deduplicated so equal conversations hash equally.
    pub fn pm(user_ids: impl IntoIterator<Item = UserId>) -> Self {
        let mut user_ids: Vec<UserId> = user_ids.into_iter().collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        Narrow::Pm { user_ids }
    }

    pub fn search(query: impl Into<String>) -> Self {
        Narrow::Search {
            query: query.into(),
        }
    }
}

impl fmt::Display for Narrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Narrow::Home => write!(f, "home"),
            Narrow::Stream { stream_id } => write!(f, "stream:{}", stream_id),
            Narrow::Topic { stream_id, topic } => write!(f, "topic:{}:{}", stream_id, topic),
            Narrow::Pm { user_ids } => {
                let ids: Vec<String> = user_ids.iter().map(|id| id.to_string()).collect();
                write!(f, "pm:{}", ids.join(","))
            }
            Narrow::Starred => write!(f, "starred"),
            Narrow::Mentioned => write!(f, "mentioned"),
            Narrow::Search { query } => write!(f, "search:{}", query),
            Narrow::AllPrivate => write!(f, "all-private"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pm_narrow_is_normalized() {
        assert_eq!(Narrow::pm([8, 7, 8]), Narrow::pm([7, 8]));
    }

    #[test]
    fn test_parse_tagged_narrow() {
        let narrow: Narrow =
            serde_json::from_str(r#"{"type": "topic", "streamId": 4, "topic": "lunch"}"#)
                .unwrap();
        assert_eq!(narrow, Narrow::topic(4, "lunch"));

        let narrow: Narrow = serde_json::from_str(r#"{"type": "all-private"}"#).unwrap();
        assert_eq!(narrow, Narrow::AllPrivate);

        let narrow: Narrow =
            serde_json::from_str(r#"{"type": "pm", "userIds": [3, 2]}"#).unwrap();
        assert_eq!(narrow, Narrow::Pm { user_ids: vec![3, 2] });
    }

    #[test]
    fn test_display() {
        assert_eq!(Narrow::topic(4, "lunch").to_string(), "topic:4:lunch");
        assert_eq!(Narrow::pm([2, 3]).to_string(), "pm:2,3");
    }
}
