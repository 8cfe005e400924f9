//! Normalized index of unread messages.
//!
//! The index is split into four independently shared parts (stream topics, 1:1
//! conversations, group conversations, mentions). A state transition builds a new
//! `UnreadIndex` that replaces only the parts it touched, so downstream memoized
//! computations that read an untouched part keep their cached results.

use super::{MessageId, StreamId, UserId};
use crate::error::UnreadError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

/// Unread stream messages, keyed by `(stream_id, topic)`.
///
/// Keys are kept in a single ordered map so iteration naturally groups topics by
/// stream; message ids inside a topic are ascending and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamUnreads {
    topics: BTreeMap<(StreamId, String), BTreeSet<MessageId>>,
}

impl StreamUnreads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Number of (stream, topic) entries.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    pub fn topic(&self, stream_id: StreamId, topic: &str) -> Option<&BTreeSet<MessageId>> {
        self.topics.get(&(stream_id, topic.to_string()))
    }

    pub fn contains_stream(&self, stream_id: StreamId) -> bool {
        self.topics_in(stream_id).next().is_some()
    }

    /// Topics of one stream, in key order.
    pub fn topics_in(
        &self,
        stream_id: StreamId,
    ) -> impl Iterator<Item = (&str, &BTreeSet<MessageId>)> + '_ {
        self.topics
            .range((stream_id, String::new())..)
            .take_while(move |((sid, _), _)| *sid == stream_id)
            .map(|((_, topic), ids)| (topic.as_str(), ids))
    }

    /// Every stream with at least one topic entry, with its topics grouped.
    pub fn streams(
        &self,
    ) -> impl Iterator<Item = (StreamId, Vec<(&str, &BTreeSet<MessageId>)>)> + '_ {
        let mut entries = self.topics.iter().peekable();
        std::iter::from_fn(move || {
            let ((stream_id, _), _) = entries.peek()?;
            let stream_id = *stream_id;
            let mut topics = Vec::new();
            while let Some(((_, topic), ids)) =
                entries.next_if(|((sid, _), _)| *sid == stream_id)
            {
                topics.push((topic.as_str(), ids));
            }
            Some((stream_id, topics))
        })
    }

    pub fn message_ids(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.topics.values().flat_map(|ids| ids.iter().copied())
    }

    pub fn insert(&mut self, stream_id: StreamId, topic: &str, message_id: MessageId) {
        self.topics
            .entry((stream_id, topic.to_string()))
            .or_default()
            .insert(message_id);
    }

    /// Remove the given ids, dropping topics left empty. Returns whether anything changed.
    pub fn remove_ids(&mut self, ids: &HashSet<MessageId>) -> bool {
        let before = self.topics.values().map(BTreeSet::len).sum::<usize>();
        for set in self.topics.values_mut() {
            set.retain(|id| !ids.contains(id));
        }
        self.topics.retain(|_, set| !set.is_empty());
        before != self.topics.values().map(BTreeSet::len).sum::<usize>()
    }
}

/// Unread messages of one 1:1 conversation.
///
/// `sender_id` is the other party, or the own user for the self-conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PmThread {
    pub sender_id: UserId,
    pub unread_message_ids: Vec<MessageId>,
}

/// Unread messages of one group conversation.
///
/// `user_ids_string` is the canonical participant key, see [`huddle_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuddleThread {
    pub user_ids_string: String,
    pub unread_message_ids: Vec<MessageId>,
}

/// Canonical group conversation key: sorted, deduplicated, comma-joined user ids.
pub fn huddle_key(user_ids: impl IntoIterator<Item = UserId>) -> String {
    user_ids
        .into_iter()
        .collect::<BTreeSet<_>>()
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn parse_huddle_key(key: &str) -> Result<Vec<UserId>, UnreadError> {
    key.split(',')
        .map(|part| part.trim().parse::<UserId>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| UnreadError::InvalidHuddleKey {
            key: key.to_string(),
        })
}

/// Insert into an ascending id list, ignoring duplicates.
fn insert_sorted(ids: &mut Vec<MessageId>, message_id: MessageId) {
    if let Err(pos) = ids.binary_search(&message_id) {
        ids.insert(pos, message_id);
    }
}

/// All unread messages known to the client.
///
/// Never mutated in place once shared: use the `with_*` / `without_messages`
/// transitions, which return a new index.
#[derive(Debug, Clone, Default)]
pub struct UnreadIndex {
    pub streams: Arc<StreamUnreads>,
    pub pms: Arc<Vec<PmThread>>,
    pub huddles: Arc<Vec<HuddleThread>>,
    pub mentions: Arc<BTreeSet<MessageId>>,
}

impl UnreadIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
            && self.pms.is_empty()
            && self.huddles.is_empty()
            && self.mentions.is_empty()
    }

    // ===== Lookups =====

    /// Unread count of one topic, regardless of mute state. 0 if the topic is unknown.
    pub fn unread_count_for_topic(&self, stream_id: StreamId, topic: &str) -> usize {
        self.streams.topic(stream_id, topic).map_or(0, BTreeSet::len)
    }

    pub fn pm_thread(&self, sender_id: UserId) -> Option<&PmThread> {
        self.pms.iter().find(|pm| pm.sender_id == sender_id)
    }

    pub fn huddle_thread(&self, key: &str) -> Option<&HuddleThread> {
        self.huddles.iter().find(|h| h.user_ids_string == key)
    }

    /// Unread ids of the private conversation with `participants`.
    ///
    /// The own user id may or may not be included in `participants`. With no other
    /// participant this is the self-conversation; with one it is the 1:1
    /// conversation; with more it is the group conversation including self.
    pub fn unread_ids_for_pm_narrow(
        &self,
        participants: &[UserId],
        own_user_id: UserId,
    ) -> &[MessageId] {
        let others: BTreeSet<UserId> = participants
            .iter()
            .copied()
            .filter(|id| *id != own_user_id)
            .collect();

        let ids = match others.len() {
            0 => self.pm_thread(own_user_id).map(|pm| &pm.unread_message_ids),
            1 => others
                .first()
                .and_then(|other| self.pm_thread(*other))
                .map(|pm| &pm.unread_message_ids),
            _ => {
                let key = huddle_key(others.iter().copied().chain([own_user_id]));
                self.huddle_thread(&key).map(|h| &h.unread_message_ids)
            }
        };
        ids.map(Vec::as_slice).unwrap_or(&[])
    }

    // ===== Copy-on-write transitions =====

    pub fn with_stream_message(
        &self,
        stream_id: StreamId,
        topic: &str,
        message_id: MessageId,
    ) -> Self {
        let mut streams = (*self.streams).clone();
        streams.insert(stream_id, topic, message_id);
        Self {
            streams: Arc::new(streams),
            ..self.clone()
        }
    }

    pub fn with_pm_message(&self, sender_id: UserId, message_id: MessageId) -> Self {
        let mut pms = (*self.pms).clone();
        match pms.iter_mut().find(|pm| pm.sender_id == sender_id) {
            Some(pm) => insert_sorted(&mut pm.unread_message_ids, message_id),
            None => pms.push(PmThread {
                sender_id,
                unread_message_ids: vec![message_id],
            }),
        }
        Self {
            pms: Arc::new(pms),
            ..self.clone()
        }
    }

    /// Add a group message; `user_ids` must include the own user.
    pub fn with_huddle_message(&self, user_ids: &[UserId], message_id: MessageId) -> Self {
        let key = huddle_key(user_ids.iter().copied());
        let mut huddles = (*self.huddles).clone();
        match huddles.iter_mut().find(|h| h.user_ids_string == key) {
            Some(huddle) => insert_sorted(&mut huddle.unread_message_ids, message_id),
            None => huddles.push(HuddleThread {
                user_ids_string: key,
                unread_message_ids: vec![message_id],
            }),
        }
        Self {
            huddles: Arc::new(huddles),
            ..self.clone()
        }
    }

    pub fn with_mention(&self, message_id: MessageId) -> Self {
        let mut mentions = (*self.mentions).clone();
        mentions.insert(message_id);
        Self {
            mentions: Arc::new(mentions),
            ..self.clone()
        }
    }

    /// Mark messages as read. Parts that did not contain any of the ids keep their
    /// identity.
    pub fn without_messages(&self, message_ids: &[MessageId]) -> Self {
        let ids: HashSet<MessageId> = message_ids.iter().copied().collect();
        let mut next = self.clone();

        let mut streams = (*self.streams).clone();
        if streams.remove_ids(&ids) {
            next.streams = Arc::new(streams);
        }

        if self
            .pms
            .iter()
            .any(|pm| pm.unread_message_ids.iter().any(|id| ids.contains(id)))
        {
            let pms = self
                .pms
                .iter()
                .map(|pm| PmThread {
                    sender_id: pm.sender_id,
                    unread_message_ids: retain_unread(&pm.unread_message_ids, &ids),
                })
                .filter(|pm| !pm.unread_message_ids.is_empty())
                .collect();
            next.pms = Arc::new(pms);
        }

        if self
            .huddles
            .iter()
            .any(|h| h.unread_message_ids.iter().any(|id| ids.contains(id)))
        {
            let huddles = self
                .huddles
                .iter()
                .map(|h| HuddleThread {
                    user_ids_string: h.user_ids_string.clone(),
                    unread_message_ids: retain_unread(&h.unread_message_ids, &ids),
                })
                .filter(|h| !h.unread_message_ids.is_empty())
                .collect();
            next.huddles = Arc::new(huddles);
        }

        if self.mentions.iter().any(|id| ids.contains(id)) {
            let mentions = self
                .mentions
                .iter()
                .copied()
                .filter(|id| !ids.contains(id))
                .collect();
            next.mentions = Arc::new(mentions);
        }

        next
    }

    // ===== Validation =====

    /// Check the structural invariants the aggregations rely on: every mention is
    /// an unread message of exactly one conversation, and group keys are canonical.
    pub fn check_invariants(&self) -> Result<(), UnreadError> {
        let mut seen: HashSet<MessageId> = HashSet::new();
        let all_ids = self
            .streams
            .message_ids()
            .chain(
                self.pms
                    .iter()
                    .flat_map(|pm| pm.unread_message_ids.iter().copied()),
            )
            .chain(
                self.huddles
                    .iter()
                    .flat_map(|h| h.unread_message_ids.iter().copied()),
            );
        for message_id in all_ids {
            if !seen.insert(message_id) {
                return Err(UnreadError::DuplicateMessage { message_id });
            }
        }

        for huddle in self.huddles.iter() {
            let ids = parse_huddle_key(&huddle.user_ids_string)?;
            if huddle_key(ids) != huddle.user_ids_string {
                return Err(UnreadError::InvalidHuddleKey {
                    key: huddle.user_ids_string.clone(),
                });
            }
        }

        if let Some(message_id) = self.mentions.iter().find(|id| !seen.contains(*id)) {
            return Err(UnreadError::OrphanMention {
                message_id: *message_id,
            });
        }

        Ok(())
    }
}

fn retain_unread(ids: &[MessageId], read: &HashSet<MessageId>) -> Vec<MessageId> {
    ids.iter().copied().filter(|id| !read.contains(id)).collect()
}

/// One stream/topic entry in the server's `unread_msgs` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadStreamEntry {
    pub stream_id: StreamId,
    pub topic: String,
    pub unread_message_ids: Vec<MessageId>,
}

/// Wire shape of the unread index as delivered by the server on registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadMessagesData {
    #[serde(default)]
    pub streams: Vec<UnreadStreamEntry>,
    #[serde(default)]
    pub pms: Vec<PmThread>,
    #[serde(default)]
    pub huddles: Vec<HuddleThread>,
    #[serde(default)]
    pub mentions: Vec<MessageId>,
}

impl From<UnreadMessagesData> for UnreadIndex {
    fn from(data: UnreadMessagesData) -> Self {
        let mut streams = StreamUnreads::new();
        for entry in &data.streams {
            for id in &entry.unread_message_ids {
                streams.insert(entry.stream_id, &entry.topic, *id);
            }
        }

        let pms = data
            .pms
            .into_iter()
            .map(|mut pm| {
                pm.unread_message_ids.sort_unstable();
                pm.unread_message_ids.dedup();
                pm
            })
            .collect();

        let huddles = data
            .huddles
            .into_iter()
            .map(|mut h| {
                h.unread_message_ids.sort_unstable();
                h.unread_message_ids.dedup();
                h
            })
            .collect();

        Self {
            streams: Arc::new(streams),
            pms: Arc::new(pms),
            huddles: Arc::new(huddles),
            mentions: Arc::new(data.mentions.into_iter().collect()),
        }
    }
}
