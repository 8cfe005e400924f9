//! Unread counts and groupings derived from a [`Snapshot`].
//!
//! Every aggregation is a pure function below, wrapped in its own memo node in
//! [`UnreadAggregator`]. Nodes that depend on other nodes take the upstream
//! `Arc` output as input, so an unchanged upstream result keeps the downstream
//! cache warm. Evaluation always goes leaves-first.

use super::memo::{MemoCell, MemoCounts, MemoTable};
use crate::config::AggregatorConfig;
use crate::models::{
    HuddleThread, MessageId, MuteIndex, Narrow, PmThread, StreamDirectory, StreamId,
    StreamUnreadSummary, StreamUnreads, TopicUnreadSummary, UnreadIndex, UserId,
};
use crate::snapshot::Snapshot;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

type MentionSet = BTreeSet<MessageId>;

// ===== Pure aggregations =====

/// Unread count per stream, excluding muted topics.
///
/// Every stream in the index gets an entry, 0 included. Muted streams are not
/// skipped: only topic-level mutes reduce the count.
pub fn unread_by_stream(streams: &StreamUnreads, mute: &MuteIndex) -> BTreeMap<StreamId, usize> {
    streams
        .streams()
        .map(|(stream_id, topics)| {
            let total = topics
                .iter()
                .filter(|(topic, _)| !mute.is_topic_muted(stream_id, topic))
                .map(|(_, ids)| ids.len())
                .sum::<usize>();
            (stream_id, total)
        })
        .collect()
}

/// Unread count of one stream, excluding muted topics. 0 for unknown streams.
pub fn unread_count_for_stream(
    streams: &StreamUnreads,
    mute: &MuteIndex,
    stream_id: StreamId,
) -> usize {
    streams
        .topics_in(stream_id)
        .filter(|(topic, _)| !mute.is_topic_muted(stream_id, topic))
        .map(|(_, ids)| ids.len())
        .sum()
}

/// How a repeated conversation key folds into the running total.
///
/// Without accumulation this keeps the first non-zero count seen for the key,
/// matching the historical unreads screen.
fn combine_thread_count(existing: Option<usize>, count: usize, accumulate: bool) -> usize {
    match existing {
        Some(prev) if accumulate => prev + count,
        Some(prev) if prev != 0 => prev,
        _ => count,
    }
}

/// Unread count per 1:1 conversation, keyed by the other user (self for the
/// self-conversation). Private conversations are never muted.
pub fn unread_by_pm(pms: &[PmThread], accumulate: bool) -> BTreeMap<UserId, usize> {
    let mut totals: BTreeMap<UserId, usize> = BTreeMap::new();
    for pm in pms {
        let total = combine_thread_count(
            totals.get(&pm.sender_id).copied(),
            pm.unread_message_ids.len(),
            accumulate,
        );
        totals.insert(pm.sender_id, total);
    }
    totals
}

/// Unread count per group conversation, keyed by the participant key.
pub fn unread_by_huddle(huddles: &[HuddleThread], accumulate: bool) -> BTreeMap<String, usize> {
    let mut totals: BTreeMap<String, usize> = BTreeMap::new();
    for huddle in huddles {
        let total = combine_thread_count(
            totals.get(&huddle.user_ids_string).copied(),
            huddle.unread_message_ids.len(),
            accumulate,
        );
        totals.insert(huddle.user_ids_string.clone(), total);
    }
    totals
}

pub fn unread_pm_total(pms: &[PmThread]) -> usize {
    pms.iter().map(|pm| pm.unread_message_ids.len()).sum()
}

pub fn unread_huddle_total(huddles: &[HuddleThread]) -> usize {
    huddles.iter().map(|h| h.unread_message_ids.len()).sum()
}

/// Per-stream summaries with per-topic entries, in display order.
///
/// Topics are ordered newest first by their last unread id. Streams are ordered
/// pinned first, then by name ignoring case; the two sorts are stable so equal
/// names keep index order.
pub fn streams_and_topics(
    streams: &StreamUnreads,
    mute: &MuteIndex,
    mentions: &MentionSet,
    directory: &StreamDirectory,
) -> Vec<StreamUnreadSummary> {
    let mut summaries: Vec<StreamUnreadSummary> = streams
        .streams()
        .map(|(stream_id, topics)| {
            let metadata = directory.get_or_null(stream_id);
            let mut unread_count = 0;
            let mut topic_summaries: Vec<TopicUnreadSummary> = topics
                .into_iter()
                .map(|(topic, ids)| {
                    let is_muted = mute.is_topic_muted(stream_id, topic);
                    if !is_muted {
                        unread_count += ids.len();
                    }
                    TopicUnreadSummary {
                        key: topic.to_string(),
                        topic: topic.to_string(),
                        unread_count: ids.len(),
                        is_mentioned: ids.iter().any(|id| mentions.contains(id)),
                        last_unread_message_id: ids.last().copied(),
                        is_muted,
                    }
                })
                .collect();

            topic_summaries
                .sort_by(|a, b| b.last_unread_message_id.cmp(&a.last_unread_message_id));

            StreamUnreadSummary {
                key: StreamUnreadSummary::key_for(stream_id),
                stream_id,
                stream_name: metadata.name.clone(),
                is_muted: !metadata.in_home_view || mute.is_stream_muted(stream_id),
                is_private: metadata.invite_only,
                is_pinned: metadata.pin_to_top,
                is_web_public: metadata.is_web_public,
                color: metadata.color.clone(),
                unread_count,
                topics: topic_summaries,
            }
        })
        .collect();

    summaries.sort_by_cached_key(|s| s.stream_name.to_lowercase());
    summaries.sort_by_key(|s| !s.is_pinned);
    summaries
}

/// Filter of [`streams_and_topics`] down to what the unreads screen shows:
/// muted topics removed, then muted or emptied streams removed.
pub fn without_muted(summaries: &[StreamUnreadSummary]) -> Vec<StreamUnreadSummary> {
    summaries
        .iter()
        .filter(|stream| !stream.is_muted)
        .filter_map(|stream| {
            let mut stream = stream.clone();
            stream.topics.retain(|topic| !topic.is_muted);
            (!stream.topics.is_empty()).then_some(stream)
        })
        .collect()
}

// ===== Memoized graph =====

/// Every aggregate for one snapshot. Outputs are shared with the memo cache.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregates {
    pub unread_by_stream: Arc<BTreeMap<StreamId, usize>>,
    pub unread_stream_total: Arc<usize>,
    pub unread_by_pm: Arc<BTreeMap<UserId, usize>>,
    pub unread_pm_total: Arc<usize>,
    pub unread_by_huddle: Arc<BTreeMap<String, usize>>,
    pub unread_huddle_total: Arc<usize>,
    pub unread_mentions_total: Arc<usize>,
    pub unread_total: Arc<usize>,
    pub streams_and_topics: Arc<Vec<StreamUnreadSummary>>,
    pub streams_and_topics_unmuted: Arc<Vec<StreamUnreadSummary>>,
}

type NarrowInputs = (Arc<UnreadIndex>, Arc<MuteIndex>, UserId, Arc<usize>);

/// Owns the memo nodes of the unread aggregation graph.
///
/// Instances are independent: two aggregators never share cached results.
pub struct UnreadAggregator {
    config: AggregatorConfig,
    unread_by_stream: MemoCell<(Arc<StreamUnreads>, Arc<MuteIndex>), BTreeMap<StreamId, usize>>,
    unread_stream_total: MemoCell<Arc<BTreeMap<StreamId, usize>>, usize>,
    unread_by_pm: MemoCell<Arc<Vec<PmThread>>, BTreeMap<UserId, usize>>,
    unread_pm_total: MemoCell<Arc<Vec<PmThread>>, usize>,
    unread_by_huddle: MemoCell<Arc<Vec<HuddleThread>>, BTreeMap<String, usize>>,
    unread_huddle_total: MemoCell<Arc<Vec<HuddleThread>>, usize>,
    unread_mentions_total: MemoCell<Arc<MentionSet>, usize>,
    unread_total: MemoCell<(Arc<usize>, Arc<usize>, Arc<usize>, Arc<usize>), usize>,
    streams_and_topics: MemoCell<
        (
            Arc<StreamUnreads>,
            Arc<MuteIndex>,
            Arc<MentionSet>,
            Arc<StreamDirectory>,
        ),
        Vec<StreamUnreadSummary>,
    >,
    streams_and_topics_unmuted: MemoCell<Arc<Vec<StreamUnreadSummary>>, Vec<StreamUnreadSummary>>,
    pub(super) narrow_counts: MemoTable<Narrow, NarrowInputs, usize>,
}

impl Default for UnreadAggregator {
    fn default() -> Self {
        Self::new(AggregatorConfig::default())
    }
}

impl UnreadAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            unread_by_stream: MemoCell::new("unread_by_stream"),
            unread_stream_total: MemoCell::new("unread_stream_total"),
            unread_by_pm: MemoCell::new("unread_by_pm"),
            unread_pm_total: MemoCell::new("unread_pm_total"),
            unread_by_huddle: MemoCell::new("unread_by_huddle"),
            unread_huddle_total: MemoCell::new("unread_huddle_total"),
            unread_mentions_total: MemoCell::new("unread_mentions_total"),
            unread_total: MemoCell::new("unread_total"),
            streams_and_topics: MemoCell::new("streams_and_topics"),
            streams_and_topics_unmuted: MemoCell::new("streams_and_topics_unmuted"),
            narrow_counts: MemoTable::with_capacity(
                "unread_count_for_narrow",
                config.narrow_cache_capacity,
            ),
            config,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn unread_by_stream(&self, snapshot: &Snapshot) -> Arc<BTreeMap<StreamId, usize>> {
        self.unread_by_stream.get_or_compute(
            (
                Arc::clone(&snapshot.unread.streams),
                Arc::clone(&snapshot.mute),
            ),
            |(streams, mute)| unread_by_stream(streams, mute),
        )
    }

    pub fn unread_stream_total(&self, snapshot: &Snapshot) -> Arc<usize> {
        let by_stream = self.unread_by_stream(snapshot);
        self.unread_stream_total
            .get_or_compute(by_stream, |by_stream| by_stream.values().sum())
    }

    pub fn unread_by_pm(&self, snapshot: &Snapshot) -> Arc<BTreeMap<UserId, usize>> {
        let accumulate = self.config.accumulate_repeated_threads;
        self.unread_by_pm
            .get_or_compute(Arc::clone(&snapshot.unread.pms), |pms| {
                unread_by_pm(pms, accumulate)
            })
    }

    pub fn unread_pm_total(&self, snapshot: &Snapshot) -> Arc<usize> {
        self.unread_pm_total
            .get_or_compute(Arc::clone(&snapshot.unread.pms), |pms| unread_pm_total(pms))
    }

    pub fn unread_by_huddle(&self, snapshot: &Snapshot) -> Arc<BTreeMap<String, usize>> {
        let accumulate = self.config.accumulate_repeated_threads;
        self.unread_by_huddle
            .get_or_compute(Arc::clone(&snapshot.unread.huddles), |huddles| {
                unread_by_huddle(huddles, accumulate)
            })
    }

    pub fn unread_huddle_total(&self, snapshot: &Snapshot) -> Arc<usize> {
        self.unread_huddle_total
            .get_or_compute(Arc::clone(&snapshot.unread.huddles), |huddles| {
                unread_huddle_total(huddles)
            })
    }

    pub fn unread_mentions_total(&self, snapshot: &Snapshot) -> Arc<usize> {
        self.unread_mentions_total
            .get_or_compute(Arc::clone(&snapshot.unread.mentions), |mentions| {
                mentions.len()
            })
    }

    /// Grand total. Mentions are already counted in their conversation, so with
    /// `count_mentions_in_total` a mentioned message is counted twice.
    pub fn unread_total(&self, snapshot: &Snapshot) -> Arc<usize> {
        let inputs = (
            self.unread_stream_total(snapshot),
            self.unread_pm_total(snapshot),
            self.unread_huddle_total(snapshot),
            self.unread_mentions_total(snapshot),
        );
        let count_mentions = self.config.count_mentions_in_total;
        self.unread_total
            .get_or_compute(inputs, |(streams, pms, huddles, mentions)| {
                let total = **streams + **pms + **huddles;
                if count_mentions {
                    total + **mentions
                } else {
                    total
                }
            })
    }

    pub fn streams_and_topics(&self, snapshot: &Snapshot) -> Arc<Vec<StreamUnreadSummary>> {
        self.streams_and_topics.get_or_compute(
            (
                Arc::clone(&snapshot.unread.streams),
                Arc::clone(&snapshot.mute),
                Arc::clone(&snapshot.unread.mentions),
                Arc::clone(&snapshot.streams),
            ),
            |(streams, mute, mentions, directory)| {
                streams_and_topics(streams, mute, mentions, directory)
            },
        )
    }

    /// Always derived from [`Self::streams_and_topics`], never computed on its own.
    pub fn streams_and_topics_unmuted(
        &self,
        snapshot: &Snapshot,
    ) -> Arc<Vec<StreamUnreadSummary>> {
        let full = self.streams_and_topics(snapshot);
        self.streams_and_topics_unmuted
            .get_or_compute(full, |full| without_muted(full))
    }

    /// Evaluate the whole graph for `snapshot`.
    pub fn aggregate(&self, snapshot: &Snapshot) -> Aggregates {
        let aggregates = Aggregates {
            unread_by_stream: self.unread_by_stream(snapshot),
            unread_stream_total: self.unread_stream_total(snapshot),
            unread_by_pm: self.unread_by_pm(snapshot),
            unread_pm_total: self.unread_pm_total(snapshot),
            unread_by_huddle: self.unread_by_huddle(snapshot),
            unread_huddle_total: self.unread_huddle_total(snapshot),
            unread_mentions_total: self.unread_mentions_total(snapshot),
            unread_total: self.unread_total(snapshot),
            streams_and_topics: self.streams_and_topics(snapshot),
            streams_and_topics_unmuted: self.streams_and_topics_unmuted(snapshot),
        };
        tracing::debug!(
            total = *aggregates.unread_total,
            streams = aggregates.unread_by_stream.len(),
            "aggregated unreads"
        );
        aggregates
    }

    /// Counters of every node, keyed by node name.
    pub fn node_counts(&self) -> BTreeMap<&'static str, MemoCounts> {
        let mut counts = BTreeMap::new();
        counts.insert(self.unread_by_stream.name(), self.unread_by_stream.counts());
        counts.insert(self.unread_stream_total.name(), self.unread_stream_total.counts());
        counts.insert(self.unread_by_pm.name(), self.unread_by_pm.counts());
        counts.insert(self.unread_pm_total.name(), self.unread_pm_total.counts());
        counts.insert(self.unread_by_huddle.name(), self.unread_by_huddle.counts());
        counts.insert(self.unread_huddle_total.name(), self.unread_huddle_total.counts());
        counts.insert(
            self.unread_mentions_total.name(),
            self.unread_mentions_total.counts(),
        );
        counts.insert(self.unread_total.name(), self.unread_total.counts());
        counts.insert(self.streams_and_topics.name(), self.streams_and_topics.counts());
        counts.insert(
            self.streams_and_topics_unmuted.name(),
            self.streams_and_topics_unmuted.counts(),
        );
        counts.insert("unread_count_for_narrow", self.narrow_counts.counts());
        counts
    }

    /// Sum of all node counters.
    pub fn total_counts(&self) -> MemoCounts {
        self.node_counts()
            .into_values()
            .fold(MemoCounts::default(), |acc, c| acc + c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StreamMetadata, TopicVisibility};

    const OWN: UserId = 1000;

    fn metadata(stream_id: StreamId, name: &str, pinned: bool) -> StreamMetadata {
        StreamMetadata {
            stream_id,
            name: name.to_string(),
            color: "#76ce90".to_string(),
            in_home_view: true,
            invite_only: false,
            pin_to_top: pinned,
            is_web_public: false,
        }
    }

    fn snapshot() -> Snapshot {
        let unread = UnreadIndex::new()
            .with_stream_message(1, "lunch", 10)
            .with_stream_message(1, "lunch", 12)
            .with_stream_message(1, "noise", 11)
            .with_stream_message(2, "general", 13)
            .with_pm_message(7, 20)
            .with_pm_message(7, 21)
            .with_huddle_message(&[OWN, 7, 8], 30)
            .with_mention(12);
        let mute = MuteIndex::new().with_topic_policy(1, "noise", TopicVisibility::Muted);
        let streams = vec![metadata(1, "social", false), metadata(2, "design", false)]
            .into_iter()
            .collect();
        Snapshot::new(unread, mute, streams, OWN)
    }

    #[test]
    fn test_stream_total_matches_per_stream_counts() {
        let aggregator = UnreadAggregator::default();
        let result = aggregator.aggregate(&snapshot());

        assert_eq!(*result.unread_by_stream, BTreeMap::from([(1, 2), (2, 1)]));
        assert_eq!(
            *result.unread_stream_total,
            result.unread_by_stream.values().sum::<usize>()
        );
    }

    #[test]
    fn test_muted_topic_excluded_from_counts_but_listed() {
        let aggregator = UnreadAggregator::default();
        let result = aggregator.aggregate(&snapshot());

        let stream = result
            .streams_and_topics
            .iter()
            .find(|s| s.stream_id == 1)
            .unwrap();
        let noise = stream.topics.iter().find(|t| t.topic == "noise").unwrap();
        assert!(noise.is_muted);
        assert_eq!(noise.unread_count, 1);
        assert_eq!(stream.unread_count, 2);

        let unmuted = result
            .streams_and_topics_unmuted
            .iter()
            .find(|s| s.stream_id == 1)
            .unwrap();
        assert!(unmuted.topics.iter().all(|t| t.topic != "noise"));
    }

    #[test]
    fn test_muted_stream_still_counts_unmuted_topics() {
        let snap = snapshot();
        let snap = snap.with_mute((*snap.mute).clone().with_muted_stream(1));
        let aggregator = UnreadAggregator::default();
        let result = aggregator.aggregate(&snap);

        assert_eq!(result.unread_by_stream.get(&1), Some(&2));
        let stream = result
            .streams_and_topics
            .iter()
            .find(|s| s.stream_id == 1)
            .unwrap();
        assert!(stream.is_muted);
        assert!(result
            .streams_and_topics_unmuted
            .iter()
            .all(|s| s.stream_id != 1));
    }

    #[test]
    fn test_fully_muted_stream_reports_zero() {
        let snap = snapshot();
        let snap = snap.with_mute(
            (*snap.mute)
                .clone()
                .with_topic_policy(2, "general", TopicVisibility::Muted),
        );
        let result = UnreadAggregator::default().aggregate(&snap);

        assert_eq!(result.unread_by_stream.get(&2), Some(&0));
        assert!(result
            .streams_and_topics_unmuted
            .iter()
            .all(|s| s.stream_id != 2));
    }

    #[test]
    fn test_unmuted_view_is_filtered_subset() {
        let snap = snapshot();
        let snap = snap.with_unread(snap.unread.with_stream_message(3, "void", 40));
        let snap = snap.with_mute(
            (*snap.mute)
                .clone()
                .with_topic_policy(3, "void", TopicVisibility::Muted),
        );
        let result = UnreadAggregator::default().aggregate(&snap);

        for stream in result.streams_and_topics_unmuted.iter() {
            let full = result
                .streams_and_topics
                .iter()
                .find(|s| s.stream_id == stream.stream_id)
                .unwrap();
            assert!(!full.is_muted);
            assert_eq!(full.unread_count, stream.unread_count);
            let expected: Vec<_> = full.topics.iter().filter(|t| !t.is_muted).collect();
            let actual: Vec<_> = stream.topics.iter().collect();
            assert_eq!(expected, actual);
        }
        assert!(result
            .streams_and_topics_unmuted
            .iter()
            .all(|s| s.stream_id != 3));
    }

    #[test]
    fn test_stream_order_pinned_then_case_insensitive_name() {
        let unread = UnreadIndex::new()
            .with_stream_message(1, "t", 1)
            .with_stream_message(2, "t", 2)
            .with_stream_message(3, "t", 3);
        let streams = vec![
            metadata(1, "b", false),
            metadata(2, "A", true),
            metadata(3, "a", false),
        ]
        .into_iter()
        .collect();
        let snap = Snapshot::new(unread, MuteIndex::new(), streams, OWN);
        let result = UnreadAggregator::default().aggregate(&snap);

        let names: Vec<&str> = result
            .streams_and_topics
            .iter()
            .map(|s| s.stream_name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "a", "b"]);
        assert!(result.streams_and_topics[0].is_pinned);
    }

    #[test]
    fn test_topic_order_newest_first() {
        let unread = UnreadIndex::new()
            .with_stream_message(1, "x", 5)
            .with_stream_message(1, "y", 20)
            .with_stream_message(1, "z", 1);
        let snap = Snapshot::new(unread, MuteIndex::new(), StreamDirectory::new(), OWN);
        let result = UnreadAggregator::default().aggregate(&snap);

        let last_ids: Vec<Option<MessageId>> = result.streams_and_topics[0]
            .topics
            .iter()
            .map(|t| t.last_unread_message_id)
            .collect();
        assert_eq!(last_ids, vec![Some(20), Some(5), Some(1)]);
    }

    #[test]
    fn test_unknown_stream_uses_null_metadata() {
        let snap = snapshot().with_streams(StreamDirectory::new());
        let result = UnreadAggregator::default().aggregate(&snap);

        assert_eq!(result.streams_and_topics.len(), 2);
        assert!(result.streams_and_topics.iter().all(|s| s.stream_name.is_empty()));
        assert_eq!(*result.unread_stream_total, 3);
    }

    #[test]
    fn test_topic_mention_flag() {
        let result = UnreadAggregator::default().aggregate(&snapshot());
        let stream = result
            .streams_and_topics
            .iter()
            .find(|s| s.stream_id == 1)
            .unwrap();
        let lunch = stream.topics.iter().find(|t| t.topic == "lunch").unwrap();
        let noise = stream.topics.iter().find(|t| t.topic == "noise").unwrap();
        assert!(lunch.is_mentioned);
        assert!(!noise.is_mentioned);
        assert_eq!(lunch.last_unread_message_id, Some(12));
    }

    #[test]
    fn test_private_counts_and_totals() {
        let result = UnreadAggregator::default().aggregate(&snapshot());

        assert_eq!(*result.unread_by_pm, BTreeMap::from([(7, 2)]));
        assert_eq!(*result.unread_pm_total, 2);
        assert_eq!(
            *result.unread_by_huddle,
            BTreeMap::from([("7,8,1000".to_string(), 1)])
        );
        assert_eq!(*result.unread_huddle_total, 1);
        assert_eq!(*result.unread_mentions_total, 1);
        // 3 stream + 2 pm + 1 huddle + 1 mention counted again.
        assert_eq!(*result.unread_total, 7);
    }

    #[test]
    fn test_total_without_mention_double_count() {
        let config = AggregatorConfig {
            count_mentions_in_total: false,
            ..AggregatorConfig::default()
        };
        let result = UnreadAggregator::new(config).aggregate(&snapshot());
        assert_eq!(*result.unread_total, 6);
    }

    #[test]
    fn test_repeated_thread_keys() {
        let pms = vec![
            PmThread {
                sender_id: 7,
                unread_message_ids: vec![1, 2],
            },
            PmThread {
                sender_id: 7,
                unread_message_ids: vec![3, 4, 5],
            },
        ];
        // Historical behavior: the first non-zero count is kept.
        assert_eq!(unread_by_pm(&pms, false).get(&7), Some(&2));
        assert_eq!(unread_by_pm(&pms, true).get(&7), Some(&5));
        // Totals always sum every thread.
        assert_eq!(unread_pm_total(&pms), 5);

        let empty_first = vec![
            HuddleThread {
                user_ids_string: "1,2,3".to_string(),
                unread_message_ids: vec![],
            },
            HuddleThread {
                user_ids_string: "1,2,3".to_string(),
                unread_message_ids: vec![9],
            },
        ];
        assert_eq!(unread_by_huddle(&empty_first, false).get("1,2,3"), Some(&1));
    }

    #[test]
    fn test_unchanged_snapshot_is_served_from_cache() {
        let aggregator = UnreadAggregator::default();
        let snap = snapshot();

        let first = aggregator.aggregate(&snap);
        let misses = aggregator.total_counts().misses;
        let second = aggregator.aggregate(&snap.clone());

        assert_eq!(aggregator.total_counts().misses, misses);
        assert!(Arc::ptr_eq(&first.streams_and_topics, &second.streams_and_topics));
        assert!(Arc::ptr_eq(&first.unread_total, &second.unread_total));
    }

    #[test]
    fn test_equal_but_distinct_snapshot_recomputes() {
        let aggregator = UnreadAggregator::default();
        aggregator.aggregate(&snapshot());
        let before = aggregator.node_counts()["streams_and_topics"].misses;

        aggregator.aggregate(&snapshot());
        assert_eq!(
            aggregator.node_counts()["streams_and_topics"].misses,
            before + 1
        );
    }

    #[test]
    fn test_only_affected_nodes_recompute() {
        let aggregator = UnreadAggregator::default();
        let snap = snapshot();
        aggregator.aggregate(&snap);
        let before = aggregator.node_counts();

        // A new private message leaves stream-derived nodes untouched.
        let next = snap.with_unread(snap.unread.with_pm_message(9, 50));
        let result = aggregator.aggregate(&next);
        let after = aggregator.node_counts();

        assert_eq!(
            after["unread_by_stream"].misses,
            before["unread_by_stream"].misses
        );
        assert_eq!(
            after["streams_and_topics"].misses,
            before["streams_and_topics"].misses
        );
        assert_eq!(
            after["unread_pm_total"].misses,
            before["unread_pm_total"].misses + 1
        );
        assert_eq!(*result.unread_pm_total, 3);
        assert_eq!(*result.unread_total, 8);
    }

    #[test]
    fn test_unmuted_view_follows_full_view_cache() {
        let aggregator = UnreadAggregator::default();
        let snap = snapshot();
        aggregator.aggregate(&snap);

        // New pm: full view is a cache hit, so the unmuted view is too.
        aggregator.aggregate(&snap.with_unread(snap.unread.with_pm_message(9, 50)));
        assert_eq!(
            aggregator.node_counts()["streams_and_topics_unmuted"].misses,
            1
        );
    }

    #[test]
    fn test_aggregators_do_not_share_caches() {
        let snap = snapshot();
        let a = UnreadAggregator::default();
        let b = UnreadAggregator::default();
        a.aggregate(&snap);
        b.aggregate(&snap);

        assert_eq!(a.total_counts(), b.total_counts());
        assert_eq!(a.total_counts().hits, b.total_counts().hits);
    }

    #[test]
    fn test_aggregates_serialize() {
        let result = UnreadAggregator::default().aggregate(&snapshot());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["unreadTotal"], 7);
        assert_eq!(json["unreadByStream"]["1"], 2);
        assert_eq!(json["streamsAndTopics"][0]["streamName"], "design");
    }
}
