use super::aggregator::{unread_count_for_stream, UnreadAggregator};
use crate::models::{MuteIndex, Narrow, UnreadIndex, UserId};
use crate::snapshot::Snapshot;
use std::sync::Arc;

/// Unread count shown for a narrow.
///
/// Only home, stream, topic and private conversation narrows have a real count.
/// Home carries the caveats of the grand total (muted streams included, mentions
/// possibly counted twice). A topic narrow ignores mute state since it is an
/// explicit view into that topic.
pub fn count_for_narrow(
    narrow: &Narrow,
    unread: &UnreadIndex,
    mute: &MuteIndex,
    own_user_id: UserId,
    unread_total: usize,
) -> usize {
    match narrow {
        Narrow::Home => unread_total,
        Narrow::Stream { stream_id } => unread_count_for_stream(&unread.streams, mute, *stream_id),
        Narrow::Topic { stream_id, topic } => unread.unread_count_for_topic(*stream_id, topic),
        Narrow::Pm { user_ids } => unread.unread_ids_for_pm_narrow(user_ids, own_user_id).len(),
        // An unread message cannot be starred.
        Narrow::Starred => 0,
        // TODO: give a real count for the mentions narrow.
        Narrow::Mentioned => 0,
        Narrow::Search { .. } => 0,
        // Not reachable as a narrow from the UI.
        Narrow::AllPrivate => 0,
    }
}

impl UnreadAggregator {
    /// Memoized [`count_for_narrow`] for `snapshot`, one cache entry per narrow.
    pub fn unread_count_for_narrow(&self, narrow: &Narrow, snapshot: &Snapshot) -> usize {
        let unread_total = self.unread_total(snapshot);
        let inputs = (
            Arc::clone(&snapshot.unread),
            Arc::clone(&snapshot.mute),
            snapshot.own_user_id,
            unread_total,
        );
        let count = self
            .narrow_counts
            .compute(narrow, inputs, |(unread, mute, own_user_id, total)| {
                count_for_narrow(narrow, unread, mute, *own_user_id, **total)
            });
        *count
    }
}
