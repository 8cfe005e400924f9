pub mod config;
pub mod error;
pub mod models;
pub mod snapshot;
pub mod store;

pub use config::AggregatorConfig;
pub use error::UnreadError;
pub use models::{
    MessageId, MuteIndex, Narrow, StreamDirectory, StreamId, StreamMetadata,
    StreamUnreadSummary, TopicUnreadSummary, TopicVisibility, UnreadIndex, UserId,
};
pub use snapshot::Snapshot;
pub use store::{Aggregates, MemoCell, MemoCounts, MemoTable, UnreadAggregator};
