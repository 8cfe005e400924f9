pub mod mute;
pub mod narrow;
pub mod stream;
pub mod summary;
pub mod unread;

pub use mute::{MuteData, MuteIndex, TopicVisibility, UserTopic};
pub use narrow::Narrow;
pub use stream::{StreamDirectory, StreamMetadata};
pub use summary::{StreamUnreadSummary, TopicUnreadSummary};
pub use unread::{
    huddle_key, parse_huddle_key, HuddleThread, PmThread, StreamUnreads, UnreadIndex,
    UnreadMessagesData, UnreadStreamEntry,
};

pub type StreamId = u64;
pub type UserId = u64;
pub type MessageId = u64;
