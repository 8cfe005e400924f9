pub mod aggregator;
pub mod memo;
pub mod narrow_resolver;

pub use aggregator::{Aggregates, UnreadAggregator};
pub use memo::{Identity, MemoCell, MemoCounts, MemoTable};
pub use narrow_resolver::count_for_narrow;
