use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::{json, Value};
use unreads_core::{AggregatorConfig, Narrow, Snapshot, StreamId, UnreadAggregator, UserId};

/// Narrow selection on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum NarrowArg {
    /// All messages
    Home,
    /// One stream, muted topics excluded
    Stream { stream_id: StreamId },
    /// One topic, regardless of mute state
    Topic { stream_id: StreamId, topic: String },
    /// Private conversation with the given users (comma separated)
    Pm {
        #[arg(value_delimiter = ',', required = true)]
        user_ids: Vec<UserId>,
    },
    /// Starred messages
    Starred,
    /// Messages mentioning you
    Mentioned,
    /// Search results
    Search { query: String },
    /// All private messages
    AllPrivate,
}

impl From<NarrowArg> for Narrow {
    fn from(arg: NarrowArg) -> Self {
        match arg {
            NarrowArg::Home => Narrow::Home,
            NarrowArg::Stream { stream_id } => Narrow::stream(stream_id),
            NarrowArg::Topic { stream_id, topic } => Narrow::topic(stream_id, topic),
            NarrowArg::Pm { user_ids } => Narrow::pm(user_ids),
            NarrowArg::Starred => Narrow::Starred,
            NarrowArg::Mentioned => Narrow::Mentioned,
            NarrowArg::Search { query } => Narrow::search(query),
            NarrowArg::AllPrivate => Narrow::AllPrivate,
        }
    }
}

/// Load aggregator config from a JSON file, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<AggregatorConfig> {
    match path {
        Some(path) => AggregatorConfig::load(path)
            .with_context(|| format!("Failed to load config file: {}", path.display())),
        None => Ok(AggregatorConfig::default()),
    }
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    Snapshot::load(path).with_context(|| format!("Failed to load snapshot: {}", path.display()))
}

/// Every aggregate of the snapshot, optionally with the memo counters.
pub fn run_aggregate(
    snapshot_path: &Path,
    config: AggregatorConfig,
    with_stats: bool,
) -> Result<Value> {
    let snapshot = load_snapshot(snapshot_path)?;
    let aggregator = UnreadAggregator::new(config);
    let aggregates = aggregator.aggregate(&snapshot);

    let mut output = serde_json::to_value(&aggregates).context("Failed to serialize aggregates")?;
    if with_stats {
        output["memo"] = serde_json::to_value(aggregator.node_counts())
            .context("Failed to serialize memo counters")?;
    }
    Ok(output)
}

/// Unread count for one narrow.
pub fn run_count(snapshot_path: &Path, config: AggregatorConfig, narrow: Narrow) -> Result<Value> {
    let snapshot = load_snapshot(snapshot_path)?;
    let aggregator = UnreadAggregator::new(config);
    let count = aggregator.unread_count_for_narrow(&narrow, &snapshot);
    tracing::debug!(%narrow, count, "resolved narrow count");

    Ok(json!({
        "narrow": narrow,
        "unreadCount": count,
    }))
}
