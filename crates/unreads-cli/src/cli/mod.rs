pub mod query;
pub mod tracing_setup;

pub use query::{load_config, run_aggregate, run_count, NarrowArg};
pub use tracing_setup::init_tracing;
