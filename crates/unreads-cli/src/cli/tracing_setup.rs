use std::fs::OpenOptions;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber: stderr output filtered by `UNREADS_LOG`
/// (default `warn`), plus a debug-level file log when `UNREADS_LOG_FILE` is set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("UNREADS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let file = std::env::var("UNREADS_LOG_FILE").ok().and_then(|log_path| {
        match OpenOptions::new().create(true).append(true).open(&log_path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Warning: failed to open log file {}: {}", log_path, e);
                None
            }
        }
    });

    if let Some(file) = file {
        let file_layer = fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG);

        registry.with(file_layer).init();
    } else {
        registry.init();
    }
}
