//! Tracing setup: human-facing stderr plus an append-only log file

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::config::FootoConfig;

/// Map `-v` occurrences to the stderr level. Quiet by default so the
/// sourcing line on stdout stays the only noise.
pub fn stderr_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber. Call once, after the root directory exists.
pub fn init(config: &FootoConfig, verbosity: u8) -> anyhow::Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_level(verbosity));

    let file_level = if verbosity > 0 {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let log_path = config.log_file();
    let (file_layer, file_error) = match OpenOptions::new().create(true).append(true).open(&log_path)
    {
        Ok(file) => (
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_filter(file_level),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    if let Some(e) = file_error {
        warn!("Could not open log file {}: {}", log_path.display(), e);
    }

    Ok(())
}
