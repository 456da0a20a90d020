//! Tracing setup: one fmt layer teed to stdout and a log file so turn
//! traces survive restarts.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Initializes the global tracing subscriber.
///
/// Creates the log file's parent directory when missing and appends to the
/// file. The level filter comes from `RUST_LOG`, defaulting to `info` with
/// sqlx query noise turned down. Fails when a subscriber is already set.
pub fn init_tracing(log_file: &str) -> anyhow::Result<()> {
    let path = Path::new(log_file);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = Arc::new(OpenOptions::new().create(true).append(true).open(path)?);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout.and(file))
        .with_target(true)
        .with_level(true);

    Registry::default()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing subscriber already set: {}", e))?;

    Ok(())
}
