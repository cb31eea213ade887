//! Logging initialisation for the replay CLI
//!
//! Configure via RUST_LOG environment variable:
//! - `RUST_LOG=debug` - all debug logs
//! - `RUST_LOG=keyseq::keymap::pending=debug` - chord state transitions only
//! - `RUST_LOG=keyseq::keymap::registry=warn` - dropped bindings
//!
//! # Log Files
//!
//! With a log file configured, everything at debug level and above is also
//! appended to that file, independent of RUST_LOG.

use std::io;
use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize tracing subscriber with console and optional file logging
///
/// Console output goes to stderr so replay output on stdout stays clean.
pub fn init(log_file: Option<&Path>) -> io::Result<()> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_filter(console_filter);

    let file_layer = match log_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let file_name = path.file_name().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("log file path has no file name: {}", path.display()),
                )
            })?;
            std::fs::create_dir_all(dir)?;

            let file_appender = tracing_appender::rolling::never(dir, file_name);
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        None => None,
    };

    // A second init (tests, embedding apps) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}
