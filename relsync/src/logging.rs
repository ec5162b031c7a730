//! Tracing subscriber setup.

use std::error::Error;
use std::fs;
use std::path::Path;

use time::format_description::well_known::Rfc3339;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Base name of the rolling log files (`relsync.log.YYYY-MM-DD`).
pub const LOG_FILE_NAME: &str = "relsync.log";

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "relsync=debug"
    } else {
        "relsync=info"
    }
}

/// Install the global subscriber.
///
/// Logs go to stdout with RFC 3339 UTC timestamps and, when `log_dir` is
/// given, to a daily rolling file as well. `RUST_LOG` overrides the level
/// unless `verbose` is set.
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the lifetime of the process.
pub fn init_logging(
    verbose: bool,
    log_dir: Option<&Path>,
) -> Result<Option<WorkerGuard>, Box<dyn Error + Send + Sync>> {
    let filter = if verbose {
        EnvFilter::try_new(default_directive(true))?
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_directive(false)))?
    };

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_timer(UtcTime::new(Rfc3339));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_timer(UtcTime::new(Rfc3339))
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
