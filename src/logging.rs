//! Log file setup for the command-line front end

use std::ffi::OsStr;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber writing to `log_path`
///
/// The level comes from `RUST_LOG` and defaults to `info`. Events are
/// written as JSON lines when `json` is set. Keep the returned guard alive
/// for as long as logging is needed; dropping it flushes the writer.
pub fn init(log_path: &Path, json: bool) -> io::Result<WorkerGuard> {
    let dir = log_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;

    let file_name = log_path
        .file_name()
        .unwrap_or(OsStr::new("feed-versions.log"));
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        dir, file_name,
    ));

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(io::Error::other)?;

    Ok(guard)
}
