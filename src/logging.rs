//! File logging for the planner.
//!
//! The TUI owns the terminal, so diagnostics go to rotated files under the
//! configured log directory instead of stderr.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use std::path::Path;

const LOG_FILE_BASENAME: &str = "weekplan";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

/// Starts file logging. The returned handle must stay alive for the whole
/// process; dropping it flushes and stops the logger.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<LoggerHandle, String> {
    let level = normalize_level(level)?;
    std::fs::create_dir_all(log_dir).map_err(|err| {
        format!(
            "failed to create log directory `{}`: {err}",
            log_dir.display()
        )
    })?;

    let handle = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    log::info!(
        "event=app_start status=ok version={} level={} log_dir={}",
        env!("CARGO_PKG_VERSION"),
        level,
        log_dir.display()
    );
    Ok(handle)
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" | "" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error|off"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_level;

    #[test]
    fn normalize_level_accepts_known_values() {
        assert_eq!(normalize_level("TRACE"), Ok("trace"));
        assert_eq!(normalize_level(" warning "), Ok("warn"));
        assert_eq!(normalize_level(""), Ok("info"));
        assert_eq!(normalize_level("off"), Ok("off"));
    }

    #[test]
    fn normalize_level_rejects_unknown_values() {
        let err = normalize_level("loud").unwrap_err();
        assert!(err.contains("unsupported log level `loud`"));
    }
}
