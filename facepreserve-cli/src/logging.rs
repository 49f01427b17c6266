// ============================================================================
// facepreserve-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console or File Logging for the CLI
//
// The core only talks to the `log` facade. The CLI installs exactly one
// backend per run:
// - env_logger on stderr (default), RUST_LOG overrides the level
// - log4rs to a file when --log-file is given
//
// USAGE:
// - RUST_LOG=info (default): Normal operation logs
// - RUST_LOG=debug or --verbose: Per-chunk and per-command detail
// - RUST_LOG=trace: Every detector call

use crate::error::CliResult;
use facepreserve_core::CoreError;
use facepreserve_core::file_logging::setup::setup_file_logging;
use log::LevelFilter;
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Resolves `--log-file`: a directory gets a timestamped file inside it.
pub fn resolve_log_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(format!("facepreserve_{}.log", get_timestamp()))
    } else {
        path.to_path_buf()
    }
}

/// Installs the logger for this process.
///
/// Returns the log file path when logging goes to a file.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> CliResult<Option<PathBuf>> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    match log_file {
        Some(path) => {
            let resolved = resolve_log_path(path);
            setup_file_logging(&resolved, level).map_err(|e| {
                CoreError::OperationFailed(format!(
                    "Failed to set up file logging at '{}': {}",
                    resolved.display(),
                    e
                ))
            })?;
            Ok(Some(resolved))
        }
        None => {
            env_logger::Builder::new()
                .filter_level(level)
                .parse_default_env()
                .format_timestamp_secs()
                .try_init()
                .map_err(|e| {
                    CoreError::OperationFailed(format!("Failed to initialise logging: {e}"))
                })?;
            Ok(None)
        }
    }
}
