// ============================================================================
// facepreserve-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with the ffmpeg Command-Line Tool
//
// Command construction for the decode and encode processes, the process
// traits the orchestrator is written against, and dependency checking.
//
// KEY COMPONENTS:
// - FfmpegSpawner / FfmpegProcess traits with ffmpeg-sidecar implementations
// - build_decode_command / build_encode_command
// - check_dependency

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// ffmpeg command lines for the decode and encode processes
pub mod ffmpeg;

/// Traits and implementations for running ffmpeg processes
pub mod ffmpeg_executor;

/// In-memory process and probe doubles
#[cfg(test)]
pub(crate) mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg::{build_decode_command, build_encode_command};
pub use ffmpeg_executor::{FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks that `cmd_name` can be started, by running it with `-version`.
///
/// Returns [`CoreError::DependencyNotFound`] when the binary is missing and
/// [`CoreError::CommandStart`] when it exists but cannot be started.
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_is_reported() {
        let result = check_dependency("facepreserve-no-such-binary-xyz");
        assert!(matches!(result, Err(CoreError::DependencyNotFound(_))));
    }
}
