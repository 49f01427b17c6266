//! Error types for the facepreserve-core library.
//!
//! Every fallible operation in the crate returns [`CoreResult`]. The four
//! pipeline failure classes are `Framing`, `Config`, `Detection` and
//! `ProcessExit`; the remaining variants cover probing, I/O and process
//! plumbing. All of them are fatal to a run.

use std::fmt;
use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// Which of the two external processes an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    /// The ffmpeg process producing raw rgb24 frames on stdout.
    Decoder,
    /// The ffmpeg process running the ROI filter graph and writing the output file.
    Encoder,
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessRole::Decoder => write!(f, "decoder"),
            ProcessRole::Encoder => write!(f, "encoder"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Framing error: expected {expected} bytes per frame, decoder produced a trailing {received} bytes")]
    Framing { expected: usize, received: usize },

    #[error("Detection failed: {0}")]
    Detection(String),

    #[error("{process} process exited with {}: {stderr}", describe_exit_code(.code))]
    ProcessExit {
        process: ProcessRole,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed to wait for {0}: {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("Required dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("ffprobe output parse error: {0}")]
    FfprobeParse(String),

    #[error("Video info error: {0}")]
    VideoInfoError(String),

    #[error("JSON error: {0}")]
    JsonParseError(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("{0}")]
    OperationFailed(String),
}

fn describe_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Result alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Returns the process this error is attributed to, if any.
    pub fn process(&self) -> Option<ProcessRole> {
        match self {
            CoreError::ProcessExit { process, .. } => Some(*process),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::JsonParseError(err.to_string())
    }
}

pub fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

pub fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

/// Builds a [`CoreError::ProcessExit`] from a finished process's status.
pub fn process_exit_error(
    process: ProcessRole,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::ProcessExit {
        process,
        code: status.code(),
        stderr: stderr.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_exit_message_names_process_and_code() {
        let err = CoreError::ProcessExit {
            process: ProcessRole::Encoder,
            code: Some(187),
            stderr: "Invalid argument".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("encoder"));
        assert!(msg.contains("code 187"));
        assert_eq!(err.process(), Some(ProcessRole::Encoder));
    }

    #[test]
    fn test_signal_exit_has_no_code() {
        let err = CoreError::ProcessExit {
            process: ProcessRole::Decoder,
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_framing_message() {
        let err = CoreError::Framing {
            expected: 12288,
            received: 100,
        };
        assert!(err.to_string().contains("12288"));
        assert!(err.process().is_none());
    }
}
