// ============================================================================
// facepreserve-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// Traits for spawning ffmpeg and interacting with a running instance, plus the
// concrete implementation on top of ffmpeg-sidecar. The pipeline only sees the
// traits, which lets the orchestrator be driven by in-memory doubles in tests.
//
// KEY COMPONENTS:
// - FfmpegProcess: a running ffmpeg with its pipes
// - FfmpegSpawner: creates FfmpegProcess instances from an FfmpegCommand
// - SidecarProcess / SidecarSpawner: ffmpeg-sidecar backed implementation

use crate::error::{CoreError, CoreResult, command_start_error, command_wait_error};
use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::io::{Read, Write};
use std::process::ExitStatus;

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Takes ownership of the process's stdout pipe. Returns `None` once taken.
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>>;

    /// Takes ownership of the process's stdin pipe. Dropping it closes the pipe.
    fn take_stdin(&mut self) -> Option<Box<dyn Write + Send>>;

    /// Processes events parsed from the process's stderr until it closes.
    fn handle_events<F>(&mut self, handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>;

    /// Reads whatever is left on stderr. Used for error reporting after exit.
    fn read_stderr(&mut self) -> String;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;

    /// Terminates the process. Callers still have to `wait` to reap it.
    fn kill(&mut self) -> CoreResult<()>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;
    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>> {
        self.0
            .take_stdout()
            .map(|stdout| Box::new(stdout) as Box<dyn Read + Send>)
    }

    fn take_stdin(&mut self) -> Option<Box<dyn Write + Send>> {
        self.0
            .take_stdin()
            .map(|stdin| Box::new(stdin) as Box<dyn Write + Send>)
    }

    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        let iterator = self.0.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {}", e);
            CoreError::OperationFailed(format!("ffmpeg event iterator unavailable: {e}"))
        })?;
        for event in iterator {
            handler(event)?;
        }
        Ok(())
    }

    fn read_stderr(&mut self) -> String {
        let mut buf = String::new();
        if let Some(mut stderr) = self.0.take_stderr() {
            if let Err(e) = stderr.read_to_string(&mut buf) {
                log::debug!("Could not read ffmpeg stderr: {}", e);
            }
        }
        buf
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.0
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e))
    }

    fn kill(&mut self) -> CoreResult<()> {
        self.0
            .kill()
            .map_err(|e| command_wait_error("ffmpeg (sidecar kill)", e))
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg (sidecar)", e))
    }
}
