// facepreserve-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---
//
// In-memory doubles for the process and probe traits. Every process shares a
// journal with its spawner so tests can assert the order in which the
// orchestrator spawned, closed, drained, waited on and killed processes.

use super::ffmpeg_executor::{FfmpegProcess, FfmpegSpawner};
use crate::error::{CoreError, CoreResult};
use crate::media::{VideoInfo, VideoProber};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Cursor, Read, Write};
use std::os::unix::process::ExitStatusExt; // For ExitStatus::from_raw
use std::path::Path;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};

pub type Journal = Arc<Mutex<Vec<String>>>;

fn record(journal: &Journal, entry: String) {
    if let Ok(mut entries) = journal.lock() {
        entries.push(entry);
    }
}

/// Stdin handle that notes in the journal when it is dropped.
struct TrackedStdin {
    label: String,
    journal: Journal,
}

impl Write for TrackedStdin {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for TrackedStdin {
    fn drop(&mut self) {
        record(&self.journal, format!("{} stdin closed", self.label));
    }
}

/// What a mocked ffmpeg process does once spawned.
#[derive(Clone)]
pub struct MockScript {
    pub label: String,
    pub stdout: Vec<u8>,
    pub events: Vec<FfmpegEvent>,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl MockScript {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            stdout: Vec::new(),
            events: Vec::new(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    pub fn stdout(mut self, bytes: Vec<u8>) -> Self {
        self.stdout = bytes;
        self
    }

    pub fn events(mut self, events: Vec<FfmpegEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn fail(mut self, code: i32, stderr: &str) -> Self {
        self.exit_code = Some(code);
        self.stderr = stderr.to_string();
        self
    }
}

/// Mock implementation of FfmpegProcess.
pub struct MockFfmpegProcess {
    script: MockScript,
    stdout_taken: bool,
    stdin_taken: bool,
    journal: Journal,
}

impl MockFfmpegProcess {
    fn log(&self, what: &str) {
        record(&self.journal, format!("{} {}", self.script.label, what));
    }
}

impl FfmpegProcess for MockFfmpegProcess {
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>> {
        if self.stdout_taken {
            return None;
        }
        self.stdout_taken = true;
        let bytes = std::mem::take(&mut self.script.stdout);
        Some(Box::new(Cursor::new(bytes)))
    }

    fn take_stdin(&mut self) -> Option<Box<dyn Write + Send>> {
        if self.stdin_taken {
            return None;
        }
        self.stdin_taken = true;
        Some(Box::new(TrackedStdin {
            label: self.script.label.clone(),
            journal: self.journal.clone(),
        }))
    }

    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        self.log("events drained");
        for event in self.script.events.clone() {
            handler(event)?;
        }
        Ok(())
    }

    fn read_stderr(&mut self) -> String {
        std::mem::take(&mut self.script.stderr)
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.log("waited");
        Ok(match self.script.exit_code {
            Some(code) => ExitStatus::from_raw(code << 8),
            None => ExitStatus::from_raw(9),
        })
    }

    fn kill(&mut self) -> CoreResult<()> {
        self.log("killed");
        Ok(())
    }
}

/// Mock implementation of FfmpegSpawner handing out scripts in order.
#[derive(Default)]
pub struct MockFfmpegSpawner {
    scripts: RefCell<VecDeque<CoreResult<MockScript>>>,
    received_calls: RefCell<Vec<Vec<String>>>,
    journal: Journal,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, script: MockScript) {
        self.scripts.borrow_mut().push_back(Ok(script));
    }

    pub fn push_spawn_error(&self, error: CoreError) {
        self.scripts.borrow_mut().push_back(Err(error));
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.borrow().clone()
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().map(|j| j.clone()).unwrap_or_default()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args: Vec<String> = cmd
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        self.received_calls.borrow_mut().push(args.clone());

        let next = self.scripts.borrow_mut().pop_front();
        match next {
            Some(Ok(script)) => {
                record(&self.journal, format!("{} spawned", script.label));
                Ok(MockFfmpegProcess {
                    script,
                    stdout_taken: false,
                    stdin_taken: false,
                    journal: self.journal.clone(),
                })
            }
            Some(Err(err)) => Err(err),
            None => panic!("MockFfmpegSpawner: unexpected spawn with args {args:?}"),
        }
    }
}

/// Mock implementation of VideoProber returning a fixed result.
pub struct MockProber {
    info: Option<VideoInfo>,
}

impl MockProber {
    pub fn returning(info: VideoInfo) -> Self {
        Self { info: Some(info) }
    }

    pub fn failing() -> Self {
        Self { info: None }
    }
}

impl VideoProber for MockProber {
    fn probe(&self, input_path: &Path) -> CoreResult<VideoInfo> {
        self.info.ok_or_else(|| {
            CoreError::FfprobeParse(format!("mock probe failure for {}", input_path.display()))
        })
    }
}
