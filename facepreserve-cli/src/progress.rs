// ============================================================================
// facepreserve-cli/src/progress.rs
// ============================================================================
//
// PROGRESS REPORTING: Terminal progress bars for a run
//
// Implements the core EventHandler with indicatif: one bar for the decode +
// detection pass (frames), one for the encode (percent of output duration).

// ---- External crate imports ----
use facepreserve_core::events::{Event, EventHandler};
use facepreserve_core::format_duration;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

// ---- Standard library imports ----
use std::sync::Mutex;
use std::time::Duration;

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ")
}

/// Progress bar handler for interactive runs.
pub struct ProgressBarHandler {
    bar: Mutex<Option<ProgressBar>>,
    hidden: bool,
}

impl ProgressBarHandler {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            hidden: false,
        }
    }

    /// A handler whose bars are never drawn (tests, non-terminal output).
    pub fn hidden() -> Self {
        Self {
            bar: Mutex::new(None),
            hidden: true,
        }
    }

    fn start_bar(&self, total: u64, template: &str, message: &str) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if self.hidden {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        } else {
            pb.enable_steady_tick(Duration::from_millis(100));
        }
        pb.set_style(bar_style(template));
        pb.set_message(message.to_string());
        pb
    }

    fn finish_current(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }

    fn println(&self, line: &str) {
        if self.hidden {
            return;
        }
        match self.bar.lock().ok().and_then(|slot| slot.clone()) {
            Some(pb) => pb.println(line),
            None => eprintln!("{line}"),
        }
    }

    /// Current bar position, if a bar is active.
    pub fn position(&self) -> Option<u64> {
        self.bar
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(ProgressBar::position))
    }
}

impl Default for ProgressBarHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for ProgressBarHandler {
    fn handle(&self, event: &Event) {
        match event {
            Event::RunStarted {
                input_file,
                resolution,
                duration,
                frame_rate,
                detector,
                ..
            } => {
                self.println(&format!(
                    "{input_file}: {resolution}, {duration}, {frame_rate} fps, detector {detector}"
                ));
            }

            Event::DetectionProgress {
                frames_read,
                estimated_frames,
            } => {
                if let Ok(mut slot) = self.bar.lock() {
                    let pb = slot.get_or_insert_with(|| {
                        self.start_bar(
                            (*estimated_frames).max(1),
                            "{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} frames ({eta})",
                            "Detecting",
                        )
                    });
                    if *frames_read > pb.length().unwrap_or(0) {
                        pb.set_length(*frames_read);
                    }
                    pb.set_position(*frames_read);
                }
            }

            Event::DetectionComplete {
                frames_read,
                samples,
                coverage,
                ..
            } => {
                self.finish_current();
                self.println(&format!(
                    "Detection: {frames_read} frames, {samples} samples, {:.1}% mean ROI coverage",
                    coverage * 100.0
                ));
            }

            Event::PlanReady {
                chunks,
                region_directives,
                ..
            } => {
                self.println(&format!(
                    "Plan: {chunks} chunks, {region_directives} region directives"
                ));
            }

            Event::EncodingStarted { total_duration_s } => {
                let pb = self.start_bar(
                    100,
                    "{spinner:.green} {msg} [{bar:40.cyan/blue}] {percent}% ({eta})",
                    &format!("Encoding {}", format_duration(*total_duration_s)),
                );
                if let Ok(mut slot) = self.bar.lock() {
                    *slot = Some(pb);
                }
            }

            Event::EncodingProgress {
                percent,
                speed,
                fps,
                ..
            } => {
                if let Ok(slot) = self.bar.lock() {
                    if let Some(pb) = slot.as_ref() {
                        pb.set_position(percent.round() as u64);
                        pb.set_message(format!("Encoding {speed:.2}x {fps:.0} fps"));
                    }
                }
            }

            Event::RunComplete { .. } => self.finish_current(),

            Event::Warning { message } => self.println(&format!("Warning: {message}")),
        }
    }
}
