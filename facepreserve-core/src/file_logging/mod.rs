pub mod setup;

use crate::events::{Event, EventHandler};
use crate::utils::{calculate_size_reduction, format_bytes, format_duration};
use log::{debug, info, warn};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Turns pipeline events into log lines for the file log.
///
/// Encoding progress is throttled to 10% steps, with a time fallback so long
/// encodes still show up regularly.
pub struct FileLoggingHandler {
    last_logged_percent: Mutex<Option<u32>>,
    last_log_time: Mutex<Option<Instant>>,
}

impl Default for FileLoggingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FileLoggingHandler {
    pub fn new() -> Self {
        Self {
            last_logged_percent: Mutex::new(None),
            last_log_time: Mutex::new(None),
        }
    }

    fn should_log_progress(&self, percent: u32) -> bool {
        let (Ok(mut last_percent), Ok(mut last_time)) =
            (self.last_logged_percent.lock(), self.last_log_time.lock())
        else {
            return false;
        };
        let now = Instant::now();
        let due = match (*last_percent, *last_time) {
            (Some(p), Some(t)) => {
                percent >= p + 10
                    || (percent > p && now.duration_since(t) >= Duration::from_secs(300))
            }
            _ => true,
        };
        if due {
            *last_percent = Some(percent);
            *last_time = Some(now);
        }
        due
    }
}

impl EventHandler for FileLoggingHandler {
    fn handle(&self, event: &Event) {
        match event {
            Event::RunStarted {
                input_file,
                output_file,
                resolution,
                duration,
                frame_rate,
                detector,
                update_freq,
            } => {
                info!("Starting selective-quality encode");
                info!("Input: {} ({}, {}, {} fps)", input_file, resolution, duration, frame_rate);
                info!("Output: {}", output_file);
                info!("Detector: {}, sampling every {} frames", detector, update_freq);
            }

            Event::DetectionProgress {
                frames_read,
                estimated_frames,
            } => {
                debug!("Detection: {}/~{} frames", frames_read, estimated_frames);
            }

            Event::DetectionComplete {
                frames_read,
                samples,
                total_regions,
                coverage,
            } => {
                info!(
                    "Detection complete: {} frames, {} samples, {} regions, {:.2}% mean coverage",
                    frames_read,
                    samples,
                    total_regions,
                    coverage * 100.0
                );
            }

            Event::PlanReady {
                chunks,
                region_directives,
                quality_offset,
            } => {
                info!(
                    "Encode plan: {} chunks, {} region directives, qoffset {:.4}",
                    chunks, region_directives, quality_offset
                );
            }

            Event::EncodingStarted { total_duration_s } => {
                info!("Encoding {} of video", format_duration(*total_duration_s));
            }

            Event::EncodingProgress {
                elapsed_s,
                total_s,
                percent,
                speed,
                fps,
            } => {
                if self.should_log_progress(*percent as u32) {
                    info!(
                        "Encoding progress: {:.1}% ({} / {}), speed {:.2}x, {:.1} fps",
                        percent,
                        format_duration(*elapsed_s),
                        format_duration(*total_s),
                        speed,
                        fps
                    );
                }
            }

            Event::RunComplete {
                output_file,
                input_size,
                output_size,
                total_time,
            } => {
                info!("Encode complete: {}", output_file);
                match output_size {
                    Some(out) => info!(
                        "Size: {} -> {} ({}% reduction)",
                        format_bytes(*input_size),
                        format_bytes(*out),
                        calculate_size_reduction(*input_size, *out)
                    ),
                    None => info!("Size: {} -> unknown", format_bytes(*input_size)),
                }
                info!("Total time: {}", format_duration(total_time.as_secs_f64()));
            }

            Event::Warning { message } => {
                warn!("{}", message);
            }
        }
    }
}
