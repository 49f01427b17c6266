//! JSON progress handler for structured progress output
//!
//! Writes one JSON object per line for every pipeline event, so a wrapper
//! script can follow a run without scraping log output.

use super::{Event, EventHandler};
use serde_json::json;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event handler that outputs progress events as structured JSON to stdout
pub struct JsonProgressHandler {
    output: Mutex<Box<dyn Write + Send>>,
}

impl JsonProgressHandler {
    /// Create a new JSON progress handler that writes to stdout
    pub fn new() -> Self {
        Self {
            output: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a new JSON progress handler with a custom writer
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            output: Mutex::new(writer),
        }
    }

    /// Get current timestamp as seconds since Unix epoch
    fn get_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    fn write_json(&self, value: serde_json::Value) {
        if let Ok(mut output) = self.output.lock() {
            if let Ok(json_str) = serde_json::to_string(&value) {
                let _ = writeln!(output, "{}", json_str);
                let _ = output.flush();
            }
        }
    }
}

impl EventHandler for JsonProgressHandler {
    fn handle(&self, event: &Event) {
        let timestamp = Self::get_timestamp();

        let value = match event {
            Event::RunStarted {
                input_file,
                output_file,
                resolution,
                duration,
                frame_rate,
                detector,
                update_freq,
            } => json!({
                "type": "run_started",
                "input_file": input_file,
                "output_file": output_file,
                "resolution": resolution,
                "duration": duration,
                "frame_rate": frame_rate,
                "detector": detector,
                "update_freq": update_freq,
                "timestamp": timestamp
            }),

            Event::DetectionProgress {
                frames_read,
                estimated_frames,
            } => {
                let percent = if *estimated_frames > 0 {
                    (*frames_read as f64 / *estimated_frames as f64 * 100.0).min(100.0)
                } else {
                    0.0
                };
                json!({
                    "type": "detection_progress",
                    "stage": "detection",
                    "frames_read": frames_read,
                    "estimated_frames": estimated_frames,
                    "percent": percent.round(),
                    "timestamp": timestamp
                })
            }

            Event::DetectionComplete {
                frames_read,
                samples,
                total_regions,
                coverage,
            } => json!({
                "type": "detection_complete",
                "frames_read": frames_read,
                "samples": samples,
                "total_regions": total_regions,
                "coverage": coverage,
                "timestamp": timestamp
            }),

            Event::PlanReady {
                chunks,
                region_directives,
                quality_offset,
            } => json!({
                "type": "plan_ready",
                "chunks": chunks,
                "region_directives": region_directives,
                "quality_offset": quality_offset,
                "timestamp": timestamp
            }),

            Event::EncodingStarted { total_duration_s } => json!({
                "type": "encoding_started",
                "total_duration_seconds": total_duration_s,
                "timestamp": timestamp
            }),

            Event::EncodingProgress {
                elapsed_s,
                total_s,
                percent,
                speed,
                fps,
            } => {
                // Every 5% is enough for a consumer and keeps stdout quiet
                if (*percent as u32) % 5 != 0 && *percent < 99.0 {
                    return;
                }
                json!({
                    "type": "encoding_progress",
                    "stage": "encoding",
                    "elapsed_seconds": elapsed_s,
                    "total_seconds": total_s,
                    "percent": percent,
                    "speed": speed,
                    "fps": fps,
                    "timestamp": timestamp
                })
            }

            Event::RunComplete {
                output_file,
                input_size,
                output_size,
                total_time,
            } => json!({
                "type": "run_complete",
                "output_file": output_file,
                "input_size": input_size,
                "output_size": output_size,
                "duration_seconds": total_time.as_secs(),
                "size_reduction_percent": match output_size {
                    Some(out) if *input_size > 0 => {
                        (((*input_size as f64) - (*out as f64)) / (*input_size as f64) * 100.0).round()
                    }
                    _ => 0.0,
                },
                "timestamp": timestamp
            }),

            Event::Warning { message } => json!({
                "type": "warning",
                "message": message,
                "timestamp": timestamp
            }),
        };

        self.write_json(value);
    }
}

impl Default for JsonProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct MockWriter {
        content: Arc<Mutex<Vec<u8>>>,
    }

    impl MockWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let content = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    content: content.clone(),
                },
                content,
            )
        }
    }

    impl Write for MockWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.content.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn lines(content: &Arc<Mutex<Vec<u8>>>) -> Vec<serde_json::Value> {
        let output = String::from_utf8(content.lock().unwrap().clone()).unwrap();
        output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_detection_progress_json() {
        let (writer, content) = MockWriter::new();
        let handler = JsonProgressHandler::with_writer(Box::new(writer));

        handler.handle(&Event::DetectionProgress {
            frames_read: 50,
            estimated_frames: 200,
        });

        let parsed = lines(&content);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["type"], "detection_progress");
        assert_eq!(parsed[0]["frames_read"], 50);
        assert_eq!(parsed[0]["percent"], 25.0);
    }

    #[test]
    fn test_encoding_progress_is_throttled() {
        let (writer, content) = MockWriter::new();
        let handler = JsonProgressHandler::with_writer(Box::new(writer));

        for percent in [10.0, 12.0, 15.0] {
            handler.handle(&Event::EncodingProgress {
                elapsed_s: 1.0,
                total_s: 10.0,
                percent,
                speed: 1.5,
                fps: 30.0,
            });
        }

        let parsed = lines(&content);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["percent"], 10.0);
        assert_eq!(parsed[1]["percent"], 15.0);
    }

    #[test]
    fn test_run_complete_reports_reduction() {
        let (writer, content) = MockWriter::new();
        let handler = JsonProgressHandler::with_writer(Box::new(writer));

        handler.handle(&Event::RunComplete {
            output_file: "out.mp4".to_string(),
            input_size: 1000,
            output_size: Some(250),
            total_time: Duration::from_secs(12),
        });

        let parsed = lines(&content);
        assert_eq!(parsed[0]["type"], "run_complete");
        assert_eq!(parsed[0]["size_reduction_percent"], 75.0);
        assert_eq!(parsed[0]["duration_seconds"], 12);
    }
}
