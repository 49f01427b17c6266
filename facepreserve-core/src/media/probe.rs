//! FFprobe integration for obtaining [`VideoInfo`].
//!
//! Only four scalar fields are read: stream width and height, container
//! duration, and the stream's `r_frame_rate`, which is parsed as a rational.
use crate::error::{CoreError, CoreResult, command_start_error};
use crate::media::info::{FrameRate, VideoInfo};
use ffprobe::{FfProbeError, ffprobe};
use std::path::Path;

/// Trait for anything that can produce [`VideoInfo`] for an input file.
pub trait VideoProber {
    fn probe(&self, input_path: &Path) -> CoreResult<VideoInfo>;
}

/// Production prober backed by the `ffprobe` crate.
#[derive(Debug, Clone, Default)]
pub struct CrateFfprobeExecutor;

impl CrateFfprobeExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl VideoProber for CrateFfprobeExecutor {
    fn probe(&self, input_path: &Path) -> CoreResult<VideoInfo> {
        get_video_info(input_path)
    }
}

/// Gets the video info for a given input file.
pub fn get_video_info(input_path: &Path) -> CoreResult<VideoInfo> {
    log::debug!(
        "Running ffprobe (via crate) for video info on: {}",
        input_path.display()
    );
    match ffprobe(input_path) {
        Ok(metadata) => {
            let duration_s = metadata
                .format
                .duration
                .as_deref()
                .and_then(|d| d.parse::<f64>().ok())
                .ok_or_else(|| {
                    CoreError::FfprobeParse(format!(
                        "Failed to parse duration from format for {}",
                        input_path.display()
                    ))
                })?;

            let video_stream = metadata
                .streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
                .ok_or_else(|| {
                    CoreError::VideoInfoError(format!(
                        "No video stream found in {}",
                        input_path.display()
                    ))
                })?;
            let width = video_stream.width.ok_or_else(|| {
                CoreError::VideoInfoError(format!(
                    "Video stream missing width in {}",
                    input_path.display()
                ))
            })?;
            let height = video_stream.height.ok_or_else(|| {
                CoreError::VideoInfoError(format!(
                    "Video stream missing height in {}",
                    input_path.display()
                ))
            })?;

            let fps: FrameRate = video_stream.r_frame_rate.parse()?;

            build_video_info(width, height, duration_s, fps).map_err(|e| {
                CoreError::VideoInfoError(format!("{} in {}", e, input_path.display()))
            })
        }
        Err(err) => {
            log::error!("ffprobe failed for video info on {}: {:?}", input_path.display(), err);
            Err(map_ffprobe_error(err))
        }
    }
}

/// Validates the raw probe values and assembles a [`VideoInfo`].
pub fn build_video_info(
    width: i64,
    height: i64,
    duration_s: f64,
    fps: FrameRate,
) -> CoreResult<VideoInfo> {
    if width <= 0 || height <= 0 || width > i64::from(u32::MAX) || height > i64::from(u32::MAX) {
        return Err(CoreError::VideoInfoError(format!(
            "Invalid dimensions: width={width}, height={height}"
        )));
    }
    if !duration_s.is_finite() || duration_s < 0.0 {
        return Err(CoreError::VideoInfoError(format!(
            "Invalid duration: {duration_s}"
        )));
    }

    Ok(VideoInfo {
        width: width as u32,
        height: height as u32,
        duration_s,
        fps,
    })
}

fn map_ffprobe_error(err: FfProbeError) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error("ffprobe", io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            CoreError::FfprobeParse(format!(
                "ffprobe exited with {}: {}",
                output.status,
                stderr.trim()
            ))
        }
        FfProbeError::Deserialize(err) => {
            CoreError::JsonParseError(format!("ffprobe output deserialization: {err}"))
        }
        _ => CoreError::FfprobeParse(format!("Unknown ffprobe error: {err:?}")),
    }
}
