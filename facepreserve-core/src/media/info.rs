//! Video metadata consumed by the pipeline.
//!
//! `VideoInfo` holds the four scalar fields the pipeline needs from a probe:
//! width, height, duration and frame rate. The frame rate is kept as an exact
//! rational so that non-integer rates such as 30000/1001 never pass through a
//! decimal approximation when frame indices are turned into timestamps or
//! chunk boundaries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Bytes per pixel of the rgb24 raw stream produced by the decoder.
pub const RGB24_BYTES_PER_PIXEL: usize = 3;

/// A frame rate expressed as `num / den` frames per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    /// Creates a frame rate, rejecting a zero numerator or denominator.
    pub fn new(num: u32, den: u32) -> CoreResult<Self> {
        if num == 0 || den == 0 {
            return Err(CoreError::VideoInfoError(format!(
                "Invalid frame rate {num}/{den}: numerator and denominator must be positive"
            )));
        }
        Ok(Self { num, den })
    }

    /// Integer frame rate (`n/1`).
    pub fn integer(fps: u32) -> CoreResult<Self> {
        Self::new(fps, 1)
    }

    #[must_use]
    pub fn as_f64(&self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Presentation time in seconds of the frame (or frame boundary) at `frames`.
    ///
    /// Computed as a single division of exact integer products.
    #[must_use]
    pub fn frames_to_seconds(&self, frames: u64) -> f64 {
        let scaled = u128::from(frames) * u128::from(self.den);
        scaled as f64 / f64::from(self.num)
    }

    /// `floor(frame_index * 1000 / fps)` in exact integer arithmetic.
    #[must_use]
    pub fn timestamp_ms(&self, frame_index: u64) -> u64 {
        let scaled = u128::from(frame_index) * 1000 * u128::from(self.den);
        (scaled / u128::from(self.num)) as u64
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for FrameRate {
    type Err = CoreError;

    /// Parses ffprobe's `r_frame_rate` form (`"30000/1001"`) or a bare integer (`"25"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parse_part = |part: &str| {
            part.trim().parse::<u32>().map_err(|_| {
                CoreError::FfprobeParse(format!("Unparseable frame rate '{trimmed}'"))
            })
        };

        match trimmed.split_once('/') {
            Some((num, den)) => FrameRate::new(parse_part(num)?, parse_part(den)?),
            None => FrameRate::new(parse_part(trimmed)?, 1),
        }
    }
}

/// Video metadata required before processing begins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Width of the video in pixels
    pub width: u32,

    /// Height of the video in pixels
    pub height: u32,

    /// Duration of the container in seconds
    pub duration_s: f64,

    /// Frame rate as an exact rational
    pub fps: FrameRate,
}

impl VideoInfo {
    /// Size in bytes of one rgb24 frame.
    #[must_use]
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * RGB24_BYTES_PER_PIXEL
    }

    /// Approximate number of decoded frames, used only for progress reporting.
    #[must_use]
    pub fn estimated_frames(&self) -> u64 {
        (self.duration_s * self.fps.as_f64()).round().max(0.0) as u64
    }

    /// Human readable "WxH @ fps, duration" summary for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "{}x{} @ {} fps ({:.3}), {}",
            self.width,
            self.height,
            self.fps,
            self.fps.as_f64(),
            crate::utils::format_duration(self.duration_s)
        )
    }
}
