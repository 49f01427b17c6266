//! Configuration structures and constants for the facepreserve-core library.
//!
//! This module provides the configuration for a selective-quality re-encode:
//! input and output paths, the base and region-of-interest CRF values, the
//! detection cadence, and the fixed encoder settings used for the whole run.

mod builder;

use std::path::PathBuf;

pub use builder::CoreConfigBuilder;

use crate::error::{CoreError, CoreResult};

// Default constants

/// Upper bound of the CRF scale used by x264/x265.
pub const MAX_CRF: u8 = 51;

/// Default CRF applied to everything outside the regions of interest.
/// Deliberately aggressive: the background is allowed to degrade.
pub const DEFAULT_BASE_CRF: u8 = 45;

/// Default effective CRF targeted inside regions of interest.
pub const DEFAULT_ROI_CRF: u8 = 30;

/// Default number of decoded frames between two detection samples.
pub const DEFAULT_UPDATE_FREQ: u32 = 4;

/// Default video codec for the re-encode. `addroi` side data is honoured by libx264/libx265.
pub const DEFAULT_CODEC: &str = "libx264";

/// Default x264 speed preset.
pub const DEFAULT_PRESET: &str = "veryfast";

/// Default output pixel format.
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";

/// Default colour of the diagnostic region outlines.
pub const DEFAULT_OVERLAY_COLOR: &str = "red";

/// Main configuration structure for the facepreserve-core library.
///
/// Typically created by the CLI and passed to
/// [`process_video`](crate::processing::orchestrator::process_video).
/// Only the two paths are required; everything else has a default.
///
/// # Examples
///
/// ```rust
/// use facepreserve_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .input_path(PathBuf::from("/videos/call.mp4"))
///     .output_path(PathBuf::from("/videos/call.roi.mp4"))
///     .base_crf(40)
///     .roi_crf(28)
///     .update_freq(8)
///     .draw_overlay(true)
///     .build();
///
/// assert_eq!(config.base_crf, 40);
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Video file to re-encode
    pub input_path: PathBuf,

    /// Destination of the re-encoded video (overwritten if present)
    pub output_path: PathBuf,

    /// CRF applied to the whole frame (0-51)
    pub base_crf: u8,

    /// Effective CRF inside regions of interest (0-51, strictly below `base_crf`)
    pub roi_crf: u8,

    /// Decoded frames between detection samples; also the chunk length in frames
    pub update_freq: u32,

    /// Draw an outline around every region (diagnostic only)
    pub draw_overlay: bool,

    /// Video codec passed to `-c:v`
    pub codec: String,

    /// Encoder speed preset passed to `-preset`
    pub preset: String,

    /// Output pixel format passed to `-pix_fmt`
    pub pixel_format: String,

    /// Colour of the diagnostic outlines
    pub overlay_color: String,

    /// Optional path the detection sample is written to as JSON after the decode pass
    pub save_detections: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_path: PathBuf::new(),
            base_crf: DEFAULT_BASE_CRF,
            roi_crf: DEFAULT_ROI_CRF,
            update_freq: DEFAULT_UPDATE_FREQ,
            draw_overlay: false,
            codec: DEFAULT_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            overlay_color: DEFAULT_OVERLAY_COLOR.to_string(),
            save_detections: None,
        }
    }
}

impl CoreConfig {
    /// Creates a configuration for `input_path` -> `output_path` with default settings.
    pub fn new(input_path: PathBuf, output_path: PathBuf) -> Self {
        Self {
            input_path,
            output_path,
            ..Self::default()
        }
    }

    /// Checks every constraint that can be checked before a process is started.
    ///
    /// Returns [`CoreError::Config`] describing the first violation.
    pub fn validate(&self) -> CoreResult<()> {
        validate_crf_pair(self.roi_crf, self.base_crf)?;

        if self.update_freq == 0 {
            return Err(CoreError::Config(
                "update_freq must be a positive number of frames".to_string(),
            ));
        }

        if self.input_path.as_os_str().is_empty() {
            return Err(CoreError::Config("input path is not set".to_string()));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(CoreError::Config("output path is not set".to_string()));
        }
        if !self.input_path.is_file() {
            return Err(CoreError::Config(format!(
                "input file '{}' does not exist",
                self.input_path.display()
            )));
        }
        if self.input_path == self.output_path {
            return Err(CoreError::Config(format!(
                "output path '{}' would overwrite the input",
                self.output_path.display()
            )));
        }

        for (name, value) in [
            ("codec", &self.codec),
            ("preset", &self.preset),
            ("pixel format", &self.pixel_format),
            ("overlay colour", &self.overlay_color),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Config(format!("{name} must not be empty")));
            }
        }

        Ok(())
    }
}

/// Enforces `0 <= roi_crf < base_crf <= 51`.
pub fn validate_crf_pair(roi_crf: u8, base_crf: u8) -> CoreResult<()> {
    if base_crf > MAX_CRF {
        return Err(CoreError::Config(format!(
            "base CRF {base_crf} is outside 0-{MAX_CRF}"
        )));
    }
    if roi_crf > MAX_CRF {
        return Err(CoreError::Config(format!(
            "ROI CRF {roi_crf} is outside 0-{MAX_CRF}"
        )));
    }
    if roi_crf >= base_crf {
        return Err(CoreError::Config(format!(
            "ROI CRF ({roi_crf}) must be strictly lower than base CRF ({base_crf})"
        )));
    }
    Ok(())
}
