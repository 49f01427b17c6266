// ============================================================================
// facepreserve-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent construction of CoreConfig. The builder never validates; callers run
// CoreConfig::validate() before handing the config to the pipeline.

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::CoreConfig;

/// Builder for creating CoreConfig instances.
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new CoreConfigBuilder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the input video path.
    pub fn input_path(mut self, input_path: PathBuf) -> Self {
        self.config.input_path = input_path;
        self
    }

    /// Sets the output video path.
    pub fn output_path(mut self, output_path: PathBuf) -> Self {
        self.config.output_path = output_path;
        self
    }

    /// Sets the CRF used outside regions of interest.
    pub fn base_crf(mut self, crf: u8) -> Self {
        self.config.base_crf = crf;
        self
    }

    /// Sets the CRF targeted inside regions of interest.
    pub fn roi_crf(mut self, crf: u8) -> Self {
        self.config.roi_crf = crf;
        self
    }

    /// Sets the number of frames between detection samples.
    pub fn update_freq(mut self, frames: u32) -> Self {
        self.config.update_freq = frames;
        self
    }

    /// Enables or disables the diagnostic region outlines.
    pub fn draw_overlay(mut self, enable: bool) -> Self {
        self.config.draw_overlay = enable;
        self
    }

    /// Sets the video codec.
    pub fn codec(mut self, codec: &str) -> Self {
        self.config.codec = codec.to_string();
        self
    }

    /// Sets the encoder preset.
    pub fn preset(mut self, preset: &str) -> Self {
        self.config.preset = preset.to_string();
        self
    }

    /// Sets the output pixel format.
    pub fn pixel_format(mut self, pixel_format: &str) -> Self {
        self.config.pixel_format = pixel_format.to_string();
        self
    }

    /// Sets the overlay outline colour.
    pub fn overlay_color(mut self, color: &str) -> Self {
        self.config.overlay_color = color.to_string();
        self
    }

    /// Sets the path the detection sample is saved to.
    pub fn save_detections(mut self, path: PathBuf) -> Self {
        self.config.save_detections = Some(path);
        self
    }

    /// Builds the CoreConfig.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}
