//! Media information and probing module
//!
//! This module provides the [`VideoInfo`] consumed by the pipeline and the
//! ffprobe-backed prober that produces it.

pub mod info;
pub mod probe;

// Re-export commonly used types
pub use info::{FrameRate, VideoInfo, RGB24_BYTES_PER_PIXEL};
pub use probe::{CrateFfprobeExecutor, VideoProber, get_video_info};
