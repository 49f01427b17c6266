//! Core library for selective-quality video re-encoding with ffmpeg.
//!
//! A run decodes the input to raw frames, samples regions of interest every
//! `update_freq` frames, splits the timeline into matching chunks, and
//! re-encodes the whole video once at a low base quality while asking the
//! encoder to spend more bits inside each chunk's regions.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use facepreserve_core::{CoreConfig, process_video};
//! use facepreserve_core::events::EventDispatcher;
//! use facepreserve_core::external::SidecarSpawner;
//! use facepreserve_core::media::CrateFfprobeExecutor;
//! use facepreserve_core::processing::{Stateless, StaticRegions};
//! use facepreserve_core::regions::Region;
//! use std::path::PathBuf;
//!
//! let mut config = CoreConfig::new(
//!     PathBuf::from("/videos/call.mp4"),
//!     PathBuf::from("/videos/call.roi.mp4"),
//! );
//! config.roi_crf = 28;
//! config.validate().unwrap();
//!
//! let mut detector = Stateless(StaticRegions::new(vec![Region::new(640, 200, 320, 360)]));
//! let summary = process_video(
//!     &SidecarSpawner,
//!     &CrateFfprobeExecutor::new(),
//!     &mut detector,
//!     &config,
//!     &EventDispatcher::new(),
//! )
//! .unwrap();
//! println!("{} chunks encoded", summary.chunk_count);
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod external;
pub mod file_logging;
pub mod media;
pub mod processing;
pub mod regions;
pub mod utils;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{CoreError, CoreResult, ProcessRole};
pub use external::check_dependency;
pub use media::{FrameRate, VideoInfo};
pub use processing::{RunSummary, process_video};
pub use regions::{Region, RegionSet};
pub use utils::{calculate_size_reduction, format_bytes, format_duration, parse_ffmpeg_time};
