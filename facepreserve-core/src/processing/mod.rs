//! Core pipeline stages and their orchestration.
//!
//! Stages, leaf first: frame reading, periodic detection, chunk planning,
//! encode graph construction. The orchestrator runs them against the two
//! ffmpeg processes of a run.

/// Raw rgb24 frame reading from the decoder pipe
pub mod frame_source;

/// Detection capability, adapters, and the sampling pass
pub mod detection;

/// Detectors that need no model runtime
pub mod detectors;

/// Time chunking with hold-last-value sample assignment
pub mod chunk_plan;

/// Per-chunk quality directives and filter graph rendering
pub mod encode_graph;

/// Process lifecycle and the end-to-end run
pub mod orchestrator;

pub use chunk_plan::{Chunk, plan_chunks};
pub use detection::{
    DetectionSample, RegionDetector, Stateless, StatelessDetector, Temporal, TemporalDetector,
    check_timestamp_resolution, sample_regions,
};
pub use detectors::{NoRegions, ReplayDetector, StaticRegions, TimedEntry, TimedRegions};
pub use encode_graph::{EncodeGraph, EncodeSettings, QualityOffset, build_encode_graph};
pub use frame_source::{Frame, FrameReader, FrameSource};
pub use orchestrator::{RunSummary, process_video};
