//! Region detectors that run without a model runtime.
//!
//! - [`NoRegions`]: never finds anything; the output is a uniform base-CRF encode.
//! - [`StaticRegions`]: the same fixed boxes on every sampled frame.
//! - [`ReplayDetector`]: plays back a [`DetectionSample`] saved by an earlier run.
//! - [`TimedRegions`]: a time-keyed region track, held until the next key.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::processing::detection::{DetectionSample, StatelessDetector, TemporalDetector};
use crate::processing::frame_source::Frame;
use crate::regions::{Region, RegionSet};

/// Detector that reports no regions for any frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRegions;

impl StatelessDetector for NoRegions {
    fn detect_frame(&mut self, _frame: &Frame) -> CoreResult<RegionSet> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Detector that reports the same regions for every frame.
#[derive(Debug, Clone, Default)]
pub struct StaticRegions {
    regions: RegionSet,
}

impl StaticRegions {
    pub fn new(regions: RegionSet) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }
}

impl StatelessDetector for StaticRegions {
    fn detect_frame(&mut self, _frame: &Frame) -> CoreResult<RegionSet> {
        Ok(self.regions.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Plays back a saved detection sample.
///
/// The sample element is chosen from the frame index, so the saved run must
/// have used the same `update_freq` as the current one.
#[derive(Debug, Clone)]
pub struct ReplayDetector {
    sample: DetectionSample,
}

impl ReplayDetector {
    /// Wraps `sample` for a run that samples every `update_freq` frames.
    pub fn new(sample: DetectionSample, update_freq: u32) -> CoreResult<Self> {
        if sample.update_freq() != update_freq {
            return Err(CoreError::Config(format!(
                "saved detections were sampled every {} frames, but this run samples every {}",
                sample.update_freq(),
                update_freq
            )));
        }
        Ok(Self { sample })
    }

    /// Loads a sample written with `--save-detections`.
    pub fn from_file(path: &Path, update_freq: u32) -> CoreResult<Self> {
        let sample = DetectionSample::load(path)?;
        log::info!(
            "Loaded {} detection samples from {}",
            sample.len(),
            path.display()
        );
        Self::new(sample, update_freq)
    }
}

impl StatelessDetector for ReplayDetector {
    fn detect_frame(&mut self, frame: &Frame) -> CoreResult<RegionSet> {
        let freq = u64::from(self.sample.update_freq());
        let position = frame.index / freq;
        usize::try_from(position)
            .ok()
            .and_then(|i| self.sample.get(i))
            .map(<[Region]>::to_vec)
            .ok_or_else(|| {
                CoreError::Detection(format!(
                    "saved detections end after {} samples, frame {} needs sample {}",
                    self.sample.len(),
                    frame.index,
                    position
                ))
            })
    }

    fn name(&self) -> &str {
        "replay"
    }
}

/// One key of a [`TimedRegions`] track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEntry {
    pub timestamp_ms: u64,
    pub regions: RegionSet,
}

/// A region track keyed by timestamp.
///
/// Each key applies from its timestamp until the next key. Frames before the
/// first key have no regions.
#[derive(Debug, Clone, Default)]
pub struct TimedRegions {
    entries: Vec<TimedEntry>,
}

impl TimedRegions {
    pub fn new(mut entries: Vec<TimedEntry>) -> Self {
        entries.sort_by_key(|e| e.timestamp_ms);
        Self { entries }
    }

    /// Reads a JSON array of `{"timestamp_ms": .., "regions": [..]}` objects.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let file = File::open(path).map_err(|e| {
            CoreError::PathError(format!(
                "Failed to open region track '{}': {}",
                path.display(),
                e
            ))
        })?;
        let entries: Vec<TimedEntry> = serde_json::from_reader(BufReader::new(file))?;
        log::info!(
            "Loaded region track with {} keys from {}",
            entries.len(),
            path.display()
        );
        Ok(Self::new(entries))
    }

    /// Regions in effect at `timestamp_ms`.
    pub fn regions_at(&self, timestamp_ms: u64) -> &[Region] {
        let applicable = self
            .entries
            .partition_point(|e| e.timestamp_ms <= timestamp_ms);
        match applicable {
            0 => &[],
            n => &self.entries[n - 1].regions,
        }
    }
}

impl TemporalDetector for TimedRegions {
    fn detect_at(&mut self, _frame: &Frame, timestamp_ms: u64) -> CoreResult<RegionSet> {
        Ok(self.regions_at(timestamp_ms).to_vec())
    }

    fn name(&self) -> &str {
        "timed"
    }
}
