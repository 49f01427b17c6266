//! Periodic region detection over the decoded frame stream.
//!
//! The scheduler walks every decoded frame once. Frames whose index is a
//! multiple of `update_freq` are handed to the detector together with their
//! presentation timestamp; the rest are counted and dropped. The output is a
//! [`DetectionSample`] with exactly one region set per sampled frame, in call
//! order. Holding a sample over the frames that follow it is the chunk
//! planner's job, not this module's.
//!
//! Detectors come in two families behind one [`RegionDetector`] trait:
//!
//! - [`Temporal`] wraps a [`TemporalDetector`], which needs strictly
//!   increasing millisecond timestamps (video-mode trackers).
//! - [`Stateless`] wraps a [`StatelessDetector`], which looks at each frame
//!   in isolation and ignores timestamps.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::events::{Event, EventDispatcher};
use crate::media::VideoInfo;
use crate::processing::frame_source::{Frame, FrameReader};
use crate::regions::{Region, RegionSet};

/// Frames between two `DetectionProgress` events.
const PROGRESS_INTERVAL_FRAMES: u64 = 50;

/// The capability the scheduler invokes on sampled frames.
pub trait RegionDetector {
    /// Detects regions of interest in `frame`, shown at `timestamp_ms`.
    fn detect(&mut self, frame: &Frame, timestamp_ms: u64) -> CoreResult<RegionSet>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "detector"
    }

    /// Whether consecutive calls must carry strictly increasing timestamps.
    fn requires_increasing_timestamps(&self) -> bool {
        false
    }
}

impl<D: RegionDetector + ?Sized> RegionDetector for Box<D> {
    fn detect(&mut self, frame: &Frame, timestamp_ms: u64) -> CoreResult<RegionSet> {
        (**self).detect(frame, timestamp_ms)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn requires_increasing_timestamps(&self) -> bool {
        (**self).requires_increasing_timestamps()
    }
}

/// A detector that needs a strictly increasing timestamp on every call.
pub trait TemporalDetector {
    fn detect_at(&mut self, frame: &Frame, timestamp_ms: u64) -> CoreResult<RegionSet>;

    fn name(&self) -> &str {
        "temporal"
    }
}

/// A detector that treats each frame independently.
pub trait StatelessDetector {
    fn detect_frame(&mut self, frame: &Frame) -> CoreResult<RegionSet>;

    fn name(&self) -> &str {
        "stateless"
    }
}

/// Adapter for [`TemporalDetector`]s.
///
/// Rejects a timestamp that does not move forward instead of passing it on.
/// Sample timestamps are whole milliseconds, so they only move forward while
/// `update_freq` frames span at least 1 ms; see [`check_timestamp_resolution`].
pub struct Temporal<D> {
    inner: D,
    last_timestamp_ms: Option<u64>,
}

impl<D: TemporalDetector> Temporal<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            last_timestamp_ms: None,
        }
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: TemporalDetector> RegionDetector for Temporal<D> {
    fn detect(&mut self, frame: &Frame, timestamp_ms: u64) -> CoreResult<RegionSet> {
        if let Some(last) = self.last_timestamp_ms {
            if timestamp_ms <= last {
                return Err(CoreError::Detection(format!(
                    "{} requires increasing timestamps, got {} ms after {} ms (frame {})",
                    self.inner.name(),
                    timestamp_ms,
                    last,
                    frame.index
                )));
            }
        }
        self.last_timestamp_ms = Some(timestamp_ms);
        self.inner.detect_at(frame, timestamp_ms)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn requires_increasing_timestamps(&self) -> bool {
        true
    }
}

/// Adapter for [`StatelessDetector`]s. The timestamp is ignored.
pub struct Stateless<D>(pub D);

impl<D: StatelessDetector> RegionDetector for Stateless<D> {
    fn detect(&mut self, frame: &Frame, _timestamp_ms: u64) -> CoreResult<RegionSet> {
        self.0.detect_frame(frame)
    }

    fn name(&self) -> &str {
        self.0.name()
    }
}

/// Fails with a `Config` error when `detector` needs increasing timestamps but
/// `update_freq` frames at `info.fps` span less than one millisecond, so that
/// floored sample timestamps would repeat.
pub fn check_timestamp_resolution<D: RegionDetector + ?Sized>(
    detector: &D,
    info: &VideoInfo,
    update_freq: u32,
) -> CoreResult<()> {
    if !detector.requires_increasing_timestamps() {
        return Ok(());
    }
    let step_scaled = u128::from(update_freq) * 1000 * u128::from(info.fps.den);
    if step_scaled < u128::from(info.fps.num) {
        return Err(CoreError::Config(format!(
            "{} needs increasing millisecond timestamps, but {} frames at {} fps last under 1 ms; raise update_freq",
            detector.name(),
            update_freq,
            info.fps
        )));
    }
    Ok(())
}

/// Region sets for frames `0, freq, 2*freq, ...` in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSample {
    update_freq: u32,
    samples: Vec<RegionSet>,
}

impl DetectionSample {
    pub fn new(update_freq: u32) -> Self {
        Self {
            update_freq,
            samples: Vec::new(),
        }
    }

    /// Builds a sample from already computed region sets.
    pub fn from_region_sets(update_freq: u32, samples: Vec<RegionSet>) -> Self {
        Self {
            update_freq,
            samples,
        }
    }

    pub fn update_freq(&self) -> u32 {
        self.update_freq
    }

    pub fn push(&mut self, regions: RegionSet) {
        self.samples.push(regions);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[Region]> {
        self.samples.get(index).map(Vec::as_slice)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RegionSet> {
        self.samples.iter()
    }

    /// Total number of regions over every sample.
    pub fn total_regions(&self) -> usize {
        self.samples.iter().map(Vec::len).sum()
    }

    /// Writes the sample as pretty JSON.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let file = File::create(path).map_err(|e| {
            CoreError::PathError(format!(
                "Failed to create detections file '{}': {}",
                path.display(),
                e
            ))
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        log::info!("Saved {} detection samples to {}", self.len(), path.display());
        Ok(())
    }

    /// Reads a sample previously written by [`DetectionSample::save`].
    pub fn load(path: &Path) -> CoreResult<Self> {
        let file = File::open(path).map_err(|e| {
            CoreError::PathError(format!(
                "Failed to open detections file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let sample: DetectionSample = serde_json::from_reader(BufReader::new(file))?;
        if sample.update_freq == 0 {
            return Err(CoreError::JsonParseError(format!(
                "detections file '{}' has update_freq 0",
                path.display()
            )));
        }
        Ok(sample)
    }
}

/// Counters from one sampling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplingStats {
    pub frames_read: u64,
    pub frames_sampled: u64,
}

/// Runs the detection pass over `source` until it is exhausted.
///
/// Detector failures abort the pass; any non-detection error a detector
/// returns is reported as [`CoreError::Detection`].
pub fn sample_regions<S, D>(
    source: &mut S,
    info: &VideoInfo,
    update_freq: u32,
    detector: &mut D,
    events: &EventDispatcher,
) -> CoreResult<(DetectionSample, SamplingStats)>
where
    S: FrameReader + ?Sized,
    D: RegionDetector + ?Sized,
{
    if update_freq == 0 {
        return Err(CoreError::Config(
            "update_freq must be a positive number of frames".to_string(),
        ));
    }

    let freq = u64::from(update_freq);
    let estimated_frames = info.estimated_frames();
    let mut sample = DetectionSample::new(update_freq);
    let mut stats = SamplingStats::default();

    log::info!(
        "Sampling regions every {} frames with {}",
        update_freq,
        detector.name()
    );

    while let Some(frame) = source.next_frame()? {
        stats.frames_read += 1;

        if frame.index % freq == 0 {
            let timestamp_ms = info.fps.timestamp_ms(frame.index);
            let regions = detector
                .detect(&frame, timestamp_ms)
                .map_err(|e| match e {
                    CoreError::Detection(_) => e,
                    other => CoreError::Detection(format!(
                        "{} failed on frame {}: {}",
                        detector.name(),
                        frame.index,
                        other
                    )),
                })?;
            log::trace!(
                "Frame {} @ {} ms: {} regions",
                frame.index,
                timestamp_ms,
                regions.len()
            );
            sample.push(regions);
            stats.frames_sampled += 1;
        }

        if stats.frames_read % PROGRESS_INTERVAL_FRAMES == 0 {
            events.emit(Event::DetectionProgress {
                frames_read: stats.frames_read,
                estimated_frames,
            });
        }
    }

    log::info!(
        "Detection pass complete: {} frames read, {} samples, {} regions",
        stats.frames_read,
        sample.len(),
        sample.total_regions()
    );

    Ok((sample, stats))
}
