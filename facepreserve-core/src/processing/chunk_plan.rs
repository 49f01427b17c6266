//! Splits the video timeline into sampling-aligned chunks.
//!
//! Chunk `i` covers `[i*freq/fps, (i+1)*freq/fps)` seconds and reuses the
//! detection sample taken at its first frame. Once the sample runs out (the
//! decoder produced fewer frames than the container duration promises) the
//! last sample is held for every remaining chunk.

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::media::VideoInfo;
use crate::processing::detection::DetectionSample;

/// A half-open time interval of the output and the sample that applies to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Chunk {
    pub index: usize,
    pub start_time_s: f64,
    pub end_time_s: f64,
    /// Index into the [`DetectionSample`]
    pub region_index: usize,
}

impl Chunk {
    pub fn duration_s(&self) -> f64 {
        self.end_time_s - self.start_time_s
    }
}

/// `floor(duration_s * fps / update_freq)`.
///
/// A trailing partial interval is not counted.
pub fn chunk_count(info: &VideoInfo, update_freq: u32) -> usize {
    let count = (info.duration_s * f64::from(info.fps.num) / f64::from(info.fps.den)
        / f64::from(update_freq))
        .floor();
    if count.is_finite() && count > 0.0 {
        count as usize
    } else {
        0
    }
}

/// Builds the chunk list for `info`, assigning samples with hold-last-value.
pub fn plan_chunks(
    sample: &DetectionSample,
    info: &VideoInfo,
    update_freq: u32,
) -> CoreResult<Vec<Chunk>> {
    if update_freq == 0 {
        return Err(CoreError::Config(
            "update_freq must be a positive number of frames".to_string(),
        ));
    }
    if sample.is_empty() {
        return Err(CoreError::Config(
            "no detection samples were produced; the decoder returned no frames".to_string(),
        ));
    }

    let count = chunk_count(info, update_freq);
    if count == 0 {
        return Err(CoreError::Config(format!(
            "video duration {:.3}s is shorter than one sampling interval of {} frames at {} fps",
            info.duration_s, update_freq, info.fps
        )));
    }
    if count != sample.len() {
        log::debug!(
            "Chunk count {} differs from sample count {}; last sample is held",
            count,
            sample.len()
        );
    }

    let freq = u64::from(update_freq);
    let last_sample = sample.len() - 1;
    let chunks = (0..count)
        .map(|i| {
            let first_frame = i as u64 * freq;
            Chunk {
                index: i,
                start_time_s: info.fps.frames_to_seconds(first_frame),
                end_time_s: info.fps.frames_to_seconds(first_frame + freq),
                region_index: i.min(last_sample),
            }
        })
        .collect::<Vec<_>>();

    log::debug!(
        "Planned {} chunks of {} frames ({:.3}s each)",
        chunks.len(),
        update_freq,
        info.fps.frames_to_seconds(freq)
    );

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::FrameRate;

    fn info(duration_s: f64, fps: FrameRate) -> VideoInfo {
        VideoInfo {
            width: 64,
            height: 64,
            duration_s,
            fps,
        }
    }

    fn sample(n: usize, freq: u32) -> DetectionSample {
        DetectionSample::from_region_sets(freq, vec![Vec::new(); n])
    }

    #[test]
    fn test_two_seconds_at_ten_fps_gives_four_half_second_chunks() {
        let info = info(2.0, FrameRate::integer(10).unwrap());
        let chunks = plan_chunks(&sample(4, 5), &info, 5).unwrap();
        assert_eq!(chunks.len(), 4);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.start_time_s, i as f64 * 0.5);
            assert_eq!(chunk.end_time_s, (i + 1) as f64 * 0.5);
            assert_eq!(chunk.region_index, i);
        }
    }

    #[test]
    fn test_region_index_is_clamped() {
        let info = info(2.0, FrameRate::integer(10).unwrap());
        let chunks = plan_chunks(&sample(2, 5), &info, 5).unwrap();
        let indices: Vec<usize> = chunks.iter().map(|c| c.region_index).collect();
        assert_eq!(indices, vec![0, 1, 1, 1]);
    }

    #[test]
    fn test_trailing_partial_interval_dropped() {
        let info = info(2.3, FrameRate::integer(10).unwrap());
        assert_eq!(chunk_count(&info, 5), 4);
    }

    #[test]
    fn test_ntsc_boundaries_are_not_accumulated() {
        let fps = FrameRate::new(30000, 1001).unwrap();
        let info = info(100.0, fps);
        let chunks = plan_chunks(&sample(1, 4), &info, 4).unwrap();
        assert_eq!(chunks.len(), 749);
        let last = chunks.last().unwrap();
        assert_eq!(last.start_time_s, fps.frames_to_seconds(748 * 4));
        assert_eq!(last.end_time_s, fps.frames_to_seconds(749 * 4));
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end_time_s, pair[1].start_time_s);
        }
    }

    #[test]
    fn test_empty_sample_is_config_error() {
        let info = info(2.0, FrameRate::integer(10).unwrap());
        assert!(matches!(
            plan_chunks(&sample(0, 5), &info, 5),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn test_video_shorter_than_interval_is_config_error() {
        let info = info(0.3, FrameRate::integer(10).unwrap());
        assert!(matches!(
            plan_chunks(&sample(1, 5), &info, 5),
            Err(CoreError::Config(_))
        ));
    }
}
