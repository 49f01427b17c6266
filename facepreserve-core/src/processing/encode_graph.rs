//! Encode plan: one quality-adjusted sub-stream per chunk, concatenated.
//!
//! The graph is plain data. [`EncodeGraph::filter_complex`] renders it to an
//! ffmpeg `-filter_complex` string; the command itself is assembled in
//! `external::ffmpeg`.

use std::fmt::Write as _;

use serde::Serialize;

use crate::config::{CoreConfig, MAX_CRF, validate_crf_pair};
use crate::error::{CoreError, CoreResult};
use crate::processing::chunk_plan::Chunk;
use crate::processing::detection::DetectionSample;
use crate::regions::Region;

/// Relative quality shift applied inside every region, in `[-1, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityOffset(f64);

impl QualityOffset {
    /// `(roi_crf - base_crf) / 51`, rejecting pairs outside `0 <= roi < base <= 51`.
    pub fn from_crf(roi_crf: u8, base_crf: u8) -> CoreResult<Self> {
        validate_crf_pair(roi_crf, base_crf)?;
        Ok(Self(
            (f64::from(roi_crf) - f64::from(base_crf)) / f64::from(MAX_CRF),
        ))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Encoder quality hint for one region of one sub-stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionDirective {
    pub region: Region,
    pub qoffset: QualityOffset,
}

/// Diagnostic outline drawn around one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayDirective {
    pub region: Region,
    pub color: String,
}

/// One chunk of the input, trimmed and restarted at time zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubStream {
    pub start_time_s: f64,
    pub end_time_s: f64,
    pub regions: Vec<RegionDirective>,
    pub overlays: Vec<OverlayDirective>,
}

/// Settings shared by the single encode of the concatenated stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodeSettings {
    pub base_crf: u8,
    pub codec: String,
    pub preset: String,
    pub pixel_format: String,
}

impl EncodeSettings {
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            base_crf: config.base_crf,
            codec: config.codec.clone(),
            preset: config.preset.clone(),
            pixel_format: config.pixel_format.clone(),
        }
    }
}

/// Everything the encoder needs, in chunk order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodeGraph {
    pub substreams: Vec<SubStream>,
    pub settings: EncodeSettings,
}

/// Label of the concatenated stream inside the filter graph.
pub const OUTPUT_LABEL: &str = "[out]";

impl EncodeGraph {
    /// Total number of `addroi` directives across all sub-streams.
    pub fn region_directive_count(&self) -> usize {
        self.substreams.iter().map(|s| s.regions.len()).sum()
    }

    pub fn overlay_directive_count(&self) -> usize {
        self.substreams.iter().map(|s| s.overlays.len()).sum()
    }

    /// Renders the graph as an ffmpeg filter graph reading `[0:v]` and producing [`OUTPUT_LABEL`].
    pub fn filter_complex(&self) -> String {
        let n = self.substreams.len();
        let mut graph = String::new();

        let _ = write!(graph, "[0:v]split={n}");
        for i in 0..n {
            let _ = write!(graph, "[s{i}]");
        }
        graph.push(';');

        for (i, sub) in self.substreams.iter().enumerate() {
            let _ = write!(
                graph,
                "[s{i}]trim=start={}:end={},setpts=PTS-STARTPTS",
                sub.start_time_s, sub.end_time_s
            );
            for directive in &sub.regions {
                let r = directive.region;
                let _ = write!(
                    graph,
                    ",addroi=x={}:y={}:w={}:h={}:qoffset={}",
                    r.x,
                    r.y,
                    r.w,
                    r.h,
                    directive.qoffset.value()
                );
            }
            for overlay in &sub.overlays {
                let r = overlay.region;
                let _ = write!(
                    graph,
                    ",drawbox=x={}:y={}:width={}:height={}:color={}",
                    r.x, r.y, r.w, r.h, overlay.color
                );
            }
            let _ = write!(graph, "[v{i}];");
        }

        for i in 0..n {
            let _ = write!(graph, "[v{i}]");
        }
        let _ = write!(graph, "concat=n={n}:v=1:a=0{OUTPUT_LABEL}");
        graph
    }
}

/// Builds the encode graph from a finished chunk plan.
///
/// Region coordinates are copied verbatim, including boxes that extend past
/// the frame edge.
pub fn build_encode_graph(
    chunks: &[Chunk],
    sample: &DetectionSample,
    qoffset: QualityOffset,
    draw_overlay: bool,
    overlay_color: &str,
    settings: EncodeSettings,
) -> CoreResult<EncodeGraph> {
    if chunks.is_empty() {
        return Err(CoreError::Config("chunk plan is empty".to_string()));
    }

    let mut substreams = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let regions = sample.get(chunk.region_index).ok_or_else(|| {
            CoreError::Config(format!(
                "chunk {} refers to sample {} but only {} samples exist",
                chunk.index,
                chunk.region_index,
                sample.len()
            ))
        })?;

        let overlays = if draw_overlay {
            regions
                .iter()
                .map(|&region| OverlayDirective {
                    region,
                    color: overlay_color.to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };

        log::debug!(
            "Chunk {}: {:.3}s-{:.3}s, {} regions",
            chunk.index,
            chunk.start_time_s,
            chunk.end_time_s,
            regions.len()
        );

        substreams.push(SubStream {
            start_time_s: chunk.start_time_s,
            end_time_s: chunk.end_time_s,
            regions: regions
                .iter()
                .map(|&region| RegionDirective { region, qoffset })
                .collect(),
            overlays,
        });
    }

    Ok(EncodeGraph {
        substreams,
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EncodeSettings {
        EncodeSettings::from_config(&CoreConfig::default())
    }

    fn chunks(n: usize, len_s: f64) -> Vec<Chunk> {
        (0..n)
            .map(|i| Chunk {
                index: i,
                start_time_s: i as f64 * len_s,
                end_time_s: (i + 1) as f64 * len_s,
                region_index: i,
            })
            .collect()
    }

    #[test]
    fn test_quality_offset_is_negative() {
        let q = QualityOffset::from_crf(30, 45).unwrap();
        assert!((q.value() - (-15.0 / 51.0)).abs() < 1e-12);
        assert!(q.value() < 0.0);
        assert_eq!(QualityOffset::from_crf(0, 51).unwrap().value(), -1.0);
    }

    #[test]
    fn test_quality_offset_rejects_bad_pairs() {
        assert!(matches!(
            QualityOffset::from_crf(30, 30),
            Err(CoreError::Config(_))
        ));
        assert!(QualityOffset::from_crf(40, 30).is_err());
        assert!(QualityOffset::from_crf(10, 60).is_err());
    }

    #[test]
    fn test_no_regions_gives_no_directives() {
        let sample = DetectionSample::from_region_sets(5, vec![Vec::new(); 2]);
        let q = QualityOffset::from_crf(30, 45).unwrap();
        let graph = build_encode_graph(&chunks(2, 0.5), &sample, q, true, "red", settings())
            .unwrap();
        assert_eq!(graph.region_directive_count(), 0);
        assert_eq!(graph.overlay_directive_count(), 0);
        assert!(!graph.filter_complex().contains("addroi"));
        assert!(!graph.filter_complex().contains("drawbox"));
    }

    #[test]
    fn test_filter_complex_rendering() {
        let sample = DetectionSample::from_region_sets(
            5,
            vec![vec![Region::new(10, 20, 30, 40)], Vec::new()],
        );
        let q = QualityOffset::from_crf(0, 51).unwrap();
        let graph =
            build_encode_graph(&chunks(2, 0.5), &sample, q, true, "red", settings()).unwrap();
        assert_eq!(
            graph.filter_complex(),
            "[0:v]split=2[s0][s1];\
             [s0]trim=start=0:end=0.5,setpts=PTS-STARTPTS,\
             addroi=x=10:y=20:w=30:h=40:qoffset=-1,\
             drawbox=x=10:y=20:width=30:height=40:color=red[v0];\
             [s1]trim=start=0.5:end=1,setpts=PTS-STARTPTS[v1];\
             [v0][v1]concat=n=2:v=1:a=0[out]"
        );
    }

    #[test]
    fn test_out_of_frame_regions_pass_through() {
        let sample =
            DetectionSample::from_region_sets(5, vec![vec![Region::new(-10, -10, 500, 500)]]);
        let q = QualityOffset::from_crf(30, 45).unwrap();
        let graph =
            build_encode_graph(&chunks(1, 0.5), &sample, q, false, "red", settings()).unwrap();
        assert_eq!(
            graph.substreams[0].regions[0].region,
            Region::new(-10, -10, 500, 500)
        );
        assert!(graph.substreams[0].overlays.is_empty());
    }

    #[test]
    fn test_missing_sample_is_config_error() {
        let sample = DetectionSample::from_region_sets(5, vec![Vec::new()]);
        let q = QualityOffset::from_crf(30, 45).unwrap();
        assert!(build_encode_graph(&chunks(2, 0.5), &sample, q, false, "red", settings()).is_err());
    }
}
