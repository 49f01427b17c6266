// facepreserve-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand, ValueEnum};
use facepreserve_core::Region;
use facepreserve_core::config::{
    DEFAULT_BASE_CRF, DEFAULT_CODEC, DEFAULT_OVERLAY_COLOR, DEFAULT_PIXEL_FORMAT, DEFAULT_PRESET,
    DEFAULT_ROI_CRF, DEFAULT_UPDATE_FREQ,
};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "FacePreserve: selective-quality video re-encoder",
    long_about = "Re-encodes a video at a low base quality while keeping detected regions of interest sharp."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Write logs to this file instead of the terminal. A directory gets a timestamped file.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Re-encodes one video with region-of-interest quality boosts
    Encode(EncodeArgs),
}

/// Where the regions of interest come from.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    /// No regions; a plain base-quality encode
    None,
    /// The boxes given with --region on every sampled frame
    Static,
    /// A detection file saved by an earlier run (--detections)
    Replay,
    /// A time-keyed region track (--timed-regions)
    Timed,
}

#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// Input video file
    #[arg(short = 'i', long = "input", required = true, value_name = "INPUT_PATH")]
    pub input_path: PathBuf,

    /// Output video file (overwritten if it exists)
    #[arg(short = 'o', long = "output", required = true, value_name = "OUTPUT_PATH")]
    pub output_path: PathBuf,

    // --- Quality ---
    /// CRF for the whole frame (0-51)
    #[arg(
        long,
        value_name = "CRF",
        env = "FACEPRESERVE_BASE_CRF",
        default_value_t = DEFAULT_BASE_CRF,
        value_parser = clap::value_parser!(u8).range(0..=51)
    )]
    pub base_crf: u8,

    /// Effective CRF inside regions of interest (0-51, below --base-crf)
    #[arg(
        long,
        value_name = "CRF",
        env = "FACEPRESERVE_ROI_CRF",
        default_value_t = DEFAULT_ROI_CRF,
        value_parser = clap::value_parser!(u8).range(0..=51)
    )]
    pub roi_crf: u8,

    /// Frames between detection samples; also the chunk length
    #[arg(
        long,
        value_name = "FRAMES",
        env = "FACEPRESERVE_UPDATE_FREQ",
        default_value_t = DEFAULT_UPDATE_FREQ,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub update_freq: u32,

    // --- Detection ---
    /// Region source. Inferred from the other detection flags when omitted.
    #[arg(long, value_enum, value_name = "KIND")]
    pub detector: Option<DetectorKind>,

    /// Fixed region as x,y,w,h (repeatable)
    #[arg(long = "region", value_name = "X,Y,W,H", value_parser = parse_region)]
    pub regions: Vec<Region>,

    /// Saved detections to replay
    #[arg(long, value_name = "PATH")]
    pub detections: Option<PathBuf>,

    /// JSON region track: [{"timestamp_ms": .., "regions": [..]}, ..]
    #[arg(long, value_name = "PATH")]
    pub timed_regions: Option<PathBuf>,

    /// Save this run's detections as JSON
    #[arg(long, value_name = "PATH")]
    pub save_detections: Option<PathBuf>,

    // --- Encoder ---
    /// Draw an outline around every region (diagnostic)
    #[arg(long, default_value_t = false)]
    pub overlay: bool,

    /// Outline colour used with --overlay
    #[arg(long, value_name = "COLOR", default_value = DEFAULT_OVERLAY_COLOR)]
    pub overlay_color: String,

    /// Video codec
    #[arg(long, value_name = "CODEC", default_value = DEFAULT_CODEC)]
    pub codec: String,

    /// Encoder preset
    #[arg(long, value_name = "PRESET", default_value = DEFAULT_PRESET)]
    pub preset: String,

    /// Output pixel format
    #[arg(long, value_name = "PIX_FMT", default_value = DEFAULT_PIXEL_FORMAT)]
    pub pixel_format: String,

    // --- Output ---
    /// Print progress as JSON lines instead of progress bars
    #[arg(long, default_value_t = false)]
    pub json_progress: bool,
}

impl EncodeArgs {
    /// The detector to use, honouring an explicit --detector first.
    pub fn detector_kind(&self) -> DetectorKind {
        if let Some(kind) = self.detector {
            return kind;
        }
        if self.detections.is_some() {
            DetectorKind::Replay
        } else if self.timed_regions.is_some() {
            DetectorKind::Timed
        } else if !self.regions.is_empty() {
            DetectorKind::Static
        } else {
            DetectorKind::None
        }
    }
}

fn parse_region(s: &str) -> Result<Region, String> {
    let region = Region::parse_csv(s).ok_or_else(|| format!("expected x,y,w,h, got '{s}'"))?;
    if region.w <= 0 || region.h <= 0 {
        return Err(format!("region '{s}' must have a positive width and height"));
    }
    Ok(region)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> EncodeArgs {
        let mut full = vec!["facepreserve", "encode", "-i", "in.mp4", "-o", "out.mp4"];
        full.extend_from_slice(args);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Encode(args) => args,
        }
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.base_crf, DEFAULT_BASE_CRF);
        assert_eq!(args.roi_crf, DEFAULT_ROI_CRF);
        assert_eq!(args.update_freq, DEFAULT_UPDATE_FREQ);
        assert_eq!(args.preset, "veryfast");
        assert_eq!(args.detector_kind(), DetectorKind::None);
        assert!(!args.overlay);
    }

    #[test]
    fn test_regions_select_static_detector() {
        let args = parse(&["--region", "10,20,30,40", "--region", "0,0,5,5"]);
        assert_eq!(args.regions.len(), 2);
        assert_eq!(args.regions[0], Region::new(10, 20, 30, 40));
        assert_eq!(args.detector_kind(), DetectorKind::Static);
    }

    #[test]
    fn test_explicit_detector_wins() {
        let args = parse(&["--region", "1,1,1,1", "--detector", "none"]);
        assert_eq!(args.detector_kind(), DetectorKind::None);
        let args = parse(&["--detections", "d.json"]);
        assert_eq!(args.detector_kind(), DetectorKind::Replay);
    }

    #[test]
    fn test_bad_values_rejected() {
        let base = ["facepreserve", "encode", "-i", "in.mp4", "-o", "out.mp4"];
        for extra in [
            vec!["--region", "1,2,3"],
            vec!["--region", "1,2,0,4"],
            vec!["--base-crf", "52"],
            vec!["--update-freq", "0"],
            vec!["--detector", "magic"],
        ] {
            let mut argv = base.to_vec();
            argv.extend(extra.iter());
            assert!(Cli::try_parse_from(argv).is_err(), "{extra:?} should fail");
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "facepreserve",
            "encode",
            "-i",
            "in.mp4",
            "-o",
            "out.mp4",
            "--verbose",
            "--log-file",
            "run.log",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log_file, Some(PathBuf::from("run.log")));
    }
}
