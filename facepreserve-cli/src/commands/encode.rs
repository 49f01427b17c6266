//! Implementation of the 'encode' subcommand.
//!
//! Maps the parsed arguments onto a [`CoreConfig`] and a detector, checks
//! that ffmpeg is available, and runs the core pipeline.

use crate::cli::{DetectorKind, EncodeArgs};
use crate::error::{CliErrorContext, CliResult};
use crate::progress::ProgressBarHandler;

use facepreserve_core::events::EventDispatcher;
use facepreserve_core::events::json_handler::JsonProgressHandler;
use facepreserve_core::external::SidecarSpawner;
use facepreserve_core::file_logging::FileLoggingHandler;
use facepreserve_core::media::CrateFfprobeExecutor;
use facepreserve_core::processing::{
    NoRegions, RegionDetector, ReplayDetector, Stateless, StaticRegions, Temporal, TimedRegions,
};
use facepreserve_core::{
    CoreConfig, CoreConfigBuilder, CoreError, RunSummary, calculate_size_reduction,
    check_dependency, format_bytes, format_duration, process_video,
};

use log::{info, warn};
use std::sync::Arc;

/// Builds the core configuration from the command-line arguments.
pub fn build_config(args: &EncodeArgs) -> CoreConfig {
    let mut builder = CoreConfigBuilder::new()
        .input_path(args.input_path.clone())
        .output_path(args.output_path.clone())
        .base_crf(args.base_crf)
        .roi_crf(args.roi_crf)
        .update_freq(args.update_freq)
        .draw_overlay(args.overlay)
        .codec(&args.codec)
        .preset(&args.preset)
        .pixel_format(&args.pixel_format)
        .overlay_color(&args.overlay_color);
    if let Some(path) = &args.save_detections {
        builder = builder.save_detections(path.clone());
    }
    builder.build()
}

/// Constructs the detector selected by `args`.
pub fn build_detector(args: &EncodeArgs) -> CliResult<Box<dyn RegionDetector>> {
    let kind = args.detector_kind();
    if kind != DetectorKind::Static && !args.regions.is_empty() {
        warn!("--region is ignored with the {:?} detector", kind);
    }

    let detector: Box<dyn RegionDetector> = match kind {
        DetectorKind::None => Box::new(Stateless(NoRegions)),
        DetectorKind::Static => {
            if args.regions.is_empty() {
                return Err(CoreError::Config(
                    "the static detector needs at least one --region".to_string(),
                ));
            }
            Box::new(Stateless(StaticRegions::new(args.regions.clone())))
        }
        DetectorKind::Replay => {
            let path = args
                .detections
                .as_deref()
                .cli_context("the replay detector needs --detections PATH")?;
            let replay = ReplayDetector::from_file(path, args.update_freq)
                .cli_with_context(|| format!("Loading detections from {}", path.display()))?;
            Box::new(Stateless(replay))
        }
        DetectorKind::Timed => {
            let path = args
                .timed_regions
                .as_deref()
                .cli_context("the timed detector needs --timed-regions PATH")?;
            let track = TimedRegions::from_file(path)
                .cli_with_context(|| format!("Loading region track from {}", path.display()))?;
            Box::new(Temporal::new(track))
        }
    };
    Ok(detector)
}

fn build_dispatcher(args: &EncodeArgs, logging_to_file: bool) -> EventDispatcher {
    let mut events = EventDispatcher::new();
    if args.json_progress {
        events.add_handler(Arc::new(JsonProgressHandler::new()));
    } else {
        events.add_handler(Arc::new(ProgressBarHandler::new()));
    }
    if logging_to_file {
        events.add_handler(Arc::new(FileLoggingHandler::new()));
    }
    events
}

/// Runs the encode command.
pub fn run_encode(args: EncodeArgs, logging_to_file: bool) -> CliResult<RunSummary> {
    let config = build_config(&args);
    config.validate()?;

    check_dependency("ffmpeg")?;
    check_dependency("ffprobe")?;

    let mut detector = build_detector(&args)?;
    let events = build_dispatcher(&args, logging_to_file);

    info!(
        "Encoding {} -> {}",
        config.input_path.display(),
        config.output_path.display()
    );
    let summary = process_video(
        &SidecarSpawner,
        &CrateFfprobeExecutor::new(),
        &mut detector,
        &config,
        &events,
    )?;

    if !args.json_progress {
        print_summary(&summary);
    }
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("Output:        {}", summary.output_path.display());
    println!(
        "Frames:        {} ({} samples, {} chunks)",
        summary.frames_read, summary.sample_count, summary.chunk_count
    );
    println!(
        "ROI:           {} directives, {:.1}% mean coverage, qoffset {:.3}",
        summary.region_directives,
        summary.roi_coverage * 100.0,
        summary.quality_offset
    );
    match summary.output_size {
        Some(out) => println!(
            "Size:          {} -> {} ({}% smaller)",
            format_bytes(summary.input_size),
            format_bytes(out),
            calculate_size_reduction(summary.input_size, out)
        ),
        None => println!("Size:          {} -> ?", format_bytes(summary.input_size)),
    }
    println!(
        "Time:          {}",
        format_duration(summary.elapsed.as_secs_f64())
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use facepreserve_core::Region;
    use facepreserve_core::processing::{DetectionSample, Frame};

    fn parse(extra: &[&str]) -> EncodeArgs {
        let mut argv = vec!["facepreserve", "encode", "-i", "in.mp4", "-o", "out.mp4"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Encode(args) => args,
        }
    }

    fn frame(index: u64) -> Frame {
        Frame {
            index,
            width: 2,
            height: 2,
            data: vec![0; 12],
        }
    }

    #[test]
    fn test_config_mirrors_arguments() {
        let args = parse(&[
            "--base-crf",
            "40",
            "--roi-crf",
            "25",
            "--update-freq",
            "6",
            "--overlay",
            "--preset",
            "fast",
            "--save-detections",
            "d.json",
        ]);
        let config = build_config(&args);
        assert_eq!(config.base_crf, 40);
        assert_eq!(config.roi_crf, 25);
        assert_eq!(config.update_freq, 6);
        assert!(config.draw_overlay);
        assert_eq!(config.preset, "fast");
        assert_eq!(config.save_detections.as_deref(), Some(std::path::Path::new("d.json")));
    }

    #[test]
    fn test_static_detector_needs_regions() {
        let args = parse(&["--detector", "static"]);
        assert!(matches!(build_detector(&args), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_static_detector_returns_regions() {
        let args = parse(&["--region", "1,2,3,4"]);
        let mut detector = build_detector(&args).unwrap();
        assert_eq!(detector.name(), "static");
        assert_eq!(
            detector.detect(&frame(0), 0).unwrap(),
            vec![Region::new(1, 2, 3, 4)]
        );
    }

    #[test]
    fn test_replay_detector_from_saved_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.json");
        DetectionSample::from_region_sets(4, vec![vec![Region::new(0, 0, 1, 1)]])
            .save(&path)
            .unwrap();

        let args = parse(&["--detections", path.to_str().unwrap()]);
        let mut detector = build_detector(&args).unwrap();
        assert_eq!(detector.name(), "replay");
        assert_eq!(detector.detect(&frame(0), 0).unwrap().len(), 1);

        let mismatched = parse(&["--detections", path.to_str().unwrap(), "--update-freq", "5"]);
        assert!(matches!(
            build_detector(&mismatched),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn test_replay_without_path_fails() {
        let args = parse(&["--detector", "replay"]);
        assert!(matches!(
            build_detector(&args),
            Err(CoreError::OperationFailed(_))
        ));
    }
}
