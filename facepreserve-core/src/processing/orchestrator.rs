// ============================================================================
// facepreserve-core/src/processing/orchestrator.rs
// ============================================================================
//
// PROCESS ORCHESTRATION: One Selective-Quality Re-encode, End to End
//
// Drives the two ffmpeg processes of a run. The decoder is spawned first and
// fully finished (drained, waited, exit status checked) before the encoder
// is spawned, so at most one child process exists at any time. Both
// processes live inside owned wrappers whose `finish` methods encode the
// shutdown order and whose `Drop` impls kill and reap a process that was
// never finished.
//
// KEY COMPONENTS:
// - DecodeProcess: decoder child + the FrameSource reading its stdout
// - EncodeProcess: encoder child; closes stdin, drains diagnostics, waits
// - process_video: validate -> probe -> detect -> plan -> encode -> summary

use std::path::PathBuf;
use std::time::{Duration, Instant};

use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use log::{debug, error, info, warn};

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult, ProcessRole, process_exit_error};
use crate::events::{Event, EventDispatcher};
use crate::external::ffmpeg::{build_decode_command, build_encode_command};
use crate::external::ffmpeg_executor::{FfmpegProcess, FfmpegSpawner};
use crate::media::{VideoInfo, VideoProber};
use crate::processing::chunk_plan::plan_chunks;
use crate::processing::detection::{RegionDetector, check_timestamp_resolution, sample_regions};
use crate::processing::encode_graph::{EncodeSettings, QualityOffset, build_encode_graph};
use crate::processing::frame_source::FrameSource;
use crate::regions::mean_coverage;
use crate::utils::{file_size, parse_ffmpeg_time};

/// Diagnostic lines kept from the encoder for error reporting.
const STDERR_TAIL_LINES: usize = 20;

type PipeReader = Box<dyn std::io::Read + Send>;

// ============================================================================
// DECODE PROCESS
// ============================================================================

/// The decoder child and the frame source over its stdout.
pub struct DecodeProcess<P: FfmpegProcess> {
    process: Option<P>,
    source: FrameSource<PipeReader>,
}

impl<P: FfmpegProcess> DecodeProcess<P> {
    /// Spawns the decoder for `info`'s frame geometry and closes its stdin.
    pub fn spawn<S>(spawner: &S, config: &CoreConfig, info: &VideoInfo) -> CoreResult<Self>
    where
        S: FfmpegSpawner<Process = P>,
    {
        let mut process = spawner.spawn(build_decode_command(&config.input_path))?;
        drop(process.take_stdin());

        let Some(stdout) = process.take_stdout() else {
            let _ = process.kill();
            let _ = process.wait();
            return Err(CoreError::OperationFailed(
                "decoder stdout was not captured".to_string(),
            ));
        };

        debug!("Decoder started, {} bytes per frame", info.frame_size());
        Ok(Self {
            process: Some(process),
            source: FrameSource::new(stdout, info),
        })
    }

    pub fn source_mut(&mut self) -> &mut FrameSource<PipeReader> {
        &mut self.source
    }

    /// Drains any unread output, waits, and checks the exit status.
    pub fn finish(mut self) -> CoreResult<u64> {
        self.source.drain()?;
        let frames = self.source.frames_read();

        let Some(process) = self.process.as_mut() else {
            return Ok(frames);
        };
        let status = process.wait()?;
        let stderr = process.read_stderr();
        self.process = None;

        if !status.success() {
            error!("Decoder failed after {} frames: {}", frames, stderr.trim());
            return Err(process_exit_error(
                ProcessRole::Decoder,
                status,
                stderr.trim(),
            ));
        }
        debug!("Decoder exited cleanly after {} frames", frames);
        Ok(frames)
    }
}

impl<P: FfmpegProcess> Drop for DecodeProcess<P> {
    fn drop(&mut self) {
        if let Some(process) = self.process.as_mut() {
            warn!("Stopping unfinished decoder");
            let _ = process.kill();
            let _ = process.wait();
        }
    }
}

// ============================================================================
// ENCODE PROCESS
// ============================================================================

/// The encoder child.
pub struct EncodeProcess<P: FfmpegProcess> {
    process: Option<P>,
}

impl<P: FfmpegProcess> EncodeProcess<P> {
    pub fn spawn<S>(spawner: &S, cmd: ffmpeg_sidecar::command::FfmpegCommand) -> CoreResult<Self>
    where
        S: FfmpegSpawner<Process = P>,
    {
        let process = spawner.spawn(cmd)?;
        Ok(Self {
            process: Some(process),
        })
    }

    /// Closes stdin, drains diagnostics until exit, then waits.
    ///
    /// Progress lines are turned into `EncodingProgress` events against
    /// `total_s` seconds of output.
    pub fn finish(mut self, total_s: f64, events: &EventDispatcher) -> CoreResult<()> {
        let Some(process) = self.process.as_mut() else {
            return Ok(());
        };

        {
            let stdin = process.take_stdin();
            drop(stdin);
        }

        let started = Instant::now();
        let mut tail: Vec<String> = Vec::new();
        process.handle_events(|event| {
            match event {
                FfmpegEvent::Progress(progress) => {
                    if let Some(elapsed_s) = parse_ffmpeg_time(&progress.time) {
                        let percent = if total_s > 0.0 {
                            (elapsed_s / total_s * 100.0).clamp(0.0, 100.0) as f32
                        } else {
                            0.0
                        };
                        events.emit(Event::EncodingProgress {
                            elapsed_s,
                            total_s,
                            percent,
                            speed: progress.speed,
                            fps: progress.fps,
                        });
                    }
                }
                FfmpegEvent::Error(line)
                | FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, line) => {
                    debug!("encoder: {}", line);
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.remove(0);
                    }
                    tail.push(line);
                }
                FfmpegEvent::Log(_, line) => debug!("encoder: {}", line),
                _ => {}
            }
            Ok(())
        })?;

        let status = process.wait()?;
        self.process = None;

        if !status.success() {
            let stderr = tail.join("\n");
            error!("Encoder failed: {}", stderr);
            return Err(process_exit_error(ProcessRole::Encoder, status, stderr));
        }
        debug!(
            "Encoder exited cleanly after {:.1}s",
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }
}

impl<P: FfmpegProcess> Drop for EncodeProcess<P> {
    fn drop(&mut self) {
        if let Some(process) = self.process.as_mut() {
            warn!("Stopping unfinished encoder");
            drop(process.take_stdin());
            let _ = process.kill();
            let _ = process.wait();
        }
    }
}

// ============================================================================
// RUN
// ============================================================================

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub video: VideoInfo,
    pub frames_read: u64,
    pub sample_count: usize,
    pub chunk_count: usize,
    pub region_directives: usize,
    pub quality_offset: f64,
    /// Mean fraction of the frame covered by regions over all samples
    pub roi_coverage: f64,
    pub elapsed: Duration,
    pub input_size: u64,
    /// `None` when the output could not be inspected after the encode
    pub output_size: Option<u64>,
}

/// Re-encodes `config.input_path` with extra quality inside detected regions.
///
/// Configuration is validated before anything is spawned. On any error both
/// processes are stopped and reaped before this returns.
pub fn process_video<S, P, D>(
    spawner: &S,
    prober: &P,
    detector: &mut D,
    config: &CoreConfig,
    events: &EventDispatcher,
) -> CoreResult<RunSummary>
where
    S: FfmpegSpawner,
    P: VideoProber,
    D: RegionDetector + ?Sized,
{
    let run_start = Instant::now();

    // ========================================================================
    // STEP 1: VALIDATE CONFIGURATION
    // ========================================================================

    config.validate()?;
    let qoffset = QualityOffset::from_crf(config.roi_crf, config.base_crf)?;
    info!(
        "Quality: base CRF {}, ROI CRF {} (qoffset {:.4})",
        config.base_crf,
        config.roi_crf,
        qoffset.value()
    );

    // ========================================================================
    // STEP 2: PROBE INPUT
    // ========================================================================

    let video = prober.probe(&config.input_path)?;
    if video.frame_size() == 0 {
        return Err(CoreError::VideoInfoError(format!(
            "{} reports an empty frame ({}x{})",
            config.input_path.display(),
            video.width,
            video.height
        )));
    }
    info!("Input: {}", video.describe());
    check_timestamp_resolution(detector, &video, config.update_freq)?;

    events.emit(Event::RunStarted {
        input_file: config.input_path.display().to_string(),
        output_file: config.output_path.display().to_string(),
        resolution: format!("{}x{}", video.width, video.height),
        duration: crate::utils::format_duration(video.duration_s),
        frame_rate: video.fps.to_string(),
        detector: detector.name().to_string(),
        update_freq: config.update_freq,
    });

    // ========================================================================
    // STEP 3: DECODE AND DETECT
    // ========================================================================

    info!("Decoding and sampling regions");
    let mut decode = DecodeProcess::spawn(spawner, config, &video)?;
    let (sample, stats) = sample_regions(
        decode.source_mut(),
        &video,
        config.update_freq,
        detector,
        events,
    )?;
    let frames_read = decode.finish()?;

    let roi_coverage = mean_coverage(sample.iter(), video.width, video.height);
    events.emit(Event::DetectionComplete {
        frames_read,
        samples: sample.len(),
        total_regions: sample.total_regions(),
        coverage: roi_coverage,
    });
    debug!(
        "{} of {} frames sampled, coverage {:.2}%",
        stats.frames_sampled,
        frames_read,
        roi_coverage * 100.0
    );

    if let Some(path) = &config.save_detections {
        sample.save(path)?;
    }

    // ========================================================================
    // STEP 4: PLAN
    // ========================================================================

    let chunks = plan_chunks(&sample, &video, config.update_freq)?;
    if sample.len() < chunks.len() {
        let message = format!(
            "decoder produced {} samples for {} chunks; the last detection is held for the rest",
            sample.len(),
            chunks.len()
        );
        warn!("{}", message);
        events.emit(Event::Warning { message });
    }

    let graph = build_encode_graph(
        &chunks,
        &sample,
        qoffset,
        config.draw_overlay,
        &config.overlay_color,
        EncodeSettings::from_config(config),
    )?;
    let region_directives = graph.region_directive_count();
    info!(
        "Plan: {} chunks, {} region directives",
        chunks.len(),
        region_directives
    );
    events.emit(Event::PlanReady {
        chunks: chunks.len(),
        region_directives,
        quality_offset: qoffset.value(),
    });

    // ========================================================================
    // STEP 5: ENCODE
    // ========================================================================

    let total_s = chunks.last().map_or(0.0, |c| c.end_time_s);
    let cmd = build_encode_command(&config.input_path, &config.output_path, &graph);
    info!("Encoding to {}", config.output_path.display());
    let encode = EncodeProcess::spawn(spawner, cmd)?;
    events.emit(Event::EncodingStarted {
        total_duration_s: total_s,
    });
    encode.finish(total_s, events)?;

    // ========================================================================
    // STEP 6: SUMMARY
    // ========================================================================

    let input_size = file_size(&config.input_path)?;
    let output_size = match file_size(&config.output_path) {
        Ok(size) => Some(size),
        Err(e) => {
            warn!("Could not read output size: {}", e);
            None
        }
    };
    let elapsed = run_start.elapsed();

    events.emit(Event::RunComplete {
        output_file: config.output_path.display().to_string(),
        input_size,
        output_size,
        total_time: elapsed,
    });
    info!("Finished in {}", crate::utils::format_duration(elapsed.as_secs_f64()));

    Ok(RunSummary {
        output_path: config.output_path.clone(),
        video,
        frames_read,
        sample_count: sample.len(),
        chunk_count: chunks.len(),
        region_directives,
        quality_offset: qoffset.value(),
        roi_coverage,
        elapsed,
        input_size,
        output_size,
    })
}
