//! ffmpeg command lines for the two processes of a run.
//!
//! The decode command turns the input into headerless rgb24 frames on stdout.
//! The encode command reads the input again, applies the ROI filter graph and
//! writes the output file at the base CRF.

use std::path::Path;

use ffmpeg_sidecar::command::FfmpegCommand;
use log::debug;

use crate::processing::encode_graph::{EncodeGraph, OUTPUT_LABEL};

/// Builds `ffmpeg -loglevel error -nostats -i INPUT -f rawvideo -pix_fmt rgb24 -`.
///
/// `FfmpegCommand::new` already sets `-loglevel level+info`. ffmpeg applies the
/// last `-loglevel` it sees, so the `error` level added here is the one used.
pub fn build_decode_command(input: &Path) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new();
    cmd.args(["-loglevel", "error", "-nostats"]);
    cmd.input(input.to_string_lossy().as_ref());
    cmd.args(["-f", "rawvideo", "-pix_fmt", "rgb24"]);
    cmd.output("-");
    debug!("Decode command built for {}", input.display());
    cmd
}

/// Builds the single encode invocation for `graph`.
///
/// Audio is not carried over; the filter graph only produces a video stream.
pub fn build_encode_command(input: &Path, output: &Path, graph: &EncodeGraph) -> FfmpegCommand {
    let settings = &graph.settings;
    let filter = graph.filter_complex();

    let mut cmd = FfmpegCommand::new();
    cmd.hide_banner();
    cmd.input(input.to_string_lossy().as_ref());
    cmd.args(["-filter_complex", filter.as_str()]);
    cmd.args(["-map", OUTPUT_LABEL]);
    cmd.args(["-pix_fmt", settings.pixel_format.as_str()]);
    cmd.args(["-c:v", settings.codec.as_str()]);
    cmd.arg("-crf");
    cmd.arg(settings.base_crf.to_string());
    cmd.args(["-preset", settings.preset.as_str()]);
    cmd.overwrite();
    cmd.output(output.to_string_lossy().as_ref());

    debug!(
        "Encode command: {} sub-streams, crf {}, {} / {}",
        graph.substreams.len(),
        settings.base_crf,
        settings.codec,
        settings.preset
    );
    debug!("Filter graph: {}", filter);
    cmd
}
