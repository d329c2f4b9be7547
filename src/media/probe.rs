//! Media metadata probing via ffprobe.
//!
//! Duration, resolution, and audio-track presence are three independent
//! ffprobe invocations, so a resolution failure never blocks a duration
//! probe. `probe` combines them into one `MediaInfo` contract.

use std::path::Path;

use super::runner::ToolRunner;
use super::types::{MediaInfo, ProbeError, ProbeResult};

/// Probe duration, resolution, and audio presence for one file.
///
/// Duration and audio-detection failures are errors (the caller decides
/// exclude-vs-abort); a resolution failure only leaves `width`/`height`
/// unset, since the normalizer re-derives geometry anyway.
pub fn probe(runner: &ToolRunner, path: &Path) -> ProbeResult<MediaInfo> {
    if !path.exists() {
        return Err(ProbeError::FileNotFound(path.to_path_buf()));
    }

    let duration_s = probe_duration(runner, path)?;
    let has_audio = probe_has_audio(runner, path)?;

    let (width, height) = match probe_resolution(runner, path) {
        Ok((w, h)) => (Some(w), Some(h)),
        Err(e) => {
            tracing::debug!("Resolution probe failed for {}: {}", path.display(), e);
            (None, None)
        }
    };

    Ok(MediaInfo {
        duration_s: Some(duration_s),
        width,
        height,
        has_audio,
    })
}

/// Get the container duration in seconds.
pub fn probe_duration(runner: &ToolRunner, path: &Path) -> ProbeResult<f64> {
    let args = probe_args(
        &["-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1"],
        path,
    );
    let output = runner
        .ffprobe(&args)
        .map_err(|e| ProbeError::tool(path, e))?;

    parse_duration_output(&output.stdout)
        .map_err(|msg| ProbeError::parse_error("duration", path, msg))
}

/// Get the first video stream's (width, height).
pub fn probe_resolution(runner: &ToolRunner, path: &Path) -> ProbeResult<(u32, u32)> {
    let args = probe_args(
        &[
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=p=0:s=x",
        ],
        path,
    );
    let output = runner
        .ffprobe(&args)
        .map_err(|e| ProbeError::tool(path, e))?;

    parse_resolution_output(&output.stdout)
        .map_err(|msg| ProbeError::parse_error("resolution", path, msg))
}

/// Check whether the file exposes at least one audio stream.
///
/// Channel count does not matter; any decodable audio stream counts.
pub fn probe_has_audio(runner: &ToolRunner, path: &Path) -> ProbeResult<bool> {
    let args = probe_args(
        &["-select_streams", "a", "-show_entries", "stream=codec_type", "-of", "csv=p=0"],
        path,
    );
    let output = runner
        .ffprobe(&args)
        .map_err(|e| ProbeError::tool(path, e))?;

    Ok(output.stdout.lines().any(|l| l.trim() == "audio"))
}

/// Common ffprobe prefix plus the entry-specific tokens and the input path.
fn probe_args(entry_args: &[&str], path: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec!["-v".into(), "error".into()];
    args.extend(entry_args.iter().map(|s| s.to_string()));
    args.push(path.to_string_lossy().to_string());
    args
}

/// Parse the stdout of a `format=duration` probe.
pub fn parse_duration_output(stdout: &str) -> Result<f64, String> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err("empty ffprobe output".to_string());
    }
    let duration: f64 = trimmed
        .parse()
        .map_err(|e| format!("'{}' is not a number: {}", trimmed, e))?;
    if !duration.is_finite() || duration < 0.0 {
        return Err(format!("invalid duration value: {}", duration));
    }
    Ok(duration)
}

/// Parse the stdout of a `stream=width,height` probe (`WxH` format).
pub fn parse_resolution_output(stdout: &str) -> Result<(u32, u32), String> {
    let trimmed = stdout.trim();
    let (w_str, h_str) = trimmed
        .split_once('x')
        .ok_or_else(|| format!("'{}' is not WxH", trimmed))?;
    let width: u32 = w_str
        .trim()
        .parse()
        .map_err(|e| format!("bad width '{}': {}", w_str, e))?;
    let height: u32 = h_str
        .trim()
        .parse()
        .map_err(|e| format!("bad height '{}': {}", h_str, e))?;
    if width == 0 || height == 0 {
        return Err(format!("degenerate resolution {}x{}", width, height));
    }
    Ok((width, height))
}
