//! Clip normalization: geometry, frame rate, and audio-track presence.
//!
//! Every clip entering the compositor must have identical width x height,
//! a pinned frame rate, and an audio stream. The normalizer enforces all
//! three in a single ffmpeg pass per clip:
//! - scale to cover the target box, then center-crop to exact dimensions
//!   (never letterbox, never distort)
//! - pin the frame rate so concatenation and xfade are well-defined
//! - mux in a silent stereo track when the source has no audio

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::EncodingSettings;
use crate::media::{probe_duration, ProbeError, ToolError, ToolRunner};
use crate::models::{AspectTarget, Clip, NormalizedClip};

/// Errors from normalizing a single clip.
///
/// Per-clip failures are recoverable: the caller drops the clip unless
/// the set ends up empty.
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// ffmpeg failed while scaling/cropping/muxing.
    #[error("Normalization of {path} failed: {source}")]
    Tool {
        path: PathBuf,
        #[source]
        source: ToolError,
    },

    /// Re-probing the normalized output failed.
    #[error("Normalized output could not be probed: {0}")]
    Reprobe(#[from] ProbeError),
}

/// Result type for normalization operations.
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Normalizes clips to a uniform target geometry.
pub struct Normalizer {
    runner: ToolRunner,
    encoding: EncodingSettings,
}

impl Normalizer {
    pub fn new(runner: ToolRunner, encoding: EncodingSettings) -> Self {
        Self { runner, encoding }
    }

    /// Normalize one clip, writing the result to `output`.
    ///
    /// The returned clip carries the re-probed duration of the output file,
    /// which is what all downstream timeline math uses.
    pub fn normalize(
        &self,
        clip: &Clip,
        target: AspectTarget,
        output: &Path,
    ) -> NormalizeResult<NormalizedClip> {
        let args = build_normalize_args(&clip.path, clip.has_audio, target, &self.encoding, output);

        self.runner.ffmpeg(&args).map_err(|e| NormalizeError::Tool {
            path: clip.path.clone(),
            source: e,
        })?;

        let duration_s = probe_duration(&self.runner, output)?;

        tracing::debug!(
            "Normalized {} -> {} ({}x{}, {:.2}s)",
            clip.path.display(),
            output.display(),
            target.width(),
            target.height(),
            duration_s
        );

        Ok(NormalizedClip::new(output, duration_s))
    }
}

/// The scale/crop/fps video filter chain for one target geometry.
///
/// `force_original_aspect_ratio=increase` scales to cover the box, the crop
/// centers it at exact dimensions, and the fps pin guarantees concat/xfade
/// compatibility across heterogeneous sources.
pub fn scale_crop_filter(target: AspectTarget, frame_rate: u32) -> String {
    let (w, h) = target.dimensions();
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1,fps={frame_rate}"
    )
}

/// Build the full ffmpeg token vector for normalizing one clip.
pub fn build_normalize_args(
    input: &Path,
    has_audio: bool,
    target: AspectTarget,
    encoding: &EncodingSettings,
    output: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-nostdin".into(),
        "-v".into(),
        "error".into(),
        "-i".into(),
        input.to_string_lossy().to_string(),
    ];

    if !has_audio {
        // Silent stereo source; -shortest cuts it to the video duration.
        args.push("-f".into());
        args.push("lavfi".into());
        args.push("-i".into());
        args.push(format!(
            "anullsrc=channel_layout=stereo:sample_rate={}",
            encoding.audio_sample_rate
        ));
        args.push("-map".into());
        args.push("0:v:0".into());
        args.push("-map".into());
        args.push("1:a:0".into());
        args.push("-shortest".into());
    }

    args.push("-vf".into());
    args.push(scale_crop_filter(target, encoding.frame_rate));

    args.extend(encoding.video_codec_args());
    args.extend(encoding.audio_codec_args());

    args.push(output.to_string_lossy().to_string());
    args
}
