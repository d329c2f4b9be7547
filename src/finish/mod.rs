//! Finishing: target-duration enforcement, audio replacement, subtitle burn.
//!
//! Operates on the already-composited track. Stages, in order:
//! 1. close the gap to the target duration (tail trim or loop-extend of the
//!    whole composite; full re-composition is never re-run here)
//! 2. replace the composite's audio with the externally mixed
//!    narration+music track (video stream-copied, audio re-encoded)
//! 3. burn the subtitle track when one was supplied (re-encode required)
//!
//! Every failure at this stage is fatal for the job. In particular, a
//! failed subtitle burn fails the run; the finisher never falls back to
//! publishing an unsubtitled video when subtitles were requested.
//!
//! All stages write under the run's work dir; the artifact is moved into
//! the output folder only after the last stage has succeeded, so a failed
//! run never leaves a truncated file at the output path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::EncodingSettings;
use crate::media::{probe_duration, ProbeError, ToolError, ToolRunner};
use crate::models::CompositeTrack;

/// Errors from the finishing stage. All fatal.
#[derive(Error, Debug)]
pub enum FinishError {
    /// The external audio track is missing.
    #[error("External audio track not found: {0}")]
    AudioNotFound(PathBuf),

    /// The supplied subtitle track is missing.
    #[error("Subtitle track not found: {0}")]
    SubtitlesNotFound(PathBuf),

    /// The composite is too short to fit against any target.
    #[error("Composite duration {0:.3}s is too short to fit against a target")]
    DegenerateDuration(f64),

    /// Moving the staged artifact into the output folder failed.
    #[error("Failed to move finished artifact into place: {0}")]
    Persist(#[from] io::Error),

    /// An ffmpeg stage failed.
    #[error("{stage} failed: {source}")]
    Tool {
        stage: &'static str,
        #[source]
        source: ToolError,
    },

    /// Re-probing an intermediate or final file failed.
    #[error("Finished output could not be probed: {0}")]
    Reprobe(#[from] ProbeError),
}

/// Result type for finishing operations.
pub type FinishResult<T> = Result<T, FinishError>;

/// What duration enforcement has to do for a given composite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationAction {
    /// Within tolerance of the target; leave the track untouched.
    Pass,
    /// Longer than target; hard-trim the tail.
    Trim,
    /// Shorter than target; loop the whole composite and trim.
    Loop { extra_loops: u32 },
}

/// Shortest composite the loop math will accept as a divisor.
const MIN_FIT_INPUT_S: f64 = 0.001;

/// Decide how to close the gap between actual and target duration.
///
/// A near-zero `actual_s` is rejected up front; dividing by it would ask
/// for an absurd loop count.
pub fn duration_action(
    actual_s: f64,
    target_s: f64,
    tolerance_s: f64,
) -> FinishResult<DurationAction> {
    if actual_s < MIN_FIT_INPUT_S {
        return Err(FinishError::DegenerateDuration(actual_s));
    }
    let gap = actual_s - target_s;
    if gap.abs() <= tolerance_s {
        return Ok(DurationAction::Pass);
    }
    if gap > 0.0 {
        return Ok(DurationAction::Trim);
    }
    // Whole extra plays of the composite needed to reach the target; the
    // -t on the output trims the final play back down.
    let plays_needed = (target_s / actual_s).ceil().max(1.0) as u32;
    Ok(DurationAction::Loop {
        extra_loops: plays_needed - 1,
    })
}

/// Tokens for a tail trim to the target duration.
///
/// The trim re-encodes: a stream-copy cut lands on the previous keyframe,
/// which can miss the target by several seconds.
pub fn build_trim_args(
    input: &Path,
    target_s: f64,
    encoding: &EncodingSettings,
    output: &Path,
) -> Vec<String> {
    let mut args = ffmpeg_prelude();
    args.push("-i".into());
    args.push(input.to_string_lossy().to_string());
    args.push("-t".into());
    args.push(format!("{target_s:.3}"));
    args.extend(encoding.video_codec_args());
    args.extend(encoding.audio_codec_args());
    args.push(output.to_string_lossy().to_string());
    args
}

/// Tokens for loop-extending the composite out to the target duration.
pub fn build_loop_args(
    input: &Path,
    extra_loops: u32,
    target_s: f64,
    encoding: &EncodingSettings,
    output: &Path,
) -> Vec<String> {
    let mut args = ffmpeg_prelude();
    args.push("-stream_loop".into());
    args.push(extra_loops.to_string());
    args.push("-i".into());
    args.push(input.to_string_lossy().to_string());
    args.push("-t".into());
    args.push(format!("{target_s:.3}"));
    args.extend(encoding.video_codec_args());
    args.extend(encoding.audio_codec_args());
    args.push(output.to_string_lossy().to_string());
    args
}

/// Tokens for replacing the composite audio with the external mix.
///
/// The video stream is copied byte-identical; only audio is encoded.
pub fn build_replace_audio_args(
    video: &Path,
    audio: &Path,
    encoding: &EncodingSettings,
    output: &Path,
) -> Vec<String> {
    let mut args = ffmpeg_prelude();
    args.push("-i".into());
    args.push(video.to_string_lossy().to_string());
    args.push("-i".into());
    args.push(audio.to_string_lossy().to_string());
    args.push("-map".into());
    args.push("0:v:0".into());
    args.push("-map".into());
    args.push("1:a:0".into());
    args.push("-c:v".into());
    args.push("copy".into());
    args.extend(encoding.audio_codec_args());
    args.push("-shortest".into());
    args.push(output.to_string_lossy().to_string());
    args
}

/// Tokens for burning a subtitle track into the video.
pub fn build_burn_subtitles_args(
    video: &Path,
    subtitles: &Path,
    encoding: &EncodingSettings,
    output: &Path,
) -> Vec<String> {
    let mut args = ffmpeg_prelude();
    args.push("-i".into());
    args.push(video.to_string_lossy().to_string());
    args.push("-vf".into());
    args.push(format!(
        "subtitles='{}'",
        escape_filter_path(&subtitles.to_string_lossy())
    ));
    args.extend(encoding.video_codec_args());
    args.push("-c:a".into());
    args.push("copy".into());
    args.push(output.to_string_lossy().to_string());
    args
}

fn ffmpeg_prelude() -> Vec<String> {
    vec!["-y".into(), "-nostdin".into(), "-v".into(), "error".into()]
}

/// Move the fully finished artifact from the work dir to the output path.
///
/// A rename can cross filesystems when the temp root and output folder
/// live on different mounts; fall back to copy-then-remove in that case.
fn persist_artifact(staged: &Path, output: &Path) -> io::Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(staged, output) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(staged, output)?;
            fs::remove_file(staged)
        }
    }
}

/// Escape a path for use inside a single-quoted ffmpeg filter argument.
pub fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
}

/// Runs the finishing stages against ffmpeg.
pub struct Finisher {
    runner: ToolRunner,
    encoding: EncodingSettings,
}

impl Finisher {
    pub fn new(runner: ToolRunner, encoding: EncodingSettings) -> Self {
        Self { runner, encoding }
    }

    /// Produce the final artifact at `output`.
    ///
    /// `work_dir` receives intermediate files; the caller owns their
    /// cleanup via the run workspace.
    pub fn finish(
        &self,
        composite: &CompositeTrack,
        target_duration_s: f64,
        external_audio: &Path,
        subtitle_track: Option<&Path>,
        work_dir: &Path,
        output: &Path,
    ) -> FinishResult<CompositeTrack> {
        if !external_audio.exists() {
            return Err(FinishError::AudioNotFound(external_audio.to_path_buf()));
        }
        if let Some(subs) = subtitle_track {
            if !subs.exists() {
                return Err(FinishError::SubtitlesNotFound(subs.to_path_buf()));
            }
        }

        let fitted = self.enforce_duration(composite, target_duration_s, work_dir)?;

        // Audio replacement writes to the staging path unless a subtitle
        // pass still follows.
        let staged = work_dir.join("finished.mp4");
        let audio_out = if subtitle_track.is_some() {
            work_dir.join("with_audio.mp4")
        } else {
            staged.clone()
        };
        let args = build_replace_audio_args(&fitted, external_audio, &self.encoding, &audio_out);
        self.runner.ffmpeg(&args).map_err(|e| FinishError::Tool {
            stage: "audio replacement",
            source: e,
        })?;

        if let Some(subs) = subtitle_track {
            let args = build_burn_subtitles_args(&audio_out, subs, &self.encoding, &staged);
            self.runner.ffmpeg(&args).map_err(|e| FinishError::Tool {
                stage: "subtitle burn",
                source: e,
            })?;
        }

        let duration_s = probe_duration(&self.runner, &staged)?;
        persist_artifact(&staged, output)?;
        tracing::info!(
            "Finished artifact {} ({:.2}s, target {:.2}s)",
            output.display(),
            duration_s,
            target_duration_s
        );

        Ok(CompositeTrack::new(output, duration_s))
    }

    /// Close the gap between the composite's duration and the target.
    fn enforce_duration(
        &self,
        composite: &CompositeTrack,
        target_s: f64,
        work_dir: &Path,
    ) -> FinishResult<PathBuf> {
        let action = duration_action(
            composite.duration_s,
            target_s,
            self.encoding.duration_tolerance_s,
        )?;

        let fitted = work_dir.join("composite_fit.mp4");
        match action {
            DurationAction::Pass => {
                tracing::debug!(
                    "Composite {:.2}s within tolerance of target {:.2}s",
                    composite.duration_s,
                    target_s
                );
                Ok(composite.path.clone())
            }
            DurationAction::Trim => {
                tracing::info!(
                    "Trimming composite tail: {:.2}s -> {:.2}s",
                    composite.duration_s,
                    target_s
                );
                let args = build_trim_args(&composite.path, target_s, &self.encoding, &fitted);
                self.runner.ffmpeg(&args).map_err(|e| FinishError::Tool {
                    stage: "duration trim",
                    source: e,
                })?;
                Ok(fitted)
            }
            DurationAction::Loop { extra_loops } => {
                tracing::info!(
                    "Loop-extending composite: {:.2}s x{} plays -> {:.2}s",
                    composite.duration_s,
                    extra_loops + 1,
                    target_s
                );
                let args = build_loop_args(
                    &composite.path,
                    extra_loops,
                    target_s,
                    &self.encoding,
                    &fitted,
                );
                self.runner.ffmpeg(&args).map_err(|e| FinishError::Tool {
                    stage: "duration loop-extend",
                    source: e,
                })?;
                Ok(fitted)
            }
        }
    }
}
