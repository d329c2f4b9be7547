//! Collaborator boundaries the orchestrator is constructed with.
//!
//! The core owns assembly only; script generation, speech synthesis, clip
//! sourcing, audio mixing, subtitle generation, and publishing are external
//! collaborators behind these traits. Retry/backoff for flaky network-bound
//! work belongs on the implementation side of this boundary, never in the
//! core: a failed call surfaces once and fails the step.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::RenderRequest;

/// Failure reported by a collaborator.
#[derive(Error, Debug)]
#[error("{provider} provider failed: {message}")]
pub struct ProviderError {
    /// Which collaborator failed (e.g. "script", "narration").
    pub provider: String,
    /// Human-readable cause.
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Narration audio plus its probed duration.
///
/// The duration becomes the run's target video duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Narration {
    pub audio_path: PathBuf,
    pub duration_s: f64,
}

/// Produces the script text for a subject.
///
/// The core never parses or validates script semantics; the text is only
/// handed onward to the narration and subtitle collaborators.
pub trait ScriptProvider: Send + Sync {
    fn generate_script(&self, subject: &str) -> ProviderResult<String>;
}

/// Synthesizes narration audio from a script.
pub trait NarrationSynthesizer: Send + Sync {
    /// Write the narration file under `out_dir` and report its duration.
    fn synthesize(&self, script: &str, out_dir: &Path) -> ProviderResult<Narration>;
}

/// Supplies local video files to assemble.
///
/// Implementations download stock footage or generate clips; the core only
/// ever sees local paths and never fetches network resources itself.
pub trait ClipSource: Send + Sync {
    fn source_clips(&self, request: &RenderRequest, out_dir: &Path) -> ProviderResult<Vec<PathBuf>>;
}

/// Combines narration with background music into one audio file.
///
/// Relative volumes are the mixer's concern; the core consumes the result
/// as a single finished track.
pub trait AudioMixer: Send + Sync {
    fn mix(&self, narration: &Narration, out_dir: &Path) -> ProviderResult<PathBuf>;
}

/// Produces a time-coded subtitle track file for the script.
///
/// The core treats the file as opaque and only burns it in. Returning
/// `None` means no subtitles for this run.
pub trait SubtitleProvider: Send + Sync {
    fn subtitle_track(
        &self,
        script: &str,
        narration_duration_s: f64,
        out_dir: &Path,
    ) -> ProviderResult<Option<PathBuf>>;
}

/// Receives the final artifact.
///
/// Responsible for any upload or copy to durable storage; the core's
/// responsibility ends at the local file. Returns where the artifact was
/// published.
pub trait Publisher: Send + Sync {
    fn publish(&self, artifact: &Path) -> ProviderResult<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_names_the_collaborator() {
        let err = ProviderError::new("narration", "TTS quota exhausted");
        let msg = err.to_string();
        assert!(msg.contains("narration"));
        assert!(msg.contains("quota"));
    }
}
