//! Core types for the orchestrator pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::logging::JobLogger;
use crate::models::{CompositeTrack, NormalizedClip, RenderRequest};
use crate::timeline::ReconcilePlan;

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Contains the render request and shared resources that steps can read
/// but not modify. Mutable state goes in `JobState`.
pub struct Context {
    /// The render request for this run.
    pub request: RenderRequest,
    /// Application settings.
    pub settings: Settings,
    /// Run name/identifier.
    pub job_name: String,
    /// Directory for sourced clips (under the run workspace).
    pub downloads_dir: PathBuf,
    /// Directory for narration and mixed audio (under the run workspace).
    pub audio_dir: PathBuf,
    /// Directory for normalized clips and other intermediates.
    pub work_dir: PathBuf,
    /// Output directory for the final artifact.
    pub output_dir: PathBuf,
    /// Per-run logger.
    pub logger: Arc<JobLogger>,
    /// Optional progress callback.
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    /// Create a new context for a run.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        request: RenderRequest,
        settings: Settings,
        job_name: impl Into<String>,
        downloads_dir: PathBuf,
        audio_dir: PathBuf,
        work_dir: PathBuf,
        output_dir: PathBuf,
        logger: Arc<JobLogger>,
    ) -> Self {
        Self {
            request,
            settings,
            job_name: job_name.into(),
            downloads_dir,
            audio_dir,
            work_dir,
            output_dir,
            logger,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }

    /// Final artifact path for this run.
    pub fn artifact_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.mp4", self.job_name))
    }
}

/// Mutable run state that accumulates results from pipeline steps.
///
/// This is the "write-once manifest" - steps add new data but
/// should not overwrite existing values. Each step's output is stored
/// in its own section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    /// Unique run identifier.
    pub job_id: String,
    /// When the run started.
    pub started_at: Option<String>,
    /// Script text (from Script step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptOutput>,
    /// Narration results (from Narration step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<NarrationOutput>,
    /// Sourced clip files (from Source step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sourcing: Option<SourceOutput>,
    /// Normalization results (from Normalize step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalize: Option<NormalizeOutput>,
    /// Composition results (from Compose step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compose: Option<ComposeOutput>,
    /// Finishing results (from Finish step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish: Option<FinishOutput>,
    /// Publish results (from Publish step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishOutput>,
}

impl JobState {
    /// Create a new run state with the given ID.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// The target duration of the final video, once narration is known.
    pub fn target_duration_s(&self) -> Option<f64> {
        self.narration.as_ref().map(|n| n.duration_s)
    }

    /// Check if narration has been synthesized.
    pub fn has_narration(&self) -> bool {
        self.narration.is_some()
    }

    /// Check if composition has completed.
    pub fn has_composite(&self) -> bool {
        self.compose.is_some()
    }
}

/// Output from the Script step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptOutput {
    /// Generated script text.
    pub text: String,
}

/// Output from the Narration step.
///
/// The narration duration is the run's target video duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationOutput {
    /// Path to the synthesized narration audio.
    pub audio_path: PathBuf,
    /// Probed narration duration in seconds.
    pub duration_s: f64,
}

/// Output from the Source step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceOutput {
    /// Local paths of the sourced clip files, in sourcing order.
    pub files: Vec<PathBuf>,
}

/// Output from the Normalize step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizeOutput {
    /// Clips that survived probing and normalization, in source order.
    pub clips: Vec<NormalizedClip>,
    /// How many sourced files were dropped as unusable.
    pub dropped: usize,
}

/// Output from the Compose step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeOutput {
    /// The single composited video+audio track.
    pub composite: CompositeTrack,
    /// The reconcile plan the composite was built from.
    pub plan: ReconcilePlan,
    /// Clip order actually used (indices into the normalized set).
    pub clip_order: Vec<usize>,
}

/// Output from the Finish step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishOutput {
    /// The final artifact with its probed duration.
    pub artifact: CompositeTrack,
    /// Whether a subtitle track was burned in.
    pub subtitles_burned: bool,
    /// Path to the mixed narration+music audio that was muxed in.
    pub mixed_audio: PathBuf,
}

/// Output from the Publish step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOutput {
    /// Where the artifact was published to.
    pub location: PathBuf,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (preconditions not met, but not an error).
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_tracks_completion() {
        let mut state = JobState::new("run-123");
        assert!(!state.has_narration());
        assert!(state.target_duration_s().is_none());

        state.narration = Some(NarrationOutput {
            audio_path: PathBuf::from("/tmp/narration.m4a"),
            duration_s: 24.5,
        });

        assert!(state.has_narration());
        assert_eq!(state.target_duration_s(), Some(24.5));
    }

    #[test]
    fn job_state_serializes() {
        let state = JobState::new("run-456");
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"job_id\":\"run-456\""));
        // Absent sections are omitted entirely.
        assert!(!json.contains("compose"));
    }
}
