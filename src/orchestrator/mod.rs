//! Pipeline orchestrator for coordinating render runs.
//!
//! This module provides the infrastructure for running the multi-step
//! assembly pipeline. Each run consists of a sequence of steps that
//! validate, execute, and record their results.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Script
//!     ├── Step: Narration
//!     ├── Step: Source
//!     ├── Step: Normalize
//!     ├── Step: Compose
//!     ├── Step: Finish
//!     └── Step: Publish
//! ```
//!
//! # Example
//!
//! ```ignore
//! use reel_core::orchestrator::{run_render_job, RenderProviders};
//!
//! let providers = RenderProviders {
//!     script: Box::new(MyScriptProvider::new(api_key)),
//!     narration: Box::new(MyTts::new()),
//!     clips: Box::new(StockFootageSource::new()),
//!     mixer: Box::new(MusicBedMixer::new()),
//!     subtitles: Box::new(AssSubtitles::new()),
//!     publisher: Box::new(LocalCopyPublisher::new("published/")),
//! };
//!
//! let report = run_render_job(request, settings, providers, None, None)?;
//! println!("Artifact: {:?}", report.artifact);
//! ```

mod errors;
mod pipeline;
mod step;
pub mod steps;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use steps::{
    ComposeStep, FinishStep, NarrationStep, NormalizeStep, PublishStep, ScriptStep, SourceStep,
};
pub use types::{
    ComposeOutput, Context, FinishOutput, JobState, NarrationOutput, NormalizeOutput,
    ProgressCallback, PublishOutput, ScriptOutput, SourceOutput, StepOutcome,
};

use crate::config::Settings;
use crate::logging::{JobLogger, LogCallback, LogConfig};
use crate::models::{JobStatus, RenderRequest};
use crate::providers::{
    AudioMixer, ClipSource, NarrationSynthesizer, Publisher, ScriptProvider, SubtitleProvider,
};
use crate::workspace::{generate_run_id, RunWorkspace};

/// The collaborator bundle a render pipeline is constructed with.
pub struct RenderProviders {
    pub script: Box<dyn ScriptProvider>,
    pub narration: Box<dyn NarrationSynthesizer>,
    pub clips: Box<dyn ClipSource>,
    pub mixer: Box<dyn AudioMixer>,
    pub subtitles: Box<dyn SubtitleProvider>,
    pub publisher: Box<dyn Publisher>,
}

/// Create the standard render pipeline with all steps in order.
///
/// 1. Script - generate the narration script
/// 2. Narration - synthesize speech; its duration becomes the target
/// 3. Source - fetch candidate clips
/// 4. Normalize - probe and conform clips to the target geometry
/// 5. Compose - order, reconcile, and composite with transitions
/// 6. Finish - fit duration, replace audio, burn subtitles
/// 7. Publish - hand the artifact to the publishing collaborator
pub fn create_render_pipeline(providers: RenderProviders) -> Pipeline {
    Pipeline::new()
        .with_step(ScriptStep::new(providers.script))
        .with_step(NarrationStep::new(providers.narration))
        .with_step(SourceStep::new(providers.clips))
        .with_step(NormalizeStep::new())
        .with_step(ComposeStep::new())
        .with_step(FinishStep::new(providers.mixer, providers.subtitles))
        .with_step(PublishStep::new(providers.publisher))
}

/// Summary of one finished render run.
#[derive(Debug, Clone)]
pub struct JobReport {
    /// Generated run identifier.
    pub job_name: String,
    /// Terminal status.
    pub status: JobStatus,
    /// Path of the final local artifact.
    pub artifact: Option<PathBuf>,
    /// Where the artifact was published, if the Publish step ran.
    pub published_to: Option<PathBuf>,
    /// Path of the per-run log file.
    pub log_path: PathBuf,
    /// Step names that completed.
    pub steps_completed: Vec<String>,
}

/// Run one complete render job end to end.
///
/// Creates the run workspace and logger, builds the standard pipeline from
/// `providers`, and runs it. The workspace is removed when the run ends;
/// on failure it is kept only when `logging.keep_workspace_on_failure` is
/// set.
pub fn run_render_job(
    request: RenderRequest,
    settings: Settings,
    providers: RenderProviders,
    log_callback: Option<LogCallback>,
    progress_callback: Option<ProgressCallback>,
) -> PipelineResult<JobReport> {
    let job_name = generate_run_id();

    let mut workspace = RunWorkspace::create(&settings.paths.temp_root, &job_name)
        .map_err(|e| PipelineError::setup_failed(&job_name, format!("workspace: {e}")))?;

    let logger = JobLogger::new(
        &job_name,
        &settings.paths.logs_folder,
        LogConfig::from_settings(&settings.logging),
        log_callback,
    )
    .map_err(|e| PipelineError::setup_failed(&job_name, format!("log file: {e}")))?;
    let logger = Arc::new(logger);
    let log_path = logger.log_path().to_path_buf();

    let keep_on_failure = settings.logging.keep_workspace_on_failure;
    let output_dir = PathBuf::from(&settings.paths.output_folder);

    logger.section(&format!("Render run {job_name}"));
    logger.info(&format!("Subject: {}", request.subject));

    let mut ctx = Context::new(
        request,
        settings,
        &job_name,
        workspace.downloads_dir(),
        workspace.audio_dir(),
        workspace.work_dir(),
        output_dir,
        Arc::clone(&logger),
    );
    if let Some(cb) = progress_callback {
        ctx = ctx.with_progress_callback(cb);
    }

    let mut state = JobState::new(&job_name);
    let pipeline = create_render_pipeline(providers);

    match pipeline.run(&ctx, &mut state) {
        Ok(result) => Ok(JobReport {
            job_name,
            status: JobStatus::Completed,
            artifact: state.finish.as_ref().map(|f| f.artifact.path.clone()),
            published_to: state.publish.as_ref().map(|p| p.location.clone()),
            log_path,
            steps_completed: result.steps_completed,
        }),
        Err(e) => {
            if keep_on_failure {
                logger.warn(&format!(
                    "Keeping workspace for inspection: {}",
                    workspace.root().display()
                ));
                workspace.keep();
            }
            logger.show_tail("run");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::providers::{Narration, ProviderError, ProviderResult};

    struct Stub;

    impl ScriptProvider for Stub {
        fn generate_script(&self, _subject: &str) -> ProviderResult<String> {
            Err(ProviderError::new("script", "stub"))
        }
    }
    impl NarrationSynthesizer for Stub {
        fn synthesize(&self, _script: &str, _out_dir: &Path) -> ProviderResult<Narration> {
            Err(ProviderError::new("narration", "stub"))
        }
    }
    impl ClipSource for Stub {
        fn source_clips(
            &self,
            _request: &RenderRequest,
            _out_dir: &Path,
        ) -> ProviderResult<Vec<PathBuf>> {
            Err(ProviderError::new("clips", "stub"))
        }
    }
    impl AudioMixer for Stub {
        fn mix(&self, _narration: &Narration, _out_dir: &Path) -> ProviderResult<PathBuf> {
            Err(ProviderError::new("mixer", "stub"))
        }
    }
    impl SubtitleProvider for Stub {
        fn subtitle_track(
            &self,
            _script: &str,
            _narration_duration_s: f64,
            _out_dir: &Path,
        ) -> ProviderResult<Option<PathBuf>> {
            Ok(None)
        }
    }
    impl Publisher for Stub {
        fn publish(&self, _artifact: &Path) -> ProviderResult<PathBuf> {
            Err(ProviderError::new("publisher", "stub"))
        }
    }

    fn stub_providers() -> RenderProviders {
        RenderProviders {
            script: Box::new(Stub),
            narration: Box::new(Stub),
            clips: Box::new(Stub),
            mixer: Box::new(Stub),
            subtitles: Box::new(Stub),
            publisher: Box::new(Stub),
        }
    }

    #[test]
    fn standard_pipeline_has_all_steps_in_order() {
        let pipeline = create_render_pipeline(stub_providers());
        assert_eq!(
            pipeline.step_names(),
            vec![
                "Script",
                "Narration",
                "Source",
                "Normalize",
                "Compose",
                "Finish",
                "Publish"
            ]
        );
    }
}
