//! Finish step - duration fit, audio replacement, and subtitle burn.

use crate::finish::Finisher;
use crate::media::ToolRunner;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, FinishOutput, JobState, StepOutcome};
use crate::providers::{AudioMixer, Narration, SubtitleProvider};

/// Finish step: turns the composite into the publishable artifact.
///
/// A failed subtitle burn fails the run; an unsubtitled video is never
/// silently published when subtitles were requested.
pub struct FinishStep {
    mixer: Box<dyn AudioMixer>,
    subtitles: Box<dyn SubtitleProvider>,
}

impl FinishStep {
    pub fn new(mixer: Box<dyn AudioMixer>, subtitles: Box<dyn SubtitleProvider>) -> Self {
        Self { mixer, subtitles }
    }
}

impl PipelineStep for FinishStep {
    fn name(&self) -> &str {
        "Finish"
    }

    fn description(&self) -> &str {
        "Fit the target duration, mux the audio mix, burn subtitles"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if let Err(e) = std::fs::create_dir_all(&ctx.output_dir) {
            return Err(StepError::io_error("creating output directory", e));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let narration = state
            .narration
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Narration step has not run"))?;
        let script = state
            .script
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Script step has not run"))?;
        let compose = state
            .compose
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Compose step has not run"))?;

        let narration_for_mix = Narration {
            audio_path: narration.audio_path.clone(),
            duration_s: narration.duration_s,
        };
        let mixed_audio = self.mixer.mix(&narration_for_mix, &ctx.audio_dir)?;
        ctx.logger
            .info(&format!("Audio mix ready: {}", mixed_audio.display()));

        let subtitle_track = if ctx.request.burn_subtitles {
            let track =
                self.subtitles
                    .subtitle_track(&script.text, narration.duration_s, &ctx.work_dir)?;
            if track.is_none() {
                ctx.logger.info("Subtitle collaborator returned no track");
            }
            track
        } else {
            None
        };

        let tail_logger = std::sync::Arc::clone(&ctx.logger);
        let runner = ToolRunner::from_settings(&ctx.settings.tools).with_output_sink(
            std::sync::Arc::new(move |line, is_stderr| tail_logger.output_line(line, is_stderr)),
        );
        let finisher = Finisher::new(runner, ctx.settings.encoding.clone());
        let artifact_path = ctx.artifact_path();

        let artifact = finisher.finish(
            &compose.composite,
            narration.duration_s,
            &mixed_audio,
            subtitle_track.as_deref(),
            &ctx.work_dir,
            &artifact_path,
        )?;

        ctx.logger.success(&format!(
            "Final artifact: {} ({:.2}s)",
            artifact.path.display(),
            artifact.duration_s
        ));

        state.finish = Some(FinishOutput {
            artifact,
            subtitles_burned: subtitle_track.is_some(),
            mixed_audio,
        });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()> {
        let finish = state
            .finish
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Finishing not recorded"))?;

        if !finish.artifact.path.exists() {
            return Err(StepError::invalid_output(format!(
                "Final artifact missing: {}",
                finish.artifact.path.display()
            )));
        }

        if let Some(target_s) = state.target_duration_s() {
            let gap = (finish.artifact.duration_s - target_s).abs();
            let tolerance = ctx.settings.encoding.duration_tolerance_s;
            if gap > tolerance {
                return Err(StepError::invalid_output(format!(
                    "Artifact duration {:.2}s misses target {:.2}s by more than {:.1}s",
                    finish.artifact.duration_s, target_s, tolerance
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};

    use crate::models::{CompositeTrack, RenderRequest};
    use crate::orchestrator::steps::testutil;
    use crate::providers::ProviderResult;

    struct NullMixer;

    impl AudioMixer for NullMixer {
        fn mix(&self, narration: &Narration, _out_dir: &Path) -> ProviderResult<PathBuf> {
            Ok(narration.audio_path.clone())
        }
    }

    struct NoSubtitles;

    impl SubtitleProvider for NoSubtitles {
        fn subtitle_track(
            &self,
            _script: &str,
            _narration_duration_s: f64,
            _out_dir: &Path,
        ) -> ProviderResult<Option<PathBuf>> {
            Ok(None)
        }
    }

    #[test]
    fn missing_compose_state_is_precondition_failure() {
        let (ctx, dir) = testutil::context(RenderRequest::new("auroras"));
        let step = FinishStep::new(Box::new(NullMixer), Box::new(NoSubtitles));
        let mut state = JobState::new("t");
        state.script = Some(crate::orchestrator::types::ScriptOutput {
            text: "s".to_string(),
        });
        let audio = dir.path().join("audio").join("narration.m4a");
        fs::write(&audio, b"a").unwrap();
        state.narration = Some(crate::orchestrator::types::NarrationOutput {
            audio_path: audio,
            duration_s: 20.0,
        });

        let err = step.execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::PreconditionFailed(_)));
    }

    #[test]
    fn output_validation_enforces_duration_tolerance() {
        let (ctx, dir) = testutil::context(RenderRequest::new("auroras"));
        let step = FinishStep::new(Box::new(NullMixer), Box::new(NoSubtitles));
        let mut state = JobState::new("t");

        let artifact = dir.path().join("out").join("final.mp4");
        fs::write(&artifact, b"v").unwrap();
        state.narration = Some(crate::orchestrator::types::NarrationOutput {
            audio_path: dir.path().join("audio").join("n.m4a"),
            duration_s: 20.0,
        });
        state.finish = Some(FinishOutput {
            artifact: CompositeTrack::new(&artifact, 26.5),
            subtitles_burned: false,
            mixed_audio: dir.path().join("audio").join("mix.m4a"),
        });

        // 26.5s against a 20s target exceeds the 1s tolerance.
        assert!(step.validate_output(&ctx, &state).is_err());
    }
}
