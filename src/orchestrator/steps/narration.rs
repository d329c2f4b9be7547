//! Narration step - synthesizes narration audio from the script.
//!
//! The probed narration duration becomes the run's target video duration;
//! every later timeline decision is anchored to it.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, NarrationOutput, StepOutcome};
use crate::providers::NarrationSynthesizer;

/// Narration step backed by a speech-synthesis collaborator.
pub struct NarrationStep {
    synthesizer: Box<dyn NarrationSynthesizer>,
}

impl NarrationStep {
    pub fn new(synthesizer: Box<dyn NarrationSynthesizer>) -> Self {
        Self { synthesizer }
    }
}

impl PipelineStep for NarrationStep {
    fn name(&self) -> &str {
        "Narration"
    }

    fn description(&self) -> &str {
        "Synthesize narration audio; its duration becomes the target duration"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let script = state
            .script
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Script step has not run"))?;

        let narration = self.synthesizer.synthesize(&script.text, &ctx.audio_dir)?;

        ctx.logger.info(&format!(
            "Narration synthesized: {} ({:.2}s)",
            narration.audio_path.display(),
            narration.duration_s
        ));

        state.narration = Some(NarrationOutput {
            audio_path: narration.audio_path,
            duration_s: narration.duration_s,
        });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let narration = state
            .narration
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Narration not recorded"))?;

        if !narration.audio_path.exists() {
            return Err(StepError::invalid_output(format!(
                "Narration file not created: {}",
                narration.audio_path.display()
            )));
        }
        if narration.duration_s <= 0.0 {
            return Err(StepError::invalid_output(format!(
                "Narration duration is not positive: {}",
                narration.duration_s
            )));
        }
        Ok(())
    }
}
