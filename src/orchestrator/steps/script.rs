//! Script step - generates the narration script for the subject.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, ScriptOutput, StepOutcome};
use crate::providers::ScriptProvider;

/// Script step backed by a script-generation collaborator.
pub struct ScriptStep {
    provider: Box<dyn ScriptProvider>,
}

impl ScriptStep {
    pub fn new(provider: Box<dyn ScriptProvider>) -> Self {
        Self { provider }
    }
}

impl PipelineStep for ScriptStep {
    fn name(&self) -> &str {
        "Script"
    }

    fn description(&self) -> &str {
        "Generate the narration script for the requested subject"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.request.subject.trim().is_empty() {
            return Err(StepError::invalid_input("Request subject is empty"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        ctx.logger
            .info(&format!("Generating script for '{}'", ctx.request.subject));

        let text = self.provider.generate_script(&ctx.request.subject)?;

        ctx.logger
            .info(&format!("Script generated ({} chars)", text.len()));
        state.script = Some(ScriptOutput { text });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let script = state
            .script
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Script not recorded"))?;
        if script.text.trim().is_empty() {
            return Err(StepError::invalid_output("Generated script is empty"));
        }
        Ok(())
    }
}
