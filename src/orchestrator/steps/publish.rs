//! Publish step - hands the final artifact to the publishing collaborator.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, PublishOutput, StepOutcome};
use crate::providers::Publisher;

/// Publish step backed by a publishing collaborator.
///
/// The core's responsibility ends at the local artifact; upload or copy to
/// durable storage is the collaborator's concern.
pub struct PublishStep {
    publisher: Box<dyn Publisher>,
}

impl PublishStep {
    pub fn new(publisher: Box<dyn Publisher>) -> Self {
        Self { publisher }
    }
}

impl PipelineStep for PublishStep {
    fn name(&self) -> &str {
        "Publish"
    }

    fn description(&self) -> &str {
        "Hand the final artifact to the publishing collaborator"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let finish = state
            .finish
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Finish step has not run"))?;

        let location = self.publisher.publish(&finish.artifact.path)?;

        ctx.logger
            .success(&format!("Published to {}", location.display()));
        state.publish = Some(PublishOutput { location });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.publish.is_none() {
            return Err(StepError::invalid_output("Publish not recorded"));
        }
        Ok(())
    }
}
