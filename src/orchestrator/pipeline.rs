//! Runner that executes the render steps in sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::errors::{PipelineError, PipelineResult};
use super::step::PipelineStep;
use super::types::{Context, JobState, StepOutcome};

/// Ordered sequence of render steps for one run.
///
/// Steps execute strictly in order with validation before and after each
/// one; the first failure aborts the remainder of the run. A cancel
/// handle stops the run at the next step boundary.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
    cancelled: Arc<AtomicBool>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Get a cancellation handle.
    ///
    /// Call `cancel()` on the returned handle to stop the pipeline
    /// at the next step boundary.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    /// Check if pipeline has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Run the pipeline with the given context and state.
    ///
    /// For each step, in order:
    /// 1. Check for cancellation
    /// 2. Run `validate_input`
    /// 3. Run `execute`
    /// 4. Run `validate_output` (if execute returned Success)
    ///
    /// The first failing step aborts the run with that step's name in the
    /// error; later steps never execute and no partial artifact is
    /// reported.
    pub fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        };

        let total_steps = self.steps.len();

        for (i, step) in self.steps.iter().enumerate() {
            // Check for cancellation
            if self.is_cancelled() {
                ctx.logger.warn(&format!(
                    "Pipeline cancelled before step '{}'",
                    step.name()
                ));
                return Err(PipelineError::cancelled(&ctx.job_name));
            }

            let step_name = step.name();
            ctx.logger.phase(step_name);

            // Report progress
            let percent = ((i as f64 / total_steps as f64) * 100.0) as u32;
            ctx.logger.progress(percent);
            ctx.report_progress(step_name, percent, &format!("Starting {}", step_name));

            // Validate input
            ctx.logger.debug(&format!("Validating input for '{}'", step_name));
            if let Err(e) = step.validate_input(ctx) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
            }

            // Execute
            ctx.logger.debug(&format!("Executing '{}'", step_name));
            let outcome = step.execute(ctx, state).map_err(|e| {
                ctx.logger.error(&format!("Execution failed: {}", e));
                PipelineError::step_failed(&ctx.job_name, step_name, e)
            })?;

            match outcome {
                StepOutcome::Success => {
                    // Validate output
                    ctx.logger
                        .debug(&format!("Validating output for '{}'", step_name));
                    if let Err(e) = step.validate_output(ctx, state) {
                        ctx.logger.error(&format!("Output validation failed: {}", e));
                        return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
                    }

                    ctx.logger.success(&format!("{} completed", step_name));
                    result.steps_completed.push(step_name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    ctx.logger
                        .info(&format!("{} skipped: {}", step_name, reason));
                    result.steps_skipped.push(step_name.to_string());
                }
            }
        }

        // Final progress
        ctx.report_progress("Complete", 100, "Pipeline finished");
        ctx.logger.success("Pipeline completed successfully");

        Ok(result)
    }

    /// Get the number of steps in the pipeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for cancelling a running pipeline.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Cancel the pipeline.
    ///
    /// The pipeline will stop at the next step boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    /// Steps that completed successfully.
    pub steps_completed: Vec<String>,
    /// Steps that were skipped.
    pub steps_skipped: Vec<String>,
}

impl PipelineRunResult {
    /// Check if all steps completed (none skipped).
    pub fn all_completed(&self) -> bool {
        self.steps_skipped.is_empty()
    }

    /// Total number of steps that ran.
    pub fn total_steps(&self) -> usize {
        self.steps_completed.len() + self.steps_skipped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RenderRequest;
    use crate::orchestrator::errors::StepError;
    use crate::orchestrator::steps::testutil;
    use std::sync::atomic::AtomicUsize;

    struct CountingStep {
        name: &'static str,
        execute_count: Arc<AtomicUsize>,
    }

    impl CountingStep {
        fn new(name: &'static str) -> (Self, Arc<AtomicUsize>) {
            let count = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    name,
                    execute_count: Arc::clone(&count),
                },
                count,
            )
        }
    }

    impl PipelineStep for CountingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context) -> Result<(), StepError> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> Result<StepOutcome, StepError> {
            self.execute_count.fetch_add(1, Ordering::SeqCst);
            Ok(StepOutcome::Success)
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> Result<(), StepError> {
            Ok(())
        }
    }

    struct FailingStep;

    impl PipelineStep for FailingStep {
        fn name(&self) -> &str {
            "Broken"
        }

        fn validate_input(&self, _ctx: &Context) -> Result<(), StepError> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> Result<StepOutcome, StepError> {
            Err(StepError::other("encoder crashed"))
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> Result<(), StepError> {
            Ok(())
        }
    }

    struct SkippingStep;

    impl PipelineStep for SkippingStep {
        fn name(&self) -> &str {
            "Maybe"
        }

        fn validate_input(&self, _ctx: &Context) -> Result<(), StepError> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> Result<StepOutcome, StepError> {
            Ok(StepOutcome::Skipped("nothing to do".to_string()))
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> Result<(), StepError> {
            Ok(())
        }
    }

    #[test]
    fn pipeline_builds_correctly() {
        let (a, _) = CountingStep::new("Step1");
        let (b, _) = CountingStep::new("Step2");
        let pipeline = Pipeline::new().with_step(a).with_step(b);

        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Step1", "Step2"]);
    }

    #[test]
    fn runs_all_steps_in_order() {
        let (ctx, _dir) = testutil::context(RenderRequest::new("lighthouses"));
        let (a, a_count) = CountingStep::new("First");
        let (b, b_count) = CountingStep::new("Second");
        let pipeline = Pipeline::new().with_step(a).with_step(b);
        let mut state = JobState::new("t");

        let result = pipeline.run(&ctx, &mut state).unwrap();

        assert_eq!(a_count.load(Ordering::SeqCst), 1);
        assert_eq!(b_count.load(Ordering::SeqCst), 1);
        assert_eq!(result.steps_completed, vec!["First", "Second"]);
        assert!(result.all_completed());
    }

    #[test]
    fn failing_step_aborts_remaining_steps() {
        let (ctx, _dir) = testutil::context(RenderRequest::new("lighthouses"));
        let (before, before_count) = CountingStep::new("Before");
        let (after, after_count) = CountingStep::new("After");
        let pipeline = Pipeline::new()
            .with_step(before)
            .with_step(FailingStep)
            .with_step(after);
        let mut state = JobState::new("t");

        let err = pipeline.run(&ctx, &mut state).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::StepFailed { ref step_name, .. } if step_name == "Broken"
        ));
        assert_eq!(before_count.load(Ordering::SeqCst), 1);
        // Nothing after the failure executes.
        assert_eq!(after_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancelled_pipeline_refuses_to_start() {
        let (ctx, _dir) = testutil::context(RenderRequest::new("lighthouses"));
        let (step, count) = CountingStep::new("Never");
        let pipeline = Pipeline::new().with_step(step);
        pipeline.cancel_handle().cancel();
        let mut state = JobState::new("t");

        let err = pipeline.run(&ctx, &mut state).unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled { .. }));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn skipped_step_is_recorded_separately() {
        let (ctx, _dir) = testutil::context(RenderRequest::new("lighthouses"));
        let (real, _) = CountingStep::new("Real");
        let pipeline = Pipeline::new().with_step(SkippingStep).with_step(real);
        let mut state = JobState::new("t");

        let result = pipeline.run(&ctx, &mut state).unwrap();

        assert_eq!(result.steps_skipped, vec!["Maybe"]);
        assert_eq!(result.steps_completed, vec!["Real"]);
        assert!(!result.all_completed());
        assert_eq!(result.total_steps(), 2);
    }

    #[test]
    fn cancel_handle_works() {
        let pipeline = Pipeline::new();
        let handle = pipeline.cancel_handle();

        assert!(!pipeline.is_cancelled());
        assert!(!handle.is_cancelled());

        handle.cancel();

        assert!(pipeline.is_cancelled());
        assert!(handle.is_cancelled());
    }
}
