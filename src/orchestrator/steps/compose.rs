//! Compose step - orders, reconciles, and composites the normalized clips.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::media::ToolRunner;
use crate::models::{ConcatOrder, NormalizedClip};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{ComposeOutput, Context, JobState, StepOutcome};
use crate::timeline::{reconcile, Compositor};

/// Compose step: one ffmpeg filtergraph run over the ordered clip set.
pub struct ComposeStep;

impl ComposeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ComposeStep {
    fn default() -> Self {
        Self::new()
    }
}

/// Playback order for `count` clips under the requested ordering policy.
///
/// A fixed seed makes the shuffle reproducible; without one the shuffle
/// draws from the thread RNG.
pub fn order_indices(count: usize, order: ConcatOrder, seed: Option<u64>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..count).collect();
    if order == ConcatOrder::Random {
        match seed {
            Some(seed) => indices.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => indices.shuffle(&mut rand::thread_rng()),
        }
    }
    indices
}

impl PipelineStep for ComposeStep {
    fn name(&self) -> &str {
        "Compose"
    }

    fn description(&self) -> &str {
        "Assemble normalized clips into one timeline with transitions"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.request.transition_duration_s < 0.0 {
            return Err(StepError::invalid_input(
                "Transition duration cannot be negative",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let normalize = state
            .normalize
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Normalize step has not run"))?;
        let target_s = state
            .target_duration_s()
            .ok_or_else(|| StepError::precondition_failed("Narration step has not run"))?;

        let clip_order = order_indices(
            normalize.clips.len(),
            ctx.request.order,
            ctx.request.shuffle_seed,
        );
        let ordered: Vec<NormalizedClip> = clip_order
            .iter()
            .map(|&i| normalize.clips[i].clone())
            .collect();
        let durations: Vec<f64> = ordered.iter().map(|c| c.duration_s).collect();

        let plan = reconcile(&durations, target_s);
        if plan.loops_added > 0 {
            ctx.logger.info(&format!(
                "Clip set short of {:.2}s target; looping last clip {} time(s)",
                target_s, plan.loops_added
            ));
        }

        let tail_logger = std::sync::Arc::clone(&ctx.logger);
        let runner = ToolRunner::from_settings(&ctx.settings.tools).with_output_sink(
            std::sync::Arc::new(move |line, is_stderr| tail_logger.output_line(line, is_stderr)),
        );
        let compositor = Compositor::new(runner, ctx.settings.encoding.clone());
        let output = ctx.work_dir.join("composite.mp4");

        let composite = compositor.compose(
            &ordered,
            &plan,
            ctx.request.transition,
            ctx.request.transition_duration_s,
            &output,
        )?;

        ctx.logger.info(&format!(
            "Composite built: {:.2}s against {:.2}s target",
            composite.duration_s, target_s
        ));

        state.compose = Some(ComposeOutput {
            composite,
            plan,
            clip_order,
        });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let compose = state
            .compose
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Composition not recorded"))?;

        if !compose.composite.path.exists() {
            return Err(StepError::invalid_output(format!(
                "Composite file not created: {}",
                compose.composite.path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RenderRequest;
    use crate::orchestrator::steps::testutil;

    #[test]
    fn sequential_order_is_identity() {
        assert_eq!(
            order_indices(4, ConcatOrder::Sequential, None),
            vec![0, 1, 2, 3]
        );
        // A seed never affects sequential ordering.
        assert_eq!(
            order_indices(4, ConcatOrder::Sequential, Some(7)),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let a = order_indices(10, ConcatOrder::Random, Some(42));
        let b = order_indices(10, ConcatOrder::Random, Some(42));
        assert_eq!(a, b);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut order = order_indices(8, ConcatOrder::Random, Some(1));
        order.sort_unstable();
        assert_eq!(order, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn missing_narration_is_precondition_failure() {
        let (ctx, _dir) = testutil::context(RenderRequest::new("glaciers"));
        let step = ComposeStep::new();
        let mut state = JobState::new("t");
        state.normalize = Some(crate::orchestrator::types::NormalizeOutput {
            clips: vec![crate::models::NormalizedClip::new("/tmp/n.mp4", 5.0)],
            dropped: 0,
        });
        let err = step.execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::PreconditionFailed(_)));
    }

    #[test]
    fn negative_transition_duration_fails_validation() {
        let mut request = RenderRequest::new("glaciers");
        request.transition_duration_s = -0.5;
        let (ctx, _dir) = testutil::context(request);
        let step = ComposeStep::new();
        assert!(step.validate_input(&ctx).is_err());
    }
}
