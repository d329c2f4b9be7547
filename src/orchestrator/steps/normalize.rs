//! Normalize step - probes sourced clips and normalizes the usable ones.
//!
//! Per-clip failures (unreadable file, zero duration, failed transcode) drop
//! the clip and continue; the step only fails when no usable clips remain.

use crate::media::{probe, ToolRunner};
use crate::models::Clip;
use crate::normalize::Normalizer;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, NormalizeOutput, StepOutcome};

/// Normalize step: uniform geometry, frame rate, and audio presence.
pub struct NormalizeStep;

impl NormalizeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NormalizeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for NormalizeStep {
    fn name(&self) -> &str {
        "Normalize"
    }

    fn description(&self) -> &str {
        "Probe sourced clips and conform them to the target geometry"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if !ctx.work_dir.exists() {
            return Err(StepError::invalid_input(format!(
                "Work directory missing: {}",
                ctx.work_dir.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let sourcing = state
            .sourcing
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("Source step has not run"))?;

        let tail_logger = std::sync::Arc::clone(&ctx.logger);
        let runner = ToolRunner::from_settings(&ctx.settings.tools).with_output_sink(
            std::sync::Arc::new(move |line, is_stderr| tail_logger.output_line(line, is_stderr)),
        );
        let normalizer = Normalizer::new(runner.clone(), ctx.settings.encoding.clone());

        let total = sourcing.files.len();
        let mut clips = Vec::with_capacity(total);
        let mut dropped = 0usize;

        for (i, file) in sourcing.files.iter().enumerate() {
            ctx.report_progress(
                self.name(),
                ((i as f64 / total as f64) * 100.0) as u32,
                &format!("Normalizing clip {} of {}", i + 1, total),
            );

            let info = match probe(&runner, file) {
                Ok(info) => info,
                Err(e) => {
                    ctx.logger
                        .warn(&format!("Dropping {}: {}", file.display(), e));
                    dropped += 1;
                    continue;
                }
            };

            let duration_s = match info.duration_s {
                Some(d) if d > 0.0 => d,
                _ => {
                    ctx.logger
                        .warn(&format!("Dropping {}: no usable duration", file.display()));
                    dropped += 1;
                    continue;
                }
            };

            let mut clip = Clip::new(file, duration_s, info.has_audio);
            if let (Some(w), Some(h)) = (info.width, info.height) {
                clip = clip.with_resolution(w, h);
            }

            let output = ctx.work_dir.join(format!("norm_{i:03}.mp4"));
            match normalizer.normalize(&clip, ctx.request.aspect, &output) {
                Ok(normalized) => clips.push(normalized),
                Err(e) => {
                    ctx.logger
                        .warn(&format!("Dropping {}: {}", file.display(), e));
                    dropped += 1;
                }
            }
        }

        if clips.is_empty() {
            return Err(StepError::precondition_failed(
                "No usable clips remain after normalization",
            ));
        }

        ctx.logger.info(&format!(
            "Normalized {} clip(s), dropped {}",
            clips.len(),
            dropped
        ));
        state.normalize = Some(NormalizeOutput { clips, dropped });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let normalize = state
            .normalize
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Normalization not recorded"))?;

        if normalize.clips.is_empty() {
            return Err(StepError::invalid_output("Normalized clip set is empty"));
        }
        for clip in &normalize.clips {
            if clip.duration_s <= 0.0 {
                return Err(StepError::invalid_output(format!(
                    "Normalized clip has non-positive duration: {}",
                    clip.path.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NormalizedClip, RenderRequest};
    use crate::orchestrator::steps::testutil;

    #[test]
    fn missing_source_state_is_precondition_failure() {
        let (ctx, _dir) = testutil::context(RenderRequest::new("forests"));
        let step = NormalizeStep::new();
        let mut state = JobState::new("t");
        let err = step.execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::PreconditionFailed(_)));
    }

    #[test]
    fn output_validation_rejects_empty_clip_set() {
        let (ctx, _dir) = testutil::context(RenderRequest::new("forests"));
        let step = NormalizeStep::new();
        let mut state = JobState::new("t");
        state.normalize = Some(NormalizeOutput {
            clips: vec![],
            dropped: 5,
        });
        assert!(step.validate_output(&ctx, &state).is_err());
    }

    #[test]
    fn output_validation_rejects_zero_duration_clip() {
        let (ctx, _dir) = testutil::context(RenderRequest::new("forests"));
        let step = NormalizeStep::new();
        let mut state = JobState::new("t");
        state.normalize = Some(NormalizeOutput {
            clips: vec![NormalizedClip::new("/tmp/n.mp4", 0.0)],
            dropped: 0,
        });
        assert!(step.validate_output(&ctx, &state).is_err());
    }
}
