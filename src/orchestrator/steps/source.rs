//! Source step - obtains local clip files from the sourcing collaborator.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, SourceOutput, StepOutcome};
use crate::providers::ClipSource;

/// Source step backed by a clip-sourcing collaborator.
///
/// The collaborator downloads or generates clips; this step only checks
/// that usable local files came back.
pub struct SourceStep {
    source: Box<dyn ClipSource>,
}

impl SourceStep {
    pub fn new(source: Box<dyn ClipSource>) -> Self {
        Self { source }
    }
}

impl PipelineStep for SourceStep {
    fn name(&self) -> &str {
        "Source"
    }

    fn description(&self) -> &str {
        "Fetch candidate clips into the run workspace"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.request.clip_count == 0 {
            return Err(StepError::invalid_input("Requested clip count is zero"));
        }
        if ctx.request.max_clip_duration_s <= 0.0 {
            return Err(StepError::invalid_input(
                "Maximum clip duration must be positive",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        ctx.logger.info(&format!(
            "Sourcing up to {} clips for '{}'",
            ctx.request.clip_count, ctx.request.subject
        ));

        let files = self.source.source_clips(&ctx.request, &ctx.downloads_dir)?;

        if files.is_empty() {
            return Err(StepError::other("Sourcing returned no clips"));
        }

        ctx.logger
            .info(&format!("Sourced {} clip file(s)", files.len()));
        state.sourcing = Some(SourceOutput { files });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let sourcing = state
            .sourcing
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Sourcing not recorded"))?;

        for file in &sourcing.files {
            if !file.exists() {
                return Err(StepError::invalid_output(format!(
                    "Sourced clip missing on disk: {}",
                    file.display()
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

    use crate::models::RenderRequest;
    use crate::orchestrator::steps::testutil;
    use crate::providers::ProviderResult;

    struct FakeSource {
        count: usize,
    }

    impl ClipSource for FakeSource {
        fn source_clips(
            &self,
            _request: &RenderRequest,
            out_dir: &Path,
        ) -> ProviderResult<Vec<PathBuf>> {
            let mut files = Vec::new();
            for i in 0..self.count {
                let path = out_dir.join(format!("clip_{i}.mp4"));
                fs::write(&path, b"fake clip").unwrap();
                files.push(path);
            }
            Ok(files)
        }
    }

    #[test]
    fn records_sourced_files() {
        let (ctx, _dir) = testutil::context(RenderRequest::new("waves"));
        let step = SourceStep::new(Box::new(FakeSource { count: 3 }));
        let mut state = JobState::new("t");

        step.validate_input(&ctx).unwrap();
        step.execute(&ctx, &mut state).unwrap();
        step.validate_output(&ctx, &state).unwrap();

        assert_eq!(state.sourcing.unwrap().files.len(), 3);
    }

    #[test]
    fn empty_sourcing_result_is_an_error() {
        let (ctx, _dir) = testutil::context(RenderRequest::new("waves"));
        let step = SourceStep::new(Box::new(FakeSource { count: 0 }));
        let mut state = JobState::new("t");
        assert!(step.execute(&ctx, &mut state).is_err());
    }

    #[test]
    fn zero_clip_count_fails_validation() {
        let mut request = RenderRequest::new("waves");
        request.clip_count = 0;
        let (ctx, _dir) = testutil::context(request);
        let step = SourceStep::new(Box::new(FakeSource { count: 1 }));
        assert!(step.validate_input(&ctx).is_err());
    }
}
