//! Pipeline step implementations.
//!
//! Each step handles one phase of the assembly pipeline, from script
//! generation through publishing.

mod compose;
mod finish;
mod narration;
mod normalize;
mod publish;
mod script;
mod source;

pub use compose::ComposeStep;
pub use finish::FinishStep;
pub use narration::NarrationStep;
pub use normalize::NormalizeStep;
pub use publish::PublishStep;
pub use script::ScriptStep;
pub use source::SourceStep;

#[cfg(test)]
pub(crate) mod testutil {
    use std::fs;
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::config::Settings;
    use crate::logging::{JobLogger, LogConfig};
    use crate::models::RenderRequest;
    use crate::orchestrator::types::Context;

    /// Build a step-test context rooted in a fresh temp directory.
    ///
    /// The returned TempDir must stay alive for the duration of the test.
    pub fn context(request: RenderRequest) -> (Context, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let downloads = dir.path().join("downloads");
        let audio = dir.path().join("audio");
        let work = dir.path().join("work");
        let out = dir.path().join("out");
        for d in [&downloads, &audio, &work, &out] {
            fs::create_dir_all(d).unwrap();
        }

        let logger = JobLogger::new(
            "test_run",
            dir.path().join("logs"),
            LogConfig::default(),
            None,
        )
        .unwrap();

        let ctx = Context::new(
            request,
            Settings::default(),
            "test_run",
            downloads,
            audio,
            work,
            out,
            Arc::new(logger),
        );
        (ctx, dir)
    }
}
