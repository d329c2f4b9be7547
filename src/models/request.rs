//! Per-run render request.

use serde::{Deserialize, Serialize};

use super::enums::{AspectTarget, ConcatOrder, Transition};

/// Parameters for one assembly run.
///
/// Passed by value into the orchestrator at construction; there is no
/// process-wide mutable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Subject/topic handed to the script and sourcing collaborators.
    pub subject: String,

    /// Output geometry.
    #[serde(default)]
    pub aspect: AspectTarget,

    /// Clip ordering before composition.
    #[serde(default)]
    pub order: ConcatOrder,

    /// Transition policy between adjacent clips.
    #[serde(default)]
    pub transition: Transition,

    /// Overlap window for fade/crossfade joins, in seconds.
    #[serde(default = "default_transition_duration")]
    pub transition_duration_s: f64,

    /// Seed for the random clip order. `None` keeps the shuffle
    /// nondeterministic; tests and reproducible runs set it.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,

    /// How many clips to request from the sourcing collaborator.
    #[serde(default = "default_clip_count")]
    pub clip_count: u32,

    /// Upper bound on a single sourced clip's duration, in seconds.
    #[serde(default = "default_max_clip_duration")]
    pub max_clip_duration_s: f64,

    /// Whether to burn the collaborator-supplied subtitle track.
    #[serde(default = "default_true")]
    pub burn_subtitles: bool,
}

fn default_transition_duration() -> f64 {
    0.5
}

fn default_clip_count() -> u32 {
    5
}

fn default_max_clip_duration() -> f64 {
    25.0
}

fn default_true() -> bool {
    true
}

impl RenderRequest {
    /// Create a request with defaults for the given subject.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            aspect: AspectTarget::default(),
            order: ConcatOrder::default(),
            transition: Transition::default(),
            transition_duration_s: default_transition_duration(),
            shuffle_seed: None,
            clip_count: default_clip_count(),
            max_clip_duration_s: default_max_clip_duration(),
            burn_subtitles: true,
        }
    }

    /// Fix the shuffle seed for reproducible runs.
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let req = RenderRequest::new("city timelapse");
        assert_eq!(req.transition, Transition::Fade);
        assert_eq!(req.transition_duration_s, 0.5);
        assert_eq!(req.clip_count, 5);
        assert!(req.burn_subtitles);
        assert!(req.shuffle_seed.is_none());
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let req: RenderRequest = serde_json::from_str(r#"{"subject": "ocean"}"#).unwrap();
        assert_eq!(req.subject, "ocean");
        assert_eq!(req.aspect, AspectTarget::Portrait9x16);
        assert_eq!(req.order, ConcatOrder::Sequential);
    }
}
