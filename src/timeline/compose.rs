//! Transition compositing: join planning and ffmpeg filtergraph execution.
//!
//! The join planner walks the clip list pairwise, maintaining the running
//! composite duration `T`. Each crossfade join starts its overlap at
//! `T - transition_duration` and shortens the total by the overlap amount;
//! a join whose incoming or outgoing clip is too short for the overlap
//! degrades to a hard cut instead of producing a degenerate window.
//!
//! Execution builds one `-filter_complex` graph over all inputs: `concat`
//! for hard-cut sequencing, chained `xfade` + `acrossfade` for overlapping
//! joins. The audio crossfade uses ffmpeg's default triangular (linear)
//! curve. Every input must already be normalized; `xfade` rejects mixed
//! geometry or frame rates.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EncodingSettings;
use crate::media::{probe_duration, ProbeError, ToolError, ToolRunner};
use crate::models::{CompositeTrack, NormalizedClip, Transition};

use super::reconcile::ReconcilePlan;
use super::DURATION_EPS;

/// Errors from the composition step. Fatal for the job; no retry.
#[derive(Error, Debug)]
pub enum ComposeError {
    /// No segments were left to compose.
    #[error("Composition plan contains no segments")]
    EmptyPlan,

    /// A segment referenced a clip index outside the normalized set.
    #[error("Segment references clip {index} but only {count} clips exist")]
    BadSegment { index: usize, count: usize },

    /// ffmpeg failed while building the composite.
    #[error("Composite encoding failed: {0}")]
    Tool(#[from] ToolError),

    /// Re-probing the composite failed.
    #[error("Composite output could not be probed: {0}")]
    Reprobe(#[from] ProbeError),
}

/// Result type for composition operations.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// How one pair of adjacent segments is joined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Join {
    /// Direct abutment, no blending.
    Cut,
    /// Overlapping blend starting `offset` seconds into the running
    /// composite.
    Crossfade { offset: f64 },
}

/// Planned joins plus the duration the composite should come out at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposePlan {
    /// One join per adjacent segment pair (`len == segments - 1`).
    pub joins: Vec<Join>,
    /// Expected composite duration: sum of durations minus total overlap.
    pub expected_duration_s: f64,
}

impl ComposePlan {
    /// Number of joins that actually crossfade.
    pub fn crossfade_count(&self) -> usize {
        self.joins
            .iter()
            .filter(|j| matches!(j, Join::Crossfade { .. }))
            .count()
    }
}

/// Plan the joins for a segment list under a fade/crossfade policy.
///
/// A crossfade requires the transition window to be strictly shorter than
/// BOTH clips it joins; otherwise that join is a hard cut and contributes
/// no shrinkage.
pub fn plan_joins(durations: &[f64], transition_duration_s: f64) -> ComposePlan {
    let mut joins = Vec::new();
    let mut total = durations.first().copied().unwrap_or(0.0);

    for i in 1..durations.len() {
        let outgoing = durations[i - 1];
        let incoming = durations[i];
        let fits = transition_duration_s + DURATION_EPS < outgoing
            && transition_duration_s + DURATION_EPS < incoming
            && transition_duration_s > 0.0;

        if fits {
            joins.push(Join::Crossfade {
                offset: total - transition_duration_s,
            });
            total += incoming - transition_duration_s;
        } else {
            joins.push(Join::Cut);
            total += incoming;
        }
    }

    ComposePlan {
        joins,
        expected_duration_s: total,
    }
}

/// One ffmpeg input for the composite graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeInput {
    pub path: PathBuf,
    /// Play only the first `trim_to` seconds, when set (loop remainder).
    pub trim_to: Option<f64>,
}

/// Build the full ffmpeg token vector for one composite run.
///
/// `joins` is `None` for plain concatenation (hard cuts everywhere) and
/// `Some` for a fade chain; in the latter case it must hold exactly
/// `inputs.len() - 1` entries.
pub fn build_compose_args(
    inputs: &[ComposeInput],
    joins: Option<&[Join]>,
    transition_duration_s: f64,
    encoding: &EncodingSettings,
    output: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into(), "-nostdin".into(), "-v".into(), "error".into()];

    for input in inputs {
        args.push("-i".into());
        args.push(input.path.to_string_lossy().to_string());
    }

    let graph = match joins {
        Some(joins) => fade_chain_graph(inputs, joins, transition_duration_s),
        None => concat_graph(inputs),
    };

    args.push("-filter_complex".into());
    args.push(graph.filter);
    args.push("-map".into());
    args.push(graph.video_label);
    args.push("-map".into());
    args.push(graph.audio_label);

    args.extend(encoding.video_codec_args());
    args.extend(encoding.audio_codec_args());

    args.push(output.to_string_lossy().to_string());
    args
}

struct FilterGraph {
    filter: String,
    video_label: String,
    audio_label: String,
}

/// Per-input stream labels, inserting trim/atrim where a segment is cut
/// short. Untrimmed inputs are referenced directly.
fn input_labels(inputs: &[ComposeInput], parts: &mut Vec<String>) -> Vec<(String, String)> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, input)| match input.trim_to {
            Some(t) => {
                parts.push(format!(
                    "[{i}:v]trim=duration={t:.3},setpts=PTS-STARTPTS[v{i}]",
                ));
                parts.push(format!(
                    "[{i}:a]atrim=duration={t:.3},asetpts=PTS-STARTPTS[a{i}]",
                ));
                (format!("[v{i}]"), format!("[a{i}]"))
            }
            None => (format!("[{i}:v]"), format!("[{i}:a]")),
        })
        .collect()
}

/// Hard-cut graph: video and audio streams concatenated independently,
/// then paired at the output maps.
fn concat_graph(inputs: &[ComposeInput]) -> FilterGraph {
    let mut parts = Vec::new();
    let labels = input_labels(inputs, &mut parts);
    let n = inputs.len();

    let video_in: String = labels.iter().map(|(v, _)| v.as_str()).collect();
    let audio_in: String = labels.iter().map(|(_, a)| a.as_str()).collect();
    parts.push(format!("{video_in}concat=n={n}:v=1:a=0[vout]"));
    parts.push(format!("{audio_in}concat=n={n}:v=0:a=1[aout]"));

    FilterGraph {
        filter: parts.join(";"),
        video_label: "[vout]".to_string(),
        audio_label: "[aout]".to_string(),
    }
}

/// Fade chain: fold the inputs left to right, crossfading where the plan
/// allows and falling back to a two-input concat for degenerate joins.
fn fade_chain_graph(
    inputs: &[ComposeInput],
    joins: &[Join],
    transition_duration_s: f64,
) -> FilterGraph {
    debug_assert_eq!(joins.len() + 1, inputs.len());

    let mut parts = Vec::new();
    let labels = input_labels(inputs, &mut parts);

    let (mut cur_v, mut cur_a) = labels[0].clone();

    for (i, join) in joins.iter().enumerate() {
        let (next_v, next_a) = &labels[i + 1];
        let out_v = format!("[vx{}]", i + 1);
        let out_a = format!("[ax{}]", i + 1);

        match join {
            Join::Crossfade { offset } => {
                parts.push(format!(
                    "{cur_v}{next_v}xfade=transition=fade:duration={d:.3}:offset={offset:.3}{out_v}",
                    d = transition_duration_s,
                ));
                parts.push(format!(
                    "{cur_a}{next_a}acrossfade=d={d:.3}{out_a}",
                    d = transition_duration_s,
                ));
            }
            Join::Cut => {
                parts.push(format!(
                    "{cur_v}{cur_a}{next_v}{next_a}concat=n=2:v=1:a=1{out_v}{out_a}"
                ));
            }
        }

        cur_v = out_v;
        cur_a = out_a;
    }

    FilterGraph {
        filter: parts.join(";"),
        video_label: cur_v,
        audio_label: cur_a,
    }
}

/// Executes composition plans against ffmpeg.
pub struct Compositor {
    runner: ToolRunner,
    encoding: EncodingSettings,
}

impl Compositor {
    pub fn new(runner: ToolRunner, encoding: EncodingSettings) -> Self {
        Self { runner, encoding }
    }

    /// Compose the reconciled segments into one video+audio track.
    ///
    /// Returns the composite with its re-probed duration; the finisher is
    /// responsible for closing any remaining gap to the target duration.
    pub fn compose(
        &self,
        clips: &[NormalizedClip],
        plan: &ReconcilePlan,
        transition: Transition,
        transition_duration_s: f64,
        output: &Path,
    ) -> ComposeResult<CompositeTrack> {
        if plan.segments.is_empty() {
            return Err(ComposeError::EmptyPlan);
        }

        let mut inputs = Vec::with_capacity(plan.segments.len());
        let mut durations = Vec::with_capacity(plan.segments.len());
        for seg in &plan.segments {
            let clip = clips.get(seg.clip).ok_or(ComposeError::BadSegment {
                index: seg.clip,
                count: clips.len(),
            })?;
            inputs.push(ComposeInput {
                path: clip.path.clone(),
                trim_to: seg.trim_to,
            });
            durations.push(seg.effective_duration(clip.duration_s));
        }

        let effective = effective_transition(transition);
        let join_plan = if effective.is_overlapping() && inputs.len() > 1 {
            Some(plan_joins(&durations, transition_duration_s))
        } else {
            None
        };

        if let Some(ref jp) = join_plan {
            tracing::info!(
                "Composing {} segments: {} crossfades, {} hard cuts, expected {:.2}s",
                inputs.len(),
                jp.crossfade_count(),
                jp.joins.len() - jp.crossfade_count(),
                jp.expected_duration_s
            );
        } else {
            tracing::info!(
                "Composing {} segments with hard cuts, expected {:.2}s",
                inputs.len(),
                durations.iter().sum::<f64>()
            );
        }

        let args = build_compose_args(
            &inputs,
            join_plan.as_ref().map(|p| p.joins.as_slice()),
            transition_duration_s,
            &self.encoding,
            output,
        );

        self.runner.ffmpeg(&args)?;
        let duration_s = probe_duration(&self.runner, output)?;

        Ok(CompositeTrack::new(output, duration_s))
    }
}

/// Map the requested policy to what the compositor actually does.
///
/// Slide has no filtergraph implementation; it degrades to plain
/// concatenation rather than failing the job.
fn effective_transition(transition: Transition) -> Transition {
    if transition == Transition::Slide {
        tracing::warn!("Slide transition is not implemented; falling back to hard cuts");
        return Transition::None;
    }
    transition
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(n: usize) -> Vec<ComposeInput> {
        (0..n)
            .map(|i| ComposeInput {
                path: PathBuf::from(format!("/tmp/norm_{i}.mp4")),
                trim_to: None,
            })
            .collect()
    }

    #[test]
    fn crossfade_shrinkage_matches_formula() {
        // Scenario A: 10s/8s/12s with d=0.5 -> 30 - 2*0.5 = 29s raw.
        let plan = plan_joins(&[10.0, 8.0, 12.0], 0.5);
        assert_eq!(plan.joins.len(), 2);
        assert_eq!(plan.crossfade_count(), 2);
        assert!((plan.expected_duration_s - 29.0).abs() < 1e-9);
    }

    #[test]
    fn offsets_are_measured_from_running_composite() {
        let plan = plan_joins(&[10.0, 8.0, 12.0], 0.5);
        let offsets: Vec<f64> = plan
            .joins
            .iter()
            .map(|j| match j {
                Join::Crossfade { offset } => *offset,
                Join::Cut => panic!("expected crossfade"),
            })
            .collect();
        // First join overlaps at 10 - 0.5; composite is then 17.5s long.
        assert!((offsets[0] - 9.5).abs() < 1e-9);
        assert!((offsets[1] - 17.0).abs() < 1e-9);
    }

    #[test]
    fn too_short_clip_degrades_join_to_cut() {
        // Scenario D: 1.0s window against a 0.8s clip.
        let plan = plan_joins(&[5.0, 0.8, 6.0], 1.0);
        assert_eq!(plan.joins[0], Join::Cut);
        assert_eq!(plan.joins[1], Join::Cut);
        // No shrinkage on cut joins.
        assert!((plan.expected_duration_s - 11.8).abs() < 1e-9);
    }

    #[test]
    fn equal_duration_and_window_is_a_cut() {
        // Strictly-less rule: a 2s window cannot crossfade a 2s clip.
        let plan = plan_joins(&[2.0, 5.0], 2.0);
        assert_eq!(plan.joins[0], Join::Cut);
    }

    #[test]
    fn mixed_joins_accumulate_correctly() {
        let plan = plan_joins(&[5.0, 0.4, 5.0, 5.0], 0.5);
        assert_eq!(plan.joins[0], Join::Cut);
        assert_eq!(plan.joins[1], Join::Cut);
        assert!(matches!(plan.joins[2], Join::Crossfade { .. }));
        // 5 + 0.4 + 5 + 5 - 0.5 = 14.9
        assert!((plan.expected_duration_s - 14.9).abs() < 1e-9);
    }

    #[test]
    fn single_clip_has_no_joins() {
        let plan = plan_joins(&[7.0], 0.5);
        assert!(plan.joins.is_empty());
        assert_eq!(plan.expected_duration_s, 7.0);
    }

    #[test]
    fn concat_graph_pairs_independent_streams() {
        let args = build_compose_args(
            &inputs(3),
            None,
            0.5,
            &EncodingSettings::default(),
            Path::new("/tmp/out.mp4"),
        );
        let idx = args.iter().position(|a| a == "-filter_complex").unwrap();
        let graph = &args[idx + 1];
        assert!(graph.contains("concat=n=3:v=1:a=0[vout]"));
        assert!(graph.contains("concat=n=3:v=0:a=1[aout]"));
        assert!(args.contains(&"[vout]".to_string()));
        assert!(args.contains(&"[aout]".to_string()));
    }

    #[test]
    fn fade_graph_chains_xfade_with_offsets() {
        let joins = plan_joins(&[10.0, 8.0, 12.0], 0.5).joins;
        let args = build_compose_args(
            &inputs(3),
            Some(&joins),
            0.5,
            &EncodingSettings::default(),
            Path::new("/tmp/out.mp4"),
        );
        let idx = args.iter().position(|a| a == "-filter_complex").unwrap();
        let graph = &args[idx + 1];
        assert!(graph.contains("xfade=transition=fade:duration=0.500:offset=9.500"));
        assert!(graph.contains("xfade=transition=fade:duration=0.500:offset=17.000"));
        assert!(graph.contains("acrossfade=d=0.500"));
    }

    #[test]
    fn degenerate_join_in_fade_graph_uses_concat() {
        let joins = plan_joins(&[5.0, 0.8, 6.0], 1.0).joins;
        let args = build_compose_args(
            &inputs(3),
            Some(&joins),
            1.0,
            &EncodingSettings::default(),
            Path::new("/tmp/out.mp4"),
        );
        let idx = args.iter().position(|a| a == "-filter_complex").unwrap();
        let graph = &args[idx + 1];
        assert!(graph.contains("concat=n=2:v=1:a=1"));
        assert!(!graph.contains("xfade"));
    }

    #[test]
    fn trimmed_segment_gets_trim_filters() {
        let mut ins = inputs(2);
        ins[1].trim_to = Some(1.5);
        let args = build_compose_args(
            &ins,
            None,
            0.5,
            &EncodingSettings::default(),
            Path::new("/tmp/out.mp4"),
        );
        let idx = args.iter().position(|a| a == "-filter_complex").unwrap();
        let graph = &args[idx + 1];
        assert!(graph.contains("[1:v]trim=duration=1.500,setpts=PTS-STARTPTS[v1]"));
        assert!(graph.contains("[1:a]atrim=duration=1.500,asetpts=PTS-STARTPTS[a1]"));
    }

    #[test]
    fn every_input_appears_once() {
        let args = build_compose_args(
            &inputs(4),
            None,
            0.5,
            &EncodingSettings::default(),
            Path::new("/tmp/out.mp4"),
        );
        let input_count = args.iter().filter(|a| *a == "-i").count();
        assert_eq!(input_count, 4);
    }
}
