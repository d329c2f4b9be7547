//! Duration reconciliation: loop-extend a clip set to cover a target.
//!
//! Given normalized clip durations and a target total, decide how the set
//! is stretched to land on the target:
//! - sum below target: repeat the LAST clip whole times to cover the
//!   shortfall, trimming the final repetition so the planned total equals
//!   the target exactly. Looping only ever touches the last clip; padding
//!   is never distributed across the set.
//! - sum at or above target: pass through unchanged. The tail trim happens
//!   after compositing (trimming mid-sequence would invalidate every
//!   transition offset downstream of the cut).

use serde::{Deserialize, Serialize};

use super::DURATION_EPS;

/// One entry in the reconciled playback order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Index into the normalized clip list.
    pub clip: usize,
    /// Play only the first `trim_to` seconds of the clip, when set.
    pub trim_to: Option<f64>,
}

impl Segment {
    fn full(clip: usize) -> Self {
        Self { clip, trim_to: None }
    }

    fn trimmed(clip: usize, trim_to: f64) -> Self {
        Self {
            clip,
            trim_to: Some(trim_to),
        }
    }

    /// Effective duration of this segment given the clip's full duration.
    pub fn effective_duration(&self, full_duration: f64) -> f64 {
        self.trim_to.unwrap_or(full_duration)
    }
}

/// The reconciled playback order plus its planned total duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcilePlan {
    /// Segments in playback order. Clip indices may repeat (loop extension).
    pub segments: Vec<Segment>,
    /// Sum of effective segment durations.
    pub planned_duration_s: f64,
    /// Number of loop repetitions that were appended.
    pub loops_added: usize,
}

/// Reconcile normalized clip durations against a target total duration.
///
/// `durations` must be non-empty and strictly positive; the caller (the
/// Normalize step) guarantees both by dropping unusable clips and failing
/// the job when none remain.
pub fn reconcile(durations: &[f64], target_s: f64) -> ReconcilePlan {
    debug_assert!(!durations.is_empty());

    let mut segments: Vec<Segment> = (0..durations.len()).map(Segment::full).collect();
    let sum: f64 = durations.iter().sum();

    if sum + DURATION_EPS >= target_s {
        // Overshoot (or exact fit) is resolved by the finisher's tail trim.
        return ReconcilePlan {
            segments,
            planned_duration_s: sum,
            loops_added: 0,
        };
    }

    let last_index = durations.len() - 1;
    let last_duration = durations[last_index];
    let mut shortfall = target_s - sum;
    let mut loops_added = 0;

    while shortfall > DURATION_EPS {
        if shortfall + DURATION_EPS >= last_duration {
            segments.push(Segment::full(last_index));
            shortfall -= last_duration;
        } else {
            segments.push(Segment::trimmed(last_index, shortfall));
            shortfall = 0.0;
        }
        loops_added += 1;
    }

    ReconcilePlan {
        segments,
        planned_duration_s: target_s,
        loops_added,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(plan: &ReconcilePlan, durations: &[f64]) -> f64 {
        plan.segments
            .iter()
            .map(|s| s.effective_duration(durations[s.clip]))
            .sum()
    }

    #[test]
    fn single_short_clip_loops_to_target() {
        // Scenario B: 1 clip of 5s, target 20s -> played 4 times, exact fit.
        let durations = [5.0];
        let plan = reconcile(&durations, 20.0);
        assert_eq!(plan.segments.len(), 4);
        assert!(plan.segments.iter().all(|s| s.clip == 0));
        assert_eq!(plan.loops_added, 3);
        assert!((total(&plan, &durations) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn shortfall_remainder_trims_final_repetition() {
        let durations = [4.0, 6.0];
        let plan = reconcile(&durations, 17.5);
        // 10s base + one full 6s loop + one loop trimmed to 1.5s.
        assert_eq!(plan.segments.len(), 4);
        assert_eq!(plan.segments[2], Segment::full(1));
        assert_eq!(plan.segments[3].clip, 1);
        assert!((plan.segments[3].trim_to.unwrap() - 1.5).abs() < 1e-9);
        assert!((total(&plan, &durations) - 17.5).abs() < 1e-9);
    }

    #[test]
    fn only_last_clip_is_ever_looped() {
        let durations = [3.0, 2.0, 4.0];
        let plan = reconcile(&durations, 20.0);
        for seg in &plan.segments[3..] {
            assert_eq!(seg.clip, 2);
        }
    }

    #[test]
    fn excess_sum_passes_through_untouched() {
        let durations = [10.0, 8.0, 12.0];
        let plan = reconcile(&durations, 25.0);
        assert_eq!(plan.segments.len(), 3);
        assert_eq!(plan.loops_added, 0);
        assert!((plan.planned_duration_s - 30.0).abs() < 1e-9);
        assert!(plan.segments.iter().all(|s| s.trim_to.is_none()));
    }

    #[test]
    fn single_long_clip_passes_through() {
        let durations = [45.0];
        let plan = reconcile(&durations, 30.0);
        assert_eq!(plan.segments, vec![Segment::full(0)]);
        assert_eq!(plan.planned_duration_s, 45.0);
    }

    #[test]
    fn exact_fit_adds_no_loops() {
        let durations = [10.0, 10.0];
        let plan = reconcile(&durations, 20.0);
        assert_eq!(plan.segments.len(), 2);
        assert_eq!(plan.loops_added, 0);
    }
}
