//! Timeline planning and transition compositing.
//!
//! This module is the algorithmic core of the crate, split into two layers:
//! - pure planning (`reconcile`, `plan_joins`): no I/O, fully unit-tested
//! - execution (`Compositor`): turns a plan into one ffmpeg filtergraph run
//!
//! All planning operates on durations of ALREADY NORMALIZED clips; the
//! compositor assumes uniform geometry, frame rate, and audio presence.

mod compose;
mod reconcile;

pub use compose::{
    build_compose_args, plan_joins, ComposeError, ComposeInput, ComposePlan, ComposeResult,
    Compositor, Join,
};
pub use reconcile::{reconcile, ReconcilePlan, Segment};

/// Epsilon for duration comparisons in planning math.
pub(crate) const DURATION_EPS: f64 = 1e-6;
