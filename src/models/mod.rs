//! Data models for ReelForge Core.
//!
//! This module contains all core data structures used throughout the crate:
//! - Enums for aspect targets, transitions, concatenation order, job status
//! - Clip structures (probed sources, normalized clips, composite tracks)
//! - The render request that parameterizes one pipeline run

mod clips;
mod enums;
mod request;

// Re-export all public types
pub use clips::{Clip, CompositeTrack, NormalizedClip};
pub use enums::{AspectTarget, ConcatOrder, JobStatus, Transition};
pub use request::RenderRequest;
