//! Reel Core - assembly engine for ReelForge short-form videos
//!
//! This crate contains the full video assembly pipeline with zero UI
//! dependencies: probing, normalization, timeline planning, transition
//! compositing, finishing, and orchestration. Script generation, speech
//! synthesis, clip sourcing, audio mixing, subtitle generation, and
//! publishing are external collaborators behind the `providers` traits.

pub mod config;
pub mod finish;
pub mod logging;
pub mod media;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod providers;
pub mod timeline;
pub mod workspace;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
