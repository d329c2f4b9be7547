//! Clip data structures (probed sources, normalized clips, composites).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A probed source clip, before normalization.
///
/// Created from a sourcing collaborator's file plus the prober's metadata.
/// Read-only to the core; the underlying temp file is discarded once the
/// compositor has consumed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Location of the already-downloaded/generated video file.
    pub path: PathBuf,
    /// Probed duration in seconds.
    pub duration_s: f64,
    /// Probed width in pixels, if resolution probing succeeded.
    pub width: Option<u32>,
    /// Probed height in pixels, if resolution probing succeeded.
    pub height: Option<u32>,
    /// Whether the container exposes at least one audio stream.
    pub has_audio: bool,
}

impl Clip {
    /// Create a clip record from probed metadata.
    pub fn new(path: impl Into<PathBuf>, duration_s: f64, has_audio: bool) -> Self {
        Self {
            path: path.into(),
            duration_s,
            width: None,
            height: None,
            has_audio,
        }
    }

    /// Set the probed resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// A clip after normalization: exact target geometry, 25 fps, audio present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedClip {
    /// Path of the normalized intermediate file.
    pub path: PathBuf,
    /// Duration in seconds (re-probed after normalization).
    pub duration_s: f64,
}

impl NormalizedClip {
    pub fn new(path: impl Into<PathBuf>, duration_s: f64) -> Self {
        Self {
            path: path.into(),
            duration_s,
        }
    }
}

/// The single video+audio timeline produced by the compositor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeTrack {
    /// Path of the composite file.
    pub path: PathBuf,
    /// Probed duration in seconds.
    pub duration_s: f64,
}

impl CompositeTrack {
    pub fn new(path: impl Into<PathBuf>, duration_s: f64) -> Self {
        Self {
            path: path.into(),
            duration_s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_builder_sets_resolution() {
        let clip = Clip::new("/tmp/a.mp4", 12.5, true).with_resolution(1920, 1080);
        assert_eq!(clip.width, Some(1920));
        assert_eq!(clip.height, Some(1080));
        assert!(clip.has_audio);
    }

    #[test]
    fn clip_without_resolution_probes_none() {
        let clip = Clip::new("/tmp/b.mp4", 3.0, false);
        assert_eq!(clip.width, None);
        assert_eq!(clip.height, None);
    }
}
