//! Core enums used throughout the crate.

use serde::{Deserialize, Serialize};

/// Output geometry for the assembled video.
///
/// Drives every scale/crop decision in the normalizer. The variants map to
/// the three short-form delivery formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectTarget {
    /// 1080x1920 (TikTok/Reels/Shorts).
    #[default]
    #[serde(rename = "portrait_9_16")]
    Portrait9x16,
    /// 1920x1080 (YouTube).
    #[serde(rename = "landscape_16_9")]
    Landscape16x9,
    /// 1080x1080 (feed posts).
    #[serde(rename = "square_1_1")]
    Square1x1,
}

impl AspectTarget {
    /// Output width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            AspectTarget::Portrait9x16 => 1080,
            AspectTarget::Landscape16x9 => 1920,
            AspectTarget::Square1x1 => 1080,
        }
    }

    /// Output height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            AspectTarget::Portrait9x16 => 1920,
            AspectTarget::Landscape16x9 => 1080,
            AspectTarget::Square1x1 => 1080,
        }
    }

    /// (width, height) pair.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }
}

impl std::fmt::Display for AspectTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AspectTarget::Portrait9x16 => write!(f, "9:16 portrait"),
            AspectTarget::Landscape16x9 => write!(f, "16:9 landscape"),
            AspectTarget::Square1x1 => write!(f, "1:1 square"),
        }
    }
}

/// Transition policy between adjacent clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// Hard cuts only.
    None,
    /// Cross-dissolve between clips.
    #[default]
    Fade,
    /// Alias of Fade; both streams crossfade over the same window.
    Crossfade,
    /// Not implemented; degrades to hard cuts.
    Slide,
}

impl Transition {
    /// Whether this policy produces overlapping joins.
    ///
    /// `Slide` is referenced by callers but has no compositor
    /// implementation; it falls back to plain concatenation.
    pub fn is_overlapping(&self) -> bool {
        matches!(self, Transition::Fade | Transition::Crossfade)
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::None => write!(f, "none"),
            Transition::Fade => write!(f, "fade"),
            Transition::Crossfade => write!(f, "crossfade"),
            Transition::Slide => write!(f, "slide"),
        }
    }
}

/// Order in which sourced clips enter the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcatOrder {
    /// Preserve the order the sourcing collaborator returned.
    #[default]
    Sequential,
    /// Shuffle once before composition. Nondeterministic unless the
    /// request carries a shuffle seed.
    Random,
}

impl std::fmt::Display for ConcatOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConcatOrder::Sequential => write!(f, "sequential"),
            ConcatOrder::Random => write!(f, "random"),
        }
    }
}

/// Status of a completed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Final artifact produced and handed to the publisher.
    Completed,
    /// Job failed with error; no artifact was produced.
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_dimensions() {
        assert_eq!(AspectTarget::Portrait9x16.dimensions(), (1080, 1920));
        assert_eq!(AspectTarget::Landscape16x9.dimensions(), (1920, 1080));
        assert_eq!(AspectTarget::Square1x1.dimensions(), (1080, 1080));
    }

    #[test]
    fn fade_and_crossfade_overlap() {
        assert!(Transition::Fade.is_overlapping());
        assert!(Transition::Crossfade.is_overlapping());
        assert!(!Transition::None.is_overlapping());
        assert!(!Transition::Slide.is_overlapping());
    }

    #[test]
    fn transition_serde_names() {
        let json = serde_json::to_string(&Transition::Crossfade).unwrap();
        assert_eq!(json, "\"crossfade\"");
        let back: Transition = serde_json::from_str("\"slide\"").unwrap();
        assert_eq!(back, Transition::Slide);
    }
}
