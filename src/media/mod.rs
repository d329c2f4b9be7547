//! External transcoder plumbing: ffmpeg/ffprobe invocation and media probing.
//!
//! All media operations in the crate are blocking calls to the external
//! ffmpeg/ffprobe binaries. This module owns:
//! - `ToolRunner`: spawns the tools with a wall-clock timeout and captures
//!   stderr for error reporting
//! - `probe`: duration / resolution / audio-presence metadata extraction

mod probe;
mod runner;
mod types;

pub use probe::{
    parse_duration_output, parse_resolution_output, probe, probe_duration, probe_has_audio,
    probe_resolution,
};
pub use runner::{OutputSink, ToolOutput, ToolRunner};
pub use types::{MediaInfo, ProbeError, ProbeResult, ToolError};
