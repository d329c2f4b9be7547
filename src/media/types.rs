//! Types shared by the probing and tool-running code.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Probed metadata for one media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Container duration in seconds, if it could be read.
    pub duration_s: Option<f64>,
    /// First video stream width, if resolution probing succeeded.
    pub width: Option<u32>,
    /// First video stream height, if resolution probing succeeded.
    pub height: Option<u32>,
    /// True iff the file exposes at least one audio stream.
    pub has_audio: bool,
}

/// Errors from running an external transcoding tool.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The external tool could not be spawned.
    #[error("Failed to run {tool}: {source}")]
    SpawnFailed {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The external tool exited with a failure status.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// The external tool exceeded the configured timeout.
    #[error("{tool} timed out after {timeout_secs}s")]
    TimedOut { tool: String, timeout_secs: u64 },

    /// Reading the tool's output failed.
    #[error("Failed to capture {tool} output: {source}")]
    OutputCapture {
        tool: String,
        #[source]
        source: io::Error,
    },
}

/// Errors from media metadata probing.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The media file does not exist.
    #[error("Media file not found: {0}")]
    FileNotFound(PathBuf),

    /// ffprobe itself failed.
    #[error("Probe of {path} failed: {source}")]
    Tool {
        path: PathBuf,
        #[source]
        source: ToolError,
    },

    /// The tool output could not be parsed.
    #[error("Failed to parse {what} from probe output for {path}: {message}")]
    ParseError {
        what: String,
        path: PathBuf,
        message: String,
    },
}

impl ProbeError {
    /// Wrap a tool error with the path being probed.
    pub fn tool(path: impl Into<PathBuf>, source: ToolError) -> Self {
        Self::Tool {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error with context.
    pub fn parse_error(
        what: impl Into<String>,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::ParseError {
            what: what.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_error_displays_context() {
        let err = ToolError::CommandFailed {
            tool: "ffprobe".to_string(),
            exit_code: 1,
            message: "Invalid data found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ffprobe"));
        assert!(msg.contains("exit code 1"));
    }

    #[test]
    fn probe_error_chains_tool_error() {
        let err = ProbeError::tool(
            "/tmp/clip.mp4",
            ToolError::TimedOut {
                tool: "ffprobe".to_string(),
                timeout_secs: 30,
            },
        );
        assert!(err.to_string().contains("clip.mp4"));
    }
}
