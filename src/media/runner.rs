//! Blocking runner for the external ffmpeg/ffprobe binaries.
//!
//! Every media operation in the crate goes through here so that timeout
//! enforcement, stderr capture, and command logging live in one place.
//! Commands are built elsewhere as plain token vectors (see the normalize,
//! timeline, and finish modules) and handed in ready to execute.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::ToolSettings;

use super::types::ToolError;

/// Poll interval while waiting for a child process.
const WAIT_POLL: Duration = Duration::from_millis(50);

/// Captured output of a finished tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Observer for captured tool output lines: `(line, is_stderr)`.
///
/// Steps attach the per-run logger here so tool chatter lands in the
/// run log's tail buffer for error diagnosis.
pub type OutputSink = Arc<dyn Fn(&str, bool) + Send + Sync>;

/// Spawns ffmpeg/ffprobe with a wall-clock timeout.
///
/// A long-running transcode either completes, times out, or fails with a
/// nonzero exit status; all three surface as `ToolError` and the caller
/// treats them as that operation's failure.
#[derive(Clone)]
pub struct ToolRunner {
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout: Duration,
    sink: Option<OutputSink>,
}

impl ToolRunner {
    /// Create a runner that finds the tools in PATH with the default timeout.
    pub fn new() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            timeout: Duration::from_secs(600),
            sink: None,
        }
    }

    /// Create a runner from the tools config section.
    pub fn from_settings(settings: &ToolSettings) -> Self {
        Self {
            ffmpeg_path: settings.ffmpeg_path.clone(),
            ffprobe_path: settings.ffprobe_path.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
            sink: None,
        }
    }

    /// Override the timeout (mainly for tests).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attach an observer for captured output lines.
    pub fn with_output_sink(mut self, sink: OutputSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run ffmpeg with the given tokens.
    pub fn ffmpeg(&self, args: &[String]) -> Result<ToolOutput, ToolError> {
        self.run(&self.ffmpeg_path, "ffmpeg", args)
    }

    /// Run ffprobe with the given tokens.
    pub fn ffprobe(&self, args: &[String]) -> Result<ToolOutput, ToolError> {
        self.run(&self.ffprobe_path, "ffprobe", args)
    }

    fn run(&self, program: &str, tool: &str, args: &[String]) -> Result<ToolOutput, ToolError> {
        tracing::debug!("$ {} {}", tool, args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ToolError::SpawnFailed {
                tool: tool.to_string(),
                source: e,
            })?;

        // Drain both pipes on background threads so the child can never
        // block on a full pipe buffer while we wait on it.
        let stdout_reader = spawn_pipe_reader(&mut child, PipeKind::Stdout);
        let stderr_reader = spawn_pipe_reader(&mut child, PipeKind::Stderr);

        let status = self.wait_with_timeout(&mut child, tool)?;

        let stdout = join_pipe_reader(stdout_reader, tool)?;
        let stderr = join_pipe_reader(stderr_reader, tool)?;

        // Feed the sink before the status check so failure output is
        // available for tail diagnosis.
        if let Some(ref sink) = self.sink {
            for line in stdout.lines() {
                sink(line, false);
            }
            for line in stderr.lines() {
                sink(line, true);
            }
        }

        if !status.success() {
            return Err(ToolError::CommandFailed {
                tool: tool.to_string(),
                exit_code: status.code().unwrap_or(-1),
                message: tail_lines(&stderr, 10),
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }

    /// Poll the child until it exits or the timeout elapses.
    fn wait_with_timeout(
        &self,
        child: &mut Child,
        tool: &str,
    ) -> Result<std::process::ExitStatus, ToolError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ToolError::TimedOut {
                            tool: tool.to_string(),
                            timeout_secs: self.timeout.as_secs(),
                        });
                    }
                    thread::sleep(WAIT_POLL);
                }
                Err(e) => {
                    return Err(ToolError::OutputCapture {
                        tool: tool.to_string(),
                        source: e,
                    })
                }
            }
        }
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new()
    }
}

enum PipeKind {
    Stdout,
    Stderr,
}

fn spawn_pipe_reader(
    child: &mut Child,
    kind: PipeKind,
) -> Option<thread::JoinHandle<std::io::Result<String>>> {
    let mut reader: Box<dyn Read + Send> = match kind {
        PipeKind::Stdout => Box::new(child.stdout.take()?),
        PipeKind::Stderr => Box::new(child.stderr.take()?),
    };
    Some(thread::spawn(move || {
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        Ok(buf)
    }))
}

fn join_pipe_reader(
    handle: Option<thread::JoinHandle<std::io::Result<String>>>,
    tool: &str,
) -> Result<String, ToolError> {
    match handle {
        Some(h) => match h.join() {
            Ok(Ok(s)) => Ok(s),
            Ok(Err(e)) => Err(ToolError::OutputCapture {
                tool: tool.to_string(),
                source: e,
            }),
            Err(_) => Err(ToolError::OutputCapture {
                tool: tool.to_string(),
                source: std::io::Error::other("pipe reader thread panicked"),
            }),
        },
        None => Ok(String::new()),
    }
}

/// Keep only the last `n` lines of tool stderr for error messages.
fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_lines_keeps_last_n() {
        let text = "a\nb\nc\nd\ne";
        assert_eq!(tail_lines(text, 2), "d\ne");
        assert_eq!(tail_lines(text, 10), text);
        assert_eq!(tail_lines("", 3), "");
    }

    #[test]
    fn default_runner_uses_path_lookup() {
        let runner = ToolRunner::new();
        assert_eq!(runner.ffmpeg_path, "ffmpeg");
        assert_eq!(runner.ffprobe_path, "ffprobe");
        assert_eq!(runner.timeout, Duration::from_secs(600));
    }
}
