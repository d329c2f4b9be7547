//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Run → Step → Operation → Detail

use std::io;

use thiserror::Error;

use crate::finish::FinishError;
use crate::media::ProbeError;
use crate::normalize::NormalizeError;
use crate::providers::ProviderError;
use crate::timeline::ComposeError;

/// Top-level pipeline error with run context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Run '{job_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        job_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Input validation failed before the pipeline started.
    #[error("Run '{job_name}' failed validation: {message}")]
    ValidationFailed { job_name: String, message: String },

    /// Pipeline was cancelled.
    #[error("Run '{job_name}' was cancelled")]
    Cancelled { job_name: String },

    /// Failed to set up the run (create directories, open log, etc.).
    #[error("Run '{job_name}' setup failed: {message}")]
    SetupFailed { job_name: String, message: String },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_name: job_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a validation failed error.
    pub fn validation_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    /// Create a setup failed error.
    pub fn setup_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    /// Create a cancelled error.
    pub fn cancelled(job_name: impl Into<String>) -> Self {
        Self::Cancelled {
            job_name: job_name.into(),
        }
    }
}

/// Error from a pipeline step with operation context.
///
/// Subsystem errors (probe, normalize, compose, finish, provider) convert
/// transparently so step code can use `?` end to end.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A required file was not found.
    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// A precondition was not met.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),

    /// A collaborator (script, narration, sourcing, mixing, subtitles,
    /// publishing) failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// ffprobe metadata extraction failed.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Clip normalization failed.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Transition compositing failed.
    #[error(transparent)]
    Compose(#[from] ComposeError),

    /// Finishing (duration fit, audio, subtitles) failed.
    #[error(transparent)]
    Finish(#[from] FinishError),

    /// Generic step error with message.
    #[error("{0}")]
    Other(String),
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a precondition failed error.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_displays_context() {
        let err = StepError::precondition_failed("No usable clips remain");
        assert!(err.to_string().contains("No usable clips"));
    }

    #[test]
    fn provider_error_converts_transparently() {
        let err: StepError = ProviderError::new("script", "model unavailable").into();
        let msg = err.to_string();
        assert!(msg.contains("script"));
        assert!(msg.contains("model unavailable"));
    }

    #[test]
    fn pipeline_error_chains_context() {
        let step_err = StepError::file_not_found("/tmp/narration.m4a");
        let pipeline_err = PipelineError::step_failed("run_20260101_0001", "Finish", step_err);

        let msg = pipeline_err.to_string();
        assert!(msg.contains("run_20260101_0001"));
        assert!(msg.contains("Finish"));
    }
}
