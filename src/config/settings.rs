//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level
//! updates.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Encoding constants for normalization, compositing, and finishing.
    #[serde(default)]
    pub encoding: EncodingSettings,

    /// External tool locations and limits.
    #[serde(default)]
    pub tools: ToolSettings,
}

/// Path configuration for output, temp, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for final assembled videos.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Root folder for per-run workspaces.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "reel_output".to_string()
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format (filter progress lines, keep error tail).
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool-output lines to keep for error diagnosis.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Keep the run workspace on disk after a failed run.
    #[serde(default)]
    pub keep_workspace_on_failure: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            keep_workspace_on_failure: false,
        }
    }
}

/// Encoding constants shared by every ffmpeg stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingSettings {
    /// Pinned output frame rate; identical across all normalized clips so
    /// concatenation and xfade are well-defined.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// x264 preset.
    #[serde(default = "default_preset")]
    pub video_preset: String,

    /// x264 constant rate factor.
    #[serde(default = "default_crf")]
    pub video_crf: u32,

    /// Output pixel format.
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// AAC bitrate.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Audio sample rate, also used for injected silent tracks.
    #[serde(default = "default_audio_sample_rate")]
    pub audio_sample_rate: u32,

    /// Acceptable gap between the final artifact's duration and the
    /// target before the finisher trims or loop-extends.
    #[serde(default = "default_duration_tolerance")]
    pub duration_tolerance_s: f64,
}

fn default_frame_rate() -> u32 {
    25
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_crf() -> u32 {
    23
}

fn default_pixel_format() -> String {
    "yuv420p".to_string()
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

fn default_audio_sample_rate() -> u32 {
    44100
}

fn default_duration_tolerance() -> f64 {
    1.0
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            video_preset: default_preset(),
            video_crf: default_crf(),
            pixel_format: default_pixel_format(),
            audio_bitrate: default_audio_bitrate(),
            audio_sample_rate: default_audio_sample_rate(),
            duration_tolerance_s: default_duration_tolerance(),
        }
    }
}

impl EncodingSettings {
    /// Video encoder tokens shared by every re-encoding stage.
    pub fn video_codec_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.video_preset.clone(),
            "-crf".to_string(),
            self.video_crf.to_string(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
        ]
    }

    /// Audio encoder tokens shared by every re-encoding stage.
    pub fn audio_codec_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
            "-ar".to_string(),
            self.audio_sample_rate.to_string(),
        ]
    }
}

/// External tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// ffmpeg executable ("ffmpeg" = find in PATH).
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffprobe executable ("ffprobe" = find in PATH).
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Wall-clock timeout for a single tool invocation, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Encoding,
    Tools,
}

impl ConfigSection {
    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Encoding => "encoding",
            ConfigSection::Tools => "tools",
        }
    }

    /// All known sections, in file order.
    pub fn all() -> &'static [ConfigSection] {
        &[
            ConfigSection::Paths,
            ConfigSection::Logging,
            ConfigSection::Encoding,
            ConfigSection::Tools,
        ]
    }
}
