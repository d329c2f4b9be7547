//! Configuration management for ReelForge Core.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! There is no process-wide mutable configuration: `Settings` is loaded
//! once and passed by value/reference into the orchestrator.
//!
//! # Example
//!
//! ```no_run
//! use reel_core::config::{ConfigManager, ConfigSection};
//!
//! // Create manager and load (or create default) config
//! let mut config = ConfigManager::new(".config/reelforge.toml");
//! config.load_or_create().unwrap();
//!
//! // Read settings
//! println!("Output folder: {}", config.settings().paths.output_folder);
//!
//! // Modify a setting
//! config.settings_mut().encoding.video_crf = 20;
//!
//! // Save just the encoding section atomically
//! config.update_section(ConfigSection::Encoding).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, EncodingSettings, LoggingSettings, PathSettings, Settings, ToolSettings,
};
