// Configuration module for depth-recorder
//
// Provides:
// - YAML configuration file loading
// - Environment variable substitution
// - Configuration validation
// - Default values

pub mod types;
mod loader;

pub use loader::ConfigLoader;
pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RecorderConfig> {
    ConfigLoader::load(path).context("Failed to load configuration")
}

/// Load configuration with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<RecorderConfig> {
    let mut config = load_config(path)?;

    // Allow environment variables to override config values
    if let Ok(source) = std::env::var("DEPTH_RECORDER_SOURCE") {
        config.camera.source = source;
    }

    if let Ok(level) = std::env::var("DEPTH_RECORDER_LOG_LEVEL") {
        config.logging.level = level;
    }

    Ok(config)
}
