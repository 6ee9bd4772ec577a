// Configuration loader with environment variable substitution

use super::types::*;
use crate::camera::DepthUnit;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RecorderConfig> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        // Substitute environment variables
        let content = Self::substitute_env_vars(&content);

        // Parse YAML
        let config: RecorderConfig =
            serde_yaml::from_str(&content).context("Failed to parse YAML configuration")?;

        // Validate configuration
        Self::validate(&config)?;

        Ok(config)
    }

    /// Substitute ${VAR} and ${VAR:-default} patterns with environment variables
    ///
    /// Examples:
    /// - ${HOME} -> /home/user
    /// - ${DEPTH_RECORDER_SOURCE:-synthetic} -> synthetic (if unset)
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}:]+)(?::-([^}]+))?\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str());

            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if let Some(default) = default_value {
                        default.to_string()
                    } else {
                        // Keep original if no default and var not found
                        format!("${{{}}}", var_name)
                    }
                }
            }
        })
        .to_string()
    }

    /// Validate configuration
    pub fn validate(config: &RecorderConfig) -> Result<()> {
        if config.camera.source.is_empty() {
            bail!("camera.source cannot be empty");
        }

        if config.camera.width == 0 || config.camera.height == 0 {
            bail!(
                "camera resolution must be > 0 (got {}x{})",
                config.camera.width,
                config.camera.height
            );
        }

        if config.camera.fps == 0 {
            bail!("camera.fps must be > 0");
        }

        // Frame logs store u16 millimeter samples; other units would
        // change the meaning of every record.
        if config.camera.unit != DepthUnit::Millimeters {
            bail!("camera.unit must be 'millimeters' (logs store millimeter depth)");
        }

        match config.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            unknown => bail!(
                "Unknown logging.level: '{}'. Supported: trace, debug, info, warn, error",
                unknown
            ),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_substitution() {
        // Set test environment variable
        std::env::set_var("TEST_VAR", "test_value");

        let input = "source: ${TEST_VAR}";
        let output = ConfigLoader::substitute_env_vars(input);
        assert_eq!(output, "source: test_value");

        std::env::remove_var("TEST_VAR");
    }

    #[test]
    fn test_env_var_with_default() {
        // Don't set TEST_VAR2
        std::env::remove_var("TEST_VAR2");

        let input = "source: ${TEST_VAR2:-synthetic}";
        let output = ConfigLoader::substitute_env_vars(input);
        assert_eq!(output, "source: synthetic");
    }

    #[test]
    fn test_validation_rejects_zero_resolution() {
        let mut config = RecorderConfig::default();
        config.camera.width = 0;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("resolution"));
    }

    #[test]
    fn test_validation_rejects_meter_units() {
        let mut config = RecorderConfig::default();
        config.camera.unit = DepthUnit::Meters;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("millimeters"));
    }

    #[test]
    fn test_validation_rejects_unknown_log_level() {
        let mut config = RecorderConfig::default();
        config.logging.level = "loud".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("logging.level"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigLoader::validate(&RecorderConfig::default()).is_ok());
    }
}
