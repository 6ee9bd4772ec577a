// Copyright 2026 depth-recorder contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Configuration types for depth-recorder

use serde::{Deserialize, Serialize};

use crate::camera::{DepthQuality, DepthUnit};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RecorderConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub recorder: RecorderSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Camera configuration handed to the frame source factory
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraConfig {
    /// Source kind: "synthetic" (hardware adapters register downstream)
    #[serde(default = "default_source")]
    pub source: String,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Depth-mode quality tier requested at open
    #[serde(default)]
    pub quality: DepthQuality,

    /// Linear unit for depth measurements; logs are always millimeters
    #[serde(default)]
    pub unit: DepthUnit,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            quality: DepthQuality::default(),
            unit: DepthUnit::default(),
        }
    }
}

/// Capability flags for the capture loop
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecorderSettings {
    /// Append frame records to the log file
    #[serde(default = "default_true")]
    pub write_log: bool,

    /// Run the per-frame preview sink
    #[serde(default)]
    pub preview: bool,

    /// Write the session summary sidecar next to the log
    #[serde(default = "default_true")]
    pub metadata: bool,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            write_log: true,
            preview: false,
            metadata: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_source() -> String {
    "synthetic".to_string()
}
fn default_width() -> u32 {
    1280
}
fn default_height() -> u32 {
    720
}
fn default_fps() -> u32 {
    30
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
