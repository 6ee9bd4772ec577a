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

// Frame source adapter boundary
//
// Wraps whatever produces aligned (depth, color) frame pairs behind the
// `FrameSource` trait. Buffers returned by `read_depth`/`read_color` are
// owned copies: the recorder never holds a reference into driver memory
// past one loop iteration. Hardware SDK adapters implement `FrameSource`
// downstream; this crate ships a deterministic `SyntheticCamera` used by
// the default configuration and the test suite.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::CameraConfig;

/// Depth-mode quality tier requested from the device at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DepthQuality {
    Performance,
    Medium,
    #[default]
    Quality,
    Ultra,
}

impl DepthQuality {
    /// Depth quantization step of the synthetic source, in millimeters.
    /// Coarser tiers produce coarser synthetic measurements.
    pub fn step_mm(self) -> f32 {
        match self {
            DepthQuality::Performance => 8.0,
            DepthQuality::Medium => 4.0,
            DepthQuality::Quality => 2.0,
            DepthQuality::Ultra => 1.0,
        }
    }
}

/// Linear-unit selector for depth measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DepthUnit {
    #[default]
    Millimeters,
    Meters,
}

/// Interleaved channel layout of a color buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Bgr8,
    Bgra8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgr8 => 3,
            PixelFormat::Bgra8 => 4,
        }
    }
}

/// Owned copy of one color buffer, interleaved row-major.
#[derive(Debug, Clone)]
pub struct ColorImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

/// Owned copy of one depth buffer: f32 millimeters, one sample per pixel,
/// row-major.
#[derive(Debug, Clone)]
pub struct DepthMap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

/// Outcome of one poll: a frame pair is ready to read, or not yet.
/// `NotReady` is not an error; the caller retries on the next iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Available,
    NotReady,
}

/// Camera faults. `Open` is fatal before a session starts; `Disconnected`
/// and `ReadFailed` end a running session with the partial log preserved.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("failed to open camera: {0}")]
    Open(String),

    #[error("camera disconnected: {0}")]
    Disconnected(String),

    #[error("frame read failed: {0}")]
    ReadFailed(String),
}

/// A pollable producer of aligned (depth, color) frame pairs.
///
/// `read_depth`/`read_color` are valid only immediately after a `poll`
/// returned `Available` and must return owned copies. `close` is
/// idempotent and is always called on session end, on every exit path.
pub trait FrameSource: std::fmt::Debug {
    /// Frame dimensions, fixed for the lifetime of the source.
    fn dimensions(&self) -> (u32, u32);

    /// Check for a new frame pair. May block briefly, bounded by the
    /// device's own frame interval, but never indefinitely.
    fn poll(&mut self) -> Result<FrameStatus, CameraError>;

    fn read_depth(&mut self) -> Result<DepthMap, CameraError>;

    fn read_color(&mut self) -> Result<ColorImage, CameraError>;

    /// Release the device. Idempotent.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

/// Open the configured frame source.
pub fn open_source(config: &CameraConfig) -> Result<Box<dyn FrameSource>> {
    match config.source.as_str() {
        "synthetic" => Ok(Box::new(SyntheticCamera::open(config)?)),
        unknown => bail!("Unknown camera source: '{}'. Supported: synthetic", unknown),
    }
}

/// Deterministic test-pattern source paced to the configured frame rate.
///
/// Depth is a moving gradient quantized by the quality tier, with a patch
/// of invalid (negative) samples so the narrowing path is exercised end to
/// end. Color is a four-channel BGRA pattern, so every recorded frame goes
/// through the alpha-drop conversion.
#[derive(Debug)]
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    quality: DepthQuality,
    frame_interval: Duration,
    next_frame_at: Instant,
    seq: u32,
    frame_ready: bool,
    closed: bool,
}

impl SyntheticCamera {
    pub fn open(config: &CameraConfig) -> Result<Self, CameraError> {
        if config.width == 0 || config.height == 0 {
            return Err(CameraError::Open(format!(
                "invalid resolution {}x{}",
                config.width, config.height
            )));
        }
        if config.fps == 0 {
            return Err(CameraError::Open("fps must be > 0".to_string()));
        }
        Ok(Self {
            width: config.width,
            height: config.height,
            quality: config.quality,
            frame_interval: Duration::from_secs(1) / config.fps,
            next_frame_at: Instant::now(),
            seq: 0,
            frame_ready: false,
            closed: false,
        })
    }

    fn quantize(&self, mm: f32) -> f32 {
        let step = self.quality.step_mm();
        (mm / step).floor() * step
    }
}

impl FrameSource for SyntheticCamera {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn poll(&mut self) -> Result<FrameStatus, CameraError> {
        if self.closed {
            return Err(CameraError::ReadFailed("source is closed".to_string()));
        }
        let now = Instant::now();
        if now < self.next_frame_at {
            // Short-blocking pacing, bounded by one frame interval.
            std::thread::sleep(self.next_frame_at - now);
        }
        self.next_frame_at = Instant::now() + self.frame_interval;
        self.seq += 1;
        self.frame_ready = true;
        Ok(FrameStatus::Available)
    }

    fn read_depth(&mut self) -> Result<DepthMap, CameraError> {
        if self.closed || !self.frame_ready {
            return Err(CameraError::ReadFailed(
                "no frame available; poll first".to_string(),
            ));
        }
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                // Top-left corner is an invalid patch (measurement failure).
                if x < 4 && y < 4 {
                    data.push(f32::NEG_INFINITY);
                } else {
                    let mm = 500.0 + ((x + y + self.seq) % 4000) as f32;
                    data.push(self.quantize(mm));
                }
            }
        }
        Ok(DepthMap {
            width: self.width,
            height: self.height,
            data,
        })
    }

    fn read_color(&mut self) -> Result<ColorImage, CameraError> {
        if self.closed || !self.frame_ready {
            return Err(CameraError::ReadFailed(
                "no frame available; poll first".to_string(),
            ));
        }
        let pixels = self.width as usize * self.height as usize;
        let mut data = Vec::with_capacity(pixels * 4);
        for y in 0..self.height {
            for x in 0..self.width {
                data.push((x % 256) as u8);
                data.push((y % 256) as u8);
                data.push((self.seq % 256) as u8);
                data.push(255);
            }
        }
        Ok(ColorImage {
            width: self.width,
            height: self.height,
            format: PixelFormat::Bgra8,
            data,
        })
    }

    fn close(&mut self) {
        self.closed = true;
        self.frame_ready = false;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CameraConfig {
        CameraConfig {
            source: "synthetic".to_string(),
            width: 16,
            height: 12,
            fps: 1000,
            quality: DepthQuality::Ultra,
            unit: DepthUnit::Millimeters,
        }
    }

    #[test]
    fn test_open_rejects_zero_resolution() {
        let mut config = test_config();
        config.width = 0;
        let err = SyntheticCamera::open(&config).unwrap_err();
        assert!(err.to_string().contains("invalid resolution"));
    }

    #[test]
    fn test_buffers_match_configured_dimensions() {
        let mut camera = SyntheticCamera::open(&test_config()).unwrap();
        assert_eq!(camera.dimensions(), (16, 12));
        assert_eq!(camera.poll().unwrap(), FrameStatus::Available);

        let depth = camera.read_depth().unwrap();
        assert_eq!(depth.data.len(), 16 * 12);

        let color = camera.read_color().unwrap();
        assert_eq!(color.format, PixelFormat::Bgra8);
        assert_eq!(color.data.len(), 16 * 12 * 4);
    }

    #[test]
    fn test_read_before_poll_fails() {
        let mut camera = SyntheticCamera::open(&test_config()).unwrap();
        assert!(camera.read_depth().is_err());
        assert!(camera.read_color().is_err());
    }

    #[test]
    fn test_depth_contains_invalid_patch() {
        let mut camera = SyntheticCamera::open(&test_config()).unwrap();
        camera.poll().unwrap();
        let depth = camera.read_depth().unwrap();
        assert!(!depth.data[0].is_finite());
        assert!(depth.data[5].is_finite());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut camera = SyntheticCamera::open(&test_config()).unwrap();
        camera.close();
        camera.close();
        assert!(camera.is_closed());
        assert!(camera.poll().is_err());
    }

    #[test]
    fn test_quality_tier_quantizes_depth() {
        let mut config = test_config();
        config.quality = DepthQuality::Performance;
        let mut camera = SyntheticCamera::open(&config).unwrap();
        camera.poll().unwrap();
        let depth = camera.read_depth().unwrap();
        for &mm in depth.data.iter().filter(|mm| mm.is_finite()) {
            assert_eq!(mm % 8.0, 0.0);
        }
    }

    #[test]
    fn test_factory_rejects_unknown_source() {
        let mut config = test_config();
        config.source = "decklink".to_string();
        let err = open_source(&config).unwrap_err();
        assert!(err.to_string().contains("Unknown camera source"));
    }
}
