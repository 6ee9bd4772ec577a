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

// Depth camera capture recorder
//
// Records synchronized depth and color frames from a pollable frame
// source into a single append-only binary log per session:
// - One synchronous capture loop: poll, read, convert, append
// - Truncation-safe record framing; any prefix of complete records replays
// - Session limits by wall-clock duration, frame cap, or external signal
// - Forward-only replay reader that tolerates an interrupted tail

pub mod camera;
pub mod config;
pub mod control;
pub mod convert;
pub mod format;
pub mod log_reader;
pub mod log_writer;
pub mod preview;
pub mod recorder;

// Re-export main types
pub use camera::{
    open_source, CameraError, ColorImage, DepthMap, DepthQuality, DepthUnit, FrameSource,
    FrameStatus, PixelFormat, SyntheticCamera,
};
pub use config::{load_config, load_config_with_env, CameraConfig, RecorderConfig};
pub use control::StopSignal;
pub use format::{Frame, FormatError, LogHeader};
pub use log_reader::{FrameLogReader, ReadError};
pub use log_writer::{FrameLogWriter, LogStats, WriteError};
pub use preview::{DepthStatsPreview, PreviewSink};
pub use recorder::{SessionOptions, SessionRecorder, SessionState, SessionSummary, StopReason};
