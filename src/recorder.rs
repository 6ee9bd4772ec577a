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

// Session recorder: the single capture loop
//
// Pulls aligned frame pairs from a `FrameSource`, converts them to the
// canonical record encodings, and appends them to the frame log. One
// session spans source-open to source-close and owns exactly one log
// file. The loop is single-threaded and strictly
// poll-read-convert-append, so append order equals acquisition order
// equals frame index order. Duration and frame-cap limits are evaluated
// after each append (and on idle polls, so a stalled camera still honors
// the budget); the camera and the log are closed on every exit path.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::camera::{FrameSource, FrameStatus};
use crate::control::StopSignal;
use crate::convert;
use crate::format::{Frame, LogHeader};
use crate::log_writer::FrameLogWriter;
use crate::preview::PreviewSink;

/// Lifecycle of one capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Opening,
    Capturing,
    Closing,
    Closed,
    Failed,
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Elapsed-time budget reached.
    Duration,
    /// Frame-count cap reached.
    FrameCap,
    /// External stop signal (operator interrupt).
    Signalled,
    /// Device fault mid-session; the partial log is preserved.
    DeviceError,
}

/// Capture session parameters.
///
/// `log_path: None` runs the loop without a file sink (preview-only
/// capability set); `duration: None` and `max_frames: None` mean run
/// until externally stopped.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub log_path: Option<PathBuf>,
    pub duration: Option<Duration>,
    pub max_frames: Option<u64>,
    pub write_metadata: bool,
}

/// Final operator-facing report for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub width: u32,
    pub height: u32,
    pub frames: u32,
    pub bytes_written: u64,
    pub stop_reason: StopReason,
    pub started_at: String,
    pub ended_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<String>,
}

impl SessionSummary {
    /// Sidecar file path for a given log path: `<log>.meta.json`.
    pub fn sidecar_path(log_path: &Path) -> PathBuf {
        let mut name = log_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".meta.json");
        log_path.with_file_name(name)
    }

    pub fn write_sidecar(&self, log_path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize session summary")?;
        std::fs::write(Self::sidecar_path(log_path), json)
            .context("Failed to write metadata sidecar")?;
        Ok(())
    }
}

/// Orchestrates one capture session over a frame source.
pub struct SessionRecorder {
    options: SessionOptions,
    state: SessionState,
    session_id: Uuid,
    preview: Option<Box<dyn PreviewSink>>,
}

impl SessionRecorder {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            state: SessionState::Idle,
            session_id: Uuid::new_v4(),
            preview: None,
        }
    }

    /// Attach a per-frame preview sink.
    pub fn with_preview(mut self, sink: Box<dyn PreviewSink>) -> Self {
        self.preview = Some(sink);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Run the session to completion over an already-opened source.
    ///
    /// The source is closed before this returns, on every path. Device
    /// faults mid-session end the session normally with
    /// `StopReason::DeviceError`; only log-creation failures, append
    /// failures, and invariant violations return an error (with the log
    /// still valid up to the last committed record).
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        stop: &StopSignal,
    ) -> Result<SessionSummary> {
        let (width, height) = source.dimensions();
        let header = LogHeader::new(width, height);
        let started_at = Utc::now();

        self.state = SessionState::Opening;
        debug!(
            session_id = %self.session_id,
            width,
            height,
            "opening session"
        );

        // Header goes out before any frame, so the log is valid with zero
        // records. A creation failure must not leave an open device with
        // no sink.
        let mut writer = match &self.options.log_path {
            Some(path) => match FrameLogWriter::create(path, header) {
                Ok(writer) => Some(writer),
                Err(err) => {
                    source.close();
                    self.state = SessionState::Failed;
                    return Err(err).context("Failed to create frame log");
                }
            },
            None => None,
        };

        self.state = SessionState::Capturing;
        let mut frames: u32 = 0;
        let mut first_frame_at: Option<Instant> = None;

        let outcome: Result<StopReason> = loop {
            if stop.is_triggered() {
                break Ok(StopReason::Signalled);
            }

            match source.poll() {
                Ok(FrameStatus::NotReady) => {
                    // No index consumed. The budget still runs while the
                    // camera stalls.
                    if self.duration_exceeded(first_frame_at) {
                        break Ok(StopReason::Duration);
                    }
                }
                Ok(FrameStatus::Available) => {
                    let depth = match source.read_depth() {
                        Ok(depth) => depth,
                        Err(err) => {
                            warn!(error = %err, "depth read failed, stopping session");
                            break Ok(StopReason::DeviceError);
                        }
                    };
                    let color = match source.read_color() {
                        Ok(color) => color,
                        Err(err) => {
                            warn!(error = %err, "color read failed, stopping session");
                            break Ok(StopReason::DeviceError);
                        }
                    };

                    let frame = Frame {
                        index: frames + 1,
                        width: depth.width,
                        height: depth.height,
                        depth: convert::narrow_depth(&depth.data),
                        color: convert::pack_color(&color),
                    };

                    if let Some(sink) = self.preview.as_deref_mut() {
                        sink.show(&frame);
                    }

                    if let Some(writer) = writer.as_mut() {
                        if let Err(err) = writer.append(&frame) {
                            // Dimension mismatches and append faults abort
                            // the session; the log stays valid up to the
                            // last committed record.
                            break Err(anyhow::Error::new(err)
                                .context("Failed to append frame record"));
                        }
                    }

                    frames += 1;
                    if first_frame_at.is_none() {
                        first_frame_at = Some(Instant::now());
                    }
                    info!(frame = frames, "captured frame");

                    // Append-then-check: a frame landing exactly on the
                    // budget boundary is kept.
                    if self.duration_exceeded(first_frame_at) {
                        break Ok(StopReason::Duration);
                    }
                    if let Some(cap) = self.options.max_frames {
                        if u64::from(frames) >= cap {
                            break Ok(StopReason::FrameCap);
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "camera fault, stopping session");
                    break Ok(StopReason::DeviceError);
                }
            }
        };

        self.state = SessionState::Closing;
        debug!(session_id = %self.session_id, "closing session");

        let mut bytes_written = 0u64;
        let mut finish_err = None;
        if let Some(writer) = writer.take() {
            match writer.finish() {
                Ok(stats) => bytes_written = stats.bytes,
                Err(err) => finish_err = Some(err),
            }
        }
        source.close();
        let ended_at = Utc::now();

        let reason = match outcome {
            Ok(reason) => reason,
            Err(err) => {
                self.state = SessionState::Failed;
                error!(session_id = %self.session_id, frames, "session aborted");
                return Err(err);
            }
        };
        if let Some(err) = finish_err {
            self.state = SessionState::Failed;
            return Err(err).context("Failed to close frame log");
        }
        self.state = SessionState::Closed;

        let summary = SessionSummary {
            session_id: self.session_id.to_string(),
            width,
            height,
            frames,
            bytes_written,
            stop_reason: reason,
            started_at: started_at.to_rfc3339(),
            ended_at: ended_at.to_rfc3339(),
            log_path: self
                .options
                .log_path
                .as_ref()
                .map(|p| p.display().to_string()),
        };

        info!(
            session_id = %summary.session_id,
            frames = summary.frames,
            bytes = summary.bytes_written,
            stop_reason = ?summary.stop_reason,
            "session finished"
        );

        if self.options.write_metadata {
            if let Some(path) = &self.options.log_path {
                if let Err(err) = summary.write_sidecar(path) {
                    warn!(error = %err, "failed to write metadata sidecar");
                }
            }
        }

        Ok(summary)
    }

    fn duration_exceeded(&self, first_frame_at: Option<Instant>) -> bool {
        match (self.options.duration, first_frame_at) {
            (Some(budget), Some(first)) => first.elapsed() >= budget,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle() {
        let recorder = SessionRecorder::new(SessionOptions::default());
        assert_eq!(recorder.state(), SessionState::Idle);
    }

    #[test]
    fn test_sidecar_path_appends_suffix() {
        let path = SessionSummary::sidecar_path(Path::new("/data/run1.dclg"));
        assert_eq!(path, Path::new("/data/run1.dclg.meta.json"));
    }

    #[test]
    fn test_summary_serializes_stop_reason_snake_case() {
        let summary = SessionSummary {
            session_id: "s".to_string(),
            width: 4,
            height: 3,
            frames: 0,
            bytes_written: 16,
            stop_reason: StopReason::DeviceError,
            started_at: String::new(),
            ended_at: String::new(),
            log_path: None,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"device_error\""));
    }
}
