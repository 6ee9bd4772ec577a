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

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use depth_recorder::camera::open_source;
use depth_recorder::config::{load_config_with_env, RecorderConfig};
use depth_recorder::control::StopSignal;
use depth_recorder::preview::DepthStatsPreview;
use depth_recorder::recorder::{SessionOptions, SessionRecorder};

/// Depth Recorder - capture depth and color frames to a binary log
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output log file path (created or truncated)
    #[arg(short = 'f', long)]
    output: PathBuf,

    /// Recording duration in whole seconds (0 = run until stopped)
    #[arg(short, long, default_value_t = 0)]
    duration: u64,

    /// Maximum number of frames to capture (0 = unbounded)
    #[arg(short = 'n', long, default_value_t = 0)]
    max_frames: u64,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration from file, or fall back to defaults
    let recorder_config = match &args.config {
        Some(path) => load_config_with_env(path)?,
        None => RecorderConfig::default(),
    };

    // Initialize tracing with configured level
    let log_level = match recorder_config.logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Depth Recorder");
    if let Some(path) = &args.config {
        info!("Loaded configuration from: {:?}", path);
    }
    info!("Camera source: {}", recorder_config.camera.source);
    info!(
        "Resolution: {}x{} @ {} fps",
        recorder_config.camera.width, recorder_config.camera.height, recorder_config.camera.fps
    );

    // Open the camera before touching the output path; an open failure
    // must leave no log file behind.
    let mut source =
        open_source(&recorder_config.camera).context("Failed to open camera source")?;

    let stop = StopSignal::new();
    stop.install_ctrlc_handler()?;

    let options = SessionOptions {
        log_path: recorder_config
            .recorder
            .write_log
            .then(|| args.output.clone()),
        duration: (args.duration > 0).then(|| Duration::from_secs(args.duration)),
        max_frames: (args.max_frames > 0).then_some(args.max_frames),
        write_metadata: recorder_config.recorder.metadata,
    };

    let mut recorder = SessionRecorder::new(options);
    if recorder_config.recorder.preview {
        recorder = recorder.with_preview(Box::new(DepthStatsPreview));
    }

    let summary = recorder.run(source.as_mut(), &stop)?;

    info!(
        "Recorded {} frames ({} bytes) to {:?}",
        summary.frames, summary.bytes_written, args.output
    );
    info!("Depth Recorder shut down successfully");

    Ok(())
}
