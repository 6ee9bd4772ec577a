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

// External stop signal for the capture loop
//
// The recorder checks the signal at the top of every iteration, so an
// operator interrupt routes through the same Closing path as a normal
// duration stop and the log is left on a record boundary.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Cloneable stop flag shared between the capture loop and signal handlers.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Safe to call from any thread, any number of times.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Route Ctrl+C through this signal.
    pub fn install_ctrlc_handler(&self) -> Result<()> {
        let flag = self.flag.clone();
        ctrlc::set_handler(move || {
            info!("Received Ctrl+C, stopping session");
            flag.store(true, Ordering::SeqCst);
        })
        .context("Failed to install Ctrl+C handler")
    }
}
