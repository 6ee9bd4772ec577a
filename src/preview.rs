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

// Optional per-frame preview capability
//
// The capture loop is parameterized by an optional sink rather than
// duplicated into with-preview and without-preview variants. GUI
// rendering is out of scope; the built-in sink reports depth statistics
// through the logging layer instead.

use tracing::debug;

use crate::format::Frame;

/// Per-frame hook invoked after conversion, before the record is appended.
pub trait PreviewSink {
    fn show(&mut self, frame: &Frame);
}

/// Summary of one frame's depth content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStats {
    pub min_mm: u16,
    pub max_mm: u16,
    /// Fraction of pixels carrying a valid (non-zero) depth sample.
    pub coverage: f32,
}

impl DepthStats {
    pub fn compute(frame: &Frame) -> Self {
        let mut min_mm = u16::MAX;
        let mut max_mm = 0u16;
        let mut valid = 0usize;
        for &mm in &frame.depth {
            if mm > 0 {
                valid += 1;
                min_mm = min_mm.min(mm);
                max_mm = max_mm.max(mm);
            }
        }
        if valid == 0 {
            min_mm = 0;
        }
        Self {
            min_mm,
            max_mm,
            coverage: valid as f32 / frame.depth.len().max(1) as f32,
        }
    }
}

/// Default preview sink: per-frame depth range and coverage at debug level.
#[derive(Debug, Default)]
pub struct DepthStatsPreview;

impl PreviewSink for DepthStatsPreview {
    fn show(&mut self, frame: &Frame) {
        let stats = DepthStats::compute(frame);
        debug!(
            frame = frame.index,
            min_mm = stats.min_mm,
            max_mm = stats.max_mm,
            coverage_pct = stats.coverage * 100.0,
            "depth preview"
        );
    }
}
