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

// Stateless pixel-format conversion between adapter buffers and the
// canonical record encodings. Invoked once per frame, no state retained
// between calls.

use crate::camera::{ColorImage, PixelFormat};

/// Narrow one floating-point millimeter sample to the stored u16 encoding.
///
/// Truncates toward zero and clamps to [0, 65535]. Negative and non-finite
/// inputs (measurement-failure sentinels such as NaN or -inf) store as 0,
/// which downstream readers interpret as "no valid depth".
pub fn narrow_depth_sample(mm: f32) -> u16 {
    if !mm.is_finite() || mm < 0.0 {
        return 0;
    }
    if mm >= u16::MAX as f32 {
        return u16::MAX;
    }
    mm as u16
}

/// Narrow a full depth grid from f32 millimeters to u16 millimeters.
pub fn narrow_depth(samples: &[f32]) -> Vec<u16> {
    samples.iter().copied().map(narrow_depth_sample).collect()
}

/// Pack a color buffer into the canonical 3-channel interleaved encoding.
///
/// Four-channel input drops the alpha channel; the remaining channels keep
/// the source's interleaved order. Three-channel input passes through.
pub fn pack_color(image: &ColorImage) -> Vec<u8> {
    match image.format {
        PixelFormat::Bgr8 => image.data.clone(),
        PixelFormat::Bgra8 => image
            .data
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
    }
}
