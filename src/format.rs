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

// On-disk frame log format (binary, little-endian, append-only)
//
// Layout:
// - Session header, written once before any record:
//   magic "DCLG" | version u32 | width u32 | height u32
// - Frame records, repeated:
//   body length u32 | frame index u32 | depth payload | color payload
//
// The body length counts every byte after the length field itself, so a
// reader can detect and discard a trailing incomplete record. Depth is
// width*height u16 millimeter samples in row-major order; color is
// width*height*3 u8 samples, row-major and channel-interleaved. A file
// containing the header plus any prefix of complete records is valid.

use thiserror::Error;

/// Magic bytes identifying a depth/color frame log.
pub const LOG_MAGIC: [u8; 4] = *b"DCLG";

/// Current format version.
pub const LOG_VERSION: u32 = 1;

/// Encoded size of the session header in bytes.
pub const LOG_HEADER_LEN: usize = 16;

/// Errors raised while encoding or decoding log contents.
///
/// `DimensionMismatch` is the invariant violation the recorder must never
/// swallow: it means a frame's buffers disagree with the dimensions the
/// session header declared.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("log header truncated ({actual} bytes, need {LOG_HEADER_LEN})")]
    TruncatedHeader { actual: usize },

    #[error("bad magic bytes, not a frame log")]
    BadMagic,

    #[error("unsupported format version {0} (supported: {LOG_VERSION})")]
    UnsupportedVersion(u32),

    #[error(
        "frame {index} does not match session dimensions {width}x{height}: \
         {depth_samples} depth samples, {color_bytes} color bytes"
    )]
    DimensionMismatch {
        index: u32,
        width: u32,
        height: u32,
        depth_samples: usize,
        color_bytes: usize,
    },

    #[error("record body is {actual} bytes, expected {expected} for {width}x{height} frames")]
    BadRecordLength {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },
}

/// Session-level header: fixed frame dimensions shared by every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogHeader {
    pub width: u32,
    pub height: u32,
}

impl LogHeader {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Byte length of one depth payload (u16 per pixel).
    pub fn depth_payload_len(&self) -> usize {
        self.pixel_count() * 2
    }

    /// Byte length of one color payload (3 bytes per pixel).
    pub fn color_payload_len(&self) -> usize {
        self.pixel_count() * 3
    }

    /// Byte length of one record body (frame index plus both payloads).
    pub fn record_body_len(&self) -> usize {
        4 + self.depth_payload_len() + self.color_payload_len()
    }

    pub fn encode(&self) -> [u8; LOG_HEADER_LEN] {
        let mut buf = [0u8; LOG_HEADER_LEN];
        buf[0..4].copy_from_slice(&LOG_MAGIC);
        buf[4..8].copy_from_slice(&LOG_VERSION.to_le_bytes());
        buf[8..12].copy_from_slice(&self.width.to_le_bytes());
        buf[12..16].copy_from_slice(&self.height.to_le_bytes());
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < LOG_HEADER_LEN {
            return Err(FormatError::TruncatedHeader {
                actual: bytes.len(),
            });
        }
        if bytes[0..4] != LOG_MAGIC {
            return Err(FormatError::BadMagic);
        }
        let version = read_u32_le(&bytes[4..8]);
        if version != LOG_VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }
        Ok(Self {
            width: read_u32_le(&bytes[8..12]),
            height: read_u32_le(&bytes[12..16]),
        })
    }

    /// Check a frame's buffers against the session dimensions.
    pub fn validate_frame(&self, frame: &Frame) -> Result<(), FormatError> {
        let dims_match = frame.width == self.width && frame.height == self.height;
        if !dims_match
            || frame.depth.len() != self.pixel_count()
            || frame.color.len() != self.color_payload_len()
        {
            return Err(FormatError::DimensionMismatch {
                index: frame.index,
                width: self.width,
                height: self.height,
                depth_samples: frame.depth.len(),
                color_bytes: frame.color.len(),
            });
        }
        Ok(())
    }
}

/// One capture instant, already converted to the canonical encodings:
/// depth as u16 millimeters, color as 3-channel interleaved u8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub depth: Vec<u16>,
    pub color: Vec<u8>,
}

impl Frame {
    /// Serialize the full record, length prefix included, into one buffer.
    ///
    /// Building the record in memory before any I/O is what lets the writer
    /// commit it with a single write: a record is either fully appended or
    /// not appended at all.
    pub fn encode_record(&self) -> Vec<u8> {
        let body_len = 4 + self.depth.len() * 2 + self.color.len();
        let mut buf = Vec::with_capacity(4 + body_len);
        buf.extend_from_slice(&(body_len as u32).to_le_bytes());
        buf.extend_from_slice(&self.index.to_le_bytes());
        for sample in &self.depth {
            buf.extend_from_slice(&sample.to_le_bytes());
        }
        buf.extend_from_slice(&self.color);
        buf
    }

    /// Decode one record body (the bytes after the length prefix).
    pub fn decode_record_body(header: &LogHeader, body: &[u8]) -> Result<Self, FormatError> {
        let expected = header.record_body_len();
        if body.len() != expected {
            return Err(FormatError::BadRecordLength {
                actual: body.len(),
                expected,
                width: header.width,
                height: header.height,
            });
        }

        let index = read_u32_le(&body[0..4]);
        let depth_end = 4 + header.depth_payload_len();
        let mut depth = Vec::with_capacity(header.pixel_count());
        for chunk in body[4..depth_end].chunks_exact(2) {
            depth.push(u16::from_le_bytes([chunk[0], chunk[1]]));
        }
        let color = body[depth_end..].to_vec();

        Ok(Self {
            index,
            width: header.width,
            height: header.height,
            depth,
            color,
        })
    }
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frame(index: u32, width: u32, height: u32) -> Frame {
        let pixels = (width * height) as usize;
        Frame {
            index,
            width,
            height,
            depth: (0..pixels).map(|i| (i % 4000) as u16).collect(),
            color: (0..pixels * 3).map(|i| (i % 251) as u8).collect(),
        }
    }

    #[test]
    fn test_header_roundtrip() {
        let header = LogHeader::new(1280, 720);
        let encoded = header.encode();
        assert_eq!(encoded.len(), LOG_HEADER_LEN);
        assert_eq!(LogHeader::decode(&encoded).unwrap(), header);
    }

    #[test]
    fn test_header_rejects_bad_magic() {
        let mut encoded = LogHeader::new(64, 48).encode();
        encoded[0] = b'X';
        assert!(matches!(
            LogHeader::decode(&encoded),
            Err(FormatError::BadMagic)
        ));
    }

    #[test]
    fn test_header_rejects_unknown_version() {
        let mut encoded = LogHeader::new(64, 48).encode();
        encoded[4..8].copy_from_slice(&99u32.to_le_bytes());
        assert!(matches!(
            LogHeader::decode(&encoded),
            Err(FormatError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn test_header_rejects_short_input() {
        let encoded = LogHeader::new(64, 48).encode();
        let err = LogHeader::decode(&encoded[..10]).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_record_roundtrip() {
        let header = LogHeader::new(8, 6);
        let frame = test_frame(7, 8, 6);
        let record = frame.encode_record();

        // Length prefix counts the body only.
        let body_len = read_u32_le(&record[0..4]) as usize;
        assert_eq!(body_len, header.record_body_len());
        assert_eq!(record.len(), 4 + body_len);

        let decoded = Frame::decode_record_body(&header, &record[4..]).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_record_payload_sizes_match_dimensions() {
        let header = LogHeader::new(1280, 720);
        let frame = test_frame(1, 1280, 720);
        let record = frame.encode_record();

        assert_eq!(header.depth_payload_len(), 1280 * 720 * 2);
        assert_eq!(header.color_payload_len(), 1280 * 720 * 3);
        assert_eq!(record.len(), 4 + 4 + 1280 * 720 * 2 + 1280 * 720 * 3);
    }

    #[test]
    fn test_decode_rejects_wrong_body_length() {
        let header = LogHeader::new(8, 6);
        let frame = test_frame(1, 8, 6);
        let record = frame.encode_record();

        let err = Frame::decode_record_body(&header, &record[4..record.len() - 1]).unwrap_err();
        assert!(err.to_string().contains("expected"));
    }

    #[test]
    fn test_validate_frame_accepts_matching_dimensions() {
        let header = LogHeader::new(8, 6);
        assert!(header.validate_frame(&test_frame(1, 8, 6)).is_ok());
    }

    #[test]
    fn test_validate_frame_rejects_changed_dimensions() {
        let header = LogHeader::new(8, 6);
        let err = header.validate_frame(&test_frame(3, 4, 6)).unwrap_err();
        assert!(matches!(
            err,
            FormatError::DimensionMismatch { index: 3, .. }
        ));
    }

    #[test]
    fn test_validate_frame_rejects_short_payloads() {
        let header = LogHeader::new(8, 6);
        let mut frame = test_frame(2, 8, 6);
        frame.depth.pop();
        assert!(header.validate_frame(&frame).is_err());
    }
}
