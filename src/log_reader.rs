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

// Forward-only replay reader for frame logs
//
// Reads the session header, then yields complete records in disk order
// without ever seeking backward. A trailing incomplete record (writer
// interrupted mid-session by a crash or power loss) is detected via the
// per-record length prefix, flagged, and discarded; everything before it
// replays normally.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::format::{Frame, FormatError, LogHeader, LOG_HEADER_LEN};

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read log file: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),
}

#[derive(Debug)]
pub struct FrameLogReader {
    reader: BufReader<File>,
    header: LogHeader,
    next_index: u64,
    truncated: bool,
    done: bool,
}

impl FrameLogReader {
    /// Open a log and parse its session header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReadError> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);

        let mut header_bytes = [0u8; LOG_HEADER_LEN];
        let got = read_up_to(&mut reader, &mut header_bytes)?;
        if got < LOG_HEADER_LEN {
            return Err(FormatError::TruncatedHeader { actual: got }.into());
        }
        let header = LogHeader::decode(&header_bytes)?;

        Ok(Self {
            reader,
            header,
            next_index: 0,
            truncated: false,
            done: false,
        })
    }

    pub fn header(&self) -> &LogHeader {
        &self.header
    }

    /// True once a trailing incomplete record was detected and discarded.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Read the next complete record, or `None` at end of log.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, ReadError> {
        if self.done {
            return Ok(None);
        }

        let mut len_bytes = [0u8; 4];
        let got = read_up_to(&mut self.reader, &mut len_bytes)?;
        if got == 0 {
            // Clean end on a record boundary.
            self.done = true;
            return Ok(None);
        }
        if got < 4 {
            self.mark_truncated();
            return Ok(None);
        }

        let body_len = u32::from_le_bytes(len_bytes) as usize;
        if body_len != self.header.record_body_len() {
            return Err(FormatError::BadRecordLength {
                actual: body_len,
                expected: self.header.record_body_len(),
                width: self.header.width,
                height: self.header.height,
            }
            .into());
        }

        let mut body = vec![0u8; body_len];
        let got = read_up_to(&mut self.reader, &mut body)?;
        if got < body_len {
            self.mark_truncated();
            return Ok(None);
        }

        self.next_index += 1;
        Ok(Some(Frame::decode_record_body(&self.header, &body)?))
    }

    /// Read every remaining complete record.
    pub fn read_all(&mut self) -> Result<Vec<Frame>, ReadError> {
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    fn mark_truncated(&mut self) {
        debug!(
            records = self.next_index,
            "discarding trailing incomplete record"
        );
        self.truncated = true;
        self.done = true;
    }
}

/// Fill `buf` as far as the stream allows, returning the byte count read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
