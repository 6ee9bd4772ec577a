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

// Append-only frame log writer
//
// Creates (or truncates) the log file and writes the session header
// immediately, so the file is valid with zero frames. Each record is
// assembled into one contiguous buffer and committed with a single write;
// a failed append truncates the file back to the last committed record
// boundary. The file therefore always ends on a record boundary and any
// prefix of it replays.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::format::{Frame, FormatError, LogHeader, LOG_HEADER_LEN};

/// Errors raised by the frame log writer.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create log file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to append record for frame {index}: {source}")]
    Append {
        index: u32,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("failed to finish log file: {0}")]
    Finish(#[source] io::Error),
}

/// Final writer statistics reported on close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogStats {
    pub frames: u32,
    pub bytes: u64,
}

/// Exclusive owner of one open log file for the lifetime of a session.
#[derive(Debug)]
pub struct FrameLogWriter {
    file: File,
    header: LogHeader,
    frames: u32,
    committed_bytes: u64,
}

impl FrameLogWriter {
    /// Create or truncate the log at `path` and write the session header.
    pub fn create<P: AsRef<Path>>(path: P, header: LogHeader) -> Result<Self, WriteError> {
        let path = path.as_ref();
        let mut file = File::create(path).map_err(|source| WriteError::Create {
            path: path.to_path_buf(),
            source,
        })?;

        file.write_all(&header.encode())
            .map_err(|source| WriteError::Create {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(
            path = %path.display(),
            width = header.width,
            height = header.height,
            "created frame log"
        );

        Ok(Self {
            file,
            header,
            frames: 0,
            committed_bytes: LOG_HEADER_LEN as u64,
        })
    }

    pub fn header(&self) -> &LogHeader {
        &self.header
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn bytes_written(&self) -> u64 {
        self.committed_bytes
    }

    /// Append one frame record.
    ///
    /// The frame is validated against the session header first; a
    /// dimension mismatch is an invariant violation and nothing is
    /// written. On an I/O failure the file is truncated back to the last
    /// committed record boundary, so a record is either fully appended or
    /// not appended at all.
    pub fn append(&mut self, frame: &Frame) -> Result<(), WriteError> {
        self.header.validate_frame(frame)?;

        let record = frame.encode_record();
        if let Err(source) = self.file.write_all(&record) {
            // Discard whatever part of the record reached the file.
            let _ = self.file.set_len(self.committed_bytes);
            return Err(WriteError::Append {
                index: frame.index,
                source,
            });
        }

        self.frames += 1;
        self.committed_bytes += record.len() as u64;
        debug!(
            frame = frame.index,
            bytes = record.len(),
            total_bytes = self.committed_bytes,
            "appended frame record"
        );
        Ok(())
    }

    /// Flush to stable storage and close the file, returning final stats.
    pub fn finish(self) -> Result<LogStats, WriteError> {
        self.file.sync_all().map_err(WriteError::Finish)?;
        Ok(LogStats {
            frames: self.frames,
            bytes: self.committed_bytes,
        })
    }
}
