//! Error types for container parsing, stream extraction and output writing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading and validating a `.sgb` container.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Failed to read container file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Container truncated: {actual} bytes, need at least {expected}")]
    Truncated { expected: u64, actual: u64 },

    #[error("Invalid container magic: read {found:02X?}, expected [53, 47, 42, 00]")]
    BadMagic { found: [u8; 4] },

    #[error(
        "Stream {index}: payload at offset {offset} with length {length} runs past the container end ({container_size} bytes)"
    )]
    DescriptorOutOfBounds {
        index: usize,
        offset: u64,
        length: u64,
        container_size: u64,
    },

    #[error("Stream {index}: offset {offset} precedes the previous stream offset {previous}")]
    DescriptorOrder {
        index: usize,
        offset: u64,
        previous: u64,
    },

    #[error(
        "Stream {index}: offset {offset} lies inside the stream directory (ends at {directory_end})"
    )]
    DescriptorInHeader {
        index: usize,
        offset: u64,
        directory_end: u64,
    },
}

/// Errors raised while validating an AC-3 sync frame header.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Payload too short for an AC-3 sync frame: {len} bytes, need at least 6")]
    ShortPayload { len: usize },

    #[error("Invalid AC-3 sync word: read {found:#06X}, expected 0x0B77")]
    BadSyncWord { found: u16 },

    #[error("Reserved AC-3 sample rate code (fscod 3)")]
    ReservedSampleRate,

    #[error("AC-3 frame size code {code} out of range, maximum is 37")]
    BadFrameSizeCode { code: u8 },

    #[error("AC-3 bitstream id {bsid} out of range, maximum is 16")]
    BadBsid { bsid: u8 },
}

/// Errors raised while extracting a single stream payload.
///
/// Extraction failures are scoped to one stream so a damaged payload
/// never blocks its siblings.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Stream {index}: {source}")]
    InvalidPayload {
        index: usize,
        #[source]
        source: SyncError,
    },

    #[error(
        "Stream {index}: payload range {start}..{end} runs past the container end ({container_size} bytes)"
    )]
    PayloadOutOfBounds {
        index: usize,
        start: u64,
        end: u64,
        container_size: u64,
    },

    #[error("Stream {index}: empty payload")]
    EmptyPayload { index: usize },
}

impl ExtractError {
    /// Index of the stream this error belongs to.
    pub fn index(&self) -> usize {
        match self {
            Self::InvalidPayload { index, .. }
            | Self::PayloadOutOfBounds { index, .. }
            | Self::EmptyPayload { index } => *index,
        }
    }
}

/// Errors raised while writing extracted streams to disk.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to create output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stage a temporary file in {}: {source}", .path.display())]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to finalize {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
