//! Errors raised while extracting a single archive entry.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of one entry's extraction.
///
/// Every variant is fatal to the entry being extracted. Nothing in the
/// pipeline retries; the caller decides whether to skip the entry or abort.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("destination `{}` already exists", .path.display())]
    DestinationExists { path: PathBuf },

    #[error("{entry}: unsupported compression method {method}")]
    UnsupportedCompression { entry: String, method: u16 },

    #[error("{entry}: symbolic link target is not valid UTF-8")]
    InvalidSymlinkTarget {
        entry: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("{entry}: archive truncated, needed {wanted} bytes at offset {offset}")]
    Truncated {
        entry: String,
        offset: u64,
        wanted: usize,
    },

    #[error("{entry}: failed to read archive data")]
    Read {
        entry: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{entry}: corrupt compressed stream: {reason}")]
    Corrupt { entry: String, reason: String },

    #[error("cannot write `{}`", .path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{entry}: CRC32 mismatch (expected {expected:08x}, got {actual:08x})")]
    ChecksumMismatch {
        entry: String,
        expected: u32,
        actual: u32,
    },

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

pub type Result<T> = std::result::Result<T, ExtractError>;
