//! # zipstream
//!
//! Streaming extraction of ZIP archive entries with bounded memory.
//!
//! Given an [`Entry`] located by a central-directory walk and a random-access
//! source for the archive, this crate rebuilds the entry's content: a
//! directory, a regular file, or a symbolic link. Content is read and
//! delivered in chunks of a configurable size, folded into a CRC32 and
//! reported to an optional progress counter on the way.
//!
//! ## Features
//!
//! - STORED (raw copy) and DEFLATE (streaming inflate) entries
//! - Sinks for files, directories, symbolic links and any `io::Write`
//! - Archives on the local filesystem, in memory, or behind HTTP Range requests
//! - Size and end-of-stream checks on compressed data
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use zipstream::{CompressionMethod, Entry, LocalFileReader, ProgressCounter, ZipExtractor};
//!
//! fn main() -> anyhow::Result<()> {
//!     let reader = LocalFileReader::new(Path::new("archive.zip"))?;
//!     let extractor = ZipExtractor::new(reader);
//!
//!     // Normally produced by a central directory walk.
//!     let entry = Entry::file("notes.txt", CompressionMethod::Deflate, 812, 2048, 58)
//!         .with_crc32(0x1c291ca3);
//!
//!     let mut progress = ProgressCounter::new();
//!     let crc = extractor.extract_to_path(&entry, Path::new("out/notes.txt"), Some(&mut progress))?;
//!     entry.verify_crc32(crc)?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod progress;
pub mod zip;

pub use cli::Cli;
pub use error::{ExtractError, Result};
pub use io::{ArchiveHandle, HttpRangeReader, LocalFileReader, ReadAt};
pub use progress::{Progress, ProgressCounter};
pub use zip::{
    CompressionMethod, Entry, EntryKind, ExtractOptions, LocalFileHeader, Sink, ZipExtractor,
};
