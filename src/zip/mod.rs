//! Streaming extraction of ZIP entries.
//!
//! This module turns a located archive entry into its original content:
//! a directory, a regular file's bytes, or a symbolic link's target.
//!
//! ## Architecture
//!
//! - [`structures`]: the [`Entry`] model and compression methods
//! - `raw` and `inflate`: the two content paths, for stored and deflated data
//! - `delivery`: checksum folding and progress accounting shared by both paths
//! - [`sink`]: destination-side consumers of content chunks
//! - [`extractor`]: picks a path per entry and drives it
//! - [`attributes`]: permission bits and timestamps applied afterwards
//! - [`local_header`]: builds an [`Entry`] from a Local File Header
//!
//! ## Pipeline
//!
//! Content flows strictly in order. Each chunk is folded into the CRC32,
//! counted toward progress, and only then handed to the sink. No entry is
//! ever buffered whole, except for symbolic link targets.
//!
//! ## Limitations
//!
//! - Only STORED and DEFLATE entries
//! - No encryption support
//! - The central directory is expected to be walked elsewhere

pub mod attributes;
mod checksum;
mod delivery;
pub mod extractor;
mod inflate;
pub mod local_header;
mod raw;
pub mod sink;
pub mod structures;

pub use checksum::Checksum;
pub use extractor::{DEFAULT_CHUNK_SIZE, ExtractOptions, ZipExtractor};
pub use local_header::LocalFileHeader;
pub use sink::{DirectorySink, FileSink, NullSink, Sink, SymlinkSink, WriterSink};
pub use structures::*;
