use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::io::{ArchiveCursor, ArchiveHandle, ReadAt};
use crate::progress::Progress;

use super::attributes;
use super::delivery::{Delivery, Measure};
use super::inflate::{self, Sizes};
use super::local_header::LocalFileHeader;
use super::raw;
use super::sink::{DirectorySink, FileSink, NullSink, Sink, SymlinkSink, WriterSink};
use super::structures::{CompressionMethod, Entry, EntryKind};

/// Default upper bound for a single read or decompressed chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Tunables for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Largest chunk read from the archive or handed to a sink at once.
    pub chunk_size: usize,
    /// Skip CRC32 computation; extraction then reports a checksum of 0.
    pub skip_crc32: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            skip_crc32: false,
        }
    }
}

/// ZIP entry extractor
///
/// Owns the archive source behind an [`ArchiveHandle`], so concurrent calls
/// on one extractor take turns; each call reads one entry start to finish.
pub struct ZipExtractor<R: ReadAt> {
    handle: ArchiveHandle<R>,
    options: ExtractOptions,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            handle: ArchiveHandle::new(reader),
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn handle(&self) -> &ArchiveHandle<R> {
        &self.handle
    }

    /// Parse the local file header at `offset`.
    pub fn local_header(&self, offset: u64) -> anyhow::Result<LocalFileHeader> {
        LocalFileHeader::read(self.handle.reader(), offset)
    }

    /// Stream an entry's content into `sink` and return its CRC32.
    ///
    /// Directories produce exactly one empty chunk, symbolic links exactly
    /// one chunk holding the target, regular files as many chunks of at
    /// most `chunk_size` bytes as their content needs. The checksum is not
    /// compared with [`Entry::crc32`]; see [`ZipExtractor::verify`].
    ///
    /// # Errors
    ///
    /// Any failure aborts the extraction. Errors returned by the sink are
    /// passed through untouched. After a failure neither the progress
    /// counter nor partially delivered content is meaningful.
    pub fn extract<S: Sink + ?Sized>(
        &self,
        entry: &Entry,
        progress: Option<&mut dyn Progress>,
        sink: &mut S,
    ) -> Result<u32> {
        self.run(entry, progress, sink, !self.options.skip_crc32)
    }

    /// Materialize an entry at `destination` and apply its recorded
    /// attributes.
    ///
    /// Regular files and symbolic links fail with
    /// [`ExtractError::DestinationExists`] before anything is read if the
    /// path is taken. An incomplete file is removed when extraction fails.
    pub fn extract_to_path(
        &self,
        entry: &Entry,
        destination: &Path,
        progress: Option<&mut dyn Progress>,
    ) -> Result<u32> {
        self.check(entry)?;

        let checksum = match entry.kind {
            EntryKind::File => {
                let mut sink = FileSink::prepare(destination)?;
                match self.extract(entry, progress, &mut sink) {
                    Ok(checksum) => {
                        sink.finish()?;
                        checksum
                    }
                    Err(e) => {
                        sink.discard();
                        return Err(e);
                    }
                }
            }
            EntryKind::Directory => {
                let mut sink = DirectorySink::new(destination);
                self.extract(entry, progress, &mut sink)?
            }
            EntryKind::Symlink => {
                let mut sink = SymlinkSink::prepare(destination, &entry.path)?;
                let checksum = self.extract(entry, progress, &mut sink)?;
                sink.finish()?;
                checksum
            }
        };

        attributes::apply(entry, destination).map_err(|source| ExtractError::Sink {
            path: destination.to_path_buf(),
            source,
        })?;
        Ok(checksum)
    }

    /// Stream an entry's content into `writer`, e.g. stdout.
    pub fn extract_to_writer<W: Write>(
        &self,
        entry: &Entry,
        writer: W,
        progress: Option<&mut dyn Progress>,
    ) -> Result<u32> {
        let mut sink = WriterSink::new(writer, &entry.path);
        let checksum = self.extract(entry, progress, &mut sink)?;
        sink.into_inner()
            .flush()
            .map_err(|source| ExtractError::Sink {
                path: entry.path.clone().into(),
                source,
            })?;
        Ok(checksum)
    }

    /// Extract an entry into memory. Only sensible for small entries.
    pub fn extract_to_memory(&self, entry: &Entry) -> Result<(Vec<u8>, u32)> {
        let mut data = Vec::new();
        let checksum = self.extract(entry, None, &mut |chunk: &[u8]| -> Result<()> {
            data.extend_from_slice(chunk);
            Ok(())
        })?;
        Ok((data, checksum))
    }

    /// Decode an entry without writing it anywhere and compare its CRC32
    /// with the recorded one. Ignores [`ExtractOptions::skip_crc32`].
    pub fn verify(&self, entry: &Entry) -> Result<()> {
        let checksum = self.run(entry, None, &mut NullSink, true)?;
        entry.verify_crc32(checksum)
    }

    fn check(&self, entry: &Entry) -> Result<()> {
        if self.options.chunk_size == 0 {
            return Err(ExtractError::InvalidChunkSize);
        }
        if let CompressionMethod::Unknown(method) = entry.compression_method() {
            return Err(ExtractError::UnsupportedCompression {
                entry: entry.path.clone(),
                method,
            });
        }
        Ok(())
    }

    fn run<S: Sink + ?Sized>(
        &self,
        entry: &Entry,
        progress: Option<&mut dyn Progress>,
        sink: &mut S,
        compute_crc32: bool,
    ) -> Result<u32> {
        self.check(entry)?;
        let chunk_size = self.options.chunk_size;

        let mut cursor = self.handle.lock();
        cursor.seek(entry.data_offset);
        debug!(
            entry = %entry.path,
            kind = ?entry.kind,
            method = ?entry.compression_method(),
            offset = entry.data_offset,
            "extracting entry"
        );

        let (checksum, delivered) = match (entry.kind, entry.compression_method()) {
            (EntryKind::Directory, _) => {
                let mut delivery = Delivery::new(sink, progress, Measure::Unit, compute_crc32);
                delivery.deliver(&[])?;
                delivery.complete_unit();
                (delivery.checksum(), delivery.delivered())
            }
            (EntryKind::Symlink, _) => {
                // Link targets are short; read them in one go and never inflate.
                let len = usize::try_from(entry.compressed_size).map_err(|_| {
                    ExtractError::Corrupt {
                        entry: entry.path.clone(),
                        reason: format!("symbolic link target of {} bytes", entry.compressed_size),
                    }
                })?;
                let mut delivery = Delivery::new(sink, progress, Measure::Unit, compute_crc32);
                let mut target = vec![0u8; len];
                read_entry(&mut cursor, entry, &mut target)?;
                delivery.deliver(&target)?;
                delivery.complete_unit();
                (delivery.checksum(), delivery.delivered())
            }
            (EntryKind::File, CompressionMethod::Stored) => {
                let mut delivery = Delivery::new(
                    sink,
                    progress,
                    Measure::Bytes(entry.uncompressed_size),
                    compute_crc32,
                );
                raw::copy(
                    entry.uncompressed_size,
                    chunk_size,
                    |buf| read_entry(&mut cursor, entry, buf),
                    &mut delivery,
                )?;
                (delivery.checksum(), delivery.delivered())
            }
            (EntryKind::File, CompressionMethod::Deflate) => {
                let mut delivery = Delivery::new(
                    sink,
                    progress,
                    Measure::Bytes(entry.uncompressed_size),
                    compute_crc32,
                );
                let sizes = Sizes {
                    compressed: entry.compressed_size,
                    uncompressed: entry.uncompressed_size,
                };
                inflate::pump(
                    &entry.path,
                    sizes,
                    chunk_size,
                    |buf| read_entry(&mut cursor, entry, buf),
                    |chunk| delivery.deliver(chunk),
                )?;
                (delivery.checksum(), delivery.delivered())
            }
            (EntryKind::File, CompressionMethod::Unknown(method)) => {
                return Err(ExtractError::UnsupportedCompression {
                    entry: entry.path.clone(),
                    method,
                });
            }
        };

        debug!(
            entry = %entry.path,
            bytes = delivered,
            crc32 = format_args!("{checksum:08x}"),
            "extracted entry"
        );
        Ok(checksum)
    }
}

fn read_entry<R: ReadAt>(
    cursor: &mut ArchiveCursor<'_, R>,
    entry: &Entry,
    buf: &mut [u8],
) -> Result<()> {
    let offset = cursor.position();
    let wanted = buf.len();
    cursor.read_exact(buf).map_err(|source| match source.kind() {
        io::ErrorKind::UnexpectedEof => ExtractError::Truncated {
            entry: entry.path.clone(),
            offset,
            wanted,
        },
        _ => ExtractError::Read {
            entry: entry.path.clone(),
            source,
        },
    })
}
