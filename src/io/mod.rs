//! Random-access sources for archive bytes.
//!
//! [`ReadAt`] is the single point of contact with archive storage. The
//! extraction pipeline never touches a source directly; it goes through an
//! [`ArchiveHandle`], which serializes access so only one entry is read at a
//! time.

mod handle;
mod http;
mod local;
mod memory;

pub use handle::{ArchiveCursor, ArchiveHandle};
pub use http::HttpRangeReader;
pub use local::LocalFileReader;

use std::io;
use std::sync::Arc;

/// Trait for random access reading from a data source
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer.
    ///
    /// May return fewer bytes than requested; `Ok(0)` means end of data.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;
}

impl<R: ReadAt + ?Sized> ReadAt for Arc<R> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }

    fn size(&self) -> u64 {
        (**self).size()
    }
}

impl<R: ReadAt + ?Sized> ReadAt for &R {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }

    fn size(&self) -> u64 {
        (**self).size()
    }
}
