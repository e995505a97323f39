use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::ReadAt;

/// An open archive shared between extraction requests.
///
/// Extracting an entry seeks a cursor to the entry's data and reads
/// forward from there, so two extractions must never interleave on the
/// same cursor. [`ArchiveHandle::lock`] hands out that cursor under a
/// mutex; the lock is held until the returned [`ArchiveCursor`] is dropped.
pub struct ArchiveHandle<R: ReadAt> {
    reader: R,
    position: Mutex<u64>,
}

impl<R: ReadAt> ArchiveHandle<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            position: Mutex::new(0),
        }
    }

    /// Acquire exclusive use of the cursor, blocking while another
    /// extraction holds it.
    pub fn lock(&self) -> ArchiveCursor<'_, R> {
        // The position is re-seeked by every extraction, so a poisoned
        // lock carries no state worth rejecting.
        let position = self
            .position
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        ArchiveCursor {
            reader: &self.reader,
            position,
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn size(&self) -> u64 {
        self.reader.size()
    }
}

/// Exclusive, sequential view of an archive.
pub struct ArchiveCursor<'a, R: ReadAt> {
    reader: &'a R,
    position: MutexGuard<'a, u64>,
}

impl<R: ReadAt> ArchiveCursor<'_, R> {
    pub fn seek(&mut self, offset: u64) {
        *self.position = offset;
    }

    pub fn position(&self) -> u64 {
        *self.position
    }

    /// Fill `buf` completely from the current position and advance past it.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] when the source ends
    /// first; the cursor is then left where the short read stopped.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read_at(*self.position, &mut buf[filled..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!(
                            "archive ended after {filled} of {} bytes",
                            buf.len()
                        ),
                    ));
                }
                Ok(n) => {
                    filled += n;
                    *self.position += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    /// Hands out at most two bytes per call.
    struct Trickle(Vec<u8>);

    impl ReadAt for Trickle {
        fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
            let len = buf.len().min(2);
            self.0.read_at(offset, &mut buf[..len])
        }

        fn size(&self) -> u64 {
            self.0.len() as u64
        }
    }

    #[test]
    fn test_read_exact_assembles_short_reads() {
        let handle = ArchiveHandle::new(Trickle(b"0123456789".to_vec()));
        let mut cursor = handle.lock();
        cursor.seek(3);
        let mut buf = [0u8; 5];
        cursor.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"34567");
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_read_exact_reports_truncation() {
        let handle = ArchiveHandle::new(b"abc".to_vec());
        let mut cursor = handle.lock();
        let mut buf = [0u8; 4];
        let err = cursor.read_exact(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_lock_serializes_cursors() {
        let handle = Arc::new(ArchiveHandle::new(vec![0u8; 16]));
        let cursor = handle.lock();

        let other = Arc::clone(&handle);
        let waiter = thread::spawn(move || {
            let mut cursor = other.lock();
            cursor.seek(4);
            cursor.position()
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished());
        drop(cursor);
        assert_eq!(waiter.join().unwrap(), 4);
    }
}
