//! Destination side of the extraction pipeline.
//!
//! A [`Sink`] receives an entry's content one chunk at a time, in order, and
//! performs whatever side effect materializes it. The pipeline knows nothing
//! about destinations; returning an error from [`Sink::accept`] aborts the
//! extraction and the error reaches the caller unchanged.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{ExtractError, Result};

/// Consumer of content chunks.
pub trait Sink {
    fn accept(&mut self, chunk: &[u8]) -> Result<()>;
}

impl<F> Sink for F
where
    F: FnMut(&[u8]) -> Result<()>,
{
    fn accept(&mut self, chunk: &[u8]) -> Result<()> {
        self(chunk)
    }
}

/// Writes chunks to any [`io::Write`], e.g. stdout.
pub struct WriterSink<W: Write> {
    writer: W,
    path: PathBuf,
}

impl<W: Write> WriterSink<W> {
    /// `label` names the destination in error messages.
    pub fn new(writer: W, label: impl Into<PathBuf>) -> Self {
        Self {
            writer,
            path: label.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn accept(&mut self, chunk: &[u8]) -> Result<()> {
        self.writer
            .write_all(chunk)
            .map_err(|source| sink_error(&self.path, source))
    }
}

/// Appends every chunk to a freshly created file.
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
}

impl FileSink {
    /// Check the destination and open it for writing.
    ///
    /// Fails with [`ExtractError::DestinationExists`] if anything, even a
    /// dangling symlink, already occupies `path`. Missing parent
    /// directories are created.
    pub fn prepare(path: &Path) -> Result<Self> {
        ensure_vacant(path)?;
        create_parents(path)?;
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|source| match source.kind() {
                io::ErrorKind::AlreadyExists => ExtractError::DestinationExists {
                    path: path.to_path_buf(),
                },
                _ => sink_error(path, source),
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    /// Flush and close the file.
    pub fn finish(mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all().map_err(|source| sink_error(&self.path, source))?;
        }
        Ok(())
    }

    /// Close and delete an incomplete file.
    pub fn discard(mut self) {
        drop(self.file.take());
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "cannot remove incomplete file");
        }
    }
}

impl Sink for FileSink {
    fn accept(&mut self, chunk: &[u8]) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Err(sink_error(
                &self.path,
                io::Error::other("file already closed"),
            ));
        };
        file.write_all(chunk)
            .map_err(|source| sink_error(&self.path, source))
    }
}

/// Creates a directory when it receives the (empty) directory chunk.
///
/// An existing directory at the path is accepted.
pub struct DirectorySink {
    path: PathBuf,
}

impl DirectorySink {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Sink for DirectorySink {
    fn accept(&mut self, _chunk: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.path).map_err(|source| sink_error(&self.path, source))
    }
}

/// Collects a link target and creates the symbolic link on [`finish`].
///
/// [`finish`]: SymlinkSink::finish
pub struct SymlinkSink {
    path: PathBuf,
    entry: String,
    target: Vec<u8>,
}

impl SymlinkSink {
    pub fn prepare(path: &Path, entry: &str) -> Result<Self> {
        ensure_vacant(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            entry: entry.to_string(),
            target: Vec::new(),
        })
    }

    pub fn finish(self) -> Result<()> {
        let target = std::str::from_utf8(&self.target).map_err(|source| {
            ExtractError::InvalidSymlinkTarget {
                entry: self.entry.clone(),
                source,
            }
        })?;
        create_parents(&self.path)?;
        symlink(target, &self.path).map_err(|source| match source.kind() {
            io::ErrorKind::AlreadyExists => ExtractError::DestinationExists {
                path: self.path.clone(),
            },
            _ => sink_error(&self.path, source),
        })
    }
}

impl Sink for SymlinkSink {
    fn accept(&mut self, chunk: &[u8]) -> Result<()> {
        self.target.extend_from_slice(chunk);
        Ok(())
    }
}

/// Discards everything; used when only the checksum matters.
pub struct NullSink;

impl Sink for NullSink {
    fn accept(&mut self, _chunk: &[u8]) -> Result<()> {
        Ok(())
    }
}

#[cfg(unix)]
fn symlink(target: &str, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &str, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn symlink(_target: &str, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}

fn ensure_vacant(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(_) => Err(ExtractError::DestinationExists {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(sink_error(path, source)),
    }
}

fn create_parents(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| sink_error(parent, source))?;
        }
    }
    Ok(())
}

fn sink_error(path: &Path, source: io::Error) -> ExtractError {
    ExtractError::Sink {
        path: path.to_path_buf(),
        source,
    }
}
