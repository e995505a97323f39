use time::{Date, Month, PrimitiveDateTime, Time};

use crate::error::{ExtractError, Result};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// What an entry materializes as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

/// One located archive member.
///
/// Entries are produced by whatever walks the archive's directory and are
/// read-only input to extraction. `data_offset` is the absolute offset of
/// the member's payload, past its local header.
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: String,
    pub kind: EntryKind,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub data_offset: u64,
    pub external_attributes: u32,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
}

impl Entry {
    /// A regular file whose payload is `compressed_size` bytes at `data_offset`.
    pub fn file(
        path: impl Into<String>,
        compression_method: CompressionMethod,
        compressed_size: u64,
        uncompressed_size: u64,
        data_offset: u64,
    ) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            compression_method,
            compressed_size,
            uncompressed_size,
            crc32: 0,
            data_offset,
            external_attributes: 0,
            last_mod_time: 0,
            last_mod_date: 0,
        }
    }

    pub fn directory(path: impl Into<String>, data_offset: u64) -> Self {
        Self {
            kind: EntryKind::Directory,
            ..Self::file(path, CompressionMethod::Stored, 0, 0, data_offset)
        }
    }

    /// A symbolic link whose target is stored verbatim as `target_len` bytes.
    pub fn symlink(path: impl Into<String>, target_len: u64, data_offset: u64) -> Self {
        Self {
            kind: EntryKind::Symlink,
            ..Self::file(
                path,
                CompressionMethod::Stored,
                target_len,
                target_len,
                data_offset,
            )
        }
    }

    pub fn with_crc32(mut self, crc32: u32) -> Self {
        self.crc32 = crc32;
        self
    }

    pub fn with_external_attributes(mut self, attributes: u32) -> Self {
        self.external_attributes = attributes;
        self
    }

    pub fn with_modified(mut self, time: u16, date: u16) -> Self {
        self.last_mod_time = time;
        self.last_mod_date = date;
        self
    }

    /// Effective compression method. Only regular files are ever compressed.
    pub fn compression_method(&self) -> CompressionMethod {
        match self.kind {
            EntryKind::File => self.compression_method,
            EntryKind::Directory | EntryKind::Symlink => CompressionMethod::Stored,
        }
    }

    /// Compare a computed checksum with the one recorded in the archive.
    pub fn verify_crc32(&self, actual: u32) -> Result<()> {
        if actual == self.crc32 {
            Ok(())
        } else {
            Err(ExtractError::ChecksumMismatch {
                entry: self.path.clone(),
                expected: self.crc32,
                actual,
            })
        }
    }

    /// Unix mode bits carried in the upper half of the external attributes.
    pub fn unix_mode(&self) -> Option<u32> {
        let mode = self.external_attributes >> 16;
        (mode != 0).then_some(mode & 0o7777)
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }

    /// Modification timestamp, or `None` when the DOS fields are unset or
    /// out of range.
    pub fn modified(&self) -> Option<PrimitiveDateTime> {
        if self.last_mod_date == 0 {
            return None;
        }
        let (year, month, day) = self.mod_date();
        let (hour, minute, second) = self.mod_time();
        let date =
            Date::from_calendar_date(year as i32, Month::try_from(month).ok()?, day).ok()?;
        let time = Time::from_hms(hour, minute, second).ok()?;
        Some(PrimitiveDateTime::new(date, time))
    }
}

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_files_are_never_compressed() {
        let mut dir = Entry::directory("docs/", 0);
        dir.compression_method = CompressionMethod::Deflate;
        assert_eq!(dir.compression_method(), CompressionMethod::Stored);

        let mut link = Entry::symlink("current", 6, 0);
        link.compression_method = CompressionMethod::Deflate;
        assert_eq!(link.compression_method(), CompressionMethod::Stored);

        let file = Entry::file("a.txt", CompressionMethod::Deflate, 3, 5, 0);
        assert_eq!(file.compression_method(), CompressionMethod::Deflate);
    }

    #[test]
    fn test_modified_decodes_dos_fields() {
        // 2024-03-15 13:45:30
        let date = ((2024 - 1980) << 9) | (3 << 5) | 15;
        let time = (13 << 11) | (45 << 5) | 15;
        let entry = Entry::directory("d/", 0).with_modified(time, date);
        let modified = entry.modified().unwrap();
        assert_eq!(modified.year(), 2024);
        assert_eq!(modified.month(), Month::March);
        assert_eq!(modified.day(), 15);
        assert_eq!(modified.hour(), 13);
        assert_eq!(modified.minute(), 45);
        assert_eq!(modified.second(), 30);
    }

    #[test]
    fn test_modified_rejects_invalid_fields() {
        assert!(Entry::directory("d/", 0).modified().is_none());
        // month 0
        let entry = Entry::directory("d/", 0).with_modified(0, (44 << 9) | 1);
        assert!(entry.modified().is_none());
    }

    #[test]
    fn test_unix_mode_from_external_attributes() {
        let entry = Entry::file("run.sh", CompressionMethod::Stored, 0, 0, 0)
            .with_external_attributes(0o100755 << 16);
        assert_eq!(entry.unix_mode(), Some(0o755));
        assert_eq!(Entry::directory("d/", 0).unix_mode(), None);
    }
}
