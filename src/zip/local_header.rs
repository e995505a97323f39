//! Locating a member from its Local File Header.
//!
//! Archives are normally walked through their central directory, which is
//! not this crate's business. When a member's header offset is already
//! known, its local header carries enough to build an [`Entry`]: sizes,
//! method, CRC32, timestamps and the name, from which the data offset
//! follows.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::structures::*;

/// General purpose flag bit 3: sizes and CRC live in a trailing data descriptor.
const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;
/// General purpose flag bit 0: the payload is encrypted.
const FLAG_ENCRYPTED: u16 = 1;
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Parsed Local File Header.
#[derive(Debug, Clone)]
pub struct LocalFileHeader {
    pub header_offset: u64,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub file_name: String,
    /// First byte after the header, name and extra field.
    pub data_offset: u64,
}

impl LocalFileHeader {
    /// Read and parse the header at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature is wrong, the source ends inside
    /// the header, or the header defers its sizes to a data descriptor.
    pub fn read<R: ReadAt + ?Sized>(reader: &R, offset: u64) -> Result<Self> {
        let mut fixed = [0u8; LFH_SIZE];
        read_exact_at(reader, offset, &mut fixed)?;

        if &fixed[0..4] != LFH_SIGNATURE {
            bail!("Invalid Local File Header at offset {offset}");
        }

        let mut cursor = Cursor::new(&fixed[4..]);
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()? as usize;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as usize;

        let mut variable = vec![0u8; file_name_length + extra_field_length];
        read_exact_at(reader, offset + LFH_SIZE as u64, &mut variable)?;
        let (name_bytes, extra) = variable.split_at(file_name_length);
        // Use lossy conversion to handle non-UTF8 filenames gracefully
        let file_name = String::from_utf8_lossy(name_bytes).to_string();

        // ZIP64: the local header's extra field holds the uncompressed size
        // then the compressed size, each only if the 32-bit field is saturated.
        let mut extra = Cursor::new(extra);
        let extra_end = extra_field_length as u64;
        while extra.position() + 4 <= extra_end {
            let header_id = extra.read_u16::<LittleEndian>()?;
            let field_size = extra.read_u16::<LittleEndian>()? as u64;
            let field_end = (extra.position() + field_size).min(extra_end);

            if header_id == ZIP64_EXTRA_ID {
                if uncompressed_size == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                    uncompressed_size = extra.read_u64::<LittleEndian>()?;
                }
                if compressed_size == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                    compressed_size = extra.read_u64::<LittleEndian>()?;
                }
            }
            extra.set_position(field_end);
        }

        if flags & FLAG_ENCRYPTED != 0 {
            bail!("{file_name}: encrypted entries are not supported");
        }
        if flags & FLAG_DATA_DESCRIPTOR != 0 && compressed_size == 0 && uncompressed_size == 0 {
            bail!("{file_name}: sizes are deferred to a data descriptor; locate it through the central directory");
        }

        let data_offset = offset + LFH_SIZE as u64 + file_name_length as u64 + extra_field_length as u64;

        Ok(Self {
            header_offset: offset,
            flags,
            compression_method: CompressionMethod::from_u16(compression_method),
            last_mod_time,
            last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name,
            data_offset,
        })
    }

    /// Whether the recorded CRC32 can be trusted.
    pub fn has_crc32(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR == 0
    }

    /// Build an [`Entry`]. Names ending in `/` are directories; everything
    /// else is a regular file, since a local header cannot mark symlinks.
    pub fn to_entry(&self) -> Entry {
        let entry = if self.file_name.ends_with('/') {
            Entry::directory(self.file_name.clone(), self.data_offset)
        } else {
            Entry::file(
                self.file_name.clone(),
                self.compression_method,
                self.compressed_size,
                self.uncompressed_size,
                self.data_offset,
            )
        };
        entry
            .with_crc32(self.crc32)
            .with_modified(self.last_mod_time, self.last_mod_date)
    }
}

fn read_exact_at<R: ReadAt + ?Sized>(reader: &R, offset: u64, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read_at(offset + filled as u64, &mut buf[filled..])?;
        if n == 0 {
            bail!("Unexpected end of archive at offset {}", offset + filled as u64);
        }
        filled += n;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    fn header(name: &str, method: u16, flags: u16, csize: u32, usize_: u32, extra: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_all(LFH_SIGNATURE).unwrap();
        buf.write_u16::<LittleEndian>(20).unwrap();
        buf.write_u16::<LittleEndian>(flags).unwrap();
        buf.write_u16::<LittleEndian>(method).unwrap();
        buf.write_u16::<LittleEndian>(0x6000).unwrap();
        buf.write_u16::<LittleEndian>(0x5821).unwrap();
        buf.write_u32::<LittleEndian>(0xDEADBEEF).unwrap();
        buf.write_u32::<LittleEndian>(csize).unwrap();
        buf.write_u32::<LittleEndian>(usize_).unwrap();
        buf.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        buf.write_u16::<LittleEndian>(extra.len() as u16).unwrap();
        buf.write_all(name.as_bytes()).unwrap();
        buf.write_all(extra).unwrap();
        buf
    }

    #[test]
    fn test_parses_plain_header() {
        let mut archive = vec![0u8; 10];
        archive.extend(header("dir/a.txt", 8, 0, 12, 40, &[]));
        archive.extend_from_slice(&[0u8; 12]);

        let lfh = LocalFileHeader::read(&archive, 10).unwrap();
        assert_eq!(lfh.file_name, "dir/a.txt");
        assert_eq!(lfh.compression_method, CompressionMethod::Deflate);
        assert_eq!(lfh.compressed_size, 12);
        assert_eq!(lfh.uncompressed_size, 40);
        assert_eq!(lfh.data_offset, 10 + 30 + 9);

        let entry = lfh.to_entry();
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.crc32, 0xDEADBEEF);
        assert_eq!(entry.data_offset, lfh.data_offset);
    }

    #[test]
    fn test_directory_name() {
        let archive = header("docs/", 0, 0, 0, 0, &[]);
        let entry = LocalFileHeader::read(&archive, 0).unwrap().to_entry();
        assert_eq!(entry.kind, EntryKind::Directory);
    }

    #[test]
    fn test_zip64_extra_field() {
        let mut extra = Vec::new();
        // An unrelated field first
        extra.write_u16::<LittleEndian>(0x5455).unwrap();
        extra.write_u16::<LittleEndian>(5).unwrap();
        extra.write_all(&[1, 2, 3, 4, 5]).unwrap();
        extra.write_u16::<LittleEndian>(ZIP64_EXTRA_ID).unwrap();
        extra.write_u16::<LittleEndian>(16).unwrap();
        extra.write_u64::<LittleEndian>(5_000_000_000).unwrap();
        extra.write_u64::<LittleEndian>(4_500_000_000).unwrap();

        let archive = header("big.bin", 8, 0, 0xFFFFFFFF, 0xFFFFFFFF, &extra);
        let lfh = LocalFileHeader::read(&archive, 0).unwrap();
        assert_eq!(lfh.uncompressed_size, 5_000_000_000);
        assert_eq!(lfh.compressed_size, 4_500_000_000);
        assert_eq!(lfh.data_offset, 30 + 7 + extra.len() as u64);
    }

    #[test]
    fn test_rejects_bad_signature_and_data_descriptor() {
        let mut archive = header("a", 0, 0, 1, 1, &[]);
        archive[0] = b'X';
        assert!(LocalFileHeader::read(&archive, 0).is_err());

        let archive = header("a", 8, FLAG_DATA_DESCRIPTOR, 0, 0, &[]);
        assert!(LocalFileHeader::read(&archive, 0).is_err());
    }

    #[test]
    fn test_truncated_header() {
        let archive = header("name.txt", 0, 0, 1, 1, &[]);
        assert!(LocalFileHeader::read(&archive[..20].to_vec(), 0).is_err());
        assert!(LocalFileHeader::read(&archive[..33].to_vec(), 0).is_err());
    }
}
