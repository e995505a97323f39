/// Running CRC32 over an entry's content, starting from zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Checksum(u32);

impl Checksum {
    pub fn new() -> Self {
        Self(0)
    }

    /// Fold `bytes` into the running value. Chunks must arrive in content order.
    #[must_use]
    pub fn fold(self, bytes: &[u8]) -> Self {
        let mut hasher = crc32fast::Hasher::new_with_initial(self.0);
        hasher.update(bytes);
        Self(hasher.finalize())
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_value() {
        assert_eq!(Checksum::new().fold(b"").value(), 0);
        assert_eq!(Checksum::new().fold(b"123456789").value(), 0xCBF43926);
    }

    #[test]
    fn test_chunked_matches_whole() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i * 7 % 251) as u8).collect();
        let whole = Checksum::new().fold(&data).value();
        for size in [1, 3, 64, 4096, data.len()] {
            let chunked = data
                .chunks(size)
                .fold(Checksum::new(), |acc, chunk| acc.fold(chunk));
            assert_eq!(chunked.value(), whole, "chunk size {size}");
        }
    }
}
