//! Deflate decompression driven as a pull/push pump.
//!
//! The pump pulls compressed input through a provider, feeds it to a
//! `flate2` inflate engine and pushes whatever plaintext the engine emits
//! to a consumer. Both buffers are `chunk_size` long, so memory stays
//! bounded whatever the entry size.

use flate2::{Decompress, FlushDecompress, Status};

use crate::error::{ExtractError, Result};

/// Declared sizes of a deflated entry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Sizes {
    pub compressed: u64,
    pub uncompressed: u64,
}

/// Inflate one entry.
///
/// `provide` must fill the whole buffer it is handed; the pump never asks
/// for more than the compressed bytes left. `consume` receives each
/// decompressed chunk in order.
///
/// Fails with [`ExtractError::Corrupt`] when the engine rejects the data,
/// when input runs out before the end-of-stream marker, or when consumed
/// input or produced output differ from the declared sizes.
pub(crate) fn pump<P, C>(
    entry: &str,
    sizes: Sizes,
    chunk_size: usize,
    mut provide: P,
    mut consume: C,
) -> Result<()>
where
    P: FnMut(&mut [u8]) -> Result<()>,
    C: FnMut(&[u8]) -> Result<()>,
{
    let corrupt = |reason: String| ExtractError::Corrupt {
        entry: entry.to_string(),
        reason,
    };

    let mut engine = Decompress::new(false);
    let mut input = vec![0u8; chunk_size];
    let mut output = vec![0u8; chunk_size];
    // input[start..end] is fed but not yet consumed by the engine.
    let mut start = 0;
    let mut end = 0;
    let mut unread = sizes.compressed;

    loop {
        if start == end && unread > 0 {
            let want = input.len().min(usize::try_from(unread).unwrap_or(usize::MAX));
            provide(&mut input[..want])?;
            start = 0;
            end = want;
            unread -= want as u64;
        }

        let in_before = engine.total_in();
        let out_before = engine.total_out();
        let status = engine
            .decompress(&input[start..end], &mut output, FlushDecompress::None)
            .map_err(|e| corrupt(e.to_string()))?;
        let consumed = (engine.total_in() - in_before) as usize;
        let produced = (engine.total_out() - out_before) as usize;
        start += consumed;

        if engine.total_out() > sizes.uncompressed {
            return Err(corrupt(format!(
                "inflated past the declared {} bytes",
                sizes.uncompressed
            )));
        }
        if produced > 0 {
            consume(&output[..produced])?;
        }

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError if consumed == 0 && produced == 0 => {
                // Fresh input would be fetched on the next turn; anything
                // else means the engine cannot move.
                if start == end && unread > 0 {
                    continue;
                }
                return Err(corrupt(format!(
                    "stream ended without end marker after {} of {} compressed bytes",
                    engine.total_in(),
                    sizes.compressed
                )));
            }
            Status::Ok | Status::BufError => {}
        }
    }

    if engine.total_in() != sizes.compressed {
        return Err(corrupt(format!(
            "end marker after {} of {} compressed bytes",
            engine.total_in(),
            sizes.compressed
        )));
    }
    if engine.total_out() != sizes.uncompressed {
        return Err(corrupt(format!(
            "inflated {} bytes, expected {}",
            engine.total_out(),
            sizes.uncompressed
        )));
    }
    Ok(())
}
