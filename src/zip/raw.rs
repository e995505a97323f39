use super::delivery::Delivery;
use super::sink::Sink;
use crate::error::Result;

/// Copy `size` bytes verbatim, at most `chunk_size` at a time.
///
/// `read` fills the buffer it is given from the archive, in order.
pub(crate) fn copy<S, P>(
    size: u64,
    chunk_size: usize,
    mut read: P,
    delivery: &mut Delivery<'_, '_, S>,
) -> Result<()>
where
    S: Sink + ?Sized,
    P: FnMut(&mut [u8]) -> Result<()>,
{
    let mut buf = vec![0u8; chunk_size.min(usize::try_from(size).unwrap_or(usize::MAX))];
    let mut remaining = size;
    while remaining > 0 {
        let len = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        read(&mut buf[..len])?;
        delivery.deliver(&buf[..len])?;
        remaining -= len as u64;
    }
    Ok(())
}
