use tracing::trace;

use super::checksum::Checksum;
use super::sink::Sink;
use crate::error::Result;
use crate::progress::{Progress, ProgressGuard};

/// What the progress counter measures for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Measure {
    /// Content bytes; every delivered chunk advances by its length.
    Bytes(u64),
    /// The entry as a single unit, completed by [`Delivery::complete_unit`].
    Unit,
}

/// Hands content chunks to a sink.
///
/// Each chunk is folded into the checksum and counted toward progress
/// before the sink sees it, so the sink never observes bytes that are not
/// yet accounted for. Every extraction path delivers through this type.
pub(crate) struct Delivery<'s, 'p, S: Sink + ?Sized> {
    sink: &'s mut S,
    checksum: Option<Checksum>,
    progress: ProgressGuard<'p>,
    measure: Measure,
    delivered: u64,
}

impl<'s, 'p, S: Sink + ?Sized> Delivery<'s, 'p, S> {
    pub(crate) fn new(
        sink: &'s mut S,
        progress: Option<&'p mut dyn Progress>,
        measure: Measure,
        compute_crc32: bool,
    ) -> Self {
        let total = match measure {
            Measure::Bytes(total) => total,
            Measure::Unit => 1,
        };
        Self {
            sink,
            checksum: compute_crc32.then(Checksum::new),
            progress: ProgressGuard::start(progress, total),
            measure,
            delivered: 0,
        }
    }

    pub(crate) fn deliver(&mut self, chunk: &[u8]) -> Result<()> {
        if let Some(checksum) = self.checksum.as_mut() {
            *checksum = checksum.fold(chunk);
        }
        if let Measure::Bytes(_) = self.measure {
            self.progress.advance(chunk.len() as u64);
        }
        self.delivered += chunk.len() as u64;
        trace!(len = chunk.len(), delivered = self.delivered, "chunk");
        self.sink.accept(chunk)
    }

    pub(crate) fn complete_unit(&mut self) {
        if self.measure == Measure::Unit {
            self.progress.advance(1);
        }
    }

    pub(crate) fn delivered(&self) -> u64 {
        self.delivered
    }

    pub(crate) fn checksum(&self) -> u32 {
        self.checksum.map_or(0, Checksum::value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressCounter;

    #[test]
    fn test_accounts_before_sink_sees_chunk() {
        let mut counter = ProgressCounter::new();
        let mut seen = Vec::new();
        let mut sink = |chunk: &[u8]| -> Result<()> {
            seen.extend_from_slice(chunk);
            Ok(())
        };
        {
            let mut delivery =
                Delivery::new(&mut sink, Some(&mut counter), Measure::Bytes(9), true);
            delivery.deliver(b"1234").unwrap();
            delivery.deliver(b"56789").unwrap();
            assert_eq!(delivery.delivered(), 9);
            assert_eq!(delivery.checksum(), 0xCBF43926);
        }
        assert_eq!(seen, b"123456789");
        assert_eq!(counter, ProgressCounter { total: 9, completed: 9 });
    }

    #[test]
    fn test_unit_measure_ignores_byte_counts() {
        let mut counter = ProgressCounter::new();
        let mut sink = |_: &[u8]| -> Result<()> { Ok(()) };
        let mut delivery = Delivery::new(&mut sink, Some(&mut counter), Measure::Unit, false);
        delivery.deliver(b"../shared/target.txt").unwrap();
        delivery.complete_unit();
        assert_eq!(delivery.checksum(), 0);
        drop(delivery);
        assert_eq!(counter, ProgressCounter { total: 1, completed: 1 });
    }
}
