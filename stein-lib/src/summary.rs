use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::decode::DecodedBatch;
use crate::event::{DecodedEvent, EventKind};

/// Tracks stats on a decode run.
///
/// # Example
/// ```
/// use stein::event::decode_raw;
/// use stein::Summary;
///
/// let mut summary = Summary::default();
/// summary.add(&decode_raw([0xc0, 0x05, 0x00, 0x0a], 0));
///
/// assert_eq!(summary.events, 1);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Packets successfully decoded
    pub packets: usize,
    /// Packets skipped due to framing or hex token errors
    pub skipped_packets: usize,
    /// Events decoded
    pub events: usize,
    /// Events skipped due to an invalid code or ADD bit
    pub skipped_events: usize,
    /// Decoded event counts by kind
    pub kinds: BTreeMap<EventKind, usize>,
    /// Decoded event counts by event code
    pub codes: BTreeMap<u8, usize>,
}

impl Summary {
    pub fn add(&mut self, event: &DecodedEvent) {
        self.events += 1;
        *self.kinds.entry(event.kind).or_default() += 1;
        *self.codes.entry(event.code).or_default() += 1;
    }

    pub fn add_batch(&mut self, batch: &DecodedBatch) {
        self.packets += 1;
        self.skipped_events += batch.skipped;
        for event in &batch.events {
            self.add(event);
        }
    }

    pub fn add_skipped_packet(&mut self) {
        self.skipped_packets += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{decode_packed, decode_raw};

    #[test]
    fn summary() {
        let mut summary = Summary::default();
        summary.add(&decode_packed(0x0_0001, 0).unwrap());
        summary.add(&decode_packed(0x0_0002, 1).unwrap());
        summary.add(&decode_packed(0xe_0000, 2).unwrap());
        summary.add(&decode_raw([0xc0, 0, 0, 0], 3));
        summary.add_skipped_packet();

        assert_eq!(summary.events, 4);
        assert_eq!(summary.packets, 0);
        assert_eq!(summary.skipped_packets, 1);
        assert_eq!(summary.kinds[&EventKind::Data], 2);
        assert_eq!(summary.kinds[&EventKind::Status], 1);
        assert_eq!(summary.kinds[&EventKind::Raw], 1);
        assert_eq!(summary.codes[&0], 2);
        assert_eq!(summary.codes[&3], 2);
    }

    #[test]
    fn add_batch() {
        let batch = DecodedBatch {
            packet: 0,
            events: vec![decode_packed(0x4_0000, 0).unwrap()],
            skipped: 2,
            next_index: 3,
        };
        let mut summary = Summary::default();
        summary.add_batch(&batch);

        assert_eq!(summary.packets, 1);
        assert_eq!(summary.events, 1);
        assert_eq!(summary.skipped_events, 2);
        assert_eq!(summary.kinds[&EventKind::TriggerRate], 1);
    }
}
