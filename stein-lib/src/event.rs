//! STEIN event decoding.
//!
//! There are two event encodings, each with its own decoder:
//!
//! * [decode_packed] handles the 20-bit words packed into flight software subframes. The field
//!   layout depends on the event code, and for code 3 on the ADD bit, so fields are present or
//!   absent per event.
//! * [decode_raw] handles the 4-byte records written by the instrument directly (or converted
//!   from SUB-20 logs). Every field is always reported regardless of the event code.
//!
//! The two are intentionally kept separate; they produce differently shaped events for the same
//! event code.
use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::unpack::WORD_BITS;
use crate::{Error, Result};

/// Data event
pub const CODE_DATA: u8 = 0;
/// Sweep checksum, number of triggers per second
pub const CODE_TRIGGER_RATE: u8 = 1;
/// Sweep checksum, number of events per second
pub const CODE_EVENT_RATE: u8 = 2;
/// Noise or status event, selected by the ADD bit
pub const CODE_EXTENDED: u8 = 3;

/// Length of a raw binary event record.
pub const RECORD_LEN: usize = 4;
/// A raw binary event record.
pub type Record = [u8; RECORD_LEN];

/// Offset applied to raw record data to recover the unsigned value from the signed quantity the
/// instrument writes. Wraps at 2^16.
pub const RAW_DATA_OFFSET: u16 = 32768;

/// Classification of a decoded event.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Data,
    TriggerRate,
    EventRate,
    /// Code 3 with ADD=0
    Noise,
    /// Code 3 with ADD=1
    Status,
    /// Produced by [decode_raw], which does not discriminate event types.
    Raw,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Data => "data",
            Self::TriggerRate => "trigger_rate",
            Self::EventRate => "event_rate",
            Self::Noise => "noise",
            Self::Status => "status",
            Self::Raw => "raw",
        };
        f.write_str(s)
    }
}

/// A single decoded STEIN event.
///
/// Fields not defined for an event's code are `None`, which is distinct from a zero value.
/// `data` is always present, though its width depends on the code.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedEvent {
    /// Position of this event in the decoded stream
    pub index: u64,
    pub kind: EventKind,
    /// Event code, 0 to 3
    pub code: u8,
    pub add: Option<u8>,
    pub det_id: Option<u8>,
    pub timestamp: Option<u8>,
    pub data: u16,
}

/// Formats as an event list line; absent fields are written as `-1`.
impl Display for DecodedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sentinel = |v: Option<u8>| v.map_or(-1, i16::from);
        write!(
            f,
            "{} {} {} {} {} {}",
            self.index,
            self.code,
            sentinel(self.add),
            sentinel(self.det_id),
            sentinel(self.timestamp),
            self.data
        )
    }
}

/// Extract a field `width` bits wide starting `offset` bits below the MSB of a 20-bit word.
#[allow(clippy::cast_possible_truncation)]
const fn field(word: u32, offset: u32, width: u32) -> u16 {
    ((word >> (WORD_BITS - offset - width)) & ((1 << width) - 1)) as u16
}

#[allow(clippy::cast_possible_truncation)]
const fn field_u8(word: u32, offset: u32, width: u32) -> u8 {
    field(word, offset, width) as u8
}

/// Decode a packed 20-bit event word.
///
/// | code | add | det_id | timestamp | data |
/// |---|---|---|---|---|
/// | 0 | - | 5 bits | 6 bits | 7 bits |
/// | 1, 2 | - | - | 6 bits | 12 bits |
/// | 3, add=0 | 1 bit | 1 bit | - | 16 bits |
/// | 3, add=1 | 1 bit | - | 8 bits | 9 bits |
///
/// `index` is assigned to the event as-is; numbering is the caller's responsibility.
///
/// # Errors
/// [Error::InvalidCode] if `word` is wider than 20 bits so the code is not 0 to 3, or
/// [Error::InvalidAdd] if the ADD bit is not 0 or 1. Neither can happen for a word produced by
/// [unpack](crate::unpack::unpack).
///
/// # Example
/// ```
/// use stein::event::{decode_packed, EventKind};
///
/// let event = decode_packed(0b00_00001_000001_0000111, 0).unwrap();
/// assert_eq!(event.kind, EventKind::Data);
/// assert_eq!(event.det_id, Some(1));
/// assert_eq!(event.add, None);
/// ```
pub fn decode_packed(word: u32, index: u64) -> Result<DecodedEvent> {
    let code = word >> (WORD_BITS - 2);
    let event = match code {
        0 => DecodedEvent {
            index,
            kind: EventKind::Data,
            code: CODE_DATA,
            add: None,
            det_id: Some(field_u8(word, 2, 5)),
            timestamp: Some(field_u8(word, 7, 6)),
            data: field(word, 13, 7),
        },
        1 | 2 => DecodedEvent {
            index,
            kind: if code == 1 {
                EventKind::TriggerRate
            } else {
                EventKind::EventRate
            },
            code: if code == 1 {
                CODE_TRIGGER_RATE
            } else {
                CODE_EVENT_RATE
            },
            add: None,
            det_id: None,
            timestamp: Some(field_u8(word, 2, 6)),
            data: field(word, 8, 12),
        },
        3 => {
            let add = u32::from(field(word, 2, 1));
            match add {
                0 => DecodedEvent {
                    index,
                    kind: EventKind::Noise,
                    code: CODE_EXTENDED,
                    add: Some(0),
                    det_id: Some(field_u8(word, 3, 1)),
                    timestamp: None,
                    data: field(word, 4, 16),
                },
                1 => DecodedEvent {
                    index,
                    kind: EventKind::Status,
                    code: CODE_EXTENDED,
                    add: Some(1),
                    det_id: None,
                    timestamp: Some(field_u8(word, 3, 8)),
                    data: field(word, 11, 9),
                },
                _ => return Err(Error::InvalidAdd { word, add }),
            }
        }
        _ => return Err(Error::InvalidCode { word, code }),
    };
    Ok(event)
}

/// Decode a raw binary event record.
///
/// ```text
/// byte 0: code(7:6) add(5) det_id(4:0)
/// byte 1: timestamp
/// byte 2-3: data, big-endian
/// ```
///
/// Every field is reported for every code. Data is offset by [RAW_DATA_OFFSET] modulo 2^16.
#[must_use]
pub fn decode_raw(record: Record, index: u64) -> DecodedEvent {
    let [r0, r1, r2, r3] = record;
    DecodedEvent {
        index,
        kind: EventKind::Raw,
        code: (r0 >> 6) & 0x3,
        add: Some((r0 >> 5) & 0x1),
        det_id: Some(r0 & 0x1f),
        timestamp: Some(r1),
        data: u16::from_be_bytes([r2, r3]).wrapping_add(RAW_DATA_OFFSET),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unpack::WORD_MASK;
    use test_case::test_case;

    #[test_case(0b00_00001_000001_0000111, (0, None, Some(1), Some(1), 7) ; "data")]
    #[test_case(0b00_11111_111111_1111111, (0, None, Some(31), Some(63), 127) ; "data max")]
    #[test_case(0b01_000011_000000001111, (1, None, None, Some(3), 15) ; "trigger rate")]
    #[test_case(0b10_111111_111111111111, (2, None, None, Some(63), 4095) ; "event rate max")]
    #[test_case(0b11_0_1_0000000000001010, (3, Some(0), Some(1), None, 10) ; "noise")]
    #[test_case(0b11_0_0_1111111111111111, (3, Some(0), Some(0), None, 65535) ; "noise max")]
    #[test_case(0b11_1_00000101_000000011, (3, Some(1), None, Some(5), 3) ; "status")]
    #[test_case(0b11_1_11111111_111111111, (3, Some(1), None, Some(255), 511) ; "status max")]
    fn decode_packed_fields(
        word: u32,
        expected: (u8, Option<u8>, Option<u8>, Option<u8>, u16),
    ) {
        let event = decode_packed(word, 42).unwrap();

        assert_eq!(event.index, 42);
        assert_eq!(
            (event.code, event.add, event.det_id, event.timestamp, event.data),
            expected
        );
    }

    #[test_case(0x0_0000, EventKind::Data)]
    #[test_case(0x4_0000, EventKind::TriggerRate)]
    #[test_case(0x8_0000, EventKind::EventRate)]
    #[test_case(0xc_0000, EventKind::Noise)]
    #[test_case(0xe_0000, EventKind::Status)]
    fn decode_packed_kind(word: u32, kind: EventKind) {
        assert_eq!(decode_packed(word, 0).unwrap().kind, kind);
    }

    #[test]
    fn decode_packed_absent_is_not_zero() {
        let event = decode_packed(0x4_0000, 0).unwrap();

        assert_eq!(event.det_id, None);
        assert_ne!(event.det_id, Some(0));
        assert_eq!(event.to_string(), "0 1 -1 -1 0 0");
    }

    #[test]
    fn decode_packed_field_bounds() {
        // Sample the word space; every 20-bit word is valid.
        for word in (0..=WORD_MASK).step_by(7) {
            let event = decode_packed(word, 0).unwrap();
            assert!(event.code <= 3);
            assert!(event.add.map_or(true, |v| v <= 1));
            assert!(event.det_id.map_or(true, |v| v < 32));
            assert!(match event.code {
                0 => event.data < 128,
                1 | 2 => event.data < 4096,
                _ => event.add == Some(0) || event.data < 512,
            });
        }
    }

    #[test]
    fn decode_packed_wide_word_is_err() {
        let zult = decode_packed(1 << 20, 0);
        assert!(
            matches!(zult, Err(Error::InvalidCode { code: 4, .. })),
            "got {zult:?}"
        );
    }

    #[test_case([0xc0, 0x05, 0x00, 0x0a], (3, 0, 0, 5, 32778) ; "code 3")]
    #[test_case([0x00, 0x00, 0x00, 0x00], (0, 0, 0, 0, 32768) ; "zeros")]
    #[test_case([0xff, 0xff, 0xff, 0xff], (3, 1, 31, 255, 32767) ; "wraps")]
    #[test_case([0x3f, 0x10, 0x80, 0x00], (0, 1, 31, 16, 0) ; "signed minimum")]
    fn decode_raw_fields(record: Record, expected: (u8, u8, u8, u8, u16)) {
        let event = decode_raw(record, 7);

        assert_eq!(event.index, 7);
        assert_eq!(event.kind, EventKind::Raw);
        assert_eq!(
            (
                event.code,
                event.add.unwrap(),
                event.det_id.unwrap(),
                event.timestamp.unwrap(),
                event.data
            ),
            expected
        );
    }

    #[test]
    fn decode_raw_reports_all_fields_for_every_code() {
        for r0 in 0..=255u8 {
            let event = decode_raw([r0, 0, 0, 0], 0);
            assert!(event.add.is_some() && event.det_id.is_some() && event.timestamp.is_some());
        }
    }

    #[test]
    fn display_raw() {
        assert_eq!(decode_raw([0xc0, 0x05, 0x00, 0x0a], 3).to_string(), "3 3 0 0 5 32778");
    }
}
