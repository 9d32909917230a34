//! Splitting a STEIN subframe into packed 20-bit event words.
//!
//! Every 5 bytes (40 bits) carry exactly two event words. For a chunk `b0..b4`:
//!
//! ```text
//! event1 = ((b2 & 0x0F) << 16) | (b1 << 8) | b0
//! event2 = (b4 << 12) | (b3 << 4) | (b2 >> 4)
//! ```
//!
//! Bytes are little-endian within each word, and `b2` is shared: its low nibble is the top of
//! `event1`, its high nibble the bottom of `event2`.
use crate::{Error, Result};

/// Number of bytes holding one pair of event words.
pub const CHUNK_LEN: usize = 5;
/// Width of a packed event word.
pub const WORD_BITS: u32 = 20;
/// Mask of the valid bits of an event word.
pub const WORD_MASK: u32 = (1 << WORD_BITS) - 1;

/// Unpack a single chunk into its two event words, in stream order.
#[must_use]
pub fn unpack_chunk(chunk: [u8; CHUNK_LEN]) -> (u32, u32) {
    let [b0, b1, b2, b3, b4] = chunk.map(u32::from);
    let event1 = ((b2 & 0x0f) << 16) | (b1 << 8) | b0;
    let event2 = (b4 << 12) | (b3 << 4) | (b2 >> 4);
    (event1, event2)
}

/// Inverse of [unpack_chunk]. Bits above [WORD_BITS] are ignored.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn pack_chunk(event1: u32, event2: u32) -> [u8; CHUNK_LEN] {
    let (event1, event2) = (event1 & WORD_MASK, event2 & WORD_MASK);
    [
        event1 as u8,
        (event1 >> 8) as u8,
        ((event1 >> 16) | ((event2 & 0x0f) << 4)) as u8,
        (event2 >> 4) as u8,
        (event2 >> 12) as u8,
    ]
}

/// Return an iterator of the event words packed in `buf`.
///
/// Words are produced in chunk order, and within a chunk `event1` before `event2`. This order
/// defines the event sequence.
///
/// # Errors
/// [Error::Alignment] if the length of `buf` is not a multiple of [CHUNK_LEN].
///
/// # Example
/// ```
/// use stein::unpack::unpack;
///
/// let words: Vec<u32> = unpack(&[0x01, 0x02, 0x43, 0x05, 0x06]).unwrap().collect();
/// assert_eq!(words, vec![0x30201, 0x06054]);
/// ```
pub fn unpack(buf: &[u8]) -> Result<impl Iterator<Item = u32> + '_> {
    if buf.len() % CHUNK_LEN != 0 {
        return Err(Error::Alignment {
            len: buf.len(),
            chunk: CHUNK_LEN,
        });
    }
    Ok(buf.chunks_exact(CHUNK_LEN).flat_map(|c| {
        let (event1, event2) = unpack_chunk([c[0], c[1], c[2], c[3], c[4]]);
        [event1, event2]
    }))
}

/// Pack event words into bytes, the inverse of [unpack].
///
/// # Errors
/// [Error::Alignment] if there is an odd number of words.
pub fn pack(words: &[u32]) -> Result<Vec<u8>> {
    if words.len() % 2 != 0 {
        return Err(Error::Alignment {
            len: words.len(),
            chunk: 2,
        });
    }
    Ok(words
        .chunks_exact(2)
        .flat_map(|w| pack_chunk(w[0], w[1]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use test_case::test_case;

    #[test_case([0, 0, 0, 0, 0], (0, 0) ; "zeros")]
    #[test_case([0xff; 5], (WORD_MASK, WORD_MASK) ; "ones")]
    #[test_case([0x01, 0x02, 0x43, 0x05, 0x06], (0x3_0201, 0x0_6054) ; "shared nibble")]
    #[test_case([0x00, 0x00, 0x0f, 0x00, 0x00], (0xf_0000, 0) ; "low nibble to event1")]
    #[test_case([0x00, 0x00, 0xf0, 0x00, 0x00], (0, 0xf) ; "high nibble to event2")]
    fn unpack_chunk_layout(chunk: [u8; 5], expected: (u32, u32)) {
        assert_eq!(unpack_chunk(chunk), expected);
    }

    #[test]
    fn unpack_chunk_round_trips_exhaustive_shared_byte() {
        // b2 is the only byte split across words, so walk all of its values.
        for b2 in 0..=255u8 {
            let chunk = [0xa5, 0x5a, b2, 0x3c, 0xc3];
            let (e1, e2) = unpack_chunk(chunk);
            assert_eq!(pack_chunk(e1, e2), chunk, "b2={b2:#x}");
        }
    }

    #[test]
    fn unpack_chunk_round_trips_random() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let chunk: [u8; 5] = rng.gen();
            let (e1, e2) = unpack_chunk(chunk);
            assert!(e1 <= WORD_MASK && e2 <= WORD_MASK);
            assert_eq!(pack_chunk(e1, e2), chunk);
        }
    }

    #[test]
    fn unpack_subframe_yields_198_words() {
        let buf = vec![0x11u8; 495];
        let words: Vec<u32> = unpack(&buf).unwrap().collect();

        assert_eq!(words.len(), 198);
        assert!(words.iter().all(|w| *w <= WORD_MASK));
    }

    #[test]
    fn unpack_preserves_order() {
        let words: Vec<u32> = (1..=6).collect();
        let buf = pack(&words).unwrap();

        assert_eq!(buf.len(), 15);
        assert_eq!(unpack(&buf).unwrap().collect::<Vec<u32>>(), words);
    }

    #[test_case(1)]
    #[test_case(4)]
    #[test_case(496)]
    fn unpack_unaligned_is_err(len: usize) {
        let buf = vec![0u8; len];
        assert!(matches!(unpack(&buf), Err(Error::Alignment { chunk: 5, .. })));
    }

    #[test]
    fn pack_odd_word_count_is_err() {
        assert!(pack(&[1, 2, 3]).is_err());
    }
}
