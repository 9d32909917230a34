//! STEIN flight software packet layout and sub-frame extraction.
//!
//! Packets arrive with the CCSDS primary header already stripped. What remains is a fixed
//! table of regions:
//!
//! |region|bytes|
//! |---|---|
//! |packet header (e.g. `0xAF` for STEIN)|1|
//! |packet timestamp|6|
//! |STEIN data subframe|495|
//! |housekeeping|8|
//! |spare|2|
//!
//! Only the subframe is decoded. The other regions are kept on the [Packet] untouched.
use std::fmt::Display;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::unpack::CHUNK_LEN;
use crate::{Error, Result};

/// Fixed byte layout of a STEIN packet.
pub struct PacketLayout;

impl PacketLayout {
    pub const HEADER_LEN: usize = 1;
    pub const TIMESTAMP_LEN: usize = 6;
    pub const SUBFRAME_LEN: usize = 495;
    pub const HOUSEKEEPING_LEN: usize = 8;
    pub const SPARE_LEN: usize = 2;
    /// Nominal packet length. Observed dumps carry 2 more trailing bytes that are ignored.
    pub const LEN: usize = Self::HEADER_LEN
        + Self::TIMESTAMP_LEN
        + Self::SUBFRAME_LEN
        + Self::HOUSEKEEPING_LEN
        + Self::SPARE_LEN;

    /// Number of 20-bit event words in one subframe.
    pub const EVENTS_PER_PACKET: usize = Self::SUBFRAME_LEN / CHUNK_LEN * 2;

    pub const HEADER: Range<usize> = 0..Self::HEADER_LEN;
    pub const TIMESTAMP: Range<usize> = Self::HEADER.end..Self::HEADER.end + Self::TIMESTAMP_LEN;
    pub const SUBFRAME: Range<usize> =
        Self::TIMESTAMP.end..Self::TIMESTAMP.end + Self::SUBFRAME_LEN;
    pub const HOUSEKEEPING: Range<usize> =
        Self::SUBFRAME.end..Self::SUBFRAME.end + Self::HOUSEKEEPING_LEN;
    pub const SPARE: Range<usize> =
        Self::HOUSEKEEPING.end..Self::HOUSEKEEPING.end + Self::SPARE_LEN;
}

fn region<'a>(payload: &'a [u8], range: Range<usize>, name: &'static str) -> Result<&'a [u8]> {
    let minimum = range.end;
    payload.get(range).ok_or(Error::Framing {
        region: name,
        actual: payload.len(),
        minimum,
    })
}

/// Extract the 495 byte STEIN data subframe from a packet payload.
///
/// The payload must reach the end of the housekeeping region; only the spare bytes may be
/// missing. A shorter payload is a truncated packet even if the subframe itself is complete.
///
/// # Errors
/// [Error::Framing] if `payload` is too short to contain the header, timestamp, subframe, and
/// housekeeping. Partial subframes are never returned.
pub fn subframe(payload: &[u8]) -> Result<&[u8]> {
    region(payload, 0..PacketLayout::HOUSEKEEPING.end, "subframe")?;
    region(payload, PacketLayout::SUBFRAME, "subframe")
}

/// A single STEIN packet read from an ASCII hex dump.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Zero-based ordinal of this packet in the input
    pub index: usize,
    /// All packet bytes
    pub data: Vec<u8>,
}

impl Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Packet{{index: {}, data:[len={}]}}", self.index, self.data.len())
    }
}

impl Packet {
    #[must_use]
    pub fn new(index: usize, data: Vec<u8>) -> Self {
        Packet { index, data }
    }

    /// # Errors
    /// [Error::Framing] if there are no bytes
    pub fn header(&self) -> Result<&[u8]> {
        region(&self.data, PacketLayout::HEADER, "header")
    }

    /// Raw packet timestamp bytes. These are not decoded.
    ///
    /// # Errors
    /// [Error::Framing] if the packet is too short
    pub fn timestamp(&self) -> Result<&[u8]> {
        region(&self.data, PacketLayout::TIMESTAMP, "timestamp")
    }

    /// See [subframe].
    ///
    /// # Errors
    /// [Error::Framing] if the packet is too short
    pub fn subframe(&self) -> Result<&[u8]> {
        subframe(&self.data)
    }

    /// # Errors
    /// [Error::Framing] if the packet is too short
    pub fn housekeeping(&self) -> Result<&[u8]> {
        region(&self.data, PacketLayout::HOUSEKEEPING, "housekeeping")
    }

    /// # Errors
    /// [Error::Framing] if the packet is too short
    pub fn spare(&self) -> Result<&[u8]> {
        region(&self.data, PacketLayout::SPARE, "spare")
    }
}
