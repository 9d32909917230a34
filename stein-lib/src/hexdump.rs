//! Reading STEIN packets from ASCII hex dumps of flight software output.
//!
//! Each non-blank line holds one packet as whitespace delimited tokens, one per byte. A token is
//! a 2 character prefix, the hex digits, and a single trailing character, e.g., `0xaf,`.
use std::io::{BufRead, Lines};

use tracing::trace;

use crate::packet::{Packet, PacketLayout};
use crate::{Error, Result};

const TOKEN_PREFIX_LEN: usize = 2;
const TOKEN_SUFFIX_LEN: usize = 1;

/// Parse a single hex byte token, stripping its prefix and trailing character.
///
/// Returns `None` if the token is too short, the remaining characters are not all hex digits,
/// or their value does not fit in a byte.
#[must_use]
pub fn parse_hex_token(token: &str) -> Option<u8> {
    let end = token.len().checked_sub(TOKEN_SUFFIX_LEN)?;
    let digits = token.get(TOKEN_PREFIX_LEN..end)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}

/// True if a dump line contains packet data. Lines of 0 or 1 characters are ignored.
#[must_use]
pub fn is_data_line(line: &str) -> bool {
    line.len() > 1
}

/// Parse one dump line into a [Packet].
///
/// Only the first [PacketLayout::LEN] tokens are used; dumps commonly carry 2 spurious trailing
/// bytes. A line with fewer tokens produces a short packet, which is caught when the subframe
/// is extracted.
///
/// # Errors
/// [Error::HexToken] for the first token that cannot be parsed.
///
/// # Example
/// ```
/// use stein::hexdump::parse_packet;
///
/// let packet = parse_packet(3, "0xaf, 0x01, 0xff,").unwrap();
/// assert_eq!(packet.index, 3);
/// assert_eq!(packet.data, vec![0xaf, 0x01, 0xff]);
/// ```
pub fn parse_packet(index: usize, line: &str) -> Result<Packet> {
    let mut data = Vec::with_capacity(PacketLayout::LEN);
    for (position, token) in line.split_whitespace().take(PacketLayout::LEN).enumerate() {
        let Some(byte) = parse_hex_token(token) else {
            return Err(Error::HexToken {
                packet: index,
                position,
                token: token.to_string(),
            });
        };
        data.push(byte);
    }
    Ok(Packet::new(index, data))
}

pub struct PacketReaderIter<R>
where
    R: BufRead,
{
    lines: Lines<R>,
    index: usize,
}

impl<R> PacketReaderIter<R>
where
    R: BufRead,
{
    fn new(reader: R) -> Self {
        PacketReaderIter {
            lines: reader.lines(),
            index: 0,
        }
    }
}

impl<R> Iterator for PacketReaderIter<R>
where
    R: BufRead,
{
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };
            if !is_data_line(&line) {
                trace!(index = self.index, "skipping blank line");
                continue;
            }
            let index = self.index;
            self.index += 1;
            return Some(parse_packet(index, &line));
        }
    }
}

/// Return an iterator providing a [Packet] for each data line of an ASCII hex dump.
///
/// Packets are numbered by their ordinal among data lines. A line with a malformed token
/// produces an [Error::HexToken] for that packet only; iteration may continue past it.
///
/// # Examples
/// ```
/// use stein::hexdump::read_packets;
///
/// let dump: &[u8] = b"0x00, 0x01,\n\n0x02, 0x03,\n";
/// let packets: Vec<_> = read_packets(dump).collect();
/// assert_eq!(packets.len(), 2);
/// assert_eq!(packets[1].as_ref().unwrap().index, 1);
/// ```
pub fn read_packets<R>(reader: R) -> PacketReaderIter<R>
where
    R: BufRead,
{
    PacketReaderIter::new(reader)
}

/// Count the data lines, i.e., packets, in an ASCII hex dump without parsing them.
///
/// # Errors
/// Any ``std::io::Error`` reading
pub fn count_packets<R>(reader: R) -> Result<usize>
where
    R: BufRead,
{
    let mut count = 0;
    for line in reader.lines() {
        if is_data_line(&line?) {
            count += 1;
        }
    }
    Ok(count)
}
