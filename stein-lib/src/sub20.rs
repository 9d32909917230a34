//! Conversion of SUB-20 interface logs to raw binary event records.
//!
//! Events collected through the SUB-20 interface are logged as text, 4 hex bytes followed by an
//! ASCII gloss:
//!
//! ```text
//!   80 00 00 00                                     | ....
//!   40 00 00 00                                     | @...
//! ```
//!
//! Converted records are readable with [read_records](crate::raw::read_records).
use std::io::{BufRead, Write};

use tracing::debug;

use crate::event::{Record, RECORD_LEN};
use crate::{Error, Result};

/// Parse a single SUB-20 log line. Returns `Ok(None)` for blank lines.
///
/// `line_num` is only used for error reporting.
///
/// # Errors
/// [Error::Sub20Line] if there are fewer than 4 byte tokens, or a token is not a hex byte.
pub fn parse_line(line_num: usize, line: &str) -> Result<Option<Record>> {
    let mut tokens = line.split_whitespace().peekable();
    if tokens.peek().is_none() {
        return Ok(None);
    }
    let mut record = [0u8; RECORD_LEN];
    for (idx, byte) in record.iter_mut().enumerate() {
        let Some(token) = tokens.next() else {
            return Err(Error::Sub20Line {
                line: line_num,
                reason: format!("expected {RECORD_LEN} hex bytes, got {idx}"),
            });
        };
        *byte = u8::from_str_radix(token, 16).map_err(|err| Error::Sub20Line {
            line: line_num,
            reason: format!("invalid hex byte {token:?}: {err}"),
        })?;
    }
    Ok(Some(record))
}

/// Return an iterator of [Record]s parsed from a SUB-20 log. Line numbers start at 1.
pub fn read_sub20<R>(reader: R) -> impl Iterator<Item = Result<Record>>
where
    R: BufRead,
{
    reader
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| match line {
            Ok(line) => parse_line(idx + 1, &line).transpose(),
            Err(err) => Some(Err(err.into())),
        })
}

/// Write records to `writer` as packed binary, returning the number of records written.
///
/// # Errors
/// The first error produced by `records`, or any error writing.
pub fn write_records<W, I>(mut writer: W, records: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = Result<Record>>,
{
    let mut count = 0;
    for record in records {
        writer.write_all(&record?)?;
        count += 1;
    }
    writer.flush()?;
    debug!(count, "wrote records");
    Ok(count)
}

/// Convert a SUB-20 log into packed binary records.
///
/// # Errors
/// See [parse_line] and [write_records].
///
/// # Example
/// ```
/// let log: &[u8] = b"80 00 00 00     | ....\n\n40 01 02 03     | @...\n";
/// let mut out: Vec<u8> = Vec::new();
/// let count = stein::sub20::convert(log, &mut out).unwrap();
///
/// assert_eq!(count, 2);
/// assert_eq!(out, vec![0x80, 0, 0, 0, 0x40, 1, 2, 3]);
/// ```
pub fn convert<R, W>(reader: R, writer: W) -> Result<usize>
where
    R: BufRead,
    W: Write,
{
    write_records(writer, read_sub20(reader))
}
