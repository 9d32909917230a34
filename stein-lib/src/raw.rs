//! Reading raw binary STEIN event records.
use std::io::{self, ErrorKind, Read};

use tracing::warn;

use crate::event::{Record, RECORD_LEN};
use crate::Result;

/// Fill `buf` from `reader`, returning the number of bytes read. Fewer than `buf.len()` bytes
/// are only returned at EOF.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut num_read = 0;
    while num_read < buf.len() {
        match reader.read(&mut buf[num_read..]) {
            Ok(0) => break,
            Ok(n) => num_read += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(num_read)
}

pub struct RecordReaderIter<R>
where
    R: Read,
{
    reader: R,
    offset: usize,
    done: bool,
}

impl<R> RecordReaderIter<R>
where
    R: Read,
{
    fn new(reader: R) -> Self {
        RecordReaderIter {
            reader,
            offset: 0,
            done: false,
        }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<R> Iterator for RecordReaderIter<R>
where
    R: Read,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut buf = [0u8; RECORD_LEN];
        let num_read = match fill(&mut self.reader, &mut buf) {
            Ok(n) => n,
            Err(err) => {
                self.done = true;
                return Some(Err(err.into()));
            }
        };
        self.offset += num_read;
        match num_read {
            RECORD_LEN => Some(Ok(buf)),
            0 => {
                self.done = true;
                None
            }
            _ => {
                warn!(
                    offset = self.offset - num_read,
                    len = num_read,
                    "ignoring trailing partial record"
                );
                self.done = true;
                None
            }
        }
    }
}

/// Return an iterator of 4-byte [Record]s read from a raw binary stream.
///
/// A trailing partial record is logged and dropped.
///
/// # Examples
/// ```
/// use stein::raw::read_records;
///
/// let dat: &[u8] = &[0xc0, 0x05, 0x00, 0x0a, 0x40, 0x00, 0x00, 0x00];
/// let records: Vec<[u8; 4]> = read_records(dat).map(Result::unwrap).collect();
/// assert_eq!(records, vec![[0xc0, 0x05, 0x00, 0x0a], [0x40, 0, 0, 0]]);
/// ```
pub fn read_records<R>(reader: R) -> RecordReaderIter<R>
where
    R: Read,
{
    RecordReaderIter::new(reader)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader returning at most `step` bytes per read.
    struct Trickle<'a> {
        dat: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.dat.len());
            buf[..n].copy_from_slice(&self.dat[..n]);
            self.dat = &self.dat[n..];
            Ok(n)
        }
    }

    #[test]
    fn reads_whole_records() {
        let dat: Vec<u8> = (0..12).collect();
        let mut iter = read_records(&dat[..]);
        let records: Vec<Record> = iter.by_ref().map(Result::unwrap).collect();

        assert_eq!(records, vec![[0, 1, 2, 3], [4, 5, 6, 7], [8, 9, 10, 11]]);
        assert_eq!(iter.offset(), 12);
    }

    #[test]
    fn short_reads_are_assembled() {
        let dat: Vec<u8> = (0..8).collect();
        let reader = Trickle { dat: &dat, step: 3 };
        let records: Vec<Record> = read_records(reader).map(Result::unwrap).collect();

        assert_eq!(records, vec![[0, 1, 2, 3], [4, 5, 6, 7]]);
    }

    #[test]
    fn trailing_partial_record_is_dropped() {
        let dat: Vec<u8> = (0..10).collect();
        let mut iter = read_records(&dat[..]);
        let records: Vec<Record> = iter.by_ref().map(Result::unwrap).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(iter.offset(), 10);
        assert!(iter.next().is_none());
    }

    #[test]
    fn empty_input() {
        assert_eq!(read_records(&[0u8; 0][..]).count(), 0);
    }
}
