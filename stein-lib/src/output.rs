//! Writing decoded event lists.
use std::io::Write;

use crate::event::DecodedEvent;
use crate::Result;

/// Column header for text event lists.
pub const HEADER: &str = "# frame / EVCODE / ADD / DET_ID / TIME_STAMP / DATA";

/// Event list output format.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One space separated line per event with absent fields written as `-1`, preceded by `#`
    /// comment lines.
    #[default]
    Text,
    /// One JSON object per line with absent fields written as `null`. Comments are not written.
    #[cfg(feature = "serde")]
    Json,
}

/// Writes [DecodedEvent]s in a [Format].
///
/// # Example
/// ```
/// use stein::event::decode_raw;
/// use stein::output::{EventWriter, Format};
///
/// let mut writer = EventWriter::new(Vec::new(), Format::Text);
/// writer.write_header().unwrap();
/// writer.write_event(&decode_raw([0xc0, 0x05, 0x00, 0x0a], 0)).unwrap();
///
/// let text = String::from_utf8(writer.into_inner()).unwrap();
/// assert_eq!(text, "# frame / EVCODE / ADD / DET_ID / TIME_STAMP / DATA\n0 3 0 0 5 32778\n");
/// ```
pub struct EventWriter<W>
where
    W: Write,
{
    writer: W,
    format: Format,
}

impl<W> EventWriter<W>
where
    W: Write,
{
    pub fn new(writer: W, format: Format) -> Self {
        EventWriter { writer, format }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Write a `# ` prefixed comment line. Only written for [Format::Text].
    ///
    /// # Errors
    /// Any error writing
    pub fn write_comment(&mut self, comment: &str) -> Result<()> {
        if self.format == Format::Text {
            writeln!(self.writer, "# {comment}")?;
        }
        Ok(())
    }

    /// Write the [HEADER] line. Only written for [Format::Text].
    ///
    /// # Errors
    /// Any error writing
    pub fn write_header(&mut self) -> Result<()> {
        if self.format == Format::Text {
            writeln!(self.writer, "{HEADER}")?;
        }
        Ok(())
    }

    /// # Errors
    /// Any error writing or serializing
    pub fn write_event(&mut self, event: &DecodedEvent) -> Result<()> {
        match self.format {
            Format::Text => writeln!(self.writer, "{event}")?,
            #[cfg(feature = "serde")]
            Format::Json => {
                serde_json::to_writer(&mut self.writer, event)?;
                self.writer.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    /// Write all events, returning the number written.
    ///
    /// # Errors
    /// The first error produced by `events`, or any error writing. Events before the error
    /// have already been written.
    pub fn write_events<I>(&mut self, events: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<DecodedEvent>>,
    {
        let mut count = 0;
        for event in events {
            self.write_event(&event?)?;
            count += 1;
        }
        Ok(count)
    }

    /// # Errors
    /// Any error flushing the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        Ok(self.writer.flush()?)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{decode_packed, decode_raw};
    use crate::Error;

    #[test]
    fn text_list() {
        let mut writer = EventWriter::new(Vec::new(), Format::Text);
        writer.write_comment("usage: stein fsw <data file>").unwrap();
        writer.write_header().unwrap();
        let count = writer
            .write_events(vec![
                decode_packed(0b00_00001_000001_0000111, 0),
                decode_packed(0b11_0_1_0000000000001010, 1),
            ])
            .unwrap();

        assert_eq!(count, 2);
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            text,
            "# usage: stein fsw <data file>\n\
             # frame / EVCODE / ADD / DET_ID / TIME_STAMP / DATA\n\
             0 0 -1 1 1 7\n\
             1 3 0 1 -1 10\n"
        );
    }

    #[test]
    fn write_events_stops_at_error() {
        let mut writer = EventWriter::new(Vec::new(), Format::Text);
        let zult = writer.write_events(vec![
            Ok(decode_raw([0, 0, 0, 0], 0)),
            Err(Error::Io(std::io::Error::other("boom"))),
            Ok(decode_raw([0, 0, 0, 0], 2)),
        ]);

        assert!(zult.is_err());
        assert_eq!(
            String::from_utf8(writer.into_inner()).unwrap(),
            "0 0 0 0 0 32768\n"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_lines() {
        let mut writer = EventWriter::new(Vec::new(), Format::Json);
        writer.write_comment("not written").unwrap();
        writer.write_header().unwrap();
        writer
            .write_event(&decode_packed(0b00_00001_000001_0000111, 4).unwrap())
            .unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["index"], 4);
        assert_eq!(value["kind"], "data");
        assert_eq!(value["add"], serde_json::Value::Null);
        assert_eq!(value["det_id"], 1);
        assert_eq!(value["data"], 7);
    }
}
