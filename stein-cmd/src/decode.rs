use std::fs::File;
use std::io::{stdout, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use stein::decode::{decode_fsw, decode_fsw_parallel, decode_raw_records, ParallelOpts};
use stein::event::DecodedEvent;
use stein::hexdump::{count_packets, read_packets};
use stein::output::EventWriter;
use stein::raw::read_records;
use stein::Summary;
use tracing::{debug, info};

/// Message for any failure reading input.
pub const READ_FAILED: &str = "Invalid file name / path: read failed!";

#[derive(Debug, Clone, Copy)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

impl From<Format> for stein::output::Format {
    fn from(value: Format) -> Self {
        match value {
            Format::Json => Self::Json,
            Format::Text => Self::Text,
        }
    }
}

fn write_events<W, I>(writer: &mut EventWriter<W>, events: I) -> Result<usize>
where
    W: Write,
    I: Iterator<Item = stein::Result<DecodedEvent>>,
{
    let mut count = 0;
    for event in events {
        let event = event.context(READ_FAILED)?;
        writer.write_event(&event).context("writing event")?;
        count += 1;
    }
    writer.flush().context("flushing output")?;
    Ok(count)
}

fn log_summary(summary: &Summary) {
    info!(
        packets = summary.packets,
        skipped_packets = summary.skipped_packets,
        events = summary.events,
        skipped_events = summary.skipped_events,
        "decode complete"
    );
}

pub fn fsw(input: &Path, format: Format, threads: usize, batch_size: usize) -> Result<()> {
    let count = count_packets(BufReader::new(File::open(input).context(READ_FAILED)?))
        .context(READ_FAILED)?;
    debug!("{input:?} has {count} packets");

    let packets = read_packets(BufReader::new(File::open(input).context(READ_FAILED)?));
    let mut events = if threads == 1 {
        decode_fsw(packets)
    } else {
        let opts = ParallelOpts::new()
            .with_num_threads(threads)
            .with_batch_size(batch_size);
        debug!("decoding with {opts:?}");
        decode_fsw_parallel(packets, opts).context("starting decode")?
    };

    let mut writer = EventWriter::new(BufWriter::new(stdout().lock()), format.into());
    writer.write_comment("usage: stein fsw <data file>")?;
    writer.write_comment(&input.display().to_string())?;
    writer.write_comment(&format!("packet count (line_cnt): {count}"))?;
    writer.write_header()?;

    write_events(&mut writer, events.by_ref())?;
    log_summary(events.summary());
    Ok(())
}

pub fn raw(input: &Path, format: Format) -> Result<()> {
    let file = File::open(input).context(READ_FAILED)?;
    let size = file.metadata().context(READ_FAILED)?.len();

    let mut writer = EventWriter::new(BufWriter::new(stdout().lock()), format.into());
    writer.write_comment("usage: stein raw <data file>")?;
    writer.write_comment(&input.display().to_string())?;
    writer.write_comment(&format!("Import successful; bytes read: {size}"))?;
    writer.write_header()?;

    let mut events = decode_raw_records(read_records(BufReader::new(file)));
    write_events(&mut writer, events.by_ref())?;
    log_summary(events.summary());
    Ok(())
}
