//! Decoding pipelines producing numbered [DecodedEvent]s.
//!
//! Events are numbered by their position in the stream. The counter is owned by the pipeline and
//! threaded through each packet decode; the decoders themselves are stateless.
use std::collections::VecDeque;

use crossbeam::channel::{bounded, Sender};
use rayon::prelude::*;
use tracing::{debug, error, trace, warn};

use crate::event::{decode_packed, decode_raw, DecodedEvent, Record};
use crate::packet::{Packet, PacketLayout};
use crate::summary::Summary;
use crate::unpack::unpack;
use crate::{Error, Result};

/// Events decoded from a single packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBatch {
    /// Index of the source packet
    pub packet: usize,
    pub events: Vec<DecodedEvent>,
    /// Number of event words that failed to decode. Their indexes are not reused.
    pub skipped: usize,
    /// Index to assign to the first event of the next packet
    pub next_index: u64,
}

impl DecodedBatch {
    /// Shift all event indexes, and `next_index`, by `offset`.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        for event in &mut self.events {
            event.index += offset;
        }
        self.next_index += offset;
        self
    }
}

/// Decode all event words in a packet's subframe, numbering them from `start`.
///
/// Words that fail to decode are logged and skipped but still consume an index, so an index
/// always identifies the same word position in the input.
///
/// # Errors
/// [Error::Framing] if the packet is truncated before the end of its housekeeping bytes.
pub fn decode_packet(packet: &Packet, start: u64) -> Result<DecodedBatch> {
    let subframe = packet.subframe()?;
    debug!(packet = packet.index, header = ?packet.header().ok(), "decoding packet");

    let mut batch = DecodedBatch {
        packet: packet.index,
        events: Vec::with_capacity(PacketLayout::EVENTS_PER_PACKET),
        skipped: 0,
        next_index: start,
    };
    for word in unpack(subframe)? {
        let index = batch.next_index;
        batch.next_index += 1;
        match decode_packed(word, index) {
            Ok(event) => batch.events.push(event),
            Err(err) => {
                error!(packet = packet.index, index, "{err}; skipping event");
                batch.skipped += 1;
            }
        }
    }
    Ok(batch)
}

/// The result of decoding a single packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketOutcome {
    Decoded(DecodedBatch),
    /// The packet with this index could not be decoded and was dropped.
    Skipped(usize),
}

/// Decode a packet, converting packet level errors into [PacketOutcome::Skipped]. Only errors
/// that should stop the stream are returned.
fn decode_outcome(packet: Result<Packet>, start: u64) -> Result<PacketOutcome> {
    let packet = match packet {
        Ok(packet) => packet,
        Err(Error::HexToken {
            packet,
            position,
            token,
        }) => {
            warn!(packet, position, token = %token, "invalid hex token, skipping packet");
            return Ok(PacketOutcome::Skipped(packet));
        }
        Err(err) => return Err(err),
    };
    match decode_packet(&packet, start) {
        Ok(batch) => Ok(PacketOutcome::Decoded(batch)),
        Err(err) if err.is_packet_error() => {
            warn!(packet = packet.index, "{err}, skipping packet");
            Ok(PacketOutcome::Skipped(packet.index))
        }
        Err(err) => Err(err),
    }
}

struct SequentialOutcomes<I> {
    packets: I,
    next_index: u64,
}

impl<I> Iterator for SequentialOutcomes<I>
where
    I: Iterator<Item = Result<Packet>>,
{
    type Item = Result<PacketOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        let outcome = decode_outcome(self.packets.next()?, self.next_index);
        if let Ok(PacketOutcome::Decoded(batch)) = &outcome {
            self.next_index = batch.next_index;
        }
        Some(outcome)
    }
}

/// Iterator of events decoded from STEIN flight software packets.
///
/// Bad packets are skipped (see [decode_fsw]). Iteration ends after the first error, which can
/// only be an error reading the input.
pub struct FswEventIter {
    outcomes: Box<dyn Iterator<Item = Result<PacketOutcome>> + Send>,
    ready: VecDeque<DecodedEvent>,
    summary: Summary,
    done: bool,
}

impl FswEventIter {
    fn new(outcomes: Box<dyn Iterator<Item = Result<PacketOutcome>> + Send>) -> Self {
        FswEventIter {
            outcomes,
            ready: VecDeque::with_capacity(PacketLayout::EVENTS_PER_PACKET),
            summary: Summary::default(),
            done: false,
        }
    }

    /// Stats for the events produced so far.
    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}

impl Iterator for FswEventIter {
    type Item = Result<DecodedEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Some(Ok(event));
            }
            if self.done {
                return None;
            }
            match self.outcomes.next() {
                Some(Ok(PacketOutcome::Decoded(batch))) => {
                    self.summary.add_batch(&batch);
                    self.ready.extend(batch.events);
                }
                Some(Ok(PacketOutcome::Skipped(_))) => self.summary.add_skipped_packet(),
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {
                    trace!("no more packets");
                    self.done = true;
                }
            }
        }
    }
}

/// Decode events from STEIN flight software packets, in order, on the calling thread.
///
/// Packets that are truncated before the end of their housekeeping bytes, or that failed to
/// parse from a hex dump, are logged and skipped; they do not consume event indexes. Any other
/// error is returned and ends iteration.
///
/// # Example
/// ```
/// use stein::decode::decode_fsw;
/// use stein::packet::Packet;
///
/// let packets: Vec<stein::Result<Packet>> =
///     vec![Ok(Packet::new(0, vec![0u8; 512])), Ok(Packet::new(1, vec![0u8; 10]))];
/// let mut events = decode_fsw(packets.into_iter());
/// let count = events.by_ref().map(Result::unwrap).count();
///
/// assert_eq!(count, 198);
/// assert_eq!(events.summary().skipped_packets, 1);
/// ```
pub fn decode_fsw<I>(packets: I) -> FswEventIter
where
    I: Iterator<Item = Result<Packet>> + Send + 'static,
{
    FswEventIter::new(Box::new(SequentialOutcomes {
        packets,
        next_index: 0,
    }))
}

/// Configuration options for [decode_fsw_parallel].
#[derive(Debug, Clone, Copy)]
pub struct ParallelOpts {
    num_threads: usize,
    batch_size: usize,
    buffer_size: usize,
}

impl Default for ParallelOpts {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelOpts {
    pub fn new() -> Self {
        ParallelOpts {
            num_threads: 0,
            batch_size: 64,
            buffer_size: 256,
        }
    }

    /// Size of the thread pool used to decode packets. By default the value will be chosen
    /// automatically.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Number of packets decoded in parallel before their events are renumbered and released.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the allowable number of decoded packets waiting to be consumed.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }
}

fn do_decode_parallel<I>(mut packets: I, opts: ParallelOpts, tx: Sender<Result<PacketOutcome>>)
where
    I: Iterator<Item = Result<Packet>>,
{
    let pool = match rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("stein::decode{i}"))
        .num_threads(opts.num_threads)
        .build()
    {
        Ok(pool) => pool,
        Err(err) => {
            let _ = tx.send(Err(Error::ThreadPool(err.to_string())));
            return;
        }
    };

    let mut next_index = 0u64;
    loop {
        let batch: Vec<Result<Packet>> = packets.by_ref().take(opts.batch_size).collect();
        if batch.is_empty() {
            return;
        }
        // Decode with indexes relative to each packet, then renumber in packet order.
        let outcomes: Vec<Result<PacketOutcome>> = pool.install(|| {
            batch
                .into_par_iter()
                .map(|packet| decode_outcome(packet, 0))
                .collect()
        });
        for outcome in outcomes {
            let outcome = outcome.map(|outcome| match outcome {
                PacketOutcome::Decoded(batch) => {
                    let batch = batch.offset(next_index);
                    next_index = batch.next_index;
                    PacketOutcome::Decoded(batch)
                }
                skipped @ PacketOutcome::Skipped(_) => skipped,
            });
            let failed = outcome.is_err();
            if tx.send(outcome).is_err() {
                debug!("event receiver dropped");
                return;
            }
            if failed {
                return;
            }
        }
    }
}

/// Decode events from STEIN flight software packets using a pool of background threads.
///
/// Packets are read in batches on a dispatch thread and each batch is decoded in parallel.
/// Events are renumbered in input packet order before they are released, so the results
/// are identical to [decode_fsw].
///
/// # Errors
/// If the dispatch thread cannot be started. Errors building the thread pool are produced by
/// the returned iterator.
pub fn decode_fsw_parallel<I>(packets: I, opts: ParallelOpts) -> Result<FswEventIter>
where
    I: Iterator<Item = Result<Packet>> + Send + 'static,
{
    let (tx, rx) = bounded(opts.buffer_size);

    std::thread::Builder::new()
        .name("stein::dispatch".into())
        .spawn(move || {
            do_decode_parallel(packets, opts, tx);
            debug!("stein::dispatch thread exit");
        })?;

    Ok(FswEventIter::new(Box::new(rx.into_iter())))
}

/// Iterator of events decoded from raw binary records. See [decode_raw_records].
pub struct RawEventIter<I> {
    records: I,
    next_index: u64,
    summary: Summary,
    done: bool,
}

impl<I> RawEventIter<I> {
    /// Stats for the events produced so far.
    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}

impl<I> Iterator for RawEventIter<I>
where
    I: Iterator<Item = Result<Record>>,
{
    type Item = Result<DecodedEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.records.next()? {
            Ok(record) => {
                let event = decode_raw(record, self.next_index);
                trace!(?record, index = self.next_index, "decoded record");
                self.next_index += 1;
                self.summary.add(&event);
                Some(Ok(event))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Decode events from raw binary records, numbering them in record order.
///
/// # Example
/// ```
/// use stein::decode::decode_raw_records;
/// use stein::raw::read_records;
///
/// let dat: &[u8] = &[0xc0, 0x05, 0x00, 0x0a];
/// let events: Vec<_> = decode_raw_records(read_records(dat)).map(Result::unwrap).collect();
///
/// assert_eq!(events[0].to_string(), "0 3 0 0 5 32778");
/// ```
pub fn decode_raw_records<I>(records: I) -> RawEventIter<I::IntoIter>
where
    I: IntoIterator<Item = Result<Record>>,
{
    RawEventIter {
        records: records.into_iter(),
        next_index: 0,
        summary: Summary::default(),
        done: false,
    }
}
