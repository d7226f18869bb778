//! Oversized body fragmentation and the lazy packet stream
//!
//! A body shorter than the chunk size travels as a single packet. Anything
//! longer is cut into consecutive chunks, each wrapped as
//!
//! ```text
//! [HEADER (40)] [INDEX (4, big-endian)] [CHUNK (<= chunk size)] [CRC-32 of INDEX+CHUNK (4)]
//! ```
//!
//! There is no final-fragment marker; receivers infer completion from
//! `len_body`.

use std::iter::FusedIterator;
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use super::checksum::crc32;
use super::metrics::Metrics;
use super::{FOOTER_SIZE, FRAGMENT_INDEX_SIZE, HEADER_SIZE, PacketHeader, SequenceCounter};

/// Finite, non-restartable iterator over the packets of one message.
///
/// Every packet takes a fresh value from the sequence counter when it is
/// pulled; the timestamp and `len_body` are fixed for the whole message.
/// Dropping the stream early simply stops emission.
#[derive(Debug)]
pub struct PacketStream {
    header: PacketHeader,
    pinned_seq: bool,
    body: Bytes,
    chunk_size: usize,
    fragmented: bool,
    offset: usize,
    next_index: u32,
    finished: bool,
    counter: Arc<SequenceCounter>,
}

impl PacketStream {
    /// `chunk_size` must be non-zero. With `pinned_seq` the header's `snd_seq`
    /// is kept as given, though the counter still advances once per packet.
    pub(crate) fn new(
        header: PacketHeader,
        pinned_seq: bool,
        body: Bytes,
        chunk_size: usize,
        counter: Arc<SequenceCounter>,
    ) -> Self {
        Self {
            header,
            pinned_seq,
            fragmented: body.len() >= chunk_size,
            body,
            chunk_size,
            offset: 0,
            next_index: 0,
            finished: false,
            counter,
        }
    }

    /// Whether the message is being split into fragments
    #[must_use]
    pub const fn is_fragmented(&self) -> bool {
        self.fragmented
    }

    /// Header shared by every packet of this message (before sequence stamping)
    #[must_use]
    pub const fn header(&self) -> &PacketHeader {
        &self.header
    }

    fn stamp_header(&mut self) -> [u8; HEADER_SIZE] {
        let seq = self.counter.next();
        if !self.pinned_seq {
            self.header.snd_seq = seq;
        }
        self.header.to_bytes()
    }

    fn single_packet(&mut self) -> Bytes {
        let header = self.stamp_header();

        let mut packet = BytesMut::with_capacity(HEADER_SIZE + self.body.len() + FOOTER_SIZE);
        packet.put_slice(&header);
        packet.put_slice(&self.body);
        packet.put_u32(crc32(&self.body));

        trace!(seq = self.header.snd_seq, len = packet.len(), "emit packet");
        Metrics::record_packet_emitted(false);
        self.finished = true;
        packet.freeze()
    }

    fn next_fragment(&mut self) -> Bytes {
        let header = self.stamp_header();
        let end = (self.offset + self.chunk_size).min(self.body.len());
        let chunk = &self.body[self.offset..end];

        let mut packet = BytesMut::with_capacity(
            HEADER_SIZE + FRAGMENT_INDEX_SIZE + chunk.len() + FOOTER_SIZE,
        );
        packet.put_slice(&header);
        packet.put_u32(self.next_index);
        packet.put_slice(chunk);
        let footer = crc32(&packet[HEADER_SIZE..]);
        packet.put_u32(footer);

        trace!(
            seq = self.header.snd_seq,
            index = self.next_index,
            chunk = chunk.len(),
            "emit fragment"
        );
        Metrics::record_packet_emitted(true);

        self.offset = end;
        self.next_index = self.next_index.wrapping_add(1);
        self.finished = self.offset >= self.body.len();
        packet.freeze()
    }

    fn remaining(&self) -> usize {
        if self.finished {
            0
        } else if self.fragmented {
            (self.body.len() - self.offset).div_ceil(self.chunk_size)
        } else {
            1
        }
    }
}

impl Iterator for PacketStream {
    type Item = Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if self.fragmented {
            Some(self.next_fragment())
        } else {
            Some(self.single_packet())
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PacketStream {}

impl FusedIterator for PacketStream {}

/// Read the fragment index prefixed to an unpacked fragment body
#[must_use]
pub fn fragment_index(body: &[u8]) -> Option<u32> {
    let prefix = body.get(..FRAGMENT_INDEX_SIZE)?;
    let mut index = [0u8; FRAGMENT_INDEX_SIZE];
    index.copy_from_slice(prefix);
    Some(u32::from_be_bytes(index))
}

/// Split an unpacked fragment body into its index and chunk
#[must_use]
pub fn split_fragment(body: &Bytes) -> Option<(u32, Bytes)> {
    let index = fragment_index(body)?;
    Some((index, body.slice(FRAGMENT_INDEX_SIZE..)))
}
