//! Waggle packet codec (pack/unpack)
//!
//! This module composes header encoding, fragmentation and checksums into the
//! two operations callers use: [`pack`] a message into packets and [`unpack`]
//! one received packet.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tracing::{debug, warn};

use super::checksum::crc32;
use super::metrics::Metrics;
use super::{
    Error, FOOTER_SIZE, HEADER_SIZE, HeaderBuilder, MIN_PACKET_SIZE, PacketConfig, PacketHeader,
    PacketStream, Result, SequenceCounter,
};

/// Packing facade: owns the outgoing defaults and a handle to the sequence counter
#[derive(Debug, Clone)]
pub struct Packer {
    config: PacketConfig,
    counter: Arc<SequenceCounter>,
}

impl Packer {
    /// Create a packer with an explicit configuration and counter
    pub fn new(config: PacketConfig, counter: Arc<SequenceCounter>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, counter })
    }

    /// Create a packer sharing the process-wide counter
    pub fn with_config(config: PacketConfig) -> Result<Self> {
        Self::new(config, SequenceCounter::global())
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &PacketConfig {
        &self.config
    }

    /// Counter stamping this packer's packets
    #[must_use]
    pub const fn counter(&self) -> &Arc<SequenceCounter> {
        &self.counter
    }

    /// Header values applied before caller overrides.
    ///
    /// `snd_seq` is left unset; the stream stamps it per packet.
    #[must_use]
    pub fn defaults(&self, len_body: u16, time: u32) -> HeaderBuilder {
        HeaderBuilder::new()
            .prot_ver(self.config.protocol_version)
            .flags(self.config.default_flags)
            .len_body(len_body)
            .time(time)
            .snd_session(0)
            .s_uniqid(self.config.sender_id)
            .ext_header(0)
            .resp_session(0)
            .r_uniqid(0)
            .resp_seq(0)
    }

    /// Pack a message into a lazy stream of packets
    ///
    /// The header is validated up front, so a missing field or oversized body
    /// fails before any sequence number is consumed. The timestamp is read once
    /// and shared by every fragment.
    pub fn pack(&self, overrides: HeaderBuilder, body: impl Into<Bytes>) -> Result<PacketStream> {
        let body = body.into();
        let len_body = u16::try_from(body.len()).map_err(|_| Error::BodyTooLarge {
            size: body.len(),
            max: usize::from(u16::MAX),
        })?;

        let pinned_seq = overrides.has_snd_seq();
        let header = self
            .defaults(len_body, unix_time())
            .snd_seq(0)
            .merge(overrides)
            .build()?;

        let stream = PacketStream::new(
            header,
            pinned_seq,
            body,
            self.config.max_chunk_size,
            Arc::clone(&self.counter),
        );

        debug!(
            len = len_body,
            packets = stream.len(),
            msg_mj_type = header.msg_mj_type,
            msg_mi_type = header.msg_mi_type,
            "packing message"
        );
        Metrics::record_message_packed();

        Ok(stream)
    }
}

impl Default for Packer {
    fn default() -> Self {
        Self {
            config: PacketConfig::default(),
            counter: SequenceCounter::global(),
        }
    }
}

/// Pack a message with the default configuration and the process-wide counter
pub fn pack(overrides: HeaderBuilder, body: impl Into<Bytes>) -> Result<PacketStream> {
    Packer::default().pack(overrides, body)
}

/// Unpack one packet into its header and body
///
/// # Format
///
/// ```text
/// [HEADER (40 bytes)] [BODY (variable)] [CRC-32 of BODY (4 bytes)]
/// ```
///
/// The body is returned exactly as received; a fragment still carries its
/// 4-byte index prefix.
///
/// # Errors
///
/// Returns an error if:
/// - The packet is shorter than 44 bytes
/// - The body CRC-32 doesn't match the footer
/// - The header CRC-16 doesn't match
pub fn unpack(packet: impl Into<Bytes>) -> Result<(PacketHeader, Bytes)> {
    let packet = packet.into();

    match unpack_inner(&packet) {
        Ok(unpacked) => {
            Metrics::record_unpacked();
            Ok(unpacked)
        }
        Err(err) => {
            warn!(error = %err, len = packet.len(), "rejecting packet");
            Metrics::record_rejection(&err);
            Err(err)
        }
    }
}

fn unpack_inner(packet: &Bytes) -> Result<(PacketHeader, Bytes)> {
    if packet.len() < MIN_PACKET_SIZE {
        return Err(Error::InvalidPacketLength { len: packet.len() });
    }

    let body_end = packet.len() - FOOTER_SIZE;
    let mut footer = [0u8; FOOTER_SIZE];
    footer.copy_from_slice(&packet[body_end..]);

    let found = u32::from_be_bytes(footer);
    let expected = crc32(&packet[HEADER_SIZE..body_end]);
    if found != expected {
        return Err(Error::BodyIntegrity { expected, found });
    }

    let header = PacketHeader::from_bytes(&packet[..HEADER_SIZE])?;
    Ok((header, packet.slice(HEADER_SIZE..body_end)))
}

/// Decode only the header of a packet, skipping the body check
pub fn get_header(packet: &[u8]) -> Result<PacketHeader> {
    PacketHeader::from_bytes(&packet[..packet.len().min(HEADER_SIZE)])
}

fn unix_time() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX)
        })
}
