//! Waggle packet protocol core implementation
//!
//! This module provides the wire format, header layout, checksums,
//! fragmentation and the pack/unpack facade.

mod checksum;
mod codec;
mod config;
mod error;
mod fragment;
mod header;
mod metrics;
mod sequence;
mod types;

pub use checksum::{crc16, crc32};
pub use codec::{Packer, get_header, pack, unpack};
pub use config::PacketConfig;
pub use error::{Error, Result};
pub use fragment::{PacketStream, fragment_index, split_fragment};
pub use header::{
    HeaderBuilder, HeaderField, PacketHeader, format_node_id, set_header_field, write_header_crc,
};
pub use metrics::{MetricsSnapshot, metrics};
pub use sequence::SequenceCounter;
pub use types::{Flags, ProtocolVersion, decode_flags, encode_flags};

/// Header size in bytes
pub const HEADER_SIZE: usize = 40;

/// Footer (CRC-32 of the body) size in bytes
pub const FOOTER_SIZE: usize = 4;

/// Minimum packet size (header + footer, empty body)
pub const MIN_PACKET_SIZE: usize = HEADER_SIZE + FOOTER_SIZE;

/// Bodies at or above this length are fragmented; also the maximum chunk size
pub const MAX_PACKET_SIZE: usize = 1024;

/// Size of the fragment index prefixed to every fragment body
pub const FRAGMENT_INDEX_SIZE: usize = 4;

/// Sequence numbers live in `[0, 2^24)`
pub const MAX_SEQ_NUMBER: u32 = 1 << 24;
