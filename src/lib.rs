//! Waggle packet protocol - wire codec for sensor-node-to-cloud telemetry
//!
//! This library turns a structured message (typed header fields plus an opaque
//! body) into one or more self-validating byte packets, and turns received
//! packets back into structured data, rejecting anything corrupted in transit.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use waggle_packet::{HeaderBuilder, pack, unpack};
//!
//! // Supply the message type, let the codec fill in the rest
//! let overrides = HeaderBuilder::new().msg_mj_type(1).msg_mi_type(2);
//!
//! for packet in pack(overrides, b"hello".to_vec())? {
//!     let (header, body) = unpack(packet)?;
//!     assert_eq!(header.msg_mj_type, 1);
//!     assert_eq!(body.as_ref(), b"hello");
//! }
//! # Ok::<(), waggle_packet::Error>(())
//! ```
//!
//! # Wire Format
//!
//! ```text
//! [HEADER (40 bytes, CRC-16 protected)] [BODY (variable)] [FOOTER (CRC-32 of body, 4 bytes)]
//! ```
//!
//! Bodies of 1024 bytes or more are split into fragments whose bodies carry a
//! 4-byte big-endian fragment index ahead of each chunk. Reassembly is left to
//! the receiver.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;

pub use protocol::{
    Error, FOOTER_SIZE, FRAGMENT_INDEX_SIZE, Flags, HEADER_SIZE, HeaderBuilder, HeaderField,
    MAX_PACKET_SIZE, MAX_SEQ_NUMBER, MIN_PACKET_SIZE, MetricsSnapshot, PacketConfig, PacketHeader,
    PacketStream, Packer, ProtocolVersion, Result, SequenceCounter, crc16, crc32, decode_flags,
    encode_flags, format_node_id, fragment_index, get_header, metrics, pack, set_header_field,
    split_fragment, unpack, write_header_crc,
};

/// Waggle packet protocol version spoken by this crate
pub const VERSION: &str = "0.3";
