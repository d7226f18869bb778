//! Waggle packet error types

use thiserror::Error;

/// Waggle packet protocol errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required header field was never supplied
    #[error("header packing failed: required field `{field}` is missing")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// Encoded header is not exactly 40 bytes
    #[error("invalid header length: expected 40 bytes, got {len}")]
    InvalidHeaderLength {
        /// Length of the offending buffer
        len: usize,
    },

    /// Header CRC-16 check failed
    #[error("header CRC-16 mismatch: computed {expected:#06x}, stored {found:#06x}")]
    HeaderIntegrity {
        /// CRC-16 recomputed over the first 38 header bytes
        expected: u16,
        /// CRC-16 stored in the header
        found: u16,
    },

    /// Packet is shorter than header + footer
    #[error("invalid packet length: need at least 44 bytes, got {len}")]
    InvalidPacketLength {
        /// Length of the offending packet
        len: usize,
    },

    /// Body CRC-32 check failed
    #[error("body CRC-32 mismatch: computed {expected:#010x}, stored {found:#010x}")]
    BodyIntegrity {
        /// CRC-32 recomputed over the body
        expected: u32,
        /// CRC-32 stored in the footer
        found: u32,
    },

    /// Body length does not fit the 16-bit `len_body` field
    #[error("body too large: {size} bytes (max {max})")]
    BodyTooLarge {
        /// Body size
        size: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Value written into an encoded header has the wrong width
    #[error("field `{field}` is {expected} bytes wide, got {got} bytes")]
    FieldLengthMismatch {
        /// Field being written
        field: &'static str,
        /// Width of the field
        expected: usize,
        /// Width of the supplied value
        got: usize,
    },

    /// Protocol version string is not `major.minor`
    #[error("invalid protocol version: {input:?}")]
    InvalidVersion {
        /// Rejected input
        input: String,
    },

    /// Configuration failed validation
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong
        reason: String,
    },
}

impl Error {
    /// Whether this error reports corruption (as opposed to a malformed request)
    #[must_use]
    pub const fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::HeaderIntegrity { .. } | Self::BodyIntegrity { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
