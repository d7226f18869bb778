//! Header value types: packed flags and protocol version

use std::fmt;
use std::str::FromStr;

use super::Error;

/// Packet flags: two 3-bit priorities and a FIFO/LIFO preference, packed in one byte
///
/// # Wire Format
///
/// ```text
///  7 6 5 4 3 2 1 0
/// +-+-+-+-+-+-+-+-+
/// |  A  |  B  |F|0|
/// +-+-+-+-+-+-+-+-+
/// ```
///
/// Priorities are expected in `[0, 7]`. Larger values are not rejected: the
/// shift drops their high bits, exactly like existing producers do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Flags {
    /// First priority (bits 7..5)
    pub priority_a: u8,
    /// Second priority (bits 4..2)
    pub priority_b: u8,
    /// Ordering preference (bit 1); `true` requests FIFO delivery
    pub fifo: bool,
}

impl Flags {
    /// Flags applied to outgoing packets unless configured otherwise
    pub const DEFAULT: Self = Self::new(1, 1, true);

    /// Create flags from their three components
    #[must_use]
    pub const fn new(priority_a: u8, priority_b: u8, fifo: bool) -> Self {
        Self {
            priority_a,
            priority_b,
            fifo,
        }
    }

    /// Pack into the header byte
    #[must_use]
    pub fn as_u8(self) -> u8 {
        encode_flags(self.priority_a, self.priority_b, self.fifo)
    }

    /// Unpack from the header byte
    #[must_use]
    pub fn from_u8(byte: u8) -> Self {
        let (priority_a, priority_b, fifo) = decode_flags(byte);
        Self::new(priority_a, priority_b, fifo)
    }
}

impl Default for Flags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<(u8, u8, bool)> for Flags {
    fn from((priority_a, priority_b, fifo): (u8, u8, bool)) -> Self {
        Self::new(priority_a, priority_b, fifo)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.priority_a, self.priority_b, self.fifo)
    }
}

/// Pack `(a, b, fifo)` as `(a << 5) | (b << 2) | (fifo << 1)`.
///
/// Bits shifted past the top of the byte are lost; nothing is validated.
#[must_use]
pub fn encode_flags(priority_a: u8, priority_b: u8, fifo: bool) -> u8 {
    (priority_a << 5) | (priority_b << 2) | (u8::from(fifo) << 1)
}

/// Inverse of [`encode_flags`] for in-range inputs.
#[must_use]
pub const fn decode_flags(byte: u8) -> (u8, u8, bool) {
    ((byte & 0xE0) >> 5, (byte & 0x1C) >> 2, (byte & 0x02) >> 1 == 1)
}

/// Protocol version carried in the first header byte as two nibbles
///
/// Encoding shifts `major` into the high nibble. Decoding masks the high nibble
/// but does not shift it back, so a decoded `major` is `16 * encoded_major`.
/// Deployed peers only ever send major 0, which round-trips unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtocolVersion {
    /// Major version
    pub major: u8,
    /// Minor version (only the low nibble reaches the wire)
    pub minor: u8,
}

impl ProtocolVersion {
    /// Version stamped on outgoing packets by default ("0.3")
    pub const CURRENT: Self = Self::new(0, 3);

    /// Create a version
    #[must_use]
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Pack into the header byte: `(major << 4) | (minor & 0xF)`
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        (self.major << 4) | (self.minor & 0x0F)
    }

    /// Unpack from the header byte: `major = byte & 0xF0`, `minor = byte & 0x0F`
    #[must_use]
    pub const fn from_u8(byte: u8) -> Self {
        Self::new(byte & 0xF0, byte & 0x0F)
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ProtocolVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidVersion {
            input: s.to_owned(),
        };

        let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
        let major = major.trim().parse::<u8>().map_err(|_| invalid())?;
        let minor = minor.trim().parse::<u8>().map_err(|_| invalid())?;

        Ok(Self::new(major, minor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_roundtrip() {
        let byte = encode_flags(3, 5, true);
        assert_eq!(byte, 0b0111_0110);
        assert_eq!(decode_flags(byte), (3, 5, true));

        let flags = Flags::from_u8(Flags::new(7, 0, false).as_u8());
        assert_eq!(flags, Flags::new(7, 0, false));
    }

    #[test]
    fn test_flags_out_of_range_truncates() {
        // 9 = 0b1001: only the low three bits survive the shift
        assert_eq!(encode_flags(9, 0, false), encode_flags(1, 0, false));
        assert_eq!(decode_flags(encode_flags(9, 0, false)), (1, 0, false));
    }

    #[test]
    fn test_flags_out_of_range_b_bleeds_into_a() {
        // 9 << 2 sets bit 5, which belongs to priority A
        assert_eq!(encode_flags(0, 9, false), 0b0010_0100);
        assert_eq!(decode_flags(encode_flags(0, 9, false)), (1, 1, false));
    }

    #[test]
    fn test_default_flags() {
        assert_eq!(Flags::default().as_u8(), 0b0010_0110);
        assert_eq!(Flags::from((1, 1, true)), Flags::DEFAULT);
        assert_eq!(Flags::DEFAULT.to_string(), "(1, 1, true)");
    }

    #[test]
    fn test_version_encoding() {
        assert_eq!(ProtocolVersion::CURRENT.as_u8(), 0x03);
        assert_eq!(ProtocolVersion::new(1, 2).as_u8(), 0x12);
        assert_eq!(ProtocolVersion::new(0, 0x1F).as_u8(), 0x0F);
    }

    #[test]
    fn test_version_decode_keeps_major_unshifted() {
        assert_eq!(ProtocolVersion::from_u8(0x03), ProtocolVersion::new(0, 3));
        assert_eq!(ProtocolVersion::from_u8(0x03).to_string(), "0.3");

        // Major 1 encodes as 0x10 and decodes as 16
        let decoded = ProtocolVersion::from_u8(ProtocolVersion::new(1, 2).as_u8());
        assert_eq!(decoded, ProtocolVersion::new(16, 2));
        assert_eq!(decoded.to_string(), "16.2");
    }

    #[test]
    fn test_version_parse() {
        assert_eq!(
            "0.3".parse::<ProtocolVersion>().unwrap(),
            ProtocolVersion::CURRENT
        );
        assert_eq!(
            "2.10".parse::<ProtocolVersion>().unwrap(),
            ProtocolVersion::new(2, 10)
        );

        for bad in ["", "3", "a.b", "1.2.3", "300.1"] {
            assert!(matches!(
                bad.parse::<ProtocolVersion>(),
                Err(Error::InvalidVersion { .. })
            ));
        }
    }
}
