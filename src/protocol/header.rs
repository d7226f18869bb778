//! Waggle packet header
//!
//! The header is a fixed 40-byte big-endian record closed by its own CRC-16.

use super::checksum::crc16;
use super::{Error, Flags, HEADER_SIZE, ProtocolVersion, Result};

/// Offset of the header CRC-16; the checksum covers every byte before it.
const CRC16_OFFSET: usize = 38;

const SEQ_MASK: u32 = 0x00FF_FFFF;

/// Waggle packet header (40 bytes on the wire)
///
/// # Wire Format
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   prot_ver    |     flags     |           len_body            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                             time                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  msg_mj_type  |  msg_mi_type  |          snd_session          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                         s_uniqid (8)                          +
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          ext_header           |         resp_session          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                         r_uniqid (8)                          +
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 snd_seq (3)                   |   resp_seq    :
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// :    resp_seq (cont.)           |            crc-16             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PacketHeader {
    /// Protocol version
    pub prot_ver: ProtocolVersion,
    /// Priority and ordering flags
    pub flags: Flags,
    /// Total logical body length (the whole message, even on a fragment)
    pub len_body: u16,
    /// Unix timestamp in seconds
    pub time: u32,
    /// Message major type
    pub msg_mj_type: u8,
    /// Message minor type
    pub msg_mi_type: u8,
    /// Sender session
    pub snd_session: u16,
    /// Sender unique id
    pub s_uniqid: u64,
    /// Extended header, reserved (0)
    pub ext_header: u16,
    /// Response session
    pub resp_session: u16,
    /// Recipient unique id (0 addresses the cloud)
    pub r_uniqid: u64,
    /// Send sequence number (24 bits)
    pub snd_seq: u32,
    /// Response sequence number (24 bits)
    pub resp_seq: u32,
}

impl PacketHeader {
    /// Serialize to the 40-byte wire form, CRC-16 included.
    ///
    /// Sequence numbers are truncated to their low 24 bits.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];

        bytes[0] = self.prot_ver.as_u8();
        bytes[1] = self.flags.as_u8();
        bytes[2..4].copy_from_slice(&self.len_body.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.time.to_be_bytes());
        bytes[8] = self.msg_mj_type;
        bytes[9] = self.msg_mi_type;
        bytes[10..12].copy_from_slice(&self.snd_session.to_be_bytes());
        bytes[12..20].copy_from_slice(&self.s_uniqid.to_be_bytes());
        bytes[20..22].copy_from_slice(&self.ext_header.to_be_bytes());
        bytes[22..24].copy_from_slice(&self.resp_session.to_be_bytes());
        bytes[24..32].copy_from_slice(&self.r_uniqid.to_be_bytes());
        bytes[32..35].copy_from_slice(&u24_to_be(self.snd_seq));
        bytes[35..38].copy_from_slice(&u24_to_be(self.resp_seq));

        write_header_crc(&mut bytes);
        bytes
    }

    /// Parse and CRC-16-verify a 40-byte header
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; HEADER_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::InvalidHeaderLength { len: bytes.len() })?;

        let found = u16::from_be_bytes(read(bytes, CRC16_OFFSET));
        let expected = crc16(&bytes[..CRC16_OFFSET]);
        if found != expected {
            return Err(Error::HeaderIntegrity { expected, found });
        }

        Ok(Self {
            prot_ver: ProtocolVersion::from_u8(bytes[0]),
            flags: Flags::from_u8(bytes[1]),
            len_body: u16::from_be_bytes(read(bytes, 2)),
            time: u32::from_be_bytes(read(bytes, 4)),
            msg_mj_type: bytes[8],
            msg_mi_type: bytes[9],
            snd_session: u16::from_be_bytes(read(bytes, 10)),
            s_uniqid: u64::from_be_bytes(read(bytes, 12)),
            ext_header: u16::from_be_bytes(read(bytes, 20)),
            resp_session: u16::from_be_bytes(read(bytes, 22)),
            r_uniqid: u64::from_be_bytes(read(bytes, 24)),
            snd_seq: u24_from_be(read(bytes, 32)),
            resp_seq: u24_from_be(read(bytes, 35)),
        })
    }
}

fn read<const N: usize>(bytes: &[u8; HEADER_SIZE], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}

fn u24_to_be(value: u32) -> [u8; 3] {
    let [_, hi, mid, lo] = (value & SEQ_MASK).to_be_bytes();
    [hi, mid, lo]
}

fn u24_from_be([hi, mid, lo]: [u8; 3]) -> u32 {
    u32::from_be_bytes([0, hi, mid, lo])
}

/// Header builder with every field optional
///
/// Used both to assemble a complete header and to carry caller overrides on
/// top of the defaults chosen by [`Packer`](super::Packer). [`build`](Self::build)
/// fails with [`Error::MissingField`] naming the first absent field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderBuilder {
    prot_ver: Option<ProtocolVersion>,
    flags: Option<Flags>,
    len_body: Option<u16>,
    time: Option<u32>,
    msg_mj_type: Option<u8>,
    msg_mi_type: Option<u8>,
    snd_session: Option<u16>,
    s_uniqid: Option<u64>,
    ext_header: Option<u16>,
    resp_session: Option<u16>,
    r_uniqid: Option<u64>,
    snd_seq: Option<u32>,
    resp_seq: Option<u32>,
}

macro_rules! builder_setters {
    ($($(#[$doc:meta])* $field:ident: $ty:ty;)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub const fn $field(mut self, value: $ty) -> Self {
                self.$field = Some(value);
                self
            }
        )*
    };
}

impl HeaderBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    builder_setters! {
        /// Set the protocol version
        prot_ver: ProtocolVersion;
        /// Set the priority/ordering flags
        flags: Flags;
        /// Set the total body length
        len_body: u16;
        /// Set the Unix timestamp
        time: u32;
        /// Set the message major type
        msg_mj_type: u8;
        /// Set the message minor type
        msg_mi_type: u8;
        /// Set the sender session
        snd_session: u16;
        /// Set the sender unique id
        s_uniqid: u64;
        /// Set the extended header
        ext_header: u16;
        /// Set the response session
        resp_session: u16;
        /// Set the recipient unique id
        r_uniqid: u64;
        /// Set the send sequence number
        snd_seq: u32;
        /// Set the response sequence number
        resp_seq: u32;
    }

    /// Whether a send sequence number has been supplied
    #[must_use]
    pub const fn has_snd_seq(&self) -> bool {
        self.snd_seq.is_some()
    }

    /// Layer `overrides` on top of `self`; fields set in `overrides` win.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            prot_ver: overrides.prot_ver.or(self.prot_ver),
            flags: overrides.flags.or(self.flags),
            len_body: overrides.len_body.or(self.len_body),
            time: overrides.time.or(self.time),
            msg_mj_type: overrides.msg_mj_type.or(self.msg_mj_type),
            msg_mi_type: overrides.msg_mi_type.or(self.msg_mi_type),
            snd_session: overrides.snd_session.or(self.snd_session),
            s_uniqid: overrides.s_uniqid.or(self.s_uniqid),
            ext_header: overrides.ext_header.or(self.ext_header),
            resp_session: overrides.resp_session.or(self.resp_session),
            r_uniqid: overrides.r_uniqid.or(self.r_uniqid),
            snd_seq: overrides.snd_seq.or(self.snd_seq),
            resp_seq: overrides.resp_seq.or(self.resp_seq),
        }
    }

    /// Produce a complete header, or name the first missing field
    pub fn build(&self) -> Result<PacketHeader> {
        fn require<T>(value: Option<T>, field: &'static str) -> Result<T> {
            value.ok_or(Error::MissingField { field })
        }

        Ok(PacketHeader {
            prot_ver: require(self.prot_ver, "prot_ver")?,
            flags: require(self.flags, "flags")?,
            len_body: require(self.len_body, "len_body")?,
            time: require(self.time, "time")?,
            msg_mj_type: require(self.msg_mj_type, "msg_mj_type")?,
            msg_mi_type: require(self.msg_mi_type, "msg_mi_type")?,
            ext_header: require(self.ext_header, "ext_header")?,
            s_uniqid: require(self.s_uniqid, "s_uniqid")?,
            r_uniqid: require(self.r_uniqid, "r_uniqid")?,
            snd_session: require(self.snd_session, "snd_session")?,
            resp_session: require(self.resp_session, "resp_session")?,
            snd_seq: require(self.snd_seq, "snd_seq")?,
            resp_seq: require(self.resp_seq, "resp_seq")?,
        })
    }

    /// Build and serialize in one step
    pub fn encode(&self) -> Result<[u8; HEADER_SIZE]> {
        Ok(self.build()?.to_bytes())
    }
}

impl From<PacketHeader> for HeaderBuilder {
    fn from(header: PacketHeader) -> Self {
        Self {
            prot_ver: Some(header.prot_ver),
            flags: Some(header.flags),
            len_body: Some(header.len_body),
            time: Some(header.time),
            msg_mj_type: Some(header.msg_mj_type),
            msg_mi_type: Some(header.msg_mi_type),
            snd_session: Some(header.snd_session),
            s_uniqid: Some(header.s_uniqid),
            ext_header: Some(header.ext_header),
            resp_session: Some(header.resp_session),
            r_uniqid: Some(header.r_uniqid),
            snd_seq: Some(header.snd_seq),
            resp_seq: Some(header.resp_seq),
        }
    }
}

/// Header fields by position, for patching an already encoded header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum HeaderField {
    ProtVer,
    Flags,
    LenBody,
    Time,
    MsgMjType,
    MsgMiType,
    SndSession,
    SUniqid,
    ExtHeader,
    RespSession,
    RUniqid,
    SndSeq,
    RespSeq,
    Crc16,
}

impl HeaderField {
    /// All fields in wire order
    pub const ALL: [Self; 14] = [
        Self::ProtVer,
        Self::Flags,
        Self::LenBody,
        Self::Time,
        Self::MsgMjType,
        Self::MsgMiType,
        Self::SndSession,
        Self::SUniqid,
        Self::ExtHeader,
        Self::RespSession,
        Self::RUniqid,
        Self::SndSeq,
        Self::RespSeq,
        Self::Crc16,
    ];

    /// Field name as it appears in the protocol documents
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ProtVer => "prot_ver",
            Self::Flags => "flags",
            Self::LenBody => "len_body",
            Self::Time => "time",
            Self::MsgMjType => "msg_mj_type",
            Self::MsgMiType => "msg_mi_type",
            Self::SndSession => "snd_session",
            Self::SUniqid => "s_uniqid",
            Self::ExtHeader => "ext_header",
            Self::RespSession => "resp_session",
            Self::RUniqid => "r_uniqid",
            Self::SndSeq => "snd_seq",
            Self::RespSeq => "resp_seq",
            Self::Crc16 => "crc-16",
        }
    }

    /// Byte offset within the header
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            Self::ProtVer => 0,
            Self::Flags => 1,
            Self::LenBody => 2,
            Self::Time => 4,
            Self::MsgMjType => 8,
            Self::MsgMiType => 9,
            Self::SndSession => 10,
            Self::SUniqid => 12,
            Self::ExtHeader => 20,
            Self::RespSession => 22,
            Self::RUniqid => 24,
            Self::SndSeq => 32,
            Self::RespSeq => 35,
            Self::Crc16 => CRC16_OFFSET,
        }
    }

    /// Width in bytes
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::ProtVer | Self::Flags | Self::MsgMjType | Self::MsgMiType => 1,
            Self::LenBody
            | Self::SndSession
            | Self::ExtHeader
            | Self::RespSession
            | Self::Crc16 => 2,
            Self::SndSeq | Self::RespSeq => 3,
            Self::Time => 4,
            Self::SUniqid | Self::RUniqid => 8,
        }
    }
}

/// Overwrite one field of an encoded header.
///
/// The CRC-16 is left stale; call [`write_header_crc`] once patching is done.
pub fn set_header_field(
    header: &mut [u8; HEADER_SIZE],
    field: HeaderField,
    value: &[u8],
) -> Result<()> {
    if value.len() != field.width() {
        return Err(Error::FieldLengthMismatch {
            field: field.name(),
            expected: field.width(),
            got: value.len(),
        });
    }

    let start = field.offset();
    header[start..start + value.len()].copy_from_slice(value);
    Ok(())
}

/// Recompute the CRC-16 over the first 38 bytes and store it in the last two
pub fn write_header_crc(header: &mut [u8; HEADER_SIZE]) {
    let crc = crc16(&header[..CRC16_OFFSET]);
    header[CRC16_OFFSET..].copy_from_slice(&crc.to_be_bytes());
}

/// Render a node id as 16 lowercase, zero-padded hex digits
#[must_use]
pub fn format_node_id(node_id: u64) -> String {
    format!("{node_id:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PacketHeader {
        PacketHeader {
            prot_ver: ProtocolVersion::CURRENT,
            flags: Flags::new(2, 4, false),
            len_body: 0x0102,
            time: 0x0304_0506,
            msg_mj_type: 0x07,
            msg_mi_type: 0x08,
            snd_session: 0x090A,
            s_uniqid: 0x0B0C_0D0E_0F10_1112,
            ext_header: 0,
            resp_session: 0x1314,
            r_uniqid: 0x1516_1718_191A_1B1C,
            snd_seq: 0x1D_1E1F,
            resp_seq: 0x20_2122,
        }
    }

    #[test]
    fn test_header_layout() {
        let bytes = sample().to_bytes();

        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(bytes[0], 0x03);
        assert_eq!(bytes[1], Flags::new(2, 4, false).as_u8());
        assert_eq!(&bytes[2..4], &[0x01, 0x02]);
        assert_eq!(&bytes[4..8], &[0x03, 0x04, 0x05, 0x06]);
        assert_eq!(&bytes[8..10], &[0x07, 0x08]);
        assert_eq!(&bytes[10..12], &[0x09, 0x0A]);
        assert_eq!(&bytes[12..20], &0x0B0C_0D0E_0F10_1112_u64.to_be_bytes());
        assert_eq!(&bytes[20..22], &[0, 0]);
        assert_eq!(&bytes[22..24], &[0x13, 0x14]);
        assert_eq!(&bytes[24..32], &0x1516_1718_191A_1B1C_u64.to_be_bytes());
        assert_eq!(&bytes[32..35], &[0x1D, 0x1E, 0x1F]);
        assert_eq!(&bytes[35..38], &[0x20, 0x21, 0x22]);
        assert_eq!(&bytes[38..40], &crc16(&bytes[..38]).to_be_bytes());
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample();
        let decoded = PacketHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_sequence_numbers_truncate_to_24_bits() {
        let mut header = sample();
        header.snd_seq = 0x0100_0005;
        let decoded = PacketHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(decoded.snd_seq, 5);
    }

    #[test]
    fn test_invalid_length() {
        let bytes = sample().to_bytes();

        for len in [0, 39, 41] {
            let mut buf = bytes.to_vec();
            buf.resize(len, 0);
            assert_eq!(
                PacketHeader::from_bytes(&buf),
                Err(Error::InvalidHeaderLength { len })
            );
        }
    }

    #[test]
    fn test_every_covered_bit_is_protected() {
        let bytes = sample().to_bytes();

        for byte in 0..CRC16_OFFSET {
            for bit in 0..8 {
                let mut corrupted = bytes;
                corrupted[byte] ^= 1 << bit;
                assert!(matches!(
                    PacketHeader::from_bytes(&corrupted),
                    Err(Error::HeaderIntegrity { .. })
                ));
            }
        }
    }

    #[test]
    fn test_builder_missing_field() {
        let builder = HeaderBuilder::new()
            .prot_ver(ProtocolVersion::CURRENT)
            .flags(Flags::DEFAULT)
            .len_body(0u16)
            .time(0u32);

        assert_eq!(
            builder.build(),
            Err(Error::MissingField {
                field: "msg_mj_type"
            })
        );
        assert_eq!(
            builder.encode(),
            Err(Error::MissingField {
                field: "msg_mj_type"
            })
        );
    }

    #[test]
    fn test_builder_merge_prefers_overrides() {
        let defaults = HeaderBuilder::from(sample());
        let overrides = HeaderBuilder::new().msg_mj_type(42u8).r_uniqid(7u64);

        let header = defaults.merge(overrides).build().unwrap();
        assert_eq!(header.msg_mj_type, 42);
        assert_eq!(header.r_uniqid, 7);
        assert_eq!(header.msg_mi_type, sample().msg_mi_type);
    }

    #[test]
    fn test_field_table_is_contiguous() {
        let mut expected_offset = 0;
        for field in HeaderField::ALL {
            assert_eq!(field.offset(), expected_offset, "{}", field.name());
            expected_offset += field.width();
        }
        assert_eq!(expected_offset, HEADER_SIZE);
    }

    #[test]
    fn test_set_header_field_and_rewrite_crc() {
        let mut bytes = sample().to_bytes();

        set_header_field(&mut bytes, HeaderField::RUniqid, &99u64.to_be_bytes()).unwrap();
        assert!(matches!(
            PacketHeader::from_bytes(&bytes),
            Err(Error::HeaderIntegrity { .. })
        ));

        write_header_crc(&mut bytes);
        let decoded = PacketHeader::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.r_uniqid, 99);
        assert_eq!(decoded.s_uniqid, sample().s_uniqid);
    }

    #[test]
    fn test_set_header_field_wrong_width() {
        let mut bytes = sample().to_bytes();
        let result = set_header_field(&mut bytes, HeaderField::SndSeq, &[1, 2]);

        assert_eq!(
            result,
            Err(Error::FieldLengthMismatch {
                field: "snd_seq",
                expected: 3,
                got: 2,
            })
        );
        assert_eq!(bytes, sample().to_bytes());
    }

    #[test]
    fn test_format_node_id() {
        assert_eq!(format_node_id(0), "0000000000000000");
        assert_eq!(format_node_id(0x001E_06AB_CDEF), "0000001e06abcdef");
    }
}
