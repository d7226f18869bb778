//! Header and body checksums

use crc::{CRC_16_ARC, CRC_32_ISO_HDLC, Crc};

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// CRC-16/ARC (reflected polynomial 0xA001). Protects the header.
#[must_use]
pub fn crc16(bytes: &[u8]) -> u16 {
    CRC16.checksum(bytes)
}

/// CRC-32 (IEEE 802.3). Protects the body.
#[must_use]
pub fn crc32(bytes: &[u8]) -> u32 {
    CRC32.checksum(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_check_value() {
        assert_eq!(crc16(b"123456789"), 0xBB3D);
        assert_eq!(crc16(b""), 0);
    }

    #[test]
    fn test_crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn test_single_bit_changes_checksum() {
        let data = b"waggle".to_vec();
        let mut flipped = data.clone();
        flipped[2] ^= 0x01;

        assert_ne!(crc16(&data), crc16(&flipped));
        assert_ne!(crc32(&data), crc32(&flipped));
    }
}
