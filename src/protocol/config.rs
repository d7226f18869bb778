//! Packer configuration

use super::{Error, Flags, MAX_PACKET_SIZE, ProtocolVersion, Result};

/// Configurable defaults for outgoing packets.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PacketConfig {
    /// Version stamped into `prot_ver`.
    pub protocol_version: ProtocolVersion,
    /// Flags used when the caller does not override them.
    pub default_flags: Flags,
    /// Bodies this long or longer are fragmented into chunks of at most this size.
    pub max_chunk_size: usize,
    /// Sender node id written to `s_uniqid`.
    pub sender_id: u64,
}

impl Default for PacketConfig {
    fn default() -> Self {
        Self {
            protocol_version: ProtocolVersion::CURRENT,
            default_flags: Flags::DEFAULT,
            max_chunk_size: MAX_PACKET_SIZE,
            sender_id: 0,
        }
    }
}

impl PacketConfig {
    /// Config for a node with a known id
    #[must_use]
    pub fn for_node(sender_id: u64) -> Self {
        Self {
            sender_id,
            ..Self::default()
        }
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(Error::InvalidConfig {
                reason: "max_chunk_size must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PacketConfig::default();
        assert_eq!(config.protocol_version.to_string(), "0.3");
        assert_eq!(config.default_flags, Flags::new(1, 1, true));
        assert_eq!(config.max_chunk_size, 1024);
        assert_eq!(config.sender_id, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_chunk_rejected() {
        let config = PacketConfig {
            max_chunk_size: 0,
            ..PacketConfig::for_node(7)
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_config_deserializes() {
        let config: PacketConfig =
            serde_json::from_str(r#"{ "sender_id": 42, "max_chunk_size": 512 }"#).unwrap();
        assert_eq!(config.sender_id, 42);
        assert_eq!(config.max_chunk_size, 512);
        assert_eq!(config.default_flags, Flags::DEFAULT);
    }
}
