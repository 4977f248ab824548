// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Configuration of the ICMP responder

use derive_builder::Builder;
use net::ipv4::Ipv4;
use serde::{Deserialize, Serialize};

/// What to do with a packet whose transport payload is shorter than the 8 octets an ICMP
/// error normally quotes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShortPacketPolicy {
    /// Quote whatever follows the IP header.
    #[default]
    Truncate,
    /// Refuse to answer.
    Reject,
}

/// Parameters of the replies built by [`IcmpResponder`](crate::IcmpResponder).
///
/// Build it with [`ReplyConfigBuilder`] or deserialize it; a TTL of zero is refused either way.
#[derive(Builder, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[builder(derive(Debug, Deserialize), build_fn(validate = "Self::validate"))]
#[builder_struct_attr(serde(deny_unknown_fields, rename_all = "kebab-case"))]
#[serde(try_from = "ReplyConfigBuilder", rename_all = "kebab-case")]
pub struct ReplyConfig {
    /// TTL of the outer IPv4 header
    #[builder(default = "Ipv4::DEFAULT_TTL")]
    ttl: u8,
    /// TOS octet of the outer IPv4 header
    #[builder(default)]
    tos: u8,
    /// Handling of packets with less than 8 octets after the IP header
    #[builder(default)]
    short_packets: ShortPacketPolicy,
}

impl ReplyConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.ttl == Some(0) {
            return Err("reply TTL must not be zero".to_string());
        }
        Ok(())
    }
}

impl TryFrom<ReplyConfigBuilder> for ReplyConfig {
    type Error = ReplyConfigBuilderError;

    fn try_from(builder: ReplyConfigBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}

impl Default for ReplyConfig {
    fn default() -> Self {
        ReplyConfig {
            ttl: Ipv4::DEFAULT_TTL,
            tos: 0,
            short_packets: ShortPacketPolicy::default(),
        }
    }
}

impl ReplyConfig {
    /// TTL of the outer IPv4 header
    #[must_use]
    pub fn ttl(&self) -> u8 {
        self.ttl
    }

    /// TOS octet of the outer IPv4 header
    #[must_use]
    pub fn tos(&self) -> u8 {
        self.tos
    }

    /// Handling of packets with a short transport payload
    #[must_use]
    pub fn short_packets(&self) -> ShortPacketPolicy {
        self.short_packets
    }
}

#[cfg(test)]
mod test {
    use crate::config::{ReplyConfig, ReplyConfigBuilder, ShortPacketPolicy};

    #[test]
    fn builder_defaults() {
        let config = ReplyConfigBuilder::default().build().unwrap();
        assert_eq!(config, ReplyConfig::default());
        assert_eq!(config.ttl(), 64);
        assert_eq!(config.tos(), 0);
        assert_eq!(config.short_packets(), ShortPacketPolicy::Truncate);
    }

    #[test]
    fn builder_rejects_zero_ttl() {
        assert!(ReplyConfigBuilder::default().ttl(0).build().is_err());
        let config = ReplyConfigBuilder::default()
            .ttl(255)
            .tos(0xc0)
            .short_packets(ShortPacketPolicy::Reject)
            .build()
            .unwrap();
        assert_eq!(config.ttl(), 255);
        assert_eq!(config.tos(), 0xc0);
        assert_eq!(config.short_packets(), ShortPacketPolicy::Reject);
    }

    #[test]
    fn load_from_yaml() {
        let config: ReplyConfig =
            serde_yaml_ng::from_str("ttl: 32\nshort-packets: reject\n").unwrap();
        assert_eq!(config.ttl(), 32);
        assert_eq!(config.tos(), 0);
        assert_eq!(config.short_packets(), ShortPacketPolicy::Reject);

        let config: ReplyConfig = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(config, ReplyConfig::default());
    }

    #[test]
    fn yaml_is_validated() {
        assert!(serde_yaml_ng::from_str::<ReplyConfig>("ttl: 0\n").is_err());
        assert!(serde_yaml_ng::from_str::<ReplyConfig>("hop-limit: 3\n").is_err());
        assert!(serde_yaml_ng::from_str::<ReplyConfig>("short-packets: pad\n").is_err());
    }

    #[test]
    fn yaml_round_trip() {
        let config = ReplyConfigBuilder::default()
            .ttl(7)
            .short_packets(ShortPacketPolicy::Reject)
            .build()
            .unwrap();
        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        assert!(yaml.contains("short-packets: reject"));
        assert_eq!(serde_yaml_ng::from_str::<ReplyConfig>(&yaml).unwrap(), config);
    }
}
