//! Transport protocols and network modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Rejection;

/// A single transport protocol, as stored on one forwarding rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP protocol.
    Tcp,
    /// UDP protocol.
    Udp,
}

impl Protocol {
    /// Get the protocol string used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            _ => Err(Rejection::UnsupportedProtocol {
                protocol: s.to_string(),
            }),
        }
    }
}

/// Protocol descriptor for a mutation: one protocol or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolSelector {
    /// TCP only.
    Tcp,
    /// UDP only.
    Udp,
    /// Mirrored into a TCP and a UDP rule.
    Both,
}

impl ProtocolSelector {
    /// Get the descriptor string used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Both => "both",
        }
    }

    /// The one protocol this selector names, `None` for [`Self::Both`].
    #[must_use]
    pub const fn single(&self) -> Option<Protocol> {
        match self {
            Self::Tcp => Some(Protocol::Tcp),
            Self::Udp => Some(Protocol::Udp),
            Self::Both => None,
        }
    }

    /// The concrete protocols this selector expands to, TCP first.
    #[must_use]
    pub const fn protocols(&self) -> &'static [Protocol] {
        match self {
            Self::Tcp => &[Protocol::Tcp],
            Self::Udp => &[Protocol::Udp],
            Self::Both => &[Protocol::Tcp, Protocol::Udp],
        }
    }
}

impl fmt::Display for ProtocolSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProtocolSelector {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "both" => Ok(Self::Both),
            _ => Err(Rejection::UnsupportedProtocol {
                protocol: s.to_string(),
            }),
        }
    }
}

impl From<Protocol> for ProtocolSelector {
    fn from(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Tcp => Self::Tcp,
            Protocol::Udp => Self::Udp,
        }
    }
}

/// Container network mode configured for the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NetworkMode {
    /// Shared IPv4 behind NAT.
    #[default]
    #[serde(rename = "mode1")]
    NatShared,
    /// Shared IPv4 behind NAT plus dedicated IPv6.
    #[serde(rename = "mode2")]
    NatWithIpv6,
    /// Any mode this panel does not know.
    #[serde(other)]
    #[serde(rename = "unsupported")]
    Unsupported,
}

impl NetworkMode {
    /// Whether NAT port forwarding is available in this mode.
    #[must_use]
    pub const fn supports_nat(&self) -> bool {
        matches!(self, Self::NatShared | Self::NatWithIpv6)
    }

    /// Whether dedicated IPv6 bindings are available in this mode.
    #[must_use]
    pub const fn supports_ipv6(&self) -> bool {
        matches!(self, Self::NatWithIpv6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_parse_is_case_insensitive() {
        assert_eq!("TCP".parse::<Protocol>(), Ok(Protocol::Tcp));
        assert_eq!(" udp ".parse::<Protocol>(), Ok(Protocol::Udp));
        assert!("icmp".parse::<Protocol>().is_err());
    }

    #[test]
    fn selector_expansion() {
        assert_eq!(
            ProtocolSelector::Both.protocols(),
            &[Protocol::Tcp, Protocol::Udp]
        );
        assert_eq!(ProtocolSelector::Udp.protocols(), &[Protocol::Udp]);
        assert_eq!(
            "Both".parse::<ProtocolSelector>(),
            Ok(ProtocolSelector::Both)
        );
    }

    #[test]
    fn network_mode_features() {
        assert!(NetworkMode::NatShared.supports_nat());
        assert!(!NetworkMode::NatShared.supports_ipv6());
        assert!(NetworkMode::NatWithIpv6.supports_ipv6());
        assert!(!NetworkMode::Unsupported.supports_nat());
    }

    #[test]
    fn unknown_network_mode_deserializes_as_unsupported() {
        let mode: NetworkMode = serde_json::from_str("\"mode3\"").unwrap();
        assert_eq!(mode, NetworkMode::Unsupported);
        let mode: NetworkMode = serde_json::from_str("\"mode2\"").unwrap();
        assert_eq!(mode, NetworkMode::NatWithIpv6);
    }
}
