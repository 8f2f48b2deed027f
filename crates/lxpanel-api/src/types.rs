//! Canonical shapes of manager resources.

use lxpanel_common::Protocol;
use serde::{Deserialize, Serialize};

/// A NAT forwarding rule stored on the manager.
///
/// A range rule has nonzero `*_end` fields; a single-port rule has both
/// set to `0`. Every stored rule carries exactly one protocol, so a
/// dual-protocol mapping appears as two rules with the same port tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireRule")]
pub struct ForwardingRule {
    /// External (host) start port.
    pub external_port: u16,
    /// Internal (container) start port.
    pub internal_port: u16,
    /// External end port, `0` for a single port.
    pub external_port_end: u16,
    /// Internal end port, `0` for a single port.
    pub internal_port_end: u16,
    /// Protocol, `None` when the manager reported something unknown.
    pub protocol: Option<Protocol>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ForwardingRule {
    /// A single-port rule.
    #[must_use]
    pub const fn single(external_port: u16, internal_port: u16, protocol: Protocol) -> Self {
        Self {
            external_port,
            internal_port,
            external_port_end: 0,
            internal_port_end: 0,
            protocol: Some(protocol),
            description: None,
        }
    }

    /// A range rule covering `external_port..=external_port_end`.
    #[must_use]
    pub const fn range(
        external_port: u16,
        external_port_end: u16,
        internal_port: u16,
        internal_port_end: u16,
        protocol: Protocol,
    ) -> Self {
        Self {
            external_port,
            internal_port,
            external_port_end,
            internal_port_end,
            protocol: Some(protocol),
            description: None,
        }
    }

    /// Whether this rule covers a port range.
    #[must_use]
    pub const fn is_range(&self) -> bool {
        self.external_port_end > 0
    }

    /// The protocol-independent port tuple
    /// `(external, internal, external_end, internal_end)`.
    #[must_use]
    pub const fn port_tuple(&self) -> (u16, u16, u16, u16) {
        (
            self.external_port,
            self.internal_port,
            self.external_port_end,
            self.internal_port_end,
        )
    }
}

/// Rule as the manager sends it, under either naming scheme.
#[derive(Deserialize)]
struct WireRule {
    #[serde(default, deserialize_with = "crate::de::opt_port")]
    external_port: Option<u16>,
    #[serde(default, deserialize_with = "crate::de::opt_port")]
    dport: Option<u16>,
    #[serde(default, deserialize_with = "crate::de::opt_port")]
    internal_port: Option<u16>,
    #[serde(default, deserialize_with = "crate::de::opt_port")]
    sport: Option<u16>,
    #[serde(default, deserialize_with = "crate::de::opt_port")]
    external_port_end: Option<u16>,
    #[serde(default, deserialize_with = "crate::de::opt_port")]
    dport_end: Option<u16>,
    #[serde(default, deserialize_with = "crate::de::opt_port")]
    internal_port_end: Option<u16>,
    #[serde(default, deserialize_with = "crate::de::opt_port")]
    sport_end: Option<u16>,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    dtype: Option<String>,
    #[serde(default, deserialize_with = "crate::de::opt_text")]
    description: Option<String>,
}

impl From<WireRule> for ForwardingRule {
    fn from(wire: WireRule) -> Self {
        Self {
            external_port: wire.external_port.or(wire.dport).unwrap_or_default(),
            internal_port: wire.internal_port.or(wire.sport).unwrap_or_default(),
            external_port_end: wire
                .external_port_end
                .or(wire.dport_end)
                .unwrap_or_default(),
            internal_port_end: wire
                .internal_port_end
                .or(wire.sport_end)
                .unwrap_or_default(),
            protocol: wire
                .protocol
                .or(wire.dtype)
                .and_then(|p| p.parse().ok()),
            description: wire.description.filter(|d| !d.is_empty()),
        }
    }
}

/// Answer of the NAT port availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAvailability {
    /// Whether the port may be claimed.
    #[serde(default)]
    pub available: bool,
    /// Why the port is unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PortAvailability {
    /// The port is free.
    #[must_use]
    pub const fn available() -> Self {
        Self {
            available: true,
            reason: None,
        }
    }

    /// The port is taken.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            reason: Some(reason.into()),
        }
    }
}

/// A dedicated IPv6 address bound to the container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ipv6Binding {
    /// The public address.
    #[serde(default)]
    pub public_ipv6: String,
    /// Free-text description.
    #[serde(
        default,
        deserialize_with = "crate::de::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    /// Any further fields the manager reports.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A reverse-proxy domain bound to the container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyBinding {
    /// Bound domain.
    #[serde(default)]
    pub domain: String,
    /// Container port the domain forwards to.
    #[serde(default, deserialize_with = "crate::de::number")]
    pub container_port: u32,
    /// Free-text description.
    #[serde(
        default,
        deserialize_with = "crate::de::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    /// Any further fields the manager reports.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_canonical_names() {
        let rule: ForwardingRule = serde_json::from_str(
            r#"{"external_port":10022,"internal_port":22,"protocol":"tcp"}"#,
        )
        .unwrap();
        assert_eq!(rule, ForwardingRule::single(10022, 22, Protocol::Tcp));
        assert!(!rule.is_range());
    }

    #[test]
    fn decodes_short_names_and_strings() {
        let rule: ForwardingRule = serde_json::from_str(
            r#"{"dport":"20000","sport":"8000","dport_end":"20009","sport_end":8009,"dtype":"UDP"}"#,
        )
        .unwrap();
        assert_eq!(
            rule,
            ForwardingRule::range(20000, 20009, 8000, 8009, Protocol::Udp)
        );
        assert!(rule.is_range());
    }

    #[test]
    fn canonical_name_wins_over_short_name() {
        let rule: ForwardingRule =
            serde_json::from_str(r#"{"external_port":10001,"dport":10002,"sport":80}"#).unwrap();
        assert_eq!(rule.external_port, 10001);
        assert_eq!(rule.internal_port, 80);
        assert_eq!(rule.protocol, None);
    }

    #[test]
    fn empty_and_null_ends_are_single() {
        let rule: ForwardingRule = serde_json::from_str(
            r#"{"dport":10080,"sport":80,"dport_end":"","sport_end":null,"protocol":"tcp"}"#,
        )
        .unwrap();
        assert_eq!(rule.port_tuple(), (10080, 80, 0, 0));
    }

    #[test]
    fn numeric_description_is_kept_as_text() {
        let rule: ForwardingRule = serde_json::from_str(
            r#"{"dport":10080,"sport":80,"dtype":"tcp","description":7}"#,
        )
        .unwrap();
        assert_eq!(rule.description.as_deref(), Some("7"));

        let rule: ForwardingRule =
            serde_json::from_str(r#"{"dport":10081,"sport":81,"description":null}"#).unwrap();
        assert!(rule.description.is_none());
    }

    #[test]
    fn serializes_canonical_shape() {
        let rule = ForwardingRule::single(10022, 22, Protocol::Tcp);
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["external_port"], 10022);
        assert_eq!(json["protocol"], "tcp");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn proxy_binding_keeps_extra_fields() {
        let binding: ProxyBinding = serde_json::from_str(
            r#"{"domain":"app.example.com","container_port":"8080","ssl_enabled":true}"#,
        )
        .unwrap();
        assert_eq!(binding.container_port, 8080);
        assert_eq!(binding.extra["ssl_enabled"], true);
    }
}
