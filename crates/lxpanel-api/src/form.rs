//! Form bodies for mutating manager calls.
//!
//! Optional fields are left out of the encoded body entirely rather than
//! sent empty; the manager treats a present-but-zero range field as a range.

use lxpanel_common::{Protocol, ProtocolSelector};
use serde::Serialize;

/// Body of `POST /api/addport`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddPortForm {
    /// Container name.
    pub hostname: String,
    /// `tcp`, `udp` or `both`.
    pub dtype: ProtocolSelector,
    /// Internal start port.
    pub sport: u16,
    /// Internal end port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport_end: Option<u16>,
    /// External start port, chosen by the manager when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dport: Option<u16>,
    /// External end port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dport_end: Option<u16>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AddPortForm {
    /// Whether this body describes a range.
    #[must_use]
    pub const fn is_range(&self) -> bool {
        self.sport_end.is_some() && self.dport_end.is_some()
    }
}

/// Body of `POST /api/delport`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletePortForm {
    /// Container name.
    pub hostname: String,
    /// A single protocol; dual-protocol deletes are two calls.
    pub dtype: Protocol,
    /// External start port.
    pub dport: u16,
    /// Internal start port.
    pub sport: u16,
    /// External end port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dport_end: Option<u16>,
    /// Internal end port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport_end: Option<u16>,
}

/// Body of `POST /api/ipv6/add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddIpv6Form {
    /// Container name.
    pub hostname: String,
    /// Free-text description.
    pub description: String,
}

/// Body of `POST /api/ipv6/delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteIpv6Form {
    /// Container name.
    pub hostname: String,
    /// Address to release.
    pub public_ipv6: String,
}

/// Body of `POST /api/proxy/add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddProxyForm {
    /// Container name.
    pub hostname: String,
    /// Domain to bind.
    pub domain: String,
    /// Container port to forward to.
    pub container_port: u16,
    /// Free-text description.
    pub description: String,
    /// Whether to terminate TLS.
    pub ssl_enabled: bool,
    /// `self-signed`, `letsencrypt` or `custom`.
    pub ssl_type: String,
    /// PEM certificate, custom SSL only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_cert: Option<String>,
    /// PEM private key, custom SSL only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_key: Option<String>,
}

/// Body of `POST /api/proxy/delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteProxyForm {
    /// Container name.
    pub hostname: String,
    /// Domain to unbind.
    pub domain: String,
}
