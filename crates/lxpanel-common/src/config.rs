//! Panel configuration.
//!
//! The configuration file is TOML with two tables: `[manager]` describes how
//! to reach the Container Manager API and `[account]` holds the
//! per-subscription fields the panels are gated on.
//!
//! ```toml
//! [manager]
//! endpoint = "https://203.0.113.10:8443"
//! api_key = "secret"
//!
//! [account]
//! hostname = "c-1042"
//! network_mode = "mode2"
//! nat_limit = 5
//! udp_enabled = true
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PanelError, PanelResult};
use crate::protocol::{NetworkMode, ProtocolSelector};

/// Complete panel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Manager connection settings.
    pub manager: ManagerConfig,
    /// Account settings.
    pub account: AccountConfig,
}

impl PanelConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> PanelResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| PanelError::Config {
            message: format!("Failed to parse configuration: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> PanelResult<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(path).map_err(|e| PanelError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_toml(&content)
    }

    /// Replace the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.manager.api_key = api_key.into();
        self
    }

    fn validate(&self) -> PanelResult<()> {
        if self.manager.endpoint.trim().is_empty() {
            return Err(PanelError::Config {
                message: "manager.endpoint must not be empty".to_string(),
            });
        }
        if self.account.hostname.trim().is_empty() {
            return Err(PanelError::Config {
                message: "account.hostname must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Connection settings for the Container Manager API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Base URL, e.g. `https://host:port`.
    pub endpoint: String,
    /// Value of the `apikey` header.
    #[serde(default)]
    pub api_key: String,
    /// Connect timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Whole-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Accept self-signed manager certificates.
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
}

impl ManagerConfig {
    /// Create settings for an endpoint with default timeouts.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: String::new(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            accept_invalid_certs: true,
        }
    }

    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Per-subscription fields read from the account store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Container name on the manager.
    pub hostname: String,
    /// Network mode.
    #[serde(default)]
    pub network_mode: NetworkMode,
    /// NAT quota, in ports.
    #[serde(default = "default_nat_limit")]
    pub nat_limit: u32,
    /// Mirror every NAT rule into UDP as well.
    #[serde(default)]
    pub udp_enabled: bool,
    /// IPv6 binding quota.
    #[serde(default = "default_one")]
    pub ipv6_limit: u32,
    /// Whether bound IPv6 addresses may be removed by the account holder.
    #[serde(default = "default_true")]
    pub ipv6_allow_delete: bool,
    /// Whether the reverse-proxy panel is enabled.
    #[serde(default)]
    pub proxy_enabled: bool,
    /// Reverse-proxy domain quota.
    #[serde(default = "default_one")]
    pub proxy_limit: u32,
}

impl AccountConfig {
    /// Create an account with default limits.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            network_mode: NetworkMode::default(),
            nat_limit: default_nat_limit(),
            udp_enabled: false,
            ipv6_limit: 1,
            ipv6_allow_delete: true,
            proxy_enabled: false,
            proxy_limit: 1,
        }
    }

    /// NAT capabilities of this account.
    #[must_use]
    pub const fn nat_capabilities(&self) -> NatCapabilities {
        NatCapabilities {
            network_mode: self.network_mode,
            limit: self.nat_limit,
            udp_enabled: self.udp_enabled,
        }
    }

    /// IPv6 capabilities of this account.
    #[must_use]
    pub const fn ipv6_capabilities(&self) -> Ipv6Capabilities {
        Ipv6Capabilities {
            network_mode: self.network_mode,
            limit: self.ipv6_limit,
            allow_delete: self.ipv6_allow_delete,
        }
    }

    /// Reverse-proxy capabilities of this account.
    #[must_use]
    pub const fn proxy_capabilities(&self) -> ProxyCapabilities {
        ProxyCapabilities {
            enabled: self.proxy_enabled,
            limit: self.proxy_limit,
        }
    }
}

/// Feature gates and quota for NAT forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NatCapabilities {
    /// Network mode.
    pub network_mode: NetworkMode,
    /// Quota, in ports.
    pub limit: u32,
    /// Dual-protocol mirroring.
    pub udp_enabled: bool,
}

impl NatCapabilities {
    /// Capabilities for a NAT-capable account.
    #[must_use]
    pub const fn new(limit: u32) -> Self {
        Self {
            network_mode: NetworkMode::NatShared,
            limit,
            udp_enabled: false,
        }
    }

    /// Enable UDP mirroring.
    #[must_use]
    pub const fn with_udp(mut self) -> Self {
        self.udp_enabled = true;
        self
    }

    /// Set the network mode.
    #[must_use]
    pub const fn with_network_mode(mut self, mode: NetworkMode) -> Self {
        self.network_mode = mode;
        self
    }

    /// Protocol descriptor every add is issued with.
    #[must_use]
    pub const fn add_protocol(&self) -> ProtocolSelector {
        if self.udp_enabled {
            ProtocolSelector::Both
        } else {
            ProtocolSelector::Tcp
        }
    }
}

/// Feature gates and quota for IPv6 bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Capabilities {
    /// Network mode.
    pub network_mode: NetworkMode,
    /// Binding quota.
    pub limit: u32,
    /// Whether deletion is allowed.
    pub allow_delete: bool,
}

/// Feature gates and quota for reverse-proxy domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyCapabilities {
    /// Whether the panel is enabled.
    pub enabled: bool,
    /// Domain quota.
    pub limit: u32,
}

const fn default_connect_timeout() -> u64 {
    10
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_nat_limit() -> u32 {
    5
}

const fn default_one() -> u32 {
    1
}

const fn default_true() -> bool {
    true
}
