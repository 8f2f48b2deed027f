//! Reverse-proxy domain bindings.

use std::fmt;

use lxpanel_api::{AddProxyForm, DeleteProxyForm, ManagerApi, ProxyBinding};
use lxpanel_common::{PanelError, PanelResult, ProxyCapabilities, Rejection};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::outcome::ActionOutcome;

/// Shown when the reverse-proxy panel is disabled for the account.
pub const PROXY_DISABLED: &str =
    "Reverse proxy is disabled for this account, contact the administrator to enable it";

/// Container port used when none is given.
pub const DEFAULT_CONTAINER_PORT: u16 = 80;

static DOMAIN_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$")
        .map_err(|e| tracing::error!(error = %e, "Domain pattern failed to compile"))
        .ok()
});

/// Whether `domain` is a syntactically valid DNS name.
#[must_use]
pub fn is_valid_domain(domain: &str) -> bool {
    DOMAIN_RE.as_ref().is_some_and(|re| re.is_match(domain))
}

/// Certificate source for a TLS-terminating binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SslType {
    /// Certificate generated by the manager.
    #[default]
    SelfSigned,
    /// Certificate issued through ACME.
    Letsencrypt,
    /// Certificate and key supplied by the account holder.
    Custom,
}

impl SslType {
    /// Get the value used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SelfSigned => "self-signed",
            Self::Letsencrypt => "letsencrypt",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for SslType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reverse-proxy add request as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddProxyRequest {
    /// Domain to bind.
    pub domain: String,
    /// Container port to forward to.
    pub container_port: u16,
    /// Free-text description.
    pub description: String,
    /// Whether to terminate TLS.
    pub ssl_enabled: bool,
    /// Certificate source.
    pub ssl_type: SslType,
    /// PEM certificate.
    pub ssl_cert: Option<String>,
    /// PEM private key.
    pub ssl_key: Option<String>,
}

impl AddProxyRequest {
    /// A plain HTTP binding of `domain` to port 80.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            container_port: DEFAULT_CONTAINER_PORT,
            description: String::new(),
            ssl_enabled: false,
            ssl_type: SslType::default(),
            ssl_cert: None,
            ssl_key: None,
        }
    }

    /// Forward to `port` instead of 80.
    #[must_use]
    pub const fn with_container_port(mut self, port: u16) -> Self {
        self.container_port = port;
        self
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Terminate TLS with a certificate from `ssl_type`.
    #[must_use]
    pub const fn with_ssl(mut self, ssl_type: SslType) -> Self {
        self.ssl_enabled = true;
        self.ssl_type = ssl_type;
        self
    }

    /// Supply certificate and key for [`SslType::Custom`].
    #[must_use]
    pub fn with_certificate(mut self, cert: impl Into<String>, key: impl Into<String>) -> Self {
        self.ssl_cert = Some(cert.into());
        self.ssl_key = Some(key.into());
        self
    }

    const fn is_custom_ssl(&self) -> bool {
        self.ssl_enabled && matches!(self.ssl_type, SslType::Custom)
    }

    fn to_form(&self, hostname: &str, domain: &str) -> AddProxyForm {
        let material = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|_| self.is_custom_ssl())
                .map(str::to_string)
        };

        AddProxyForm {
            hostname: hostname.to_string(),
            domain: domain.to_string(),
            container_port: self.container_port,
            description: self.description.trim().to_string(),
            ssl_enabled: self.ssl_enabled,
            ssl_type: self.ssl_type.as_str().to_string(),
            ssl_cert: material(&self.ssl_cert),
            ssl_key: material(&self.ssl_key),
        }
    }
}

fn has_material(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn required_domain(domain: &str) -> Result<&str, Rejection> {
    let domain = domain.trim();
    if domain.is_empty() {
        Err(Rejection::MissingDomain)
    } else {
        Ok(domain)
    }
}

/// Reverse-proxy panel for one container.
pub struct ProxyPanel<'a, A: ?Sized> {
    api: &'a A,
    hostname: &'a str,
    caps: ProxyCapabilities,
}

impl<'a, A> ProxyPanel<'a, A>
where
    A: ManagerApi + ?Sized,
{
    /// Create a panel for `hostname`.
    pub const fn new(api: &'a A, hostname: &'a str, caps: ProxyCapabilities) -> Self {
        Self {
            api,
            hostname,
            caps,
        }
    }

    /// Domains bound, zero when the list cannot be fetched.
    pub async fn count(&self) -> u32 {
        match self.api.proxies(self.hostname).await {
            Ok(bindings) => u32::try_from(bindings.len()).unwrap_or(u32::MAX),
            Err(e) => {
                tracing::warn!(hostname = self.hostname, error = %e, "Failed to count proxies, assuming none");
                0
            }
        }
    }

    /// Bind a domain.
    pub async fn add(&self, request: &AddProxyRequest) -> PanelResult<ActionOutcome> {
        if !self.caps.enabled {
            return Err(PanelError::feature_disabled(PROXY_DISABLED));
        }

        let domain = required_domain(&request.domain)?;
        if !is_valid_domain(domain) {
            return Err(Rejection::InvalidDomain {
                domain: domain.to_string(),
            }
            .into());
        }

        let used = self.count().await;
        tracing::debug!(hostname = self.hostname, domain, used, limit = self.caps.limit, "Proxy usage");
        if used >= self.caps.limit {
            return Err(Rejection::ProxyLimitReached {
                limit: self.caps.limit,
            }
            .into());
        }

        if request.is_custom_ssl()
            && !(has_material(request.ssl_cert.as_ref()) && has_material(request.ssl_key.as_ref()))
        {
            return Err(Rejection::MissingSslMaterial.into());
        }

        self.api
            .add_proxy(&request.to_form(self.hostname, domain))
            .await?;

        tracing::info!(
            hostname = self.hostname,
            domain,
            container_port = request.container_port,
            ssl = request.ssl_enabled,
            "Reverse proxy added"
        );
        Ok(ActionOutcome::new("Reverse proxy added"))
    }

    /// Unbind a domain.
    pub async fn delete(&self, domain: &str) -> PanelResult<ActionOutcome> {
        let domain = required_domain(domain)?;

        self.api
            .delete_proxy(&DeleteProxyForm {
                hostname: self.hostname.to_string(),
                domain: domain.to_string(),
            })
            .await?;

        tracing::info!(hostname = self.hostname, domain, "Reverse proxy deleted");
        Ok(ActionOutcome::new("Reverse proxy deleted"))
    }

    /// Current bindings.
    pub async fn list(&self) -> PanelResult<Vec<ProxyBinding>> {
        self.api.proxies(self.hostname).await
    }

    /// Ask the manager whether `domain` can be bound.
    pub async fn check(&self, domain: &str) -> PanelResult<serde_json::Value> {
        let domain = required_domain(domain)?;
        self.api.check_proxy_domain(domain).await
    }
}
