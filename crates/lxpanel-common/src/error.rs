//! Common error types for lxpanel.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`PanelError`].
pub type PanelResult<T> = Result<T, PanelError>;

/// Common errors across lxpanel.
#[derive(Error, Diagnostic, Debug)]
pub enum PanelError {
    /// The account's configuration does not enable the requested feature.
    #[error("{message}")]
    #[diagnostic(
        code(lxpanel::feature::disabled),
        help("Ask the administrator to enable this feature for the account")
    )]
    FeatureDisabled {
        /// Message shown to the account holder.
        message: String,
    },

    /// The request was rejected before reaching the manager.
    #[error(transparent)]
    #[diagnostic(code(lxpanel::request::rejected))]
    Rejected(#[from] Rejection),

    /// The requested external port is already claimed.
    #[error("{reason}")]
    #[diagnostic(code(lxpanel::nat::unavailable))]
    Unavailable {
        /// Reason reported by the manager.
        reason: String,
    },

    /// The manager answered with a non-success code.
    #[error("{message}")]
    #[diagnostic(code(lxpanel::remote))]
    Remote {
        /// Response code.
        code: i64,
        /// Response message.
        message: String,
    },

    /// Every call of a multi-protocol mutation failed.
    #[error("{message}")]
    #[diagnostic(code(lxpanel::remote::all_failed))]
    MutationFailed {
        /// Per-protocol reasons, joined.
        message: String,
    },

    /// The manager could not be reached.
    #[error("Network error: {message}")]
    #[diagnostic(
        code(lxpanel::network),
        help("Check the manager endpoint and that the API server is running")
    )]
    Network {
        /// The error message.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(lxpanel::config))]
    Config {
        /// The error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(lxpanel::io))]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(lxpanel::serialization))]
    Serialization(String),
}

impl From<serde_json::Error> for PanelError {
    fn from(err: serde_json::Error) -> Self {
        PanelError::Serialization(err.to_string())
    }
}

impl PanelError {
    /// Create a [`PanelError::FeatureDisabled`].
    pub fn feature_disabled(message: impl Into<String>) -> Self {
        Self::FeatureDisabled {
            message: message.into(),
        }
    }
}

/// Reasons a request is refused locally.
///
/// Every variant is decided without contacting the manager.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Internal start port outside 1-65535.
    #[error("Internal port must be between 1 and 65535")]
    InternalPortOutOfRange,

    /// Internal range start is after its end.
    #[error("Internal port range is invalid: start must not exceed end")]
    InternalRangeOrder,

    /// External range start is after its end, or missing.
    #[error("External port range is invalid: start must be set and must not exceed end")]
    ExternalRangeOrder,

    /// Internal and external ranges differ in width.
    #[error(
        "Internal and external ranges must contain the same number of ports ({internal} vs {external})"
    )]
    RangeWidthMismatch {
        /// Internal width.
        internal: u32,
        /// External width.
        external: u32,
    },

    /// A range endpoint falls outside its side's bounds.
    #[error("Port range is out of bounds: internal 1-65535, external 10000-65535")]
    RangeOutOfBounds,

    /// The range would exceed the NAT quota.
    #[error(
        "Port range spans {width} ports and would exceed the NAT rule limit (remaining quota: {remaining})"
    )]
    RangeExceedsQuota {
        /// Ports in the requested range.
        width: u32,
        /// Quota slots still free.
        remaining: u32,
    },

    /// No NAT quota is left for a single mapping.
    #[error("NAT rule limit reached ({limit} rules), no more rules can be added")]
    NatLimitReached {
        /// Configured limit.
        limit: u32,
    },

    /// External port outside 10000-65535.
    #[error("External port must be between 10000 and 65535")]
    ExternalPortOutOfRange,

    /// Protocol is not one of the accepted values.
    #[error("Unsupported protocol: {protocol}")]
    UnsupportedProtocol {
        /// The protocol as given.
        protocol: String,
    },

    /// No IPv6 quota is left.
    #[error("IPv6 binding limit reached ({limit}), no more bindings can be added")]
    Ipv6LimitReached {
        /// Configured limit.
        limit: u32,
    },

    /// No IPv6 address was given.
    #[error("Missing IPv6 address")]
    MissingIpv6Address,

    /// No domain was given.
    #[error("Missing domain")]
    MissingDomain,

    /// The domain is not a valid DNS name.
    #[error("Invalid domain: {domain}")]
    InvalidDomain {
        /// The rejected domain.
        domain: String,
    },

    /// No reverse-proxy quota is left.
    #[error("Reverse proxy limit reached ({limit}), no more domains can be added")]
    ProxyLimitReached {
        /// Configured limit.
        limit: u32,
    },

    /// Custom SSL without certificate or key.
    #[error("Custom SSL requires both a certificate and a private key")]
    MissingSslMaterial,
}
