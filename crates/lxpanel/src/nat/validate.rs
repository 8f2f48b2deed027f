//! Admission decisions for NAT requests.
//!
//! These functions are pure: they look only at the request, the account's
//! capabilities and the usage counted beforehand, and never call the
//! manager.

use lxpanel_api::{AddPortForm, DeletePortForm};
use lxpanel_common::{
    NatCapabilities, PanelError, PanelResult, Protocol, ProtocolSelector, Rejection,
};

/// Highest valid port.
pub const PORT_MAX: u32 = 65535;

/// Lowest external port an account may claim.
pub const EXTERNAL_PORT_MIN: u32 = 10000;

/// Shown when the account's network mode has no NAT.
pub const NAT_DISABLED: &str =
    "NAT port forwarding is not enabled for this account, contact the administrator to configure a supported network mode";

/// A NAT add request as submitted.
///
/// Ports are kept wide so out-of-range input can be rejected with a reason
/// instead of failing to parse. `0` means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddRequest {
    /// Internal start port.
    pub internal_port: u32,
    /// External start port.
    pub external_port: u32,
    /// Internal end port.
    pub internal_port_end: u32,
    /// External end port.
    pub external_port_end: u32,
    /// Free-text description.
    pub description: Option<String>,
}

impl AddRequest {
    /// A single-port request; the manager picks the external port when none is given.
    #[must_use]
    pub fn single(internal_port: u32, external_port: Option<u32>) -> Self {
        Self {
            internal_port,
            external_port: external_port.unwrap_or_default(),
            ..Self::default()
        }
    }

    /// A range request mapping `external..=external_end` onto `internal..=internal_end`.
    #[must_use]
    pub fn range(internal_port: u32, internal_port_end: u32, external_port: u32, external_port_end: u32) -> Self {
        Self {
            internal_port,
            external_port,
            internal_port_end,
            external_port_end,
            description: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// A request is a range only when both end ports are given.
    #[must_use]
    pub const fn is_range(&self) -> bool {
        self.internal_port_end > 0 && self.external_port_end > 0
    }
}

/// A NAT delete request as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteRequest {
    /// `tcp`, `udp` or `both`.
    pub protocol: String,
    /// Internal start port.
    pub internal_port: u32,
    /// External start port.
    pub external_port: u32,
    /// Internal end port.
    pub internal_port_end: u32,
    /// External end port.
    pub external_port_end: u32,
}

/// Ports covered by an admitted mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSpan {
    /// One internal port, external port optional.
    Single {
        /// Internal port.
        internal: u16,
        /// External port, assigned by the manager when `None`.
        external: Option<u16>,
    },
    /// Equal-width port ranges on both sides.
    Range {
        /// Internal start port.
        internal: u16,
        /// Internal end port.
        internal_end: u16,
        /// External start port.
        external: u16,
        /// External end port.
        external_end: u16,
    },
}

impl PortSpan {
    /// Quota slots this span consumes.
    #[must_use]
    pub fn width(&self) -> u32 {
        match *self {
            Self::Single { .. } => 1,
            Self::Range {
                internal,
                internal_end,
                ..
            } => u32::from(internal_end - internal) + 1,
        }
    }
}

/// A validated add, ready for the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedMapping {
    /// Ports.
    pub span: PortSpan,
    /// Protocol descriptor, decided by the account's UDP flag.
    pub protocol: ProtocolSelector,
    /// Trimmed, non-empty description.
    pub description: Option<String>,
}

impl AdmittedMapping {
    /// Body of the add call.
    #[must_use]
    pub fn to_form(&self, hostname: &str) -> AddPortForm {
        let (sport, sport_end, dport, dport_end) = match self.span {
            PortSpan::Single { internal, external } => (internal, None, external, None),
            PortSpan::Range {
                internal,
                internal_end,
                external,
                external_end,
            } => (
                internal,
                Some(internal_end),
                Some(external),
                Some(external_end),
            ),
        };

        AddPortForm {
            hostname: hostname.to_string(),
            dtype: self.protocol,
            sport,
            sport_end,
            dport,
            dport_end,
            description: self.description.clone(),
        }
    }
}

/// A validated delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteTarget {
    /// Protocols to delete from.
    pub protocol: ProtocolSelector,
    /// Internal start port.
    pub internal: u16,
    /// External start port.
    pub external: u16,
    /// `(internal_end, external_end)` for a range.
    pub range_end: Option<(u16, u16)>,
}

impl DeleteTarget {
    /// Body of the delete call for one protocol.
    #[must_use]
    pub fn to_form(&self, hostname: &str, protocol: Protocol) -> DeletePortForm {
        DeletePortForm {
            hostname: hostname.to_string(),
            dtype: protocol,
            dport: self.external,
            sport: self.internal,
            dport_end: self.range_end.map(|(_, external_end)| external_end),
            sport_end: self.range_end.map(|(internal_end, _)| internal_end),
        }
    }
}

/// Decide whether `request` may be added given `used` quota slots.
///
/// Checks run in a fixed order and the first failure is returned: feature
/// gate, internal port, range structure and capacity (for ranges), then
/// capacity and external port bounds (for single ports).
pub fn validate_add(
    request: &AddRequest,
    caps: &NatCapabilities,
    used: u32,
) -> PanelResult<AdmittedMapping> {
    if !caps.network_mode.supports_nat() {
        return Err(PanelError::feature_disabled(NAT_DISABLED));
    }

    if !(1..=PORT_MAX).contains(&request.internal_port) {
        return Err(Rejection::InternalPortOutOfRange.into());
    }

    let protocol = caps.add_protocol();
    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    if request.is_range() {
        let span = range_span(request)?;
        let width = span.width();
        if used.saturating_add(width) > caps.limit {
            return Err(Rejection::RangeExceedsQuota {
                width,
                remaining: caps.limit.saturating_sub(used),
            }
            .into());
        }
        return Ok(AdmittedMapping {
            span,
            protocol,
            description,
        });
    }

    if used >= caps.limit {
        return Err(Rejection::NatLimitReached { limit: caps.limit }.into());
    }

    let internal = port(request.internal_port, Rejection::InternalPortOutOfRange)?;
    let external = single_external(request)?;

    Ok(AdmittedMapping {
        span: PortSpan::Single { internal, external },
        protocol,
        description,
    })
}

/// The checks of [`validate_add`] that need no usage figure.
///
/// Runs before usage is fetched, so a malformed request is refused without
/// any call to the manager. When a request fails both a shape and a
/// capacity check, the shape reason is the one reported.
pub fn validate_shape(request: &AddRequest, caps: &NatCapabilities) -> PanelResult<()> {
    if !caps.network_mode.supports_nat() {
        return Err(PanelError::feature_disabled(NAT_DISABLED));
    }

    if !(1..=PORT_MAX).contains(&request.internal_port) {
        return Err(Rejection::InternalPortOutOfRange.into());
    }

    if request.is_range() {
        range_span(request)?;
    } else {
        single_external(request)?;
    }
    Ok(())
}

fn single_external(request: &AddRequest) -> Result<Option<u16>, Rejection> {
    match request.external_port {
        0 => Ok(None),
        p if (EXTERNAL_PORT_MIN..=PORT_MAX).contains(&p) => {
            port(p, Rejection::ExternalPortOutOfRange).map(Some)
        }
        _ => Err(Rejection::ExternalPortOutOfRange),
    }
}

fn range_span(request: &AddRequest) -> Result<PortSpan, Rejection> {
    if request.internal_port > request.internal_port_end {
        return Err(Rejection::InternalRangeOrder);
    }
    if request.external_port == 0 || request.external_port > request.external_port_end {
        return Err(Rejection::ExternalRangeOrder);
    }

    let internal = request.internal_port_end - request.internal_port + 1;
    let external = request.external_port_end - request.external_port + 1;
    if internal != external {
        return Err(Rejection::RangeWidthMismatch { internal, external });
    }

    if request.external_port < EXTERNAL_PORT_MIN {
        return Err(Rejection::RangeOutOfBounds);
    }

    Ok(PortSpan::Range {
        internal: port(request.internal_port, Rejection::RangeOutOfBounds)?,
        internal_end: port(request.internal_port_end, Rejection::RangeOutOfBounds)?,
        external: port(request.external_port, Rejection::RangeOutOfBounds)?,
        external_end: port(request.external_port_end, Rejection::RangeOutOfBounds)?,
    })
}

/// Validate a delete request.
///
/// Range fields are used only when both ends are given.
pub fn validate_delete(request: &DeleteRequest) -> PanelResult<DeleteTarget> {
    let protocol: ProtocolSelector = request.protocol.parse()?;

    if !(1..=PORT_MAX).contains(&request.internal_port) {
        return Err(Rejection::InternalPortOutOfRange.into());
    }
    if !(EXTERNAL_PORT_MIN..=PORT_MAX).contains(&request.external_port) {
        return Err(Rejection::ExternalPortOutOfRange.into());
    }

    let range_end = if request.internal_port_end > 0 && request.external_port_end > 0 {
        Some((
            port(request.internal_port_end, Rejection::RangeOutOfBounds)?,
            port(request.external_port_end, Rejection::RangeOutOfBounds)?,
        ))
    } else {
        None
    };

    Ok(DeleteTarget {
        protocol,
        internal: port(request.internal_port, Rejection::InternalPortOutOfRange)?,
        external: port(request.external_port, Rejection::ExternalPortOutOfRange)?,
        range_end,
    })
}

/// Narrow to a nonzero `u16`.
fn port(value: u32, rejection: Rejection) -> Result<u16, Rejection> {
    u16::try_from(value)
        .ok()
        .filter(|p| *p > 0)
        .ok_or(rejection)
}
