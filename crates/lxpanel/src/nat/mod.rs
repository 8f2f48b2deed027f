//! Quota-gated NAT port forwarding.
//!
//! An add request flows through the validator, the rule counter, the
//! availability precheck (single ports with an explicit external port only)
//! and finally the executor:
//!
//! ```text
//! request -> shape checks -> count usage -> validate -> precheck -> add
//! ```
//!
//! Nothing is cached. Usage is recounted from the manager's live rule list
//! on every add, so rules changed elsewhere are picked up immediately. The
//! admission decision is advisory; two concurrent adds may both pass and
//! the manager has the final word.

pub mod counter;
pub mod executor;
pub mod precheck;
pub mod validate;

use lxpanel_api::{ForwardingRule, ManagerApi, PortAvailability};
use lxpanel_common::{NatCapabilities, PanelError, PanelResult, Protocol, Rejection};
use serde::Serialize;

pub use counter::{AllocationUnit, Quota, allocation_units, count_used};
pub use validate::{
    AddRequest, AdmittedMapping, DeleteRequest, DeleteTarget, PortSpan, validate_add,
    validate_delete, validate_shape,
};

use crate::outcome::ActionOutcome;

/// Current rules and quota of a container.
#[derive(Debug, Clone, Serialize)]
pub struct NatListing {
    /// Rules as stored on the manager.
    pub rules: Vec<ForwardingRule>,
    /// Rules grouped into logical mappings.
    pub units: Vec<AllocationUnit>,
    /// Quota snapshot.
    pub quota: Quota,
    /// Slots still free.
    pub remaining: u32,
}

/// NAT panel for one container.
pub struct NatPanel<'a, A: ?Sized> {
    api: &'a A,
    hostname: &'a str,
    caps: NatCapabilities,
}

impl<'a, A> NatPanel<'a, A>
where
    A: ManagerApi + ?Sized,
{
    /// Create a panel for `hostname`.
    pub const fn new(api: &'a A, hostname: &'a str, caps: NatCapabilities) -> Self {
        Self {
            api,
            hostname,
            caps,
        }
    }

    /// Quota slots in use, zero when the rule list cannot be fetched.
    pub async fn used(&self) -> u32 {
        counter::fetch_used(self.api, self.hostname).await
    }

    /// Add a mapping.
    pub async fn add(&self, request: &AddRequest) -> PanelResult<ActionOutcome> {
        tracing::debug!(
            hostname = self.hostname,
            sport = request.internal_port,
            dport = request.external_port,
            sport_end = request.internal_port_end,
            dport_end = request.external_port_end,
            "NAT add requested"
        );

        validate_shape(request, &self.caps)?;

        let used = self.used().await;
        tracing::debug!(hostname = self.hostname, used, limit = self.caps.limit, "NAT usage");

        let mapping = validate_add(request, &self.caps, used)?;

        if let PortSpan::Single {
            external: Some(port),
            ..
        } = mapping.span
        {
            let answer = precheck::precheck(self.api, self.hostname, mapping.protocol, port).await;
            if !answer.available {
                return Err(PanelError::Unavailable {
                    reason: answer
                        .reason
                        .unwrap_or_else(|| format!("Port {port} is not available")),
                });
            }
        }

        executor::execute_add(self.api, self.hostname, &mapping).await
    }

    /// Delete a mapping.
    ///
    /// With protocol `both`, success is reported when at least one of the
    /// two deletes went through; see [`executor::execute_delete`].
    pub async fn delete(&self, request: &DeleteRequest) -> PanelResult<ActionOutcome> {
        tracing::debug!(
            hostname = self.hostname,
            protocol = %request.protocol,
            sport = request.internal_port,
            dport = request.external_port,
            "NAT delete requested"
        );

        let target = validate_delete(request)?;
        executor::execute_delete(self.api, self.hostname, &target).await
    }

    /// Current rules with quota usage.
    ///
    /// Unlike admission, a failed fetch is an error here.
    pub async fn list(&self) -> PanelResult<NatListing> {
        let rules = self.api.nat_rules(self.hostname).await?;
        let units = allocation_units(&rules);
        let quota = Quota {
            limit: self.caps.limit,
            used: units.iter().map(AllocationUnit::weight).sum(),
        };

        Ok(NatListing {
            remaining: quota.remaining(),
            rules,
            units,
            quota,
        })
    }

    /// Check whether an external port is free for `protocol`.
    pub async fn check(&self, protocol: &str, port: u32) -> PanelResult<PortAvailability> {
        let protocol: Protocol = protocol.parse()?;
        let port = u16::try_from(port)
            .ok()
            .filter(|p| (validate::EXTERNAL_PORT_MIN..=validate::PORT_MAX).contains(&u32::from(*p)))
            .ok_or(Rejection::ExternalPortOutOfRange)?;

        Ok(precheck::precheck(self.api, self.hostname, protocol.into(), port).await)
    }
}
