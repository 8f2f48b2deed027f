//! Dedicated IPv6 bindings.

use lxpanel_api::{AddIpv6Form, DeleteIpv6Form, Ipv6Binding, ManagerApi};
use lxpanel_common::{Ipv6Capabilities, PanelError, PanelResult, Rejection};

use crate::outcome::ActionOutcome;

/// Shown when the account is not in `mode2`.
pub const IPV6_DISABLED: &str =
    "Dedicated IPv6 binding is not enabled for this account, contact the administrator to switch to mode2";

/// Shown when the account holder may not release addresses.
pub const IPV6_DELETE_DISABLED: &str =
    "Deleting IPv6 addresses has been disabled by the administrator, contact them to change the address";

/// IPv6 panel for one container.
pub struct Ipv6Panel<'a, A: ?Sized> {
    api: &'a A,
    hostname: &'a str,
    caps: Ipv6Capabilities,
}

impl<'a, A> Ipv6Panel<'a, A>
where
    A: ManagerApi + ?Sized,
{
    /// Create a panel for `hostname`.
    pub const fn new(api: &'a A, hostname: &'a str, caps: Ipv6Capabilities) -> Self {
        Self {
            api,
            hostname,
            caps,
        }
    }

    /// Bindings in use, zero when the list cannot be fetched.
    pub async fn count(&self) -> u32 {
        match self.api.ipv6_bindings(self.hostname).await {
            Ok(bindings) => u32::try_from(bindings.len()).unwrap_or(u32::MAX),
            Err(e) => {
                tracing::warn!(hostname = self.hostname, error = %e, "Failed to count IPv6 bindings, assuming none");
                0
            }
        }
    }

    /// Bind a new address.
    pub async fn add(&self, description: &str) -> PanelResult<ActionOutcome> {
        if !self.caps.network_mode.supports_ipv6() {
            return Err(PanelError::feature_disabled(IPV6_DISABLED));
        }

        let used = self.count().await;
        tracing::debug!(hostname = self.hostname, used, limit = self.caps.limit, "IPv6 usage");
        if used >= self.caps.limit {
            return Err(Rejection::Ipv6LimitReached {
                limit: self.caps.limit,
            }
            .into());
        }

        let msg = self
            .api
            .add_ipv6(&AddIpv6Form {
                hostname: self.hostname.to_string(),
                description: description.trim().to_string(),
            })
            .await?;

        tracing::info!(hostname = self.hostname, "IPv6 binding added");
        Ok(ActionOutcome::from_remote(msg, "IPv6 binding added"))
    }

    /// Release a bound address.
    pub async fn delete(&self, public_ipv6: &str) -> PanelResult<ActionOutcome> {
        if !self.caps.allow_delete {
            return Err(PanelError::feature_disabled(IPV6_DELETE_DISABLED));
        }

        let public_ipv6 = public_ipv6.trim();
        if public_ipv6.is_empty() {
            return Err(Rejection::MissingIpv6Address.into());
        }

        let msg = self
            .api
            .delete_ipv6(&DeleteIpv6Form {
                hostname: self.hostname.to_string(),
                public_ipv6: public_ipv6.to_string(),
            })
            .await?;

        tracing::info!(hostname = self.hostname, public_ipv6, "IPv6 binding deleted");
        Ok(ActionOutcome::from_remote(msg, "IPv6 binding deleted"))
    }

    /// Current bindings.
    pub async fn list(&self) -> PanelResult<Vec<Ipv6Binding>> {
        self.api.ipv6_bindings(self.hostname).await
    }
}
