//! External port availability check.

use lxpanel_api::{ManagerApi, PortAvailability};
use lxpanel_common::ProtocolSelector;

/// Ask the manager whether `port` is free for every protocol in `selector`.
///
/// Protocols are checked in order and the first unavailable answer wins.
/// Any error while asking is treated as unavailable.
pub async fn precheck<A>(
    api: &A,
    hostname: &str,
    selector: ProtocolSelector,
    port: u16,
) -> PortAvailability
where
    A: ManagerApi + ?Sized,
{
    for &protocol in selector.protocols() {
        match api.check_nat_port(hostname, protocol, port).await {
            Ok(answer) if answer.available => {}
            Ok(answer) => {
                tracing::debug!(hostname, port, %protocol, reason = ?answer.reason, "Port unavailable");
                let reason = answer
                    .reason
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| format!("Port {port} is not available"));
                return PortAvailability::unavailable(reason);
            }
            Err(e) => {
                tracing::warn!(hostname, port, %protocol, error = %e, "Port check failed, refusing port");
                return PortAvailability::unavailable(format!(
                    "Unable to verify port {port}: {e}"
                ));
            }
        }
    }

    PortAvailability::available()
}
