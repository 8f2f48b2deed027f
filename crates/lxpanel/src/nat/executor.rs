//! Issues NAT mutations to the manager.

use lxpanel_api::ManagerApi;
use lxpanel_common::{PanelError, PanelResult, ProtocolSelector};

use super::validate::{AdmittedMapping, DeleteTarget, PortSpan};
use crate::outcome::{ActionOutcome, ProtocolFailure};

/// Send one add call for an admitted mapping.
///
/// A dual-protocol mapping is a single call with `dtype=both`; the manager
/// stores it as two rules.
pub async fn execute_add<A>(
    api: &A,
    hostname: &str,
    mapping: &AdmittedMapping,
) -> PanelResult<ActionOutcome>
where
    A: ManagerApi + ?Sized,
{
    let form = mapping.to_form(hostname);
    api.add_port(&form).await?;

    tracing::info!(
        hostname,
        sport = form.sport,
        dport = ?form.dport,
        dtype = %form.dtype,
        width = mapping.span.width(),
        "NAT mapping added"
    );

    let protocols = protocol_label(mapping.protocol);
    let message = match mapping.span {
        PortSpan::Range { .. } => format!(
            "Port range added ({} ports, {protocols})",
            mapping.span.width()
        ),
        PortSpan::Single { .. } => format!("NAT forwarding added ({protocols})"),
    };
    Ok(ActionOutcome::new(message))
}

/// Delete a mapping.
///
/// For `both`, TCP and UDP are deleted by two independent calls. If exactly
/// one of them fails the delete still succeeds, with the failed protocol
/// listed in the outcome; only when both fail is it an error.
pub async fn execute_delete<A>(
    api: &A,
    hostname: &str,
    target: &DeleteTarget,
) -> PanelResult<ActionOutcome>
where
    A: ManagerApi + ?Sized,
{
    if let Some(protocol) = target.protocol.single() {
        let msg = api.delete_port(&target.to_form(hostname, protocol)).await?;
        tracing::info!(hostname, dport = target.external, %protocol, "NAT mapping deleted");
        return Ok(ActionOutcome::from_remote(msg, "NAT forwarding deleted"));
    }

    let mut failures = Vec::new();
    for &protocol in target.protocol.protocols() {
        if let Err(e) = api.delete_port(&target.to_form(hostname, protocol)).await {
            tracing::warn!(hostname, dport = target.external, %protocol, error = %e, "NAT delete failed");
            failures.push(ProtocolFailure {
                protocol,
                reason: e.to_string(),
            });
        }
    }

    let reasons = failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    match failures.len() {
        0 => {
            tracing::info!(hostname, dport = target.external, "NAT mapping deleted (tcp+udp)");
            Ok(ActionOutcome::new("NAT forwarding deleted"))
        }
        1 => Ok(ActionOutcome::partial(
            format!("NAT forwarding partially deleted: {reasons}"),
            failures,
        )),
        _ => Err(PanelError::MutationFailed {
            message: format!("NAT forwarding delete failed: {reasons}"),
        }),
    }
}

const fn protocol_label(selector: ProtocolSelector) -> &'static str {
    match selector {
        ProtocolSelector::Tcp => "TCP",
        ProtocolSelector::Udp => "UDP",
        ProtocolSelector::Both => "TCP+UDP",
    }
}
