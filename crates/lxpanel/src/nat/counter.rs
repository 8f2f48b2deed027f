//! Quota accounting over the manager's rule list.
//!
//! A dual-protocol mapping is stored as one TCP and one UDP rule with the
//! same port tuple, so rules are first grouped into allocation units by that
//! tuple. A unit weighs one slot per external port it covers.

use std::collections::HashMap;

use lxpanel_api::{ForwardingRule, ManagerApi};
use lxpanel_common::Protocol;
use serde::Serialize;

/// One logical mapping, independent of how many protocols mirror it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationUnit {
    /// External start port.
    pub external_port: u16,
    /// Internal start port.
    pub internal_port: u16,
    /// External end port, `0` for a single port.
    pub external_port_end: u16,
    /// Internal end port, `0` for a single port.
    pub internal_port_end: u16,
    /// Protocols the manager stores this mapping under.
    pub protocols: Vec<Protocol>,
}

impl AllocationUnit {
    /// Quota slots consumed by this unit.
    ///
    /// A stored range whose end precedes its start counts as one slot.
    #[must_use]
    pub fn weight(&self) -> u32 {
        if self.external_port_end > 0 && self.external_port_end >= self.external_port {
            u32::from(self.external_port_end - self.external_port) + 1
        } else {
            1
        }
    }
}

/// Collapse rules sharing a port tuple, keeping first-seen order.
#[must_use]
pub fn allocation_units(rules: &[ForwardingRule]) -> Vec<AllocationUnit> {
    let mut index: HashMap<(u16, u16, u16, u16), usize> = HashMap::new();
    let mut units: Vec<AllocationUnit> = Vec::new();

    for rule in rules {
        let slot = *index.entry(rule.port_tuple()).or_insert_with(|| {
            units.push(AllocationUnit {
                external_port: rule.external_port,
                internal_port: rule.internal_port,
                external_port_end: rule.external_port_end,
                internal_port_end: rule.internal_port_end,
                protocols: Vec::new(),
            });
            units.len() - 1
        });

        if let Some(protocol) = rule.protocol {
            let protocols = &mut units[slot].protocols;
            if !protocols.contains(&protocol) {
                protocols.push(protocol);
                protocols.sort_unstable();
            }
        }
    }

    units
}

/// Quota slots consumed by `rules`.
#[must_use]
pub fn count_used(rules: &[ForwardingRule]) -> u32 {
    allocation_units(rules)
        .iter()
        .map(AllocationUnit::weight)
        .sum()
}

/// Fetch the live rule list and count it.
///
/// A failed fetch counts as zero usage.
pub async fn fetch_used<A>(api: &A, hostname: &str) -> u32
where
    A: ManagerApi + ?Sized,
{
    match api.nat_rules(hostname).await {
        Ok(rules) => count_used(&rules),
        Err(e) => {
            tracing::warn!(hostname, error = %e, "Failed to fetch NAT rules, assuming no usage");
            0
        }
    }
}

/// A NAT quota snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quota {
    /// Configured limit.
    pub limit: u32,
    /// Slots in use.
    pub used: u32,
}

impl Quota {
    /// Slots still free.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn mirrored(rule: &ForwardingRule) -> [ForwardingRule; 2] {
        let mut tcp = rule.clone();
        tcp.protocol = Some(Protocol::Tcp);
        let mut udp = rule.clone();
        udp.protocol = Some(Protocol::Udp);
        [tcp, udp]
    }

    #[test]
    fn empty_list_uses_nothing() {
        assert_eq!(count_used(&[]), 0);
    }

    #[test]
    fn single_rules_weigh_one() {
        let rules = vec![
            ForwardingRule::single(10022, 22, Protocol::Tcp),
            ForwardingRule::single(10080, 80, Protocol::Tcp),
        ];
        assert_eq!(count_used(&rules), 2);
    }

    #[test]
    fn mirrored_pair_counts_once() {
        let rules = mirrored(&ForwardingRule::single(10022, 22, Protocol::Tcp));
        assert_eq!(count_used(&rules), 1);

        let units = allocation_units(&rules);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].protocols, vec![Protocol::Tcp, Protocol::Udp]);
    }

    #[test]
    fn range_weighs_its_width() {
        let rules = vec![
            ForwardingRule::single(10022, 22, Protocol::Tcp),
            ForwardingRule::range(20000, 20001, 8000, 8001, Protocol::Tcp),
        ];
        assert_eq!(count_used(&rules), 3);
    }

    #[test]
    fn mirrored_range_counts_once() {
        let rules = mirrored(&ForwardingRule::range(
            20000,
            20009,
            8000,
            8009,
            Protocol::Tcp,
        ));
        assert_eq!(count_used(&rules), 10);
    }

    #[test]
    fn inverted_range_weighs_one() {
        let rules = vec![ForwardingRule::range(
            20009,
            20000,
            8009,
            8000,
            Protocol::Tcp,
        )];
        assert_eq!(count_used(&rules), 1);
    }

    #[test]
    fn same_external_different_internal_are_distinct() {
        let rules = vec![
            ForwardingRule::single(10022, 22, Protocol::Tcp),
            ForwardingRule::single(10022, 2222, Protocol::Udp),
        ];
        assert_eq!(count_used(&rules), 2);
    }

    #[test]
    fn quota_remaining_saturates() {
        let quota = Quota { limit: 5, used: 7 };
        assert_eq!(quota.remaining(), 0);
        let quota = Quota { limit: 5, used: 3 };
        assert_eq!(quota.remaining(), 2);
    }

    fn arb_rule() -> impl Strategy<Value = ForwardingRule> {
        (10000u16..10100, 1u16..100, 0u16..8, any::<bool>(), any::<bool>()).prop_map(
            |(external, internal, span, is_range, udp)| {
                let protocol = if udp { Protocol::Udp } else { Protocol::Tcp };
                if is_range {
                    ForwardingRule::range(external, external + span, internal, internal + span, protocol)
                } else {
                    ForwardingRule::single(external, internal, protocol)
                }
            },
        )
    }

    proptest! {
        #[test]
        fn count_ignores_order(
            (rules, shuffled) in prop::collection::vec(arb_rule(), 0..20)
                .prop_flat_map(|rules| (Just(rules.clone()), Just(rules).prop_shuffle()))
        ) {
            prop_assert_eq!(count_used(&rules), count_used(&shuffled));
        }

        #[test]
        fn mirroring_does_not_change_count(rules in prop::collection::vec(arb_rule(), 0..20)) {
            let split: Vec<ForwardingRule> = rules.iter().flat_map(mirrored).collect();
            let merged: Vec<ForwardingRule> = split
                .iter()
                .filter(|r| r.protocol == Some(Protocol::Tcp))
                .cloned()
                .collect();
            prop_assert_eq!(count_used(&split), count_used(&merged));
            prop_assert_eq!(count_used(&split), count_used(&rules));
        }
    }
}
