//! In-memory Container Manager for engine tests.
#![allow(dead_code)]

use std::collections::HashMap;

use async_trait::async_trait;
use lxpanel_api::{
    AddIpv6Form, AddPortForm, AddProxyForm, DeleteIpv6Form, DeletePortForm, DeleteProxyForm,
    ForwardingRule, Ipv6Binding, ManagerApi, PortAvailability, ProxyBinding,
};
use lxpanel_common::{PanelError, PanelResult, Protocol, ProtocolSelector};
use parking_lot::Mutex;

pub const HOSTNAME: &str = "c-test";

/// A call received by [`FakeManager`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    NatRules,
    CheckNatPort(Protocol, u16),
    AddPort(AddPortForm),
    DeletePort(DeletePortForm),
    Ipv6Bindings,
    AddIpv6(AddIpv6Form),
    DeleteIpv6(DeleteIpv6Form),
    Proxies,
    CheckProxy(String),
    AddProxy(AddProxyForm),
    DeleteProxy(DeleteProxyForm),
}

#[derive(Default)]
struct State {
    rules: Vec<ForwardingRule>,
    ipv6: Vec<Ipv6Binding>,
    proxies: Vec<ProxyBinding>,
    calls: Vec<Call>,
    list_fails: bool,
    check_fails: bool,
    taken: HashMap<(Protocol, u16), String>,
    delete_failures: HashMap<Protocol, String>,
    next_port: u16,
}

/// Stores rules the way the manager does: one row per protocol.
#[derive(Default)]
pub struct FakeManager {
    state: Mutex<State>,
}

fn remote(message: &str) -> PanelError {
    PanelError::Remote {
        code: 400,
        message: message.to_string(),
    }
}

impl FakeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(self, rules: impl IntoIterator<Item = ForwardingRule>) -> Self {
        self.state.lock().rules.extend(rules);
        self
    }

    pub fn with_taken_port(self, protocol: Protocol, port: u16, reason: &str) -> Self {
        self.state
            .lock()
            .taken
            .insert((protocol, port), reason.to_string());
        self
    }

    pub fn with_failing_list(self) -> Self {
        self.state.lock().list_fails = true;
        self
    }

    pub fn with_failing_check(self) -> Self {
        self.state.lock().check_fails = true;
        self
    }

    pub fn with_failing_delete(self, protocol: Protocol, reason: &str) -> Self {
        self.state
            .lock()
            .delete_failures
            .insert(protocol, reason.to_string());
        self
    }

    pub fn with_ipv6(self, addresses: &[&str]) -> Self {
        self.state
            .lock()
            .ipv6
            .extend(addresses.iter().map(|a| Ipv6Binding {
                public_ipv6: (*a).to_string(),
                description: None,
                extra: serde_json::Map::new(),
            }));
        self
    }

    pub fn with_proxies(self, domains: &[&str]) -> Self {
        self.state
            .lock()
            .proxies
            .extend(domains.iter().map(|d| ProxyBinding {
                domain: (*d).to_string(),
                container_port: 80,
                description: None,
                extra: serde_json::Map::new(),
            }));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn adds(&self) -> Vec<AddPortForm> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::AddPort(form) => Some(form),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<DeletePortForm> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DeletePort(form) => Some(form),
                _ => None,
            })
            .collect()
    }

    pub fn rules(&self) -> Vec<ForwardingRule> {
        self.state.lock().rules.clone()
    }

    pub fn proxy_forms(&self) -> Vec<AddProxyForm> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::AddProxy(form) => Some(form),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }
}

#[async_trait]
impl ManagerApi for FakeManager {
    async fn nat_rules(&self, hostname: &str) -> PanelResult<Vec<ForwardingRule>> {
        assert_eq!(hostname, HOSTNAME);
        self.record(Call::NatRules);
        let state = self.state.lock();
        if state.list_fails {
            return Err(PanelError::Network {
                message: "connection refused".to_string(),
            });
        }
        Ok(state.rules.clone())
    }

    async fn check_nat_port(
        &self,
        _hostname: &str,
        protocol: Protocol,
        port: u16,
    ) -> PanelResult<PortAvailability> {
        self.record(Call::CheckNatPort(protocol, port));
        let state = self.state.lock();
        if state.check_fails {
            return Err(PanelError::Network {
                message: "timed out".to_string(),
            });
        }
        Ok(state
            .taken
            .get(&(protocol, port))
            .map_or_else(PortAvailability::available, |reason| {
                PortAvailability::unavailable(reason.clone())
            }))
    }

    async fn add_port(&self, form: &AddPortForm) -> PanelResult<String> {
        self.record(Call::AddPort(form.clone()));
        let mut state = self.state.lock();

        let external = form.dport.unwrap_or_else(|| {
            state.next_port = state.next_port.max(30000) + 1;
            state.next_port
        });
        let protocols: &[Protocol] = match form.dtype {
            ProtocolSelector::Both => &[Protocol::Tcp, Protocol::Udp],
            ProtocolSelector::Tcp => &[Protocol::Tcp],
            ProtocolSelector::Udp => &[Protocol::Udp],
        };
        for &protocol in protocols {
            state.rules.push(ForwardingRule::range(
                external,
                form.dport_end.unwrap_or_default(),
                form.sport,
                form.sport_end.unwrap_or_default(),
                protocol,
            ));
        }
        Ok("added".to_string())
    }

    async fn delete_port(&self, form: &DeletePortForm) -> PanelResult<String> {
        self.record(Call::DeletePort(form.clone()));
        let mut state = self.state.lock();
        if let Some(reason) = state.delete_failures.get(&form.dtype) {
            return Err(remote(reason));
        }

        let tuple = (
            form.dport,
            form.sport,
            form.dport_end.unwrap_or_default(),
            form.sport_end.unwrap_or_default(),
        );
        let before = state.rules.len();
        state
            .rules
            .retain(|r| !(r.port_tuple() == tuple && r.protocol == Some(form.dtype)));
        if state.rules.len() == before {
            return Err(remote("rule not found"));
        }
        Ok(String::new())
    }

    async fn ipv6_bindings(&self, _hostname: &str) -> PanelResult<Vec<Ipv6Binding>> {
        self.record(Call::Ipv6Bindings);
        let state = self.state.lock();
        if state.list_fails {
            return Err(remote("list unavailable"));
        }
        Ok(state.ipv6.clone())
    }

    async fn add_ipv6(&self, form: &AddIpv6Form) -> PanelResult<String> {
        self.record(Call::AddIpv6(form.clone()));
        let mut state = self.state.lock();
        let address = format!("2001:db8::{}", state.ipv6.len() + 1);
        state.ipv6.push(Ipv6Binding {
            public_ipv6: address,
            description: Some(form.description.clone()),
            extra: serde_json::Map::new(),
        });
        Ok("IPv6 bound".to_string())
    }

    async fn delete_ipv6(&self, form: &DeleteIpv6Form) -> PanelResult<String> {
        self.record(Call::DeleteIpv6(form.clone()));
        let mut state = self.state.lock();
        let before = state.ipv6.len();
        state.ipv6.retain(|b| b.public_ipv6 != form.public_ipv6);
        if state.ipv6.len() == before {
            return Err(remote("address not bound"));
        }
        Ok(String::new())
    }

    async fn proxies(&self, _hostname: &str) -> PanelResult<Vec<ProxyBinding>> {
        self.record(Call::Proxies);
        let state = self.state.lock();
        if state.list_fails {
            return Err(remote("list unavailable"));
        }
        Ok(state.proxies.clone())
    }

    async fn check_proxy_domain(&self, domain: &str) -> PanelResult<serde_json::Value> {
        self.record(Call::CheckProxy(domain.to_string()));
        let state = self.state.lock();
        let taken = state.proxies.iter().any(|p| p.domain == domain);
        Ok(serde_json::json!({ "available": !taken }))
    }

    async fn add_proxy(&self, form: &AddProxyForm) -> PanelResult<String> {
        self.record(Call::AddProxy(form.clone()));
        self.state.lock().proxies.push(ProxyBinding {
            domain: form.domain.clone(),
            container_port: u32::from(form.container_port),
            description: Some(form.description.clone()),
            extra: serde_json::Map::new(),
        });
        Ok("proxy added".to_string())
    }

    async fn delete_proxy(&self, form: &DeleteProxyForm) -> PanelResult<String> {
        self.record(Call::DeleteProxy(form.clone()));
        let mut state = self.state.lock();
        let before = state.proxies.len();
        state.proxies.retain(|p| p.domain != form.domain);
        if state.proxies.len() == before {
            return Err(remote("domain not bound"));
        }
        Ok(String::new())
    }
}
