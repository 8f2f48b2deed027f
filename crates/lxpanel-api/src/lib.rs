//! # lxpanel-api
//!
//! Client for the Container Manager API.
//!
//! The manager answers every call with a `{code, msg, data}` envelope. This
//! crate turns those envelopes into typed results and resolves the manager's
//! inconsistent field naming (`dport` versus `external_port`, ...) in one
//! place, so callers only ever see the canonical shapes.

#![warn(missing_docs)]

mod de;

pub mod client;
pub mod envelope;
pub mod form;
pub mod types;

pub use client::{HttpManager, ManagerApi};
pub use envelope::Envelope;
pub use form::{
    AddIpv6Form, AddPortForm, AddProxyForm, DeleteIpv6Form, DeletePortForm, DeleteProxyForm,
};
pub use types::{ForwardingRule, Ipv6Binding, PortAvailability, ProxyBinding};
