//! # lxpanel-common
//!
//! Shared utilities and types for lxpanel.
//!
//! This crate provides common functionality used across all lxpanel crates:
//! - Transport protocols and network modes
//! - Account capabilities and TOML configuration
//! - Common error types and rejection reasons

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod protocol;

pub use config::{
    AccountConfig, Ipv6Capabilities, ManagerConfig, NatCapabilities, PanelConfig,
    ProxyCapabilities,
};
pub use error::{PanelError, PanelResult, Rejection};
pub use protocol::{NetworkMode, Protocol, ProtocolSelector};
