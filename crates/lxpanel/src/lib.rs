//! # lxpanel
//!
//! Self-service panels for containers hosted on a remote LXD manager.
//!
//! ## Features
//!
//! - **NAT forwarding**: quota-gated single-port and port-range mappings,
//!   optionally mirrored into UDP
//! - **IPv6 bindings**: dedicated addresses for accounts in IPv6 mode
//! - **Reverse proxy**: domain bindings with optional TLS
//!
//! Every panel is stateless: usage is recounted from the manager's live
//! lists on each request and nothing is cached between calls.
//!
//! ## Usage
//!
//! ```no_run
//! use lxpanel::nat::{AddRequest, NatPanel};
//! use lxpanel_api::HttpManager;
//! use lxpanel_common::PanelConfig;
//!
//! # async fn example() -> lxpanel_common::PanelResult<()> {
//! let config = PanelConfig::from_file("/etc/lxpanel/config.toml")?;
//! let manager = HttpManager::new(&config.manager)?;
//! let panel = NatPanel::new(
//!     &manager,
//!     &config.account.hostname,
//!     config.account.nat_capabilities(),
//! );
//!
//! let outcome = panel.add(&AddRequest::single(22, Some(10022))).await?;
//! println!("{}", outcome.message);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod ipv6;
pub mod nat;
pub mod outcome;
pub mod proxy;

pub use ipv6::Ipv6Panel;
pub use nat::NatPanel;
pub use outcome::{ActionOutcome, PanelReply, ProtocolFailure, ReplyStatus};
pub use proxy::ProxyPanel;
