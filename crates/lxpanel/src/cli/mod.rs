//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use lxpanel_api::HttpManager;
use lxpanel_common::PanelConfig;
use tabled::{Table, Tabled};

use crate::ipv6::Ipv6Panel;
use crate::nat::{AddRequest, AllocationUnit, DeleteRequest, NatListing, NatPanel};
use crate::outcome::PanelReply;
use crate::proxy::{AddProxyRequest, DEFAULT_CONTAINER_PORT, ProxyPanel, SslType};

/// lxpanel - Self-service NAT, IPv6 and reverse-proxy panels for LXD containers
#[derive(Parser)]
#[command(name = "lxpanel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the panel configuration
    #[arg(
        long,
        global = true,
        env = "LXPANEL_CONFIG",
        default_value = "/etc/lxpanel/config.toml"
    )]
    pub config: PathBuf,

    /// Manager API key, overrides the configuration file
    #[arg(long, global = true, env = "LXPANEL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Panels.
#[derive(Subcommand)]
pub enum Commands {
    /// NAT port forwarding
    Nat {
        /// NAT operation.
        #[command(subcommand)]
        command: NatCommands,
    },

    /// Dedicated IPv6 bindings
    Ipv6 {
        /// IPv6 operation.
        #[command(subcommand)]
        command: Ipv6Commands,
    },

    /// Reverse-proxy domains
    Proxy {
        /// Proxy operation.
        #[command(subcommand)]
        command: ProxyCommands,
    },
}

/// NAT operations.
#[derive(Subcommand)]
pub enum NatCommands {
    /// Add a port or port-range mapping
    Add(NatAddArgs),

    /// Delete a mapping
    Del(NatDelArgs),

    /// List mappings and quota usage
    List {
        /// Print the JSON reply instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check whether an external port is free
    Check {
        /// Protocol (tcp, udp)
        #[arg(short, long, default_value = "tcp")]
        protocol: String,

        /// External port
        #[arg(long)]
        port: u32,
    },
}

/// Arguments of `nat add`.
#[derive(Args)]
pub struct NatAddArgs {
    /// Internal (container) port
    #[arg(long)]
    pub internal: u32,

    /// External (host) port, assigned by the manager when omitted
    #[arg(long, default_value_t = 0)]
    pub external: u32,

    /// Internal end port, for a range
    #[arg(long, default_value_t = 0)]
    pub internal_end: u32,

    /// External end port, for a range
    #[arg(long, default_value_t = 0)]
    pub external_end: u32,

    /// Description
    #[arg(short, long)]
    pub description: Option<String>,
}

/// Arguments of `nat del`.
#[derive(Args)]
pub struct NatDelArgs {
    /// Protocol (tcp, udp, both)
    #[arg(short, long, default_value = "tcp")]
    pub protocol: String,

    /// Internal (container) port
    #[arg(long)]
    pub internal: u32,

    /// External (host) port
    #[arg(long)]
    pub external: u32,

    /// Internal end port, for a range
    #[arg(long, default_value_t = 0)]
    pub internal_end: u32,

    /// External end port, for a range
    #[arg(long, default_value_t = 0)]
    pub external_end: u32,
}

/// IPv6 operations.
#[derive(Subcommand)]
pub enum Ipv6Commands {
    /// Bind a new address
    Add {
        /// Description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Release an address
    Del {
        /// Address to release
        address: String,
    },

    /// List bound addresses
    List,
}

/// Reverse-proxy operations.
#[derive(Subcommand)]
pub enum ProxyCommands {
    /// Bind a domain
    Add(ProxyAddArgs),

    /// Unbind a domain
    Del {
        /// Domain
        domain: String,
    },

    /// List bound domains
    List,

    /// Check whether a domain can be bound
    Check {
        /// Domain
        domain: String,
    },
}

/// Arguments of `proxy add`.
#[derive(Args)]
pub struct ProxyAddArgs {
    /// Domain to bind
    pub domain: String,

    /// Container port to forward to
    #[arg(long, default_value_t = DEFAULT_CONTAINER_PORT)]
    pub container_port: u16,

    /// Description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Terminate TLS
    #[arg(long)]
    pub ssl: bool,

    /// Certificate source
    #[arg(long, value_enum, default_value_t = SslType::SelfSigned)]
    pub ssl_type: SslType,

    /// PEM certificate file, custom SSL only
    #[arg(long)]
    pub ssl_cert: Option<PathBuf>,

    /// PEM private key file, custom SSL only
    #[arg(long)]
    pub ssl_key: Option<PathBuf>,
}

impl ProxyAddArgs {
    fn into_request(self) -> Result<AddProxyRequest> {
        let read = |path: Option<PathBuf>| -> Result<Option<String>> {
            path.map(|p| {
                std::fs::read_to_string(&p)
                    .wrap_err_with(|| format!("Failed to read {}", p.display()))
            })
            .transpose()
        };

        let mut request = AddProxyRequest::new(self.domain)
            .with_container_port(self.container_port)
            .with_description(self.description);
        if self.ssl {
            request = request.with_ssl(self.ssl_type);
        }
        request.ssl_cert = read(self.ssl_cert)?;
        request.ssl_key = read(self.ssl_key)?;
        Ok(request)
    }
}

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "EXTERNAL")]
    external: String,
    #[tabled(rename = "INTERNAL")]
    internal: String,
    #[tabled(rename = "PROTOCOL")]
    protocol: String,
    #[tabled(rename = "SLOTS")]
    slots: u32,
}

impl From<&AllocationUnit> for RuleRow {
    fn from(unit: &AllocationUnit) -> Self {
        let span = |start: u16, end: u16| {
            if end > 0 {
                format!("{start}-{end}")
            } else {
                start.to_string()
            }
        };

        Self {
            external: span(unit.external_port, unit.external_port_end),
            internal: span(unit.internal_port, unit.internal_port_end),
            protocol: unit
                .protocols
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("+"),
            slots: unit.weight(),
        }
    }
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<ExitCode> {
        let mut config = PanelConfig::from_file(&self.config)
            .wrap_err_with(|| format!("Failed to load {}", self.config.display()))?;
        if let Some(api_key) = self.api_key {
            config = config.with_api_key(api_key);
        }

        let manager = HttpManager::new(&config.manager)?;
        let hostname = config.account.hostname.as_str();
        tracing::debug!(endpoint = manager.base_url(), hostname, "Using manager");

        let reply: PanelReply = match self.command {
            Commands::Nat { command } => {
                let panel = NatPanel::new(&manager, hostname, config.account.nat_capabilities());
                match command {
                    NatCommands::Add(args) => {
                        let mut request = AddRequest::range(
                            args.internal,
                            args.internal_end,
                            args.external,
                            args.external_end,
                        );
                        request.description = args.description;
                        panel.add(&request).await.into()
                    }
                    NatCommands::Del(args) => {
                        let request = DeleteRequest {
                            protocol: args.protocol,
                            internal_port: args.internal,
                            external_port: args.external,
                            internal_port_end: args.internal_end,
                            external_port_end: args.external_end,
                        };
                        panel.delete(&request).await.into()
                    }
                    NatCommands::List { json: false } => {
                        return match panel.list().await {
                            Ok(listing) => {
                                print_listing(&listing);
                                Ok(ExitCode::SUCCESS)
                            }
                            Err(e) => emit(&PanelReply::error(e.to_string())),
                        };
                    }
                    NatCommands::List { json: true } => PanelReply::from_data(panel.list().await),
                    NatCommands::Check { protocol, port } => {
                        PanelReply::from_data(panel.check(&protocol, port).await)
                    }
                }
            }

            Commands::Ipv6 { command } => {
                let panel =
                    Ipv6Panel::new(&manager, hostname, config.account.ipv6_capabilities());
                match command {
                    Ipv6Commands::Add { description } => panel.add(&description).await.into(),
                    Ipv6Commands::Del { address } => panel.delete(&address).await.into(),
                    Ipv6Commands::List => PanelReply::from_data(panel.list().await),
                }
            }

            Commands::Proxy { command } => {
                let panel =
                    ProxyPanel::new(&manager, hostname, config.account.proxy_capabilities());
                match command {
                    ProxyCommands::Add(args) => panel.add(&args.into_request()?).await.into(),
                    ProxyCommands::Del { domain } => panel.delete(&domain).await.into(),
                    ProxyCommands::List => PanelReply::from_data(panel.list().await),
                    ProxyCommands::Check { domain } => {
                        PanelReply::from_data(panel.check(&domain).await)
                    }
                }
            }
        };

        emit(&reply)
    }
}

fn emit(reply: &PanelReply) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(reply)?);
    Ok(if reply.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_listing(listing: &NatListing) {
    if listing.units.is_empty() {
        println!("No NAT mappings");
    } else {
        let rows: Vec<RuleRow> = listing.units.iter().map(RuleRow::from).collect();
        println!("{}", Table::new(rows));
    }
    println!(
        "Quota: {}/{} used, {} remaining",
        listing.quota.used, listing.quota.limit, listing.remaining
    );
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use lxpanel_common::Protocol;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nat_range_add() {
        let cli = Cli::try_parse_from([
            "lxpanel",
            "--config",
            "/tmp/panel.toml",
            "nat",
            "add",
            "--internal",
            "8000",
            "--internal-end",
            "8009",
            "--external",
            "20000",
            "--external-end",
            "20009",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("/tmp/panel.toml"));
        let Commands::Nat {
            command: NatCommands::Add(args),
        } = cli.command
        else {
            panic!("expected nat add");
        };
        assert_eq!(
            (args.internal, args.internal_end, args.external, args.external_end),
            (8000, 8009, 20000, 20009)
        );
    }

    #[test]
    fn proxy_ssl_type_values() {
        let cli = Cli::try_parse_from([
            "lxpanel", "proxy", "add", "app.example.com", "--ssl", "--ssl-type", "self-signed",
        ])
        .unwrap();
        let Commands::Proxy {
            command: ProxyCommands::Add(args),
        } = cli.command
        else {
            panic!("expected proxy add");
        };
        assert_eq!(args.ssl_type, SslType::SelfSigned);
        assert_eq!(args.container_port, 80);
    }

    #[test]
    fn rule_row_formats_ranges() {
        let row = RuleRow::from(&AllocationUnit {
            external_port: 20000,
            internal_port: 8000,
            external_port_end: 20009,
            internal_port_end: 8009,
            protocols: vec![Protocol::Tcp, Protocol::Udp],
        });
        assert_eq!(row.external, "20000-20009");
        assert_eq!(row.internal, "8000-8009");
        assert_eq!(row.protocol, "tcp+udp");
        assert_eq!(row.slots, 10);
    }
}
