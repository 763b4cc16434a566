//! Command-line arguments shared by the `snmp-*` tools.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

use clap::{Args, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::client::Client;
use crate::engine::{DEFAULT_PORT, Engine};
use crate::error::Result;
use crate::message::ClientOptions;
use crate::version::Version;

/// Target and protocol options.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Agent address as `host` or `host:port`.
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Community string.
    #[arg(short = 'c', long, default_value = "public")]
    pub community: String,

    /// Protocol version: 1 or 2c.
    #[arg(short = 'v', long = "snmp-version", default_value = "2c")]
    pub snmp_version: Version,

    /// Seconds to wait for each attempt.
    #[arg(short = 't', long, default_value_t = 5.0)]
    pub timeout: f64,

    /// Retransmissions after the first attempt.
    #[arg(short = 'r', long, default_value_t = 1)]
    pub retries: u32,
}

impl CommonArgs {
    /// Resolve the target, defaulting the port to 161.
    pub fn target_addr(&self) -> std::result::Result<SocketAddr, String> {
        if let Ok(addr) = self.target.parse::<SocketAddr>() {
            return Ok(addr);
        }
        if let Ok(ip) = self.target.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, DEFAULT_PORT));
        }
        let with_port = if self.target.contains(':') {
            self.target.clone()
        } else {
            format!("{}:{}", self.target, DEFAULT_PORT)
        };
        with_port
            .to_socket_addrs()
            .map_err(|e| format!("cannot resolve '{}': {}", self.target, e))?
            .next()
            .ok_or_else(|| format!("no address found for '{}'", self.target))
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.timeout.max(0.0))
    }

    pub fn options(&self) -> ClientOptions {
        ClientOptions::new(self.snmp_version, self.community.clone().into_bytes())
    }

    /// Bind an engine on an ephemeral port and return a client for `target`.
    pub async fn connect(&self, target: SocketAddr) -> Result<Client> {
        let interface = if target.is_ipv6() {
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        };
        let engine = Engine::builder()
            .interface(interface)
            .port(0)
            .retries(self.retries)
            .timeout(self.timeout_duration())
            .bind()
            .await?;
        Ok(engine.client(target, self.options()))
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `OID = TYPE: value` lines
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
    /// Tab-separated, no type names
    Raw,
}

/// Output and diagnostics options.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format.
    #[arg(short = 'O', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` wins if set.
    #[arg(long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print elapsed time after the results.
    #[arg(long)]
    pub timing: bool,

    /// Always show OCTET STRING values as hex.
    #[arg(long)]
    pub hex: bool,

    /// Do not annotate well-known OIDs with names.
    #[arg(long)]
    pub no_hints: bool,
}

impl OutputArgs {
    /// Install a stderr subscriber.
    pub fn init_tracing(&self) {
        let fallback = match self.verbose {
            0 => "warn",
            1 => "snmp_engine=debug",
            _ => "snmp_engine=trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
