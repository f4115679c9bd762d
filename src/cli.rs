use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::error::GuardError;
use crate::filter::{
    check_dns_port, FilterPolicy, DEFAULT_FRAGMENT_SIGNATURE, DEFAULT_RESOLVER, DNS_PORT,
};

#[derive(Parser, Debug)]
#[command(
    name = "dnsguard",
    version,
    about = "Replay captured traffic through the spoofed-DNS-response filter"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the verdict for every frame of a capture
    Replay(ReplayArgs),
    /// Print aggregate verdict counts for a capture
    Stats(StatsArgs),
}

/// Filter policy flags shared by all subcommands.
#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    /// Trusted resolver whose responses are inspected
    #[arg(long, default_value_t = DEFAULT_RESOLVER)]
    pub resolver: Ipv4Addr,

    /// UDP source port of DNS responses
    #[arg(long, default_value_t = DNS_PORT, value_parser = validate_port)]
    pub dns_port: u16,

    /// IPv4 flags/fragment-offset word treated as a forgery signature (decimal or 0x-hex)
    #[arg(long, default_value_t = DEFAULT_FRAGMENT_SIGNATURE, value_parser = parse_signature)]
    pub fragment_signature: u16,
}

impl Default for PolicyArgs {
    fn default() -> Self {
        let policy = FilterPolicy::default();
        Self {
            resolver: policy.resolver,
            dns_port: policy.dns_port,
            fragment_signature: policy.fragment_signature,
        }
    }
}

impl PolicyArgs {
    pub fn policy(&self) -> Result<FilterPolicy, GuardError> {
        Ok(FilterPolicy::new(self.resolver, self.dns_port)?
            .with_fragment_signature(self.fragment_signature))
    }
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Capture file (classic pcap, Ethernet link type)
    pub capture: PathBuf,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Output format [default: tsv]
    #[arg(long, default_value = "tsv")]
    pub format: OutputFormat,

    /// Only print frames that would be discarded
    #[arg(long)]
    pub discarded_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    /// Capture file (classic pcap, Ethernet link type)
    pub capture: PathBuf,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Output format [default: tsv]
    #[arg(long, default_value = "tsv")]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Tsv,
    Json,
    Pretty,
}

fn validate_port(s: &str) -> Result<u16, String> {
    let val: u16 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid port"))?;
    check_dns_port(val).map_err(|e| e.to_string())
}

fn parse_signature(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| format!("'{s}' is not a 16-bit value"))
}
