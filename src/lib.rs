//! Receive-path filter for spoofed DNS responses.
//!
//! The filter inspects raw Ethernet frames, follows them through IPv4 and UDP
//! to the DNS header, and decides whether each one is admitted or discarded.
//! The same decision logic drives the `dnsguard` binary, which replays
//! classic pcap captures through a [`FilterPolicy`].

pub mod capture;
pub mod cli;
pub mod dns;
pub mod error;
pub mod filter;
pub mod output;
pub mod packet;
pub mod replay;

#[cfg(test)]
mod testutil;

pub use error::GuardError;
pub use filter::{evaluate, Disposition, FilterPolicy, Reason, Verdict};
