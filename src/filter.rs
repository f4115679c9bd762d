//! Receive-path admit/discard policy for spoofed DNS responses.
//!
//! [`FilterPolicy::evaluate`] walks one frame through the Ethernet, IPv4, UDP
//! and DNS header parsers in a fixed order and stops at the first gate that
//! reaches a decision. Responses claiming to come from the trusted resolver
//! are discarded when they carry a forgery signature:
//!
//! - IPv4 identification of zero
//! - the configured flags/fragment-offset pattern
//! - an authoritative, unauthenticated, single-answer response
//!
//! Anything that cannot be parsed far enough to be judged is admitted.
//! IPv6 is the one exception to "out of scope means admit": it is always
//! discarded.
//!
//! Evaluation is a pure function of the policy and the frame bytes, so one
//! policy value can be shared by any number of threads.

use std::fmt;
use std::net::Ipv4Addr;

use serde::Serialize;

use crate::dns::{parse_dns_header, DnsHeader};
use crate::error::GuardError;
use crate::packet::{classify_link, parse_ipv4, parse_udp, LinkClass, PROTO_UDP, UDP_HLEN};

/// Kernel XDP verdict codes (`enum xdp_action`).
pub const XDP_DROP: u32 = 1;
pub const XDP_PASS: u32 = 2;

pub const DEFAULT_RESOLVER: Ipv4Addr = Ipv4Addr::new(8, 8, 8, 8);
pub const DNS_PORT: u16 = 53;

/// Flags/fragment-offset word, in network order, treated as a forgery
/// signature: the bytes `40 00` on the wire.
pub const DEFAULT_FRAGMENT_SIGNATURE: u16 = 0x4000;

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// What happens to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Admit,
    Discard,
}

impl Disposition {
    /// The equivalent XDP return code.
    pub fn xdp_action(self) -> u32 {
        match self {
            Self::Admit => XDP_PASS,
            Self::Discard => XDP_DROP,
        }
    }

    pub fn is_discard(self) -> bool {
        self == Self::Discard
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Admit => "admit",
            Self::Discard => "discard",
        })
    }
}

/// The gate that decided a frame's fate, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Shorter than an Ethernet header.
    RuntFrame,
    Ipv6,
    NotIpv4,
    MalformedIpv4,
    NotUdp,
    UntrustedSource,
    ZeroIdentification,
    FragmentSignature,
    MalformedUdp,
    NotDnsSource,
    MalformedDns,
    NotResponse,
    AuthenticatedData,
    MultipleAnswers,
    AuthoritativeAnswer,
    /// Passed every gate without a forgery signal.
    NoSignal,
}

impl Reason {
    pub fn disposition(self) -> Disposition {
        match self {
            Self::RuntFrame
            | Self::Ipv6
            | Self::ZeroIdentification
            | Self::FragmentSignature
            | Self::AuthoritativeAnswer => Disposition::Discard,
            Self::NotIpv4
            | Self::MalformedIpv4
            | Self::NotUdp
            | Self::UntrustedSource
            | Self::MalformedUdp
            | Self::NotDnsSource
            | Self::MalformedDns
            | Self::NotResponse
            | Self::AuthenticatedData
            | Self::MultipleAnswers
            | Self::NoSignal => Disposition::Admit,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RuntFrame => "runt_frame",
            Self::Ipv6 => "ipv6",
            Self::NotIpv4 => "not_ipv4",
            Self::MalformedIpv4 => "malformed_ipv4",
            Self::NotUdp => "not_udp",
            Self::UntrustedSource => "untrusted_source",
            Self::ZeroIdentification => "zero_identification",
            Self::FragmentSignature => "fragment_signature",
            Self::MalformedUdp => "malformed_udp",
            Self::NotDnsSource => "not_dns_source",
            Self::MalformedDns => "malformed_dns",
            Self::NotResponse => "not_response",
            Self::AuthenticatedData => "authenticated_data",
            Self::MultipleAnswers => "multiple_answers",
            Self::AuthoritativeAnswer => "authoritative_answer",
            Self::NoSignal => "no_signal",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Disposition of one frame plus the gate that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub disposition: Disposition,
    pub reason: Reason,
}

impl From<Reason> for Verdict {
    fn from(reason: Reason) -> Self {
        Self {
            disposition: reason.disposition(),
            reason,
        }
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Filter configuration. Immutable while frames are being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPolicy {
    /// Upstream resolver whose responses are scrutinized.
    pub resolver: Ipv4Addr,
    /// UDP source port of DNS responses.
    pub dns_port: u16,
    /// Flags/fragment-offset word (host order) that marks a response as forged.
    pub fragment_signature: u16,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            resolver: DEFAULT_RESOLVER,
            dns_port: DNS_PORT,
            fragment_signature: DEFAULT_FRAGMENT_SIGNATURE,
        }
    }
}

impl FilterPolicy {
    /// Policy for `resolver` answering on `dns_port`, with the default
    /// fragment signature.
    pub fn new(resolver: Ipv4Addr, dns_port: u16) -> Result<Self, GuardError> {
        check_dns_port(dns_port)?;
        if resolver.is_unspecified() || resolver.is_broadcast() {
            return Err(GuardError::InvalidPolicy(format!(
                "{resolver} cannot be a resolver address"
            )));
        }
        Ok(Self {
            resolver,
            dns_port,
            fragment_signature: DEFAULT_FRAGMENT_SIGNATURE,
        })
    }

    pub fn with_fragment_signature(mut self, signature: u16) -> Self {
        self.fragment_signature = signature;
        self
    }

    /// Judge one frame.
    pub fn evaluate(&self, frame: &[u8]) -> Verdict {
        let verdict = Verdict::from(self.judge(frame));
        log::trace!("verdict: {} ({})", verdict.disposition, verdict.reason);
        verdict
    }

    /// Shorthand for `evaluate(frame).disposition`.
    pub fn disposition(&self, frame: &[u8]) -> Disposition {
        self.evaluate(frame).disposition
    }

    fn judge(&self, frame: &[u8]) -> Reason {
        let nh_off = match classify_link(frame) {
            LinkClass::Runt => {
                log::trace!("eth: runt frame ({} bytes)", frame.len());
                return Reason::RuntFrame;
            }
            LinkClass::Ipv6 => return Reason::Ipv6,
            LinkClass::PassThrough { ethertype } => {
                log::trace!("eth: proto {ethertype:#06x}, not inspected");
                return Reason::NotIpv4;
            }
            LinkClass::Continue { payload_offset, .. } => payload_offset,
        };

        let ip = match parse_ipv4(frame, nh_off) {
            Ok(ip) => ip,
            Err(e) => {
                log::trace!("{e}");
                return Reason::MalformedIpv4;
            }
        };
        if ip.protocol != PROTO_UDP {
            return Reason::NotUdp;
        }
        if ip.src != self.resolver {
            return Reason::UntrustedSource;
        }

        log::trace!("src: {}, dst: {}, proto: {}", ip.src, ip.dst, ip.protocol);
        log::trace!(
            "id: {:#06x}, ip_hdsize: {}, flags: {:#06x} (df={} mf={} off={})",
            ip.identification,
            ip.header_len,
            ip.flags_fragment,
            ip.dont_fragment(),
            ip.more_fragments(),
            ip.fragment_offset()
        );

        if ip.identification == 0 {
            return Reason::ZeroIdentification;
        }
        if ip.flags_fragment == self.fragment_signature {
            return Reason::FragmentSignature;
        }

        let udp_off = nh_off + ip.header_len;
        let udp = match parse_udp(frame, udp_off) {
            Ok(udp) => udp,
            Err(e) => {
                log::trace!("{e}");
                return Reason::MalformedUdp;
            }
        };
        log::trace!(
            "src port: {}, dst port: {}, len: {}",
            udp.src_port,
            udp.dst_port,
            udp.length
        );
        if udp.src_port != self.dns_port {
            return Reason::NotDnsSource;
        }

        let dns = match parse_dns_header(frame, udp_off + UDP_HLEN) {
            Ok(dns) => dns,
            Err(e) => {
                log::trace!("{e}");
                return Reason::MalformedDns;
            }
        };
        trace_dns(&dns);

        if !dns.qr {
            return Reason::NotResponse;
        }
        if dns.ad {
            return Reason::AuthenticatedData;
        }
        if dns.ans_count > 1 {
            return Reason::MultipleAnswers;
        }
        if dns.aa {
            return Reason::AuthoritativeAnswer;
        }
        Reason::NoSignal
    }
}

fn trace_dns(dns: &DnsHeader) {
    log::trace!(
        "dns id: {:#06x}, qr: {}, aa: {}, ad: {}, rcode: {}, answers: {}",
        dns.id,
        dns.qr as u8,
        dns.aa as u8,
        dns.ad as u8,
        dns.rcode,
        dns.ans_count
    );
}

/// Rejects port 0, which no DNS response can be sent from.
pub fn check_dns_port(port: u16) -> Result<u16, GuardError> {
    if port == 0 {
        return Err(GuardError::InvalidPolicy(
            "DNS port must be non-zero".to_string(),
        ));
    }
    Ok(port)
}

/// Judge one frame against the default policy (8.8.8.8, port 53).
pub fn evaluate(frame: &[u8]) -> Verdict {
    FilterPolicy::default().evaluate(frame)
}
