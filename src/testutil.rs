// Raw frame construction for unit tests.

use std::net::Ipv4Addr;

use crate::packet::{ETHERTYPE_IPV4, ETH_HLEN, IPV4_MIN_HLEN, PROTO_UDP, UDP_HLEN};

const DNS_QR: u16 = 0x8000;
const DNS_AA: u16 = 0x0400;
const DNS_RD: u16 = 0x0100;
const DNS_RA: u16 = 0x0080;
const DNS_AD: u16 = 0x0020;

/// Builds Ethernet/IPv4/UDP/DNS frames byte by byte.
///
/// The default frame is a single-answer, authoritative, unauthenticated
/// response from 8.8.8.8:53, the profile the filter discards.
pub(crate) struct FrameBuilder {
    src_mac: [u8; 6],
    dst_mac: [u8; 6],
    ethertype: u16,
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    protocol: u8,
    identification: u16,
    flags_fragment: u16,
    ip_options: Vec<u8>,
    src_port: u16,
    dst_port: u16,
    dns_id: u16,
    dns_flags: u16,
    answers: u16,
    // Question + answer records following the DNS header.
    dns_body: Vec<u8>,
}

impl FrameBuilder {
    pub(crate) fn new() -> Self {
        let mut dns_body = Vec::new();
        // example.com IN A
        dns_body.extend_from_slice(b"\x07example\x03com\x00");
        dns_body.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        // Answer: pointer to the question name, A, IN, TTL 300, 93.184.216.34
        dns_body.extend_from_slice(&[0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01]);
        dns_body.extend_from_slice(&300u32.to_be_bytes());
        dns_body.extend_from_slice(&[0x00, 0x04, 93, 184, 216, 34]);

        Self {
            src_mac: [0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
            dst_mac: [0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB],
            ethertype: ETHERTYPE_IPV4,
            src_ip: Ipv4Addr::new(8, 8, 8, 8),
            dst_ip: Ipv4Addr::new(192, 168, 1, 10),
            protocol: PROTO_UDP,
            identification: 0x1C2D,
            flags_fragment: 0,
            ip_options: Vec::new(),
            src_port: 53,
            dst_port: 40000,
            dns_id: 0xABCD,
            dns_flags: DNS_QR | DNS_AA | DNS_RD | DNS_RA,
            answers: 1,
            dns_body,
        }
    }

    pub(crate) fn ethertype(mut self, et: u16) -> Self {
        self.ethertype = et;
        self
    }

    pub(crate) fn ipv4(mut self, src: Ipv4Addr, dst: Ipv4Addr) -> Self {
        self.src_ip = src;
        self.dst_ip = dst;
        self
    }

    pub(crate) fn protocol(mut self, proto: u8) -> Self {
        self.protocol = proto;
        self
    }

    pub(crate) fn identification(mut self, id: u16) -> Self {
        self.identification = id;
        self
    }

    pub(crate) fn flags_fragment(mut self, word: u16) -> Self {
        self.flags_fragment = word;
        self
    }

    pub(crate) fn ip_options(mut self, opts: Vec<u8>) -> Self {
        self.ip_options = opts;
        self
    }

    pub(crate) fn ports(mut self, src: u16, dst: u16) -> Self {
        self.src_port = src;
        self.dst_port = dst;
        self
    }

    pub(crate) fn dns_flags(mut self, flags: u16) -> Self {
        self.dns_flags = flags;
        self
    }

    pub(crate) fn response(self, on: bool) -> Self {
        self.dns_flag(DNS_QR, on)
    }

    pub(crate) fn authoritative(self, on: bool) -> Self {
        self.dns_flag(DNS_AA, on)
    }

    pub(crate) fn authenticated(self, on: bool) -> Self {
        self.dns_flag(DNS_AD, on)
    }

    pub(crate) fn answers(mut self, count: u16) -> Self {
        self.answers = count;
        self
    }

    fn dns_flag(mut self, bit: u16, on: bool) -> Self {
        if on {
            self.dns_flags |= bit;
        } else {
            self.dns_flags &= !bit;
        }
        self
    }

    /// Offset of the first DNS header byte in the built frame.
    pub(crate) fn dns_offset(&self) -> usize {
        ETH_HLEN + IPV4_MIN_HLEN + self.ip_options.len() + UDP_HLEN
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut pkt = Vec::new();

        // --- Ethernet header (14 bytes) ---
        pkt.extend_from_slice(&self.dst_mac);
        pkt.extend_from_slice(&self.src_mac);
        pkt.extend_from_slice(&self.ethertype.to_be_bytes());

        let mut dns = Vec::new();
        dns.extend_from_slice(&self.dns_id.to_be_bytes());
        dns.extend_from_slice(&self.dns_flags.to_be_bytes());
        dns.extend_from_slice(&1u16.to_be_bytes()); // QDCOUNT
        dns.extend_from_slice(&self.answers.to_be_bytes()); // ANCOUNT
        dns.extend_from_slice(&0u16.to_be_bytes()); // NSCOUNT
        dns.extend_from_slice(&0u16.to_be_bytes()); // ARCOUNT
        dns.extend_from_slice(&self.dns_body);

        let udp_len = (UDP_HLEN + dns.len()) as u16;
        let ihl = (IPV4_MIN_HLEN + self.ip_options.len()) / 4;
        let total_len = (ihl * 4) as u16 + udp_len;

        // --- IPv4 header ---
        pkt.push(0x40 | ihl as u8);
        pkt.push(0x00);
        pkt.extend_from_slice(&total_len.to_be_bytes());
        pkt.extend_from_slice(&self.identification.to_be_bytes());
        pkt.extend_from_slice(&self.flags_fragment.to_be_bytes());
        pkt.push(64); // TTL
        pkt.push(self.protocol);
        pkt.extend_from_slice(&0u16.to_be_bytes()); // checksum
        pkt.extend_from_slice(&self.src_ip.octets());
        pkt.extend_from_slice(&self.dst_ip.octets());
        pkt.extend_from_slice(&self.ip_options);

        // --- UDP header ---
        pkt.extend_from_slice(&self.src_port.to_be_bytes());
        pkt.extend_from_slice(&self.dst_port.to_be_bytes());
        pkt.extend_from_slice(&udp_len.to_be_bytes());
        pkt.extend_from_slice(&0u16.to_be_bytes()); // checksum

        pkt.extend_from_slice(&dns);
        pkt
    }
}
