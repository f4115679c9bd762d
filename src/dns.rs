// DNS fixed-header inspector (RFC 1035 Section 4.1.1).
//
// Only the 12-byte header is decoded. Names and resource records that follow
// are never touched.

use crate::packet::{read_header, HeaderError, Layer};

/// DNS header size in bytes.
pub const HEADER_SIZE: usize = 12;

// First flags byte (offset 2).
const QR_BIT: u8 = 0x80;
const OPCODE_MASK: u8 = 0x78;
const OPCODE_SHIFT: u8 = 3;
const AA_BIT: u8 = 0x04;
const TC_BIT: u8 = 0x02;
const RD_BIT: u8 = 0x01;

// Second flags byte (offset 3).
const RA_BIT: u8 = 0x80;
const Z_BIT: u8 = 0x40;
const AD_BIT: u8 = 0x20;
const CD_BIT: u8 = 0x10;
const RCODE_MASK: u8 = 0x0F;

/// Decoded DNS header. Counts are in host order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsHeader {
    pub id: u16,
    /// Query (false) or response (true).
    pub qr: bool,
    pub opcode: u8,
    /// Authoritative answer.
    pub aa: bool,
    /// Truncated message.
    pub tc: bool,
    /// Recursion desired.
    pub rd: bool,
    /// Recursion available.
    pub ra: bool,
    /// Reserved bit.
    pub z: bool,
    /// Authenticated data (DNSSEC).
    pub ad: bool,
    /// Checking disabled (DNSSEC).
    pub cd: bool,
    /// Response code, low 4 bits of the second flags byte.
    pub rcode: u8,
    pub q_count: u16,
    pub ans_count: u16,
    pub auth_count: u16,
    pub add_count: u16,
}

impl DnsHeader {
    /// Decode the header from its wire bytes. Flag bits are extracted by mask
    /// and shift, never through a packed struct layout.
    pub fn from_bytes(raw: &[u8; HEADER_SIZE]) -> Self {
        let hi = raw[2];
        let lo = raw[3];
        Self {
            id: u16::from_be_bytes([raw[0], raw[1]]),
            qr: hi & QR_BIT != 0,
            opcode: (hi & OPCODE_MASK) >> OPCODE_SHIFT,
            aa: hi & AA_BIT != 0,
            tc: hi & TC_BIT != 0,
            rd: hi & RD_BIT != 0,
            ra: lo & RA_BIT != 0,
            z: lo & Z_BIT != 0,
            ad: lo & AD_BIT != 0,
            cd: lo & CD_BIT != 0,
            rcode: lo & RCODE_MASK,
            q_count: u16::from_be_bytes([raw[4], raw[5]]),
            ans_count: u16::from_be_bytes([raw[6], raw[7]]),
            auth_count: u16::from_be_bytes([raw[8], raw[9]]),
            add_count: u16::from_be_bytes([raw[10], raw[11]]),
        }
    }
}

/// Parse the DNS header starting at `offset` (the first byte of the UDP payload).
pub fn parse_dns_header(data: &[u8], offset: usize) -> Result<DnsHeader, HeaderError> {
    let raw = read_header::<HEADER_SIZE>(data, offset, Layer::Dns)?;
    Ok(DnsHeader::from_bytes(raw))
}
