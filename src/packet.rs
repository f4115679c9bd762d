// Link-layer, IPv4 and UDP header views over a raw receive buffer.
//
// Every view is produced by one bounds-checked read of a fixed-size region.
// No parser trusts a length established by another parser: the UDP offset
// depends on the IPv4 header length field, which is itself validated first.

use std::fmt;
use std::net::Ipv4Addr;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

// Ethernet
pub const ETH_HLEN: usize = 14;
pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_IPV6: u16 = 0x86DD;
const ETHERTYPE_OFFSET: usize = 12;

// IPv4
pub const IPV4_MIN_HLEN: usize = 20;
const IPV4_ID_OFFSET: usize = 4;
const IPV4_FLAGS_FRAG_OFFSET: usize = 6;
const IPV4_PROTO_OFFSET: usize = 9;
const IPV4_SRC_OFFSET: usize = 12;
const IPV4_DST_OFFSET: usize = 16;

const IPV4_FLAG_DF: u16 = 0x4000;
const IPV4_FLAG_MF: u16 = 0x2000;
const IPV4_FRAG_OFFSET_MASK: u16 = 0x1FFF;

// L4 protocol numbers
pub const PROTO_UDP: u8 = 17;

// UDP
pub const UDP_HLEN: usize = 8;

// ---------------------------------------------------------------------------
// Bounds-checked cursor
// ---------------------------------------------------------------------------

/// Returns true if `size` bytes starting at `offset` lie entirely inside `data`.
#[inline]
pub fn fits(data: &[u8], offset: usize, size: usize) -> bool {
    offset
        .checked_add(size)
        .is_some_and(|end| end <= data.len())
}

/// Borrows the `N`-byte region starting at `offset`, or `None` if any byte of
/// it lies past the end of `data`.
#[inline]
pub fn header_at<const N: usize>(data: &[u8], offset: usize) -> Option<&[u8; N]> {
    if !fits(data, offset, N) {
        return None;
    }
    data[offset..offset + N].try_into().ok()
}

/// Protocol layer a header belongs to, used in parse errors and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Ipv4,
    Udp,
    Dns,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4 => write!(f, "ipv4"),
            Self::Udp => write!(f, "udp"),
            Self::Dns => write!(f, "dns"),
        }
    }
}

/// Why a header view could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("{layer} header truncated: need {needed} bytes at offset {offset}, frame has {available}")]
    Truncated {
        layer: Layer,
        offset: usize,
        needed: usize,
        available: usize,
    },
}

/// Borrows a fixed-size header of `layer`, or reports how short the frame is.
pub(crate) fn read_header<const N: usize>(
    data: &[u8],
    offset: usize,
    layer: Layer,
) -> Result<&[u8; N], HeaderError> {
    header_at::<N>(data, offset).ok_or(HeaderError::Truncated {
        layer,
        offset,
        needed: N,
        available: data.len(),
    })
}

// ---------------------------------------------------------------------------
// Link layer
// ---------------------------------------------------------------------------

/// Outcome of inspecting the Ethernet header of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkClass {
    /// Shorter than an Ethernet header.
    Runt,
    /// IPv6 payload. Never inspected.
    Ipv6,
    /// Some other EtherType (ARP, VLAN tag, ...). Outside the filter's jurisdiction.
    PassThrough { ethertype: u16 },
    /// IPv4 payload starting at `payload_offset`.
    Continue {
        payload_offset: usize,
        ethertype: u16,
    },
}

/// Classify a frame by its Ethernet II header.
pub fn classify_link(data: &[u8]) -> LinkClass {
    let Some(eth) = header_at::<ETH_HLEN>(data, 0) else {
        return LinkClass::Runt;
    };
    let ethertype = u16::from_be_bytes([eth[ETHERTYPE_OFFSET], eth[ETHERTYPE_OFFSET + 1]]);

    match ethertype {
        ETHERTYPE_IPV6 => LinkClass::Ipv6,
        ETHERTYPE_IPV4 => LinkClass::Continue {
            payload_offset: ETH_HLEN,
            ethertype,
        },
        _ => LinkClass::PassThrough { ethertype },
    }
}

// ---------------------------------------------------------------------------
// IPv4
// ---------------------------------------------------------------------------

/// Fields of an IPv4 header the filter looks at. Multi-byte fields are in
/// host order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub protocol: u8,
    pub identification: u16,
    /// Raw flags + fragment offset word (bytes 6-7).
    pub flags_fragment: u16,
    /// Real header length in bytes (`IHL * 4`), options included.
    pub header_len: usize,
}

impl Ipv4Header {
    pub fn dont_fragment(&self) -> bool {
        self.flags_fragment & IPV4_FLAG_DF != 0
    }

    pub fn more_fragments(&self) -> bool {
        self.flags_fragment & IPV4_FLAG_MF != 0
    }

    pub fn fragment_offset(&self) -> u16 {
        self.flags_fragment & IPV4_FRAG_OFFSET_MASK
    }
}

/// Parse the IPv4 header starting at `offset`.
///
/// The 20-byte fixed part is checked first; the length derived from IHL is
/// then checked again so the caller can safely step past any options. The
/// IHL itself is not validated.
pub fn parse_ipv4(data: &[u8], offset: usize) -> Result<Ipv4Header, HeaderError> {
    let hdr = read_header::<IPV4_MIN_HLEN>(data, offset, Layer::Ipv4)?;

    // An IHL below 5 is taken at face value: the UDP offset then lands
    // inside the IPv4 header, and the later parsers still bounds-check it.
    let header_len = ((hdr[0] & 0x0F) as usize) * 4;
    if !fits(data, offset, header_len) {
        return Err(HeaderError::Truncated {
            layer: Layer::Ipv4,
            offset,
            needed: header_len,
            available: data.len(),
        });
    }

    Ok(Ipv4Header {
        src: Ipv4Addr::new(
            hdr[IPV4_SRC_OFFSET],
            hdr[IPV4_SRC_OFFSET + 1],
            hdr[IPV4_SRC_OFFSET + 2],
            hdr[IPV4_SRC_OFFSET + 3],
        ),
        dst: Ipv4Addr::new(
            hdr[IPV4_DST_OFFSET],
            hdr[IPV4_DST_OFFSET + 1],
            hdr[IPV4_DST_OFFSET + 2],
            hdr[IPV4_DST_OFFSET + 3],
        ),
        protocol: hdr[IPV4_PROTO_OFFSET],
        identification: u16::from_be_bytes([hdr[IPV4_ID_OFFSET], hdr[IPV4_ID_OFFSET + 1]]),
        flags_fragment: u16::from_be_bytes([
            hdr[IPV4_FLAGS_FRAG_OFFSET],
            hdr[IPV4_FLAGS_FRAG_OFFSET + 1],
        ]),
        header_len,
    })
}

// ---------------------------------------------------------------------------
// UDP
// ---------------------------------------------------------------------------

/// UDP header with ports and length in host order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub length: u16,
}

/// Parse the 8-byte UDP header starting at `offset`.
pub fn parse_udp(data: &[u8], offset: usize) -> Result<UdpHeader, HeaderError> {
    let hdr = read_header::<UDP_HLEN>(data, offset, Layer::Udp)?;
    Ok(UdpHeader {
        src_port: u16::from_be_bytes([hdr[0], hdr[1]]),
        dst_port: u16::from_be_bytes([hdr[2], hdr[3]]),
        length: u16::from_be_bytes([hdr[4], hdr[5]]),
    })
}
