// Classic libpcap capture-file reader.
//
// Walks the record stream of an in-memory capture, yielding frames borrowed
// from the file buffer. Only Ethernet captures are accepted because the filter
// classifies frames by their Ethernet header.

use crate::error::GuardError;
use crate::packet::header_at;

const GLOBAL_HDR_LEN: usize = 24;
const RECORD_HDR_LEN: usize = 16;

const MAGIC_MICROS: u32 = 0xA1B2_C3D4;
const MAGIC_NANOS: u32 = 0xA1B2_3C4D;

/// LINKTYPE_ETHERNET / DLT_EN10MB.
pub const LINKTYPE_ETHERNET: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn u16(self, b: [u8; 2]) -> u16 {
        match self {
            Self::Little => u16::from_le_bytes(b),
            Self::Big => u16::from_be_bytes(b),
        }
    }

    fn u32(self, b: [u8; 4]) -> u32 {
        match self {
            Self::Little => u32::from_le_bytes(b),
            Self::Big => u32::from_be_bytes(b),
        }
    }
}

/// Resolution of the fractional part of record timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPrecision {
    Micros,
    Nanos,
}

/// Decoded pcap global header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcapHeader {
    order: ByteOrder,
    pub precision: TimestampPrecision,
    pub version_major: u16,
    pub version_minor: u16,
    pub snaplen: u32,
    pub link_type: u32,
}

/// One captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcapRecord<'a> {
    /// Zero-based position in the capture.
    pub index: usize,
    /// Capture timestamp in microseconds since epoch.
    pub timestamp_us: u64,
    /// Length of the frame on the wire, which may exceed `data.len()`.
    pub orig_len: usize,
    pub data: &'a [u8],
}

impl PcapRecord<'_> {
    /// True if the capture's snap length cut this frame short.
    pub fn is_clipped(&self) -> bool {
        self.data.len() < self.orig_len
    }
}

/// Reader over a complete capture file held in memory.
#[derive(Debug, Clone, Copy)]
pub struct PcapReader<'a> {
    buf: &'a [u8],
    header: PcapHeader,
}

impl<'a> PcapReader<'a> {
    /// Validate the global header of `buf`.
    pub fn new(buf: &'a [u8]) -> Result<Self, GuardError> {
        let hdr = header_at::<GLOBAL_HDR_LEN>(buf, 0).ok_or(GuardError::CaptureFormat {
            offset: 0,
            detail: format!(
                "file is {} bytes, shorter than the {GLOBAL_HDR_LEN}-byte pcap header",
                buf.len()
            ),
        })?;

        let magic = [hdr[0], hdr[1], hdr[2], hdr[3]];
        let (order, precision) = match (u32::from_le_bytes(magic), u32::from_be_bytes(magic)) {
            (MAGIC_MICROS, _) => (ByteOrder::Little, TimestampPrecision::Micros),
            (MAGIC_NANOS, _) => (ByteOrder::Little, TimestampPrecision::Nanos),
            (_, MAGIC_MICROS) => (ByteOrder::Big, TimestampPrecision::Micros),
            (_, MAGIC_NANOS) => (ByteOrder::Big, TimestampPrecision::Nanos),
            (le, _) => {
                return Err(GuardError::CaptureFormat {
                    offset: 0,
                    detail: format!("unrecognized magic number {le:#010x} (pcapng is not supported)"),
                });
            }
        };

        let header = PcapHeader {
            order,
            precision,
            version_major: order.u16([hdr[4], hdr[5]]),
            version_minor: order.u16([hdr[6], hdr[7]]),
            snaplen: order.u32([hdr[16], hdr[17], hdr[18], hdr[19]]),
            link_type: order.u32([hdr[20], hdr[21], hdr[22], hdr[23]]),
        };

        if header.link_type != LINKTYPE_ETHERNET {
            return Err(GuardError::UnsupportedLinkType(header.link_type));
        }

        log::debug!(
            "pcap v{}.{}, snaplen {}, {:?} timestamps",
            header.version_major,
            header.version_minor,
            header.snaplen,
            header.precision
        );

        Ok(Self { buf, header })
    }

    pub fn header(&self) -> &PcapHeader {
        &self.header
    }

    pub fn records(&self) -> PcapRecordIter<'a> {
        PcapRecordIter {
            buf: self.buf,
            pos: GLOBAL_HDR_LEN,
            index: 0,
            header: self.header,
        }
    }
}

/// Streaming iterator over the records of a capture.
///
/// A record whose header or data runs past the end of the file ends the
/// iteration; whatever was read before it is still yielded.
pub struct PcapRecordIter<'a> {
    buf: &'a [u8],
    pos: usize,
    index: usize,
    header: PcapHeader,
}

impl<'a> Iterator for PcapRecordIter<'a> {
    type Item = PcapRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buf.len() {
            return None;
        }

        let Some(rec) = header_at::<RECORD_HDR_LEN>(self.buf, self.pos) else {
            log::warn!(
                "capture ends inside record header {} at offset {}",
                self.index,
                self.pos
            );
            self.pos = self.buf.len();
            return None;
        };

        let order = self.header.order;
        let ts_sec = order.u32([rec[0], rec[1], rec[2], rec[3]]) as u64;
        let ts_frac = order.u32([rec[4], rec[5], rec[6], rec[7]]) as u64;
        let incl_len = order.u32([rec[8], rec[9], rec[10], rec[11]]) as usize;
        let orig_len = order.u32([rec[12], rec[13], rec[14], rec[15]]) as usize;

        let start = self.pos + RECORD_HDR_LEN;
        let end = match start.checked_add(incl_len) {
            Some(end) if end <= self.buf.len() => end,
            _ => {
                log::warn!(
                    "record {} claims {} captured bytes at offset {}, only {} remain",
                    self.index,
                    incl_len,
                    start,
                    self.buf.len() - start
                );
                self.pos = self.buf.len();
                return None;
            }
        };

        let frac_us = match self.header.precision {
            TimestampPrecision::Micros => ts_frac,
            TimestampPrecision::Nanos => ts_frac / 1_000,
        };

        let record = PcapRecord {
            index: self.index,
            timestamp_us: ts_sec.saturating_mul(1_000_000).saturating_add(frac_us),
            orig_len,
            data: &self.buf[start..end],
        };
        self.pos = end;
        self.index += 1;
        Some(record)
    }
}
