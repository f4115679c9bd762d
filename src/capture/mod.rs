// Capture sources that feed frames to the filter offline.
//
// Live attachment to an interface is left to the hosting environment; this
// module only reads frames that were already captured.

pub mod pcap;

pub use pcap::{PcapReader, PcapRecord, PcapRecordIter};
