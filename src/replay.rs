// Offline replay: run every frame of a capture file through a filter policy.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::capture::PcapReader;
use crate::error::GuardError;
use crate::filter::{Disposition, FilterPolicy, Reason};

/// Verdict for one captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplayRecord {
    pub index: usize,
    pub timestamp_us: u64,
    /// Captured bytes the verdict was computed on.
    pub caplen: usize,
    /// Original length on the wire.
    pub wire_len: usize,
    pub disposition: Disposition,
    pub reason: Reason,
}

impl ReplayRecord {
    pub fn is_clipped(&self) -> bool {
        self.caplen < self.wire_len
    }
}

/// Aggregate counts over a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub frames: u64,
    pub admitted: u64,
    pub discarded: u64,
    /// Frames shorter in the capture than on the wire.
    pub clipped: u64,
    pub by_reason: BTreeMap<Reason, u64>,
}

impl ReplayStats {
    pub fn from_records(records: &[ReplayRecord]) -> Self {
        let mut stats = Self::default();
        for rec in records {
            stats.record(rec);
        }
        stats
    }

    fn record(&mut self, rec: &ReplayRecord) {
        self.frames += 1;
        match rec.disposition {
            Disposition::Admit => self.admitted += 1,
            Disposition::Discard => self.discarded += 1,
        }
        if rec.is_clipped() {
            self.clipped += 1;
        }
        *self.by_reason.entry(rec.reason).or_insert(0) += 1;
    }
}

/// Evaluate every frame of an in-memory pcap capture.
pub fn replay_capture(buf: &[u8], policy: &FilterPolicy) -> Result<Vec<ReplayRecord>, GuardError> {
    let reader = PcapReader::new(buf)?;
    let records: Vec<ReplayRecord> = reader
        .records()
        .map(|rec| {
            if rec.is_clipped() {
                log::debug!(
                    "frame {}: {} of {} bytes captured",
                    rec.index,
                    rec.data.len(),
                    rec.orig_len
                );
            }
            let verdict = policy.evaluate(rec.data);
            ReplayRecord {
                index: rec.index,
                timestamp_us: rec.timestamp_us,
                caplen: rec.data.len(),
                wire_len: rec.orig_len,
                disposition: verdict.disposition,
                reason: verdict.reason,
            }
        })
        .collect();
    Ok(records)
}

/// Read a pcap file from disk and evaluate every frame in it.
pub fn replay_file(path: &Path, policy: &FilterPolicy) -> Result<Vec<ReplayRecord>, GuardError> {
    let buf = std::fs::read(path).map_err(GuardError::Io)?;
    log::info!("Replaying {} ({} bytes)", path.display(), buf.len());

    let records = replay_capture(&buf, policy)?;
    log::info!(
        "Evaluated {} frames against resolver {} port {}",
        records.len(),
        policy.resolver,
        policy.dns_port
    );
    Ok(records)
}
