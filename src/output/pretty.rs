use std::io::Write;

use crate::error::GuardError;
use crate::replay::{ReplayRecord, ReplayStats};

/// Write per-frame verdicts as a human-readable table.
pub fn write_verdicts(records: &[ReplayRecord], writer: &mut impl Write) -> Result<(), GuardError> {
    write_verdicts_inner(records, writer).map_err(GuardError::Serialization)
}

fn write_verdicts_inner(records: &[ReplayRecord], w: &mut impl Write) -> Result<(), std::io::Error> {
    writeln!(w, "DNS Filter Verdicts")?;
    writeln!(w, "{}", "=".repeat(72))?;
    writeln!(
        w,
        "{:>7} {:>17} {:>11} {:<8} {:<24}",
        "FRAME", "TIME", "BYTES", "ACTION", "REASON"
    )?;
    writeln!(w, "{}", "-".repeat(72))?;

    for rec in records {
        writeln!(
            w,
            "{:>7} {:>17} {:>11} {:<8} {:<24}",
            rec.index,
            format_timestamp(rec.timestamp_us),
            format_length(rec),
            rec.disposition.to_string().to_uppercase(),
            rec.reason,
        )?;
    }

    if records.is_empty() {
        writeln!(w, "(no frames)")?;
    }

    writeln!(w, "{}", "-".repeat(72))?;
    let discarded = records.iter().filter(|r| r.disposition.is_discard()).count();
    writeln!(
        w,
        "{} frames, {} discarded, {} admitted",
        records.len(),
        discarded,
        records.len() - discarded
    )?;

    Ok(())
}

/// Write aggregate counts as a human-readable summary.
pub fn write_stats(stats: &ReplayStats, writer: &mut impl Write) -> Result<(), GuardError> {
    write_stats_inner(stats, writer).map_err(GuardError::Serialization)
}

fn write_stats_inner(stats: &ReplayStats, w: &mut impl Write) -> Result<(), std::io::Error> {
    writeln!(w, "DNS Filter Summary")?;
    writeln!(w, "{}", "=".repeat(40))?;
    writeln!(w, "{:<28} {:>11}", "frames", stats.frames)?;
    writeln!(
        w,
        "{:<28} {:>11}",
        "admitted",
        with_share(stats.admitted, stats.frames)
    )?;
    writeln!(
        w,
        "{:<28} {:>11}",
        "discarded",
        with_share(stats.discarded, stats.frames)
    )?;
    if stats.clipped > 0 {
        writeln!(w, "{:<28} {:>11}", "clipped by snaplen", stats.clipped)?;
    }
    writeln!(w, "{}", "-".repeat(40))?;
    for (reason, count) in &stats.by_reason {
        let mark = if reason.disposition().is_discard() { "x" } else { " " };
        writeln!(w, "{mark} {:<26} {:>11}", reason.as_str(), count)?;
    }
    Ok(())
}

/// Seconds.micros, e.g. `1700000000.000250`.
fn format_timestamp(us: u64) -> String {
    format!("{}.{:06}", us / 1_000_000, us % 1_000_000)
}

/// Captured length, with the wire length when the capture was clipped.
fn format_length(rec: &ReplayRecord) -> String {
    if rec.is_clipped() {
        format!("{}/{}", rec.caplen, rec.wire_len)
    } else {
        rec.caplen.to_string()
    }
}

fn with_share(count: u64, total: u64) -> String {
    if total == 0 {
        return count.to_string();
    }
    format!("{} ({:.0}%)", count, count as f64 * 100.0 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Disposition, Reason};

    fn rec(index: usize, caplen: usize, wire_len: usize, reason: Reason) -> ReplayRecord {
        ReplayRecord {
            index,
            timestamp_us: 1_700_000_000_000_250,
            caplen,
            wire_len,
            disposition: reason.disposition(),
            reason,
        }
    }

    #[test]
    fn timestamp_formatting() {
        assert_eq!(format_timestamp(1_700_000_000_000_250), "1700000000.000250");
        assert_eq!(format_timestamp(0), "0.000000");
    }

    #[test]
    fn clipped_length_shows_wire_length() {
        assert_eq!(format_length(&rec(0, 64, 1514, Reason::MalformedDns)), "64/1514");
        assert_eq!(format_length(&rec(0, 96, 96, Reason::NoSignal)), "96");
    }

    #[test]
    fn share_formatting() {
        assert_eq!(with_share(1, 4), "1 (25%)");
        assert_eq!(with_share(0, 0), "0");
    }

    #[test]
    fn verdict_table() {
        let records = vec![
            rec(0, 96, 96, Reason::AuthoritativeAnswer),
            rec(1, 80, 80, Reason::NoSignal),
        ];
        let mut buf = Vec::new();
        write_verdicts(&records, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();

        assert!(output.contains("DISCARD"));
        assert!(output.contains("authoritative_answer"));
        assert!(output.contains("2 frames, 1 discarded, 1 admitted"));
        assert_eq!(records[1].disposition, Disposition::Admit);
    }

    #[test]
    fn empty_table() {
        let mut buf = Vec::new();
        write_verdicts(&[], &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert!(output.contains("(no frames)"));
        assert!(output.contains("0 frames, 0 discarded, 0 admitted"));
    }

    #[test]
    fn stats_summary_marks_discard_reasons() {
        let stats = ReplayStats::from_records(&[
            rec(0, 96, 96, Reason::Ipv6),
            rec(1, 96, 96, Reason::NotUdp),
            rec(2, 96, 96, Reason::NotUdp),
        ]);
        let mut buf = Vec::new();
        write_stats(&stats, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();

        assert!(output.contains("1 (33%)"));
        assert!(output.lines().any(|l| l.starts_with("x ipv6")));
        assert!(output.lines().any(|l| l.starts_with("  not_udp")));
        assert!(!output.contains("clipped"));
    }
}
