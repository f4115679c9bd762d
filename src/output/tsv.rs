use std::io::Write;

use crate::error::GuardError;
use crate::replay::{ReplayRecord, ReplayStats};

/// Write per-frame verdicts as TSV.
///
/// Output: header row + one row per frame in capture order.
/// Columns: index, timestamp_us, caplen, wire_len, disposition, reason.
pub fn write_verdicts(records: &[ReplayRecord], writer: &mut impl Write) -> Result<(), GuardError> {
    writeln!(
        writer,
        "index\ttimestamp_us\tcaplen\twire_len\tdisposition\treason"
    )
    .map_err(GuardError::Serialization)?;

    for rec in records {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            rec.index, rec.timestamp_us, rec.caplen, rec.wire_len, rec.disposition, rec.reason,
        )
        .map_err(GuardError::Serialization)?;
    }

    Ok(())
}

/// Write aggregate counts as two-column TSV (`metric`, `count`).
///
/// Totals come first, then one `reason:<name>` row per reason seen.
pub fn write_stats(stats: &ReplayStats, writer: &mut impl Write) -> Result<(), GuardError> {
    write_stats_inner(stats, writer).map_err(GuardError::Serialization)
}

fn write_stats_inner(stats: &ReplayStats, w: &mut impl Write) -> Result<(), std::io::Error> {
    writeln!(w, "metric\tcount")?;
    writeln!(w, "frames\t{}", stats.frames)?;
    writeln!(w, "admitted\t{}", stats.admitted)?;
    writeln!(w, "discarded\t{}", stats.discarded)?;
    writeln!(w, "clipped\t{}", stats.clipped)?;
    for (reason, count) in &stats.by_reason {
        writeln!(w, "reason:{}\t{}", reason, count)?;
    }
    Ok(())
}
