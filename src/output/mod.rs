pub mod json;
pub mod pretty;
pub mod tsv;

use std::io::Write;

use crate::cli::OutputFormat;
use crate::error::GuardError;
use crate::replay::{ReplayRecord, ReplayStats};

/// Write per-frame verdicts in the specified format.
pub fn write_verdicts(
    records: &[ReplayRecord],
    format: OutputFormat,
    writer: &mut impl Write,
) -> Result<(), GuardError> {
    match format {
        OutputFormat::Tsv => tsv::write_verdicts(records, writer),
        OutputFormat::Json => json::write_json(records, writer),
        OutputFormat::Pretty => pretty::write_verdicts(records, writer),
    }
}

/// Write aggregate replay counts in the specified format.
pub fn write_stats(
    stats: &ReplayStats,
    format: OutputFormat,
    writer: &mut impl Write,
) -> Result<(), GuardError> {
    match format {
        OutputFormat::Tsv => tsv::write_stats(stats, writer),
        OutputFormat::Json => json::write_json(stats, writer),
        OutputFormat::Pretty => pretty::write_stats(stats, writer),
    }
}
