use std::io::Write;

use serde::Serialize;

use crate::error::GuardError;

/// Write any replay output as pretty-printed JSON, followed by a newline.
pub fn write_json<T: Serialize + ?Sized>(
    value: &T,
    writer: &mut impl Write,
) -> Result<(), GuardError> {
    serde_json::to_writer_pretty(&mut *writer, value)
        .map_err(|e| GuardError::Serialization(std::io::Error::other(e.to_string())))?;
    writeln!(writer).map_err(GuardError::Serialization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Disposition, Reason};
    use crate::replay::{ReplayRecord, ReplayStats};

    fn sample() -> Vec<ReplayRecord> {
        vec![
            ReplayRecord {
                index: 0,
                timestamp_us: 1_000_000,
                caplen: 96,
                wire_len: 96,
                disposition: Disposition::Discard,
                reason: Reason::AuthoritativeAnswer,
            },
            ReplayRecord {
                index: 1,
                timestamp_us: 1_000_250,
                caplen: 60,
                wire_len: 60,
                disposition: Disposition::Admit,
                reason: Reason::UntrustedSource,
            },
        ]
    }

    #[test]
    fn verdicts_as_array() {
        let mut buf = Vec::new();
        write_json(sample().as_slice(), &mut buf).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let arr = parsed.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["disposition"], "discard");
        assert_eq!(arr[0]["reason"], "authoritative_answer");
        assert_eq!(arr[1]["timestamp_us"], 1_000_250);
        assert_eq!(arr[1]["disposition"], "admit");
    }

    #[test]
    fn empty_verdicts() {
        let mut buf = Vec::new();
        write_json(&[] as &[ReplayRecord], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().trim(), "[]");
    }

    #[test]
    fn stats_object() {
        let mut buf = Vec::new();
        write_json(&ReplayStats::from_records(&sample()), &mut buf).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["frames"], 2);
        assert_eq!(parsed["admitted"], 1);
        assert_eq!(parsed["discarded"], 1);
        assert_eq!(parsed["by_reason"]["untrusted_source"], 1);
    }
}
