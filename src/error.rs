#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("capture file error at offset {offset}: {detail}")]
    CaptureFormat { offset: usize, detail: String },
    #[error("unsupported capture link type {0} (only Ethernet is supported)")]
    UnsupportedLinkType(u32),
    #[error("cannot read capture file: {0}")]
    Io(#[source] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[source] std::io::Error),
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
}
