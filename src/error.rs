//! Structured error and warning kinds for the SCCA decoder.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScccaError>;

/// Everything that can stop a parse. Variant names mirror the kinds
/// enumerated in the format specification.
#[derive(Debug, Error)]
pub enum ScccaError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("short input: needed {needed} bytes at offset {offset}, region only has {available}")]
    ShortInput {
        offset: u64,
        needed: usize,
        available: usize,
    },

    #[error("invalid signature: expected \"SCCA\", found {found:?}")]
    InvalidSignature { found: [u8; 4] },

    #[error("unsupported format version {0} (supported: 17, 23, 26)")]
    UnsupportedVersion(u32),

    #[error("offset {offset} with length {length} escapes its containing region (bound {bound})")]
    OffsetOutOfBounds {
        offset: u64,
        length: u64,
        bound: u64,
    },

    #[error("malformed string table: {0}")]
    MalformedStringTable(String),

    #[error("byte source read failed")]
    ReadFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("parse aborted")]
    Aborted,

    #[error("allocation failed")]
    OutOfMemory,

    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Non-fatal conditions discovered during a successful parse, attached to the
/// resulting [`crate::FileModel`] rather than surfaced as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The header's declared `file_size` did not match the byte source's
    /// reported size.
    SizeMismatch { declared: u32, actual: u64 },
    /// A declared entry count did not match the number of entries actually
    /// recovered while decoding a section.
    InconsistentCounts {
        context: &'static str,
        declared: u32,
        parsed: usize,
    },
}
