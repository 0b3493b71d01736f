//! Archive error types

use thiserror::Error;

/// Archive-specific error type
#[derive(Debug, Error)]
pub enum P4kError {
    /// End-of-central-directory record not found in the archive tail
    #[error("end of central directory not found in the final {0} bytes")]
    EocdNotFound(usize),

    /// ZIP64 locator or ZIP64 end-of-central-directory record missing
    #[error("ZIP64 end of central directory not found")]
    Zip64EocdNotFound,

    /// A record signature did not match
    #[error("invalid signature: expected {expected:#010X}, got {actual:#010X}")]
    InvalidSignature {
        /// Expected signature value
        expected: u32,
        /// Signature actually read
        actual: u32,
    },

    /// Compression method outside {0, 8, 93, 100}
    #[error("unknown compression method: {0}")]
    UnknownCompression(u16),

    /// Buffer ran out while parsing a directory record
    #[error("truncated central directory: needed {needed} bytes, {available} available")]
    TruncatedDirectory {
        /// Bytes required to finish the current record
        needed: usize,
        /// Bytes left in the directory region
        available: usize,
    },

    /// AES unwrap failed
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Deflate/Zstd stream failure or size mismatch
    #[error("decompression failed: {0}")]
    Decompression(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for archive operations
pub type P4kResult<T> = Result<T, P4kError>;
