//! Decoder error types

use thiserror::Error;

/// DataForge / CryXmlB decoding errors
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Database version outside the supported range
    #[error("unsupported database version: {0}")]
    UnsupportedVersion(u32),

    /// Buffer ran out while a mandatory region was being read
    #[error("truncated {region}: needed {needed} bytes, {available} available")]
    Truncated {
        /// Region being parsed when the buffer ran out
        region: &'static str,
        /// Bytes required
        needed: usize,
        /// Bytes left
        available: usize,
    },

    /// Structural inconsistency in the decoded layout
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Binary XML magic present but the tables are malformed
    #[error("malformed binary XML: {0}")]
    MalformedXml(String),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for decoder operations
pub type ForgeResult<T> = Result<T, ForgeError>;
