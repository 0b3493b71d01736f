//! P4K game archive reader.
//!
//! P4K archives are ZIP64 containers with two vendor extensions: entries may
//! be AES-wrapped before compression framing, and Zstd appears under the
//! non-standard method ids 93 and 100. The directory index is built lazily;
//! opening an archive only locates the end-of-central-directory record.
//!
//! # Example
//!
//! ```rust,ignore
//! use starforge_p4k::P4kArchive;
//!
//! let mut archive = P4kArchive::open("Data.p4k")?;
//! archive.load_all(None)?;
//!
//! if let Some(entry) = archive.find("Data/Game.dcb") {
//!     let bytes = archive.read_entry(entry)?;
//! }
//! # Ok::<(), starforge_p4k::P4kError>(())
//! ```

#![warn(missing_docs)]

mod archive;
mod compress;
mod crypto;
mod error;
mod zip;

pub use archive::{P4kArchive, P4kEntry, ProgressFn};
pub use compress::CompressionMethod;
pub use crypto::ARCHIVE_KEY;
pub use error::{P4kError, P4kResult};
pub use zip::ZSTD_MAGIC;
