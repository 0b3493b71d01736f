//! DataForge database decoder and CryXmlB parser.
//!
//! The database is a single self-describing binary blob: schema (structs
//! with single-parent inheritance, typed properties), records, global
//! value-array pools and two string tables, followed by a packed data
//! region of struct instances. This crate parses the blob once into a
//! read-only [`ForgeView`] and reads dynamic [`Value`] trees out of it on
//! demand through [`InstanceReader`].
//!
//! Sidecar vehicle definitions use the CryXmlB binary XML container; see
//! [`cryxml::parse_cryxml`].
//!
//! # Example
//!
//! ```rust,ignore
//! use starforge_forge::{ForgeView, InstanceReader};
//!
//! let view = ForgeView::parse(buffer)?;
//! let reader = InstanceReader::new(&view).with_max_depth(4);
//! for record in view.records() {
//!     let tree = reader.read(record.struct_index, record.instance_index as usize);
//!     println!("{}", tree.to_json());
//! }
//! # Ok::<(), starforge_forge::ForgeError>(())
//! ```

#![warn(missing_docs)]

pub mod cryxml;
mod database;
mod defs;
mod error;
mod guid;
mod instance;
mod value;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use database::{ForgeView, MAX_SUPPORTED_VERSION};
pub use defs::{DataMapping, DataType, NO_INDEX, PropertyDef, Record, StructDef};
pub use error::{ForgeError, ForgeResult};
pub use guid::Guid;
pub use instance::{DEFAULT_ARRAY_CAP, DEFAULT_MAX_DEPTH, InstanceReader};
pub use value::{ObjectNode, Value};
