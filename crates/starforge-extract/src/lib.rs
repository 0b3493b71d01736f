//! Domain extraction over decoded game data.
//!
//! Consumes the archive provider and the database decoder and produces
//! typed rows: ships with loadout ports, components with derived stats,
//! paints, shops, FPS items and commodities, plus the catalogue
//! cross-reference. A [`Session`] owns the archive, the decoded view and
//! the indexes; each pass pushes one batch of rows into a [`RowSink`].
//!
//! # Example
//!
//! ```rust,ignore
//! use starforge_extract::{ExtractOptions, MemorySink, Session};
//!
//! let mut session = Session::open("Data.p4k", ExtractOptions::default())?;
//! session.load_database()?;
//!
//! let mut sink = MemorySink::new();
//! session.extract_all(&mut sink)?;
//! println!("{:?}", session.phase_counts());
//! # Ok::<(), starforge_extract::ExtractError>(())
//! ```

#![warn(missing_docs)]

mod components;
mod error;
mod index;
mod items;
mod options;
mod paints;
mod rows;
mod session;
mod ships;
mod shops;
mod sink;
mod tables;
mod variants;
mod walk;
mod xref;

pub use components::{ComponentExtractor, classify_component_path};
pub use error::{ExtractError, ExtractResult};
pub use index::{Indexes, VehicleEntry};
pub use items::{CommodityExtractor, ItemExtractor, classify_item_path};
pub use options::{ExtractOptions, Localisation, Phase, Progress, ProgressFn};
pub use paints::{PaintExtractor, paint_short_name};
pub use rows::{
    CatalogueLink, CommodityRow, ComponentRow, ItemRow, PaintRow, ShipModuleRow, ShipPortRow,
    ShipRow, ShopRow,
};
pub use session::Session;
pub use ships::{ShipExtractor, classify_port};
pub use shops::{ShopExtractor, shop_type_for_class};
pub use sink::{MemorySink, RowSink};
pub use tables::{manufacturer_for_class, resolve_component_name};
pub use variants::{ShipEntities, VariantResolver};
pub use xref::{CatalogueEntry, ShipIdentity, cross_reference, normalize};
