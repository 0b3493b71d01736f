//! Extraction session.
//!
//! Owns the archive handle, the database buffer's decoded view and the
//! index set; phases run sequentially against it and share no mutable
//! state once they return. Dropping the session releases everything.

use std::collections::BTreeMap;
use std::path::Path;

use starforge_forge::ForgeView;
use starforge_p4k::P4kArchive;
use tracing::info;

use crate::components::ComponentExtractor;
use crate::error::{ExtractError, ExtractResult};
use crate::index::Indexes;
use crate::items::{CommodityExtractor, ItemExtractor};
use crate::options::{ExtractOptions, Phase};
use crate::paints::PaintExtractor;
use crate::ships::ShipExtractor;
use crate::shops::ShopExtractor;
use crate::sink::RowSink;

/// Database entry paths probed before falling back to an extension scan.
const DATABASE_CANDIDATES: &[&str] = &["Data\\Game2.dcb", "Data\\Game.dcb"];

/// One archive, one decoded database, one index set.
pub struct Session {
    archive: P4kArchive,
    options: ExtractOptions,
    view: Option<ForgeView>,
    indexes: Option<Indexes>,
    counters: BTreeMap<String, u64>,
}

impl Session {
    /// Open the archive and build its directory index.
    pub fn open<P: AsRef<Path>>(archive_path: P, options: ExtractOptions) -> ExtractResult<Self> {
        let mut archive = P4kArchive::open(archive_path)?;
        {
            let report = |done: u64, total: u64| {
                options.report(Phase::Directory, done, total);
            };
            archive.load_all(Some(&report))?;
        }
        info!(entries = archive.entry_count(), "archive indexed");

        Ok(Self {
            archive,
            options,
            view: None,
            indexes: None,
            counters: BTreeMap::new(),
        })
    }

    /// Locate, read and decode the central database entry, then build the
    /// lookup indexes.
    pub fn load_database(&mut self) -> ExtractResult<()> {
        let entry = DATABASE_CANDIDATES
            .iter()
            .find_map(|path| self.archive.find(path))
            .or_else(|| {
                self.archive
                    .entries()
                    .iter()
                    .find(|e| e.path.to_lowercase().ends_with(".dcb"))
            })
            .cloned()
            .ok_or_else(|| ExtractError::DatabaseMissing(DATABASE_CANDIDATES.join(", ")))?;

        let buffer = self.archive.read_entry(&entry)?;
        info!(path = %entry.path, bytes = buffer.len(), "database entry read");

        let view = ForgeView::parse(buffer)?;
        info!(
            version = view.version(),
            structs = view.structs().len(),
            records = view.records().len(),
            "database decoded"
        );

        self.indexes = Some(Indexes::build(&view));
        self.view = Some(view);
        Ok(())
    }

    /// The archive handle.
    pub fn archive(&self) -> &P4kArchive {
        &self.archive
    }

    /// The decoded view, once loaded.
    pub fn view(&self) -> ExtractResult<&ForgeView> {
        self.view.as_ref().ok_or(ExtractError::NotReady)
    }

    /// The index set, once loaded.
    pub fn indexes(&self) -> ExtractResult<&Indexes> {
        self.indexes.as_ref().ok_or(ExtractError::NotReady)
    }

    /// Extraction options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Row counts per table from the phases run so far; callers use these
    /// to enforce the sanity-drop threshold against a previous run.
    pub fn phase_counts(&self) -> &BTreeMap<String, u64> {
        &self.counters
    }

    /// Component pass.
    pub fn extract_components(&mut self, sink: &mut dyn RowSink) -> ExtractResult<u64> {
        let (view, indexes) = self.ready()?;
        let count = ComponentExtractor::new(view, indexes, &self.options).extract(sink)?;
        self.counters.insert("components".into(), count);
        Ok(count)
    }

    /// Ship pass; counts are `(ships, ports, modules)`.
    pub fn extract_ships(&mut self, sink: &mut dyn RowSink) -> ExtractResult<(u64, u64, u64)> {
        let (view, indexes) = self.ready()?;
        let counts = ShipExtractor::new(view, indexes, &self.options, Some(&self.archive))
            .extract(sink)?;
        self.counters.insert("ships".into(), counts.0);
        self.counters.insert("ship_ports".into(), counts.1);
        self.counters.insert("ship_modules".into(), counts.2);
        Ok(counts)
    }

    /// Paint pass.
    pub fn extract_paints(&mut self, sink: &mut dyn RowSink) -> ExtractResult<u64> {
        let (view, indexes) = self.ready()?;
        let count = PaintExtractor::new(view, indexes, &self.options).extract(sink)?;
        self.counters.insert("paints".into(), count);
        Ok(count)
    }

    /// Shop pass.
    pub fn extract_shops(&mut self, sink: &mut dyn RowSink) -> ExtractResult<u64> {
        let (view, indexes) = self.ready()?;
        let count = ShopExtractor::new(view, indexes, &self.options).extract(sink)?;
        self.counters.insert("shops".into(), count);
        Ok(count)
    }

    /// FPS item pass.
    pub fn extract_items(&mut self, sink: &mut dyn RowSink) -> ExtractResult<u64> {
        let (view, indexes) = self.ready()?;
        let count = ItemExtractor::new(view, indexes, &self.options).extract(sink)?;
        self.counters.insert("items".into(), count);
        Ok(count)
    }

    /// Commodity pass.
    pub fn extract_commodities(&mut self, sink: &mut dyn RowSink) -> ExtractResult<u64> {
        let (view, indexes) = self.ready()?;
        let count = CommodityExtractor::new(view, indexes, &self.options).extract(sink)?;
        self.counters.insert("commodities".into(), count);
        Ok(count)
    }

    /// Run every pass in pipeline order.
    pub fn extract_all(&mut self, sink: &mut dyn RowSink) -> ExtractResult<()> {
        self.extract_components(sink)?;
        self.extract_ships(sink)?;
        self.extract_paints(sink)?;
        self.extract_shops(sink)?;
        self.extract_items(sink)?;
        self.extract_commodities(sink)?;
        Ok(())
    }

    fn ready(&self) -> ExtractResult<(&ForgeView, &Indexes)> {
        match (&self.view, &self.indexes) {
            (Some(view), Some(indexes)) => Ok((view, indexes)),
            _ => Err(ExtractError::NotReady),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("archive", &self.archive)
            .field("database_loaded", &self.view.is_some())
            .field("counters", &self.counters)
            .finish()
    }
}
