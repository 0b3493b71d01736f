//! Row sink contract.

use serde_json::Value as Json;

/// Destination for extracted rows.
///
/// The core pushes one batch per phase and never reads back; duplicate
/// keys (record GUID, class name) are the sink's problem to resolve.
pub trait RowSink {
    /// Upsert a batch of flat rows into a named table.
    fn upsert_batch(&mut self, table: &str, rows: &[Json]) -> Result<(), String>;
}

/// Sink that collects rows in memory, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Collected rows per table, in arrival order.
    pub tables: std::collections::BTreeMap<String, Vec<Json>>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows collected for a table.
    pub fn rows(&self, table: &str) -> &[Json] {
        self.tables.get(table).map_or(&[], Vec::as_slice)
    }
}

impl RowSink for MemorySink {
    fn upsert_batch(&mut self, table: &str, rows: &[Json]) -> Result<(), String> {
        self.tables
            .entry(table.to_string())
            .or_default()
            .extend_from_slice(rows);
        Ok(())
    }
}
