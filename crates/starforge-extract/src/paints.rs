//! Paint extraction.

use starforge_forge::{ForgeView, InstanceReader, Value};

use crate::error::{ExtractError, ExtractResult};
use crate::index::{ENTITY_CLASS_STRUCT, Indexes};
use crate::options::{ExtractOptions, Phase};
use crate::rows::{PaintRow, to_row};
use crate::sink::RowSink;
use crate::tables::PAINT_KEYWORDS;
use crate::walk::{find_component, read_record};

/// Class prefix shared by paint entities.
const PAINT_PREFIX: &str = "Paint_";

/// Ship short name from a paint class: the stem after `Paint_`, cut at
/// the first event/colour keyword.
pub fn paint_short_name(class_name: &str) -> String {
    let stem = class_name.strip_prefix(PAINT_PREFIX).unwrap_or(class_name);
    match PAINT_KEYWORDS.find(stem) {
        Some(hit) => stem[..hit.start()].to_string(),
        None => stem.to_string(),
    }
}

/// Paint extraction pass.
pub struct PaintExtractor<'a> {
    view: &'a ForgeView,
    reader: InstanceReader<'a>,
    options: &'a ExtractOptions,
}

impl<'a> PaintExtractor<'a> {
    /// Extractor over one decoded view.
    pub fn new(view: &'a ForgeView, _indexes: &'a Indexes, options: &'a ExtractOptions) -> Self {
        let reader = InstanceReader::new(view)
            .with_max_depth(options.max_instance_depth)
            .with_array_cap(options.array_element_cap);
        Self {
            view,
            reader,
            options,
        }
    }

    /// Run the pass.
    pub fn extract(&self, sink: &mut dyn RowSink) -> ExtractResult<u64> {
        let Some(entity_struct) = self.view.find_struct(ENTITY_CLASS_STRUCT) else {
            return Ok(0);
        };

        let mut rows = Vec::new();
        for (position, record) in self.view.records().iter().enumerate() {
            if record.struct_index != entity_struct {
                continue;
            }
            let path = record.file_name.to_lowercase().replace('\\', "/");
            let is_paint =
                record.name.starts_with(PAINT_PREFIX) || path.contains("/paints/");
            if !is_paint {
                continue;
            }

            let entity = read_record(self.view, &self.reader, position);
            let decoded_name = find_component(&entity, "SAttachableComponentParams")
                .map(|attach| attach.field("AttachDef").unwrap_or(attach))
                .and_then(|def| def.path(&["Localization", "Name"]).or_else(|| def.field("Name")))
                .and_then(Value::as_str)
                .unwrap_or_default();
            let localised = self.options.localise(&record.name, decoded_name);
            let paint_name = if localised.is_empty() || localised.starts_with('@') {
                record
                    .name
                    .strip_prefix(PAINT_PREFIX)
                    .unwrap_or(&record.name)
                    .replace('_', " ")
            } else {
                localised
            };

            rows.push(to_row(&PaintRow {
                paint_uuid: record.guid.to_string(),
                paint_class_name: record.name.clone(),
                paint_name,
                ship_short_name: paint_short_name(&record.name),
            }));
        }

        sink.upsert_batch("paints", &rows)
            .map_err(|message| ExtractError::Sink {
                table: "paints".into(),
                message,
            })?;
        self.options
            .report(Phase::Paints, rows.len() as u64, rows.len() as u64);
        Ok(rows.len() as u64)
    }
}
