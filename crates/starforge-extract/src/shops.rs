//! Shop extraction.

use std::collections::HashSet;

use starforge_forge::{ForgeView, InstanceReader, Value};

use crate::error::{ExtractError, ExtractResult};
use crate::index::Indexes;
use crate::options::{ExtractOptions, Phase};
use crate::rows::{ShopRow, to_row};
use crate::sink::RowSink;
use crate::tables::{SHOP_NAMES, SHOP_TYPE_KEYWORDS, title_case};
use crate::walk::{find_component, read_record};

/// Struct carrying shop records.
const SHOP_STRUCT: &str = "SCItemManufacturer";

/// Shop type from class-name keywords, first match wins.
pub fn shop_type_for_class(class_name: &str) -> &'static str {
    let lower = class_name.to_lowercase();
    SHOP_TYPE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map_or("General", |(_, shop_type)| shop_type)
}

/// Shop extraction pass.
pub struct ShopExtractor<'a> {
    view: &'a ForgeView,
    reader: InstanceReader<'a>,
    options: &'a ExtractOptions,
}

impl<'a> ShopExtractor<'a> {
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

    /// Run the pass; rows deduplicate on `(name, type)`.
    pub fn extract(&self, sink: &mut dyn RowSink) -> ExtractResult<u64> {
        let Some(shop_struct) = self.view.find_struct(SHOP_STRUCT) else {
            return Ok(0);
        };

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut rows = Vec::new();
        for (position, record) in self.view.records().iter().enumerate() {
            if record.struct_index != shop_struct {
                continue;
            }
            let path = record.file_name.to_lowercase().replace('\\', "/");
            if !path.contains("shop") {
                continue;
            }

            let entity = read_record(self.view, &self.reader, position);
            let loc_key = find_component(&entity, "SAttachableComponentParams")
                .map(|attach| attach.field("AttachDef").unwrap_or(attach))
                .and_then(|def| def.path(&["Localization", "Name"]).or_else(|| def.field("Name")))
                .and_then(Value::as_str)
                .unwrap_or_default();

            let name = SHOP_NAMES.get(loc_key).map_or_else(
                || {
                    let fallback = self.options.localise(&record.name, loc_key);
                    if fallback.is_empty() || fallback.starts_with('@') {
                        title_case(&record.name.replace('_', " "))
                    } else {
                        fallback
                    }
                },
                |known| (*known).to_string(),
            );
            let shop_type = shop_type_for_class(&record.name).to_string();

            if !seen.insert((name.clone(), shop_type.clone())) {
                continue;
            }
            rows.push(to_row(&ShopRow {
                uuid: record.guid.to_string(),
                class_name: record.name.clone(),
                name,
                shop_type,
            }));
        }

        sink.upsert_batch("shops", &rows)
            .map_err(|message| ExtractError::Sink {
                table: "shops".into(),
                message,
            })?;
        self.options
            .report(Phase::Shops, rows.len() as u64, rows.len() as u64);
        Ok(rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn shop_types_from_class_keywords() {
        assert_eq!(shop_type_for_class("Shop_CenterMass_Weapons_01"), "Weapons");
        assert_eq!(shop_type_for_class("Shop_Casaba_Clothing"), "Clothing");
        assert_eq!(shop_type_for_class("ShopKiosk_ShipWeapons"), "Weapons");
        assert_eq!(shop_type_for_class("Shop_Plain"), "General");
    }
}
