//! FPS item and commodity extraction.

use std::sync::LazyLock;

use regex::Regex;
use starforge_forge::{ForgeView, InstanceReader, Value};

use crate::error::{ExtractError, ExtractResult};
use crate::index::{ENTITY_CLASS_STRUCT, Indexes};
use crate::options::{ExtractOptions, Phase};
use crate::rows::{CommodityRow, ItemRow, to_row};
use crate::sink::RowSink;
use crate::tables::resolve_component_name;
use crate::walk::{components, find_component, read_record};

/// SCU volume of one cargo unit edge: 1.25 m per side.
const SCU_EDGE_METRES: f64 = 1.25;

/// First-match item categories over lowercased source paths.
static ITEM_CATEGORIES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("WeaponPersonal", r"fps.*weapons?|weapons?/personal"),
        ("Armor", r"armor|armour"),
        ("Clothing", r"clothing|clothes"),
        ("Medical", r"medical|medpen"),
        ("Food", r"food|drink|consumable"),
        ("Gadget", r"gadget|utility"),
    ]
    .iter()
    .map(|(name, pattern)| {
        (
            *name,
            Regex::new(pattern).unwrap_or_else(|_| Regex::new("$^").expect("fallback regex")),
        )
    })
    .collect()
});

/// Item category of a source path, first match wins.
pub fn classify_item_path(path: &str) -> Option<&'static str> {
    ITEM_CATEGORIES
        .iter()
        .find(|(_, pattern)| pattern.is_match(path))
        .map(|(name, _)| *name)
}

fn field_f64(value: &Value, names: &[&str]) -> Option<f64> {
    names
        .iter()
        .find_map(|n| value.field(n).and_then(Value::as_f64))
}

/// FPS item extraction pass.
pub struct ItemExtractor<'a> {
    view: &'a ForgeView,
    reader: InstanceReader<'a>,
    options: &'a ExtractOptions,
}

impl<'a> ItemExtractor<'a> {
    /// Extractor over one decoded view.
    pub fn new(view: &'a ForgeView, _indexes: &'a Indexes, options: &'a ExtractOptions) -> Self {
        let reader = InstanceReader::new(view)
            .with_max_depth(options.max_instance_depth.max(4))
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
            let Some(category) = classify_item_path(&path) else {
                continue;
            };

            let entity = read_record(self.view, &self.reader, position);
            if entity.is_null() {
                continue;
            }

            let mut row = ItemRow {
                uuid: record.guid.to_string(),
                class_name: record.name.clone(),
                item_type: category.to_string(),
                game_data: entity.to_json(),
                ..ItemRow::default()
            };

            for component in components(&entity) {
                match component.type_name() {
                    Some("SAttachableComponentParams") => {
                        let def = component.field("AttachDef").unwrap_or(component);
                        row.size = def.field("Size").and_then(Value::as_i64);
                        let decoded = def
                            .path(&["Localization", "Name"])
                            .or_else(|| def.field("Name"))
                            .and_then(Value::as_str)
                            .unwrap_or_default();
                        let localised = self.options.localise(&record.name, decoded);
                        if !localised.is_empty() && !localised.starts_with('@') {
                            row.name = localised;
                        }
                    }
                    Some("SEntityPhysicsControllerParams") => {
                        row.mass = component
                            .path(&["PhysType", "Mass"])
                            .or_else(|| component.field("Mass"))
                            .and_then(Value::as_f64);
                    }
                    Some("SHealthComponentParams") => {
                        row.hp = field_f64(component, &["Health", "MaxHealth"]);
                    }
                    Some("SCItemWeaponComponentParams") => {
                        if let Some(action) =
                            component.field("fireActions").and_then(|a| a.items().next())
                        {
                            row.fire_rate = field_f64(action, &["fireRate"]);
                            row.weapon_damage = field_f64(action, &["damagePerShot", "damage"]);
                        }
                    }
                    Some("SCItemClothingParams" | "SCItemSuitArmorParams") => {
                        row.damage_resistance = field_f64(
                            component,
                            &["damageResistance", "DamageResistanceMultiplier"],
                        );
                        if let Some(temp) = component.field("TemperatureResistance") {
                            row.temp_min = field_f64(temp, &["MinResistance", "min"]);
                            row.temp_max = field_f64(temp, &["MaxResistance", "max"]);
                        }
                    }
                    _ => {}
                }
            }
            if row.name.is_empty() {
                row.name = resolve_component_name(&record.name);
            }

            rows.push(to_row(&row));
        }

        sink.upsert_batch("items", &rows)
            .map_err(|message| ExtractError::Sink {
                table: "items".into(),
                message,
            })?;
        self.options
            .report(Phase::Items, rows.len() as u64, rows.len() as u64);
        Ok(rows.len() as u64)
    }
}

/// Commodity extraction pass.
pub struct CommodityExtractor<'a> {
    view: &'a ForgeView,
    reader: InstanceReader<'a>,
    options: &'a ExtractOptions,
}

impl<'a> CommodityExtractor<'a> {
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
            if !path.contains("commodit") {
                continue;
            }

            let entity = read_record(self.view, &self.reader, position);
            if entity.is_null() {
                continue;
            }

            let commodity = find_component(&entity, "SCItemCommodityParams");
            let occupancy = commodity
                .and_then(|c| field_f64(c, &["occupancySCU", "occupancy"]))
                .or_else(|| {
                    // Interior volume in SCU when the occupancy is not
                    // stated directly.
                    let dims = commodity.and_then(|c| c.field("interiorDimensions"))?;
                    let x = dims.field("x").and_then(Value::as_f64)?;
                    let y = dims.field("y").and_then(Value::as_f64)?;
                    let z = dims.field("z").and_then(Value::as_f64)?;
                    Some((x * y * z) / SCU_EDGE_METRES.powi(3))
                });

            let name = find_component(&entity, "SAttachableComponentParams")
                .map(|attach| attach.field("AttachDef").unwrap_or(attach))
                .and_then(|def| def.path(&["Localization", "Name"]).or_else(|| def.field("Name")))
                .and_then(Value::as_str)
                .map(|decoded| self.options.localise(&record.name, decoded))
                .filter(|n| !n.is_empty() && !n.starts_with('@'))
                .unwrap_or_else(|| resolve_component_name(&record.name));

            rows.push(to_row(&CommodityRow {
                uuid: record.guid.to_string(),
                class_name: record.name.clone(),
                name,
                scu_occupancy: occupancy,
                game_data: entity.to_json(),
            }));
        }

        sink.upsert_batch("commodities", &rows)
            .map_err(|message| ExtractError::Sink {
                table: "commodities".into(),
                message,
            })?;
        self.options
            .report(Phase::Commodities, rows.len() as u64, rows.len() as u64);
        Ok(rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn item_paths_classify_first_match() {
        assert_eq!(
            classify_item_path("scitem/fps/weapons/behr_rifle.xml"),
            Some("WeaponPersonal")
        );
        assert_eq!(
            classify_item_path("scitem/characters/armor/heavy_torso.xml"),
            Some("Armor")
        );
        assert_eq!(
            classify_item_path("scitem/characters/clothing/shirt.xml"),
            Some("Clothing")
        );
        assert_eq!(classify_item_path("scitem/ships/engines/x.xml"), None);
    }

    #[test]
    fn scu_edge_cubes_to_the_expected_volume() {
        // 2.5 × 2.5 × 1.25 metres is exactly four cargo units.
        let volume = 2.5 * 2.5 * 1.25;
        assert_eq!(volume / SCU_EDGE_METRES.powi(3), 4.0);
    }
}
