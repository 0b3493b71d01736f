//! Fast lookups over the decoded database.
//!
//! Built once after the view is ready, read-only afterwards: the vehicle
//! index, the GUID index and the entity-record index the later passes
//! resolve against.

use std::collections::HashMap;

use starforge_forge::{ForgeView, Guid};
use tracing::debug;

use crate::tables::{
    NON_VEHICLE_PATTERNS, VEHICLE_BLOCKLIST, VEHICLE_FOLDERS, VEHICLE_PATH_ALLOWLIST,
    has_known_manufacturer,
};

/// Struct name of entity class records.
pub const ENTITY_CLASS_STRUCT: &str = "EntityClassDefinition";

/// One vehicle-index entry.
#[derive(Debug, Clone)]
pub struct VehicleEntry {
    /// Record GUID
    pub guid: Guid,
    /// Record name
    pub name: String,
    /// Entity class name
    pub class_name: String,
}

/// Read-only index set over one [`ForgeView`].
pub struct Indexes {
    /// Lowercased vehicle class name → entry
    vehicles: HashMap<String, VehicleEntry>,
    /// Vehicle keys in record order; passes iterate in this order
    vehicle_order: Vec<String>,
    /// Record GUID → human-readable identifier
    guid_names: HashMap<Guid, String>,
    /// Record GUID → record position
    records_by_guid: HashMap<Guid, usize>,
    /// Lowercased entity class name → record position
    entities_by_name: HashMap<String, usize>,
}

impl Indexes {
    /// Build every index in one pass over the records.
    pub fn build(view: &ForgeView) -> Self {
        let entity_struct = view.find_struct(ENTITY_CLASS_STRUCT);

        let mut vehicles = HashMap::new();
        let mut vehicle_order = Vec::new();
        let mut guid_names = HashMap::new();
        let mut records_by_guid = HashMap::new();
        let mut entities_by_name = HashMap::new();

        for (position, record) in view.records().iter().enumerate() {
            let is_entity = entity_struct == Some(record.struct_index);

            if !record.guid.is_nil() {
                records_by_guid.entry(record.guid).or_insert(position);
                let identifier = record.name.clone();
                guid_names.entry(record.guid).or_insert(identifier);
            }

            if !is_entity {
                continue;
            }
            entities_by_name
                .entry(record.name.to_lowercase())
                .or_insert(position);

            if Self::is_vehicle_record(&record.name, &record.file_name) {
                let key = record.name.to_lowercase();
                if !vehicles.contains_key(&key) {
                    vehicles.insert(
                        key.clone(),
                        VehicleEntry {
                            guid: record.guid,
                            name: record.name.clone(),
                            class_name: record.name.clone(),
                        },
                    );
                    vehicle_order.push(key);
                }
            }
        }

        debug!(
            vehicles = vehicles.len(),
            guids = guid_names.len(),
            entities = entities_by_name.len(),
            "indexes built"
        );

        Self {
            vehicles,
            vehicle_order,
            guid_names,
            records_by_guid,
            entities_by_name,
        }
    }

    fn is_vehicle_record(class_name: &str, file_name: &str) -> bool {
        let path = file_name.to_lowercase().replace('\\', "/");
        let lower = class_name.to_lowercase();

        let in_vehicle_folder = VEHICLE_FOLDERS.iter().any(|f| path.contains(f))
            || VEHICLE_PATH_ALLOWLIST.iter().any(|a| lower.starts_with(a));
        if !in_vehicle_folder {
            return false;
        }
        if VEHICLE_BLOCKLIST.iter().any(|b| lower.contains(b)) {
            return false;
        }
        if !has_known_manufacturer(class_name) {
            return false;
        }
        if NON_VEHICLE_PATTERNS.iter().any(|p| p.is_match(class_name)) {
            return false;
        }
        true
    }

    /// Vehicle entries in record order.
    pub fn vehicles(&self) -> impl Iterator<Item = &VehicleEntry> {
        self.vehicle_order
            .iter()
            .filter_map(|key| self.vehicles.get(key))
    }

    /// Number of indexed vehicles.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Vehicle by class name, case-insensitive.
    pub fn vehicle(&self, class_name: &str) -> Option<&VehicleEntry> {
        self.vehicles.get(&class_name.to_lowercase())
    }

    /// Human-readable identifier for a record GUID.
    pub fn guid_name(&self, guid: &Guid) -> Option<&str> {
        self.guid_names.get(guid).map(String::as_str)
    }

    /// Record position by GUID.
    pub fn record_by_guid(&self, guid: &Guid) -> Option<usize> {
        self.records_by_guid.get(guid).copied()
    }

    /// Entity record position by class name: exact (case-insensitive)
    /// match first, then the shortest entity whose name contains the probe.
    pub fn find_entity_record(&self, name: &str) -> Option<usize> {
        let lower = name.to_lowercase();
        if let Some(&position) = self.entities_by_name.get(&lower) {
            return Some(position);
        }
        self.entities_by_name
            .iter()
            .filter(|(key, _)| key.contains(&lower))
            .min_by_key(|(key, _)| key.len())
            .map(|(_, &position)| position)
    }

    /// Entity class names that are `_PU` variants of the given base class:
    /// names starting `<class>_` and containing the `_PU` segment.
    pub fn find_variant_pu_entities(&self, class_name: &str) -> Vec<String> {
        let prefix = format!("{}_", class_name.to_lowercase());
        let mut out: Vec<String> = self
            .entities_by_name
            .keys()
            .filter(|key| key.starts_with(&prefix) && key.contains("_pu"))
            .cloned()
            .collect();
        out.sort();
        out
    }

    /// Original-case entity class name for a lowercased index key.
    pub fn entity_position(&self, lowercase_name: &str) -> Option<usize> {
        self.entities_by_name.get(lowercase_name).copied()
    }
}
