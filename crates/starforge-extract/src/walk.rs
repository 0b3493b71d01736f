//! Shared helpers for walking decoded entity trees.

use starforge_forge::{ForgeView, InstanceReader, Value};

use crate::index::Indexes;

/// Struct name of the default-loadout component.
pub const DEFAULT_LOADOUT_COMPONENT: &str = "SEntityComponentDefaultLoadoutParams";

/// Read the root instance of a record by its position in the record table.
pub fn read_record(view: &ForgeView, reader: &InstanceReader<'_>, position: usize) -> Value {
    let Some(record) = view.records().get(position) else {
        return Value::Null;
    };
    reader.read(record.struct_index, usize::from(record.instance_index))
}

/// The entity's `Components` items.
pub fn components(entity: &Value) -> impl Iterator<Item = &Value> {
    entity
        .field("Components")
        .map(Value::items)
        .unwrap_or_else(|| [].iter())
}

/// First component with the given decoded type.
pub fn find_component<'a>(entity: &'a Value, type_name: &str) -> Option<&'a Value> {
    components(entity).find(|c| c.type_name() == Some(type_name))
}

/// The default-loadout entry list of an entity, if it has one.
pub fn loadout_entries(entity: &Value) -> Option<&Value> {
    find_component(entity, DEFAULT_LOADOUT_COMPONENT)?.path(&["loadout", "entries"])
}

/// Number of default-loadout entries; zero when absent.
pub fn loadout_entry_count(entity: &Value) -> usize {
    loadout_entries(entity).map_or(0, |entries| entries.items().count())
}

/// Read an entity by class name through the index, exact or fuzzy.
pub fn read_entity_by_name(
    view: &ForgeView,
    indexes: &Indexes,
    reader: &InstanceReader<'_>,
    class_name: &str,
) -> Option<(String, Value)> {
    let position = indexes.find_entity_record(class_name)?;
    let record = view.records().get(position)?;
    let value = reader.read(record.struct_index, usize::from(record.instance_index));
    if value.is_null() {
        return None;
    }
    Some((record.name.clone(), value))
}
