//! Dynamic instance reader.
//!
//! Walks the data region from a `(struct_index, variant_index)` root and
//! produces a [`Value`] tree. Class properties and strong pointers recurse
//! up to the depth bound; weak pointers always stop at a symbolic marker,
//! which is what keeps cyclic pointer graphs finite.

use tracing::{debug, warn};

use crate::database::ForgeView;
use crate::defs::{DataType, NO_INDEX, PropertyDef};
use crate::guid::Guid;
use crate::value::{ObjectNode, Value};

/// Default recursion bound for class and strong-pointer edges.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Default per-property array element cap. Corrupted counts are truncated
/// here; every realistic gameplay list fits well below it.
pub const DEFAULT_ARRAY_CAP: usize = 200;

/// Reader over one [`ForgeView`].
pub struct InstanceReader<'a> {
    view: &'a ForgeView,
    max_depth: usize,
    array_cap: usize,
}

impl<'a> InstanceReader<'a> {
    /// Reader with the default depth and array bounds.
    pub fn new(view: &'a ForgeView) -> Self {
        Self {
            view,
            max_depth: DEFAULT_MAX_DEPTH,
            array_cap: DEFAULT_ARRAY_CAP,
        }
    }

    /// Override the depth bound.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Override the array element cap.
    pub fn with_array_cap(mut self, array_cap: usize) -> Self {
        self.array_cap = array_cap;
        self
    }

    /// Read the instance rooted at `(struct_index, variant_index)`.
    ///
    /// Returns [`Value::Null`] when the struct has no data mapping.
    pub fn read(&self, struct_index: usize, variant_index: usize) -> Value {
        self.read_mapped(struct_index, variant_index, 0)
    }

    /// Resolve an instance through the struct's mapped run in the data
    /// region; used for roots, strong pointers and class arrays.
    fn read_mapped(&self, struct_index: usize, variant_index: usize, depth: usize) -> Value {
        let Some(offset) = self.view.instance_offset(struct_index, variant_index) else {
            return Value::Null;
        };
        self.read_fields_at(struct_index, offset, depth)
    }

    /// Read the effective field list laid out at `offset`.
    fn read_fields_at(&self, struct_index: usize, offset: usize, depth: usize) -> Value {
        let Some(def) = self.view.structs().get(struct_index) else {
            return Value::Null;
        };
        let type_name = def.name.clone();

        let mut pos = offset;
        let properties = self.view.effective_properties(struct_index);
        let mut fields = Vec::with_capacity(properties.len());
        for property_index in properties {
            let prop = &self.view.properties()[property_index];
            let value = if prop.is_inline() {
                self.read_inline(&mut pos, prop, depth)
            } else {
                self.read_array(&mut pos, prop, depth)
            };
            fields.push((prop.name.clone(), value));
        }

        Value::Object(ObjectNode { type_name, fields })
    }

    /// Read one inline value at the cursor and advance by its exact
    /// footprint.
    fn read_inline(&self, pos: &mut usize, prop: &PropertyDef, depth: usize) -> Value {
        let data = self.view.data();
        match prop.data_type {
            DataType::Class => {
                let nested = prop.struct_index as usize;
                let Some(def) = self.view.structs().get(nested) else {
                    return Value::Null;
                };
                let size = def.struct_size as usize;
                let at = *pos;
                *pos += size;
                if depth >= self.max_depth {
                    return Value::Skipped(def.name.clone());
                }
                self.read_fields_at(nested, at, depth + 1)
            }
            DataType::StrongPointer => {
                let Some(raw) = read_bytes(data, pos, 8) else {
                    return Value::Null;
                };
                let target = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
                let variant = u16::from_le_bytes([raw[4], raw[5]]);
                self.follow_strong(target, variant, depth)
            }
            DataType::WeakPointer => {
                let Some(raw) = read_bytes(data, pos, 8) else {
                    return Value::Null;
                };
                let target = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
                let variant = u16::from_le_bytes([raw[4], raw[5]]);
                self.weak_marker(target, variant)
            }
            DataType::Reference => {
                let Some(raw) = read_bytes(data, pos, 20) else {
                    return Value::Null;
                };
                let mut guid = [0u8; 16];
                guid.copy_from_slice(&raw[4..20]);
                Value::Ref(Guid::from_bytes(&guid))
            }
            DataType::String | DataType::Locale | DataType::Enum => {
                let Some(raw) = read_bytes(data, pos, 4) else {
                    return Value::Null;
                };
                let offset = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
                Value::String(self.view.data_string(offset))
            }
            DataType::Guid => {
                let Some(raw) = read_bytes(data, pos, 16) else {
                    return Value::Null;
                };
                let mut guid = [0u8; 16];
                guid.copy_from_slice(raw);
                Value::Guid(Guid::from_bytes(&guid))
            }
            DataType::Boolean => scalar(data, pos, 1, |b| Value::Bool(b[0] != 0)),
            DataType::Int8 => scalar(data, pos, 1, |b| Value::Int(i64::from(b[0] as i8))),
            DataType::Int16 => scalar(data, pos, 2, |b| {
                Value::Int(i64::from(i16::from_le_bytes([b[0], b[1]])))
            }),
            DataType::Int32 => scalar(data, pos, 4, |b| {
                Value::Int(i64::from(i32::from_le_bytes([b[0], b[1], b[2], b[3]])))
            }),
            DataType::Int64 => scalar(data, pos, 8, |b| {
                Value::Int(i64::from_le_bytes([
                    b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                ]))
            }),
            DataType::UInt8 => scalar(data, pos, 1, |b| Value::UInt(u64::from(b[0]))),
            DataType::UInt16 => scalar(data, pos, 2, |b| {
                Value::UInt(u64::from(u16::from_le_bytes([b[0], b[1]])))
            }),
            DataType::UInt32 => scalar(data, pos, 4, |b| {
                Value::UInt(u64::from(u32::from_le_bytes([b[0], b[1], b[2], b[3]])))
            }),
            DataType::UInt64 => scalar(data, pos, 8, |b| {
                Value::UInt(u64::from_le_bytes([
                    b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                ]))
            }),
            DataType::Single => scalar(data, pos, 4, |b| {
                Value::Float(f64::from(f32::from_le_bytes([b[0], b[1], b[2], b[3]])))
            }),
            DataType::Double => scalar(data, pos, 8, |b| {
                Value::Float(f64::from_le_bytes([
                    b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                ]))
            }),
            DataType::Unknown(tag) => {
                debug!(tag, property = %prop.name, "unknown data type tag");
                *pos += 4;
                Value::Null
            }
        }
    }

    /// Read an array property: `(count, first_index)` header at the
    /// cursor, then pool elements, capped to the configured bound.
    fn read_array(&self, pos: &mut usize, prop: &PropertyDef, depth: usize) -> Value {
        let data = self.view.data();
        let Some(raw) = read_bytes(data, pos, 8) else {
            return Value::Null;
        };
        let count = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
        let first = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]) as usize;

        let take = count.min(self.array_cap);
        if take < count {
            warn!(
                property = %prop.name,
                count,
                cap = self.array_cap,
                "array count over the element cap, truncating"
            );
        }

        let items = (0..take)
            .map(|i| self.read_pool_element(prop, first + i, depth))
            .collect();
        Value::Array(items)
    }

    fn read_pool_element(&self, prop: &PropertyDef, index: usize, depth: usize) -> Value {
        let view = self.view;
        match prop.data_type {
            DataType::Boolean => view.bool_value(index).map_or(Value::Null, Value::Bool),
            DataType::Int8 => opt_int(view.int8_value(index).map(i64::from)),
            DataType::Int16 => opt_int(view.int16_value(index).map(i64::from)),
            DataType::Int32 => opt_int(view.int32_value(index).map(i64::from)),
            DataType::Int64 => opt_int(view.int64_value(index)),
            DataType::UInt8 => opt_uint(view.uint8_value(index).map(u64::from)),
            DataType::UInt16 => opt_uint(view.uint16_value(index).map(u64::from)),
            DataType::UInt32 => opt_uint(view.uint32_value(index).map(u64::from)),
            DataType::UInt64 => opt_uint(view.uint64_value(index)),
            DataType::Single => view
                .single_value(index)
                .map_or(Value::Null, |v| Value::Float(f64::from(v))),
            DataType::Double => view.double_value(index).map_or(Value::Null, Value::Float),
            DataType::Guid => view.guid_value(index).map_or(Value::Null, Value::Guid),
            DataType::String => view
                .string_id_value(index)
                .map_or(Value::Null, Value::String),
            DataType::Locale => view.locale_value(index).map_or(Value::Null, Value::String),
            DataType::Enum => view.enum_value(index).map_or(Value::Null, Value::String),
            DataType::Class => {
                let nested = prop.struct_index as usize;
                if depth >= self.max_depth {
                    let name = view
                        .structs()
                        .get(nested)
                        .map_or_else(String::new, |d| d.name.clone());
                    return Value::Skipped(name);
                }
                self.read_mapped(nested, index, depth + 1)
            }
            DataType::StrongPointer => match view.strong_value(index) {
                Some((target, variant)) => self.follow_strong(target, variant, depth),
                None => Value::Null,
            },
            DataType::WeakPointer => match view.weak_value(index) {
                Some((target, variant)) => self.weak_marker(target, variant),
                None => Value::Null,
            },
            DataType::Reference => view.reference_value(index).map_or(Value::Null, Value::Ref),
            DataType::Unknown(tag) => {
                debug!(tag, property = %prop.name, "unknown data type tag in array");
                Value::Null
            }
        }
    }

    fn follow_strong(&self, target: u32, variant: u16, depth: usize) -> Value {
        if target == NO_INDEX {
            return Value::Null;
        }
        let struct_index = target as usize;
        if depth >= self.max_depth {
            let name = self
                .view
                .structs()
                .get(struct_index)
                .map_or_else(String::new, |d| d.name.clone());
            return Value::Skipped(name);
        }
        self.read_mapped(struct_index, usize::from(variant), depth + 1)
    }

    fn weak_marker(&self, target: u32, variant: u16) -> Value {
        if target == NO_INDEX {
            return Value::Null;
        }
        let name = self
            .view
            .structs()
            .get(target as usize)
            .map_or("?", |d| d.name.as_str());
        Value::WeakPtr(format!("{name}[{variant}]"))
    }
}

fn scalar(data: &[u8], pos: &mut usize, width: usize, decode: impl Fn(&[u8]) -> Value) -> Value {
    match read_bytes(data, pos, width) {
        Some(raw) => decode(raw),
        None => Value::Null,
    }
}

fn opt_int(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Int)
}

fn opt_uint(value: Option<u64>) -> Value {
    value.map_or(Value::Null, Value::UInt)
}

/// Take `width` bytes at the cursor, advancing it; `None` past the end of
/// the buffer, in which case the cursor does not move and the current
/// record is effectively abandoned.
fn read_bytes<'a>(data: &'a [u8], pos: &mut usize, width: usize) -> Option<&'a [u8]> {
    let raw = data.get(*pos..*pos + width)?;
    *pos += width;
    Some(raw)
}
