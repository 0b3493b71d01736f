//! Decoded value trees.
//!
//! The instance reader produces these instead of a dynamic "anything" map:
//! extractors pattern-match on the variants, and the whole tree renders to
//! JSON for the `game_data` blob carried on every extracted row.

use serde_json::json;

use crate::guid::Guid;

/// One decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (missing struct, out-of-range read, null pointer)
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Any signed integer width
    Int(i64),
    /// Any unsigned integer width
    UInt(u64),
    /// Single or double precision float
    Float(f64),
    /// String, locale token or enum choice resolved through the string table
    String(String),
    /// Inline GUID value
    Guid(Guid),
    /// Array property
    Array(Vec<Value>),
    /// Nested struct instance
    Object(ObjectNode),
    /// Weak pointer, never followed: `StructName[variant]`
    WeakPtr(String),
    /// GUID reference to another record, resolved by the caller
    Ref(Guid),
    /// Nested instance cut by the depth bound; carries the struct name
    Skipped(String),
}

/// A decoded struct instance: type tag plus fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    /// Resolved struct name
    pub type_name: String,
    /// Field name/value pairs, parent fields first
    pub fields: Vec<(String, Value)>,
}

impl ObjectNode {
    /// Field lookup: exact name first, then case-insensitive.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
            })
            .map(|(_, v)| v)
    }
}

impl Value {
    /// The struct name of an object or skipped node.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Object(node) => Some(&node.type_name),
            Self::Skipped(name) => Some(name),
            _ => None,
        }
    }

    /// Object view of this value.
    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Self::Object(node) => Some(node),
            _ => None,
        }
    }

    /// Field of an object value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|node| node.field(name))
    }

    /// Walk a chain of object fields.
    pub fn path(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(self, |value, name| value.field(name))
    }

    /// Array items, or an empty iterator for any other variant.
    pub fn items(&self) -> std::slice::Iter<'_, Value> {
        match self {
            Self::Array(items) => items.iter(),
            _ => [].iter(),
        }
    }

    /// Whether the value is the absent marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Boolean view.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Lossy numeric view over every scalar width.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::UInt(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view truncated to f32, the native width of most game stats.
    pub fn as_f32(&self) -> Option<f32> {
        self.as_f64().map(|v| v as f32)
    }

    /// Signed integer view.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Unsigned integer view.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            Self::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// String view (strings, locale tokens, enum choices).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// GUID view over inline GUIDs and references.
    pub fn as_guid(&self) -> Option<Guid> {
        match self {
            Self::Guid(g) | Self::Ref(g) => Some(*g),
            _ => None,
        }
    }

    /// Render to JSON for the `game_data` blob.
    ///
    /// Objects keep their type under `__type`; pointer and depth markers use
    /// the `__weakPtr`, `__ref` and `__skipped` keys so downstream consumers
    /// can tell them from plain data.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => json!(b),
            Self::Int(v) => json!(v),
            Self::UInt(v) => json!(v),
            Self::Float(v) => json!(v),
            Self::String(s) => json!(s),
            Self::Guid(g) => json!(g.to_string()),
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Object(node) => {
                let mut map = serde_json::Map::with_capacity(node.fields.len() + 1);
                map.insert("__type".into(), json!(node.type_name));
                for (name, value) in &node.fields {
                    map.insert(name.clone(), value.to_json());
                }
                serde_json::Value::Object(map)
            }
            Self::WeakPtr(target) => json!({ "__weakPtr": target }),
            Self::Ref(guid) => json!({ "__ref": guid.to_string() }),
            Self::Skipped(type_name) => json!({ "__type": type_name, "__skipped": true }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::Object(ObjectNode {
            type_name: "SampleParams".into(),
            fields: vec![
                ("Size".into(), Value::Int(4)),
                ("Health".into(), Value::Float(1250.0)),
                (
                    "Tags".into(),
                    Value::Array(vec![Value::String("a".into()), Value::String("b".into())]),
                ),
                (
                    "Nested".into(),
                    Value::Object(ObjectNode {
                        type_name: "Inner".into(),
                        fields: vec![("speed".into(), Value::Float(2.5))],
                    }),
                ),
            ],
        })
    }

    #[test]
    fn field_lookup_is_case_insensitive_fallback() {
        let v = sample();
        assert_eq!(v.field("Size").unwrap().as_i64(), Some(4));
        assert_eq!(v.field("size").unwrap().as_i64(), Some(4));
        assert!(v.field("missing").is_none());
    }

    #[test]
    fn path_walks_nested_objects() {
        let v = sample();
        assert_eq!(v.path(&["Nested", "speed"]).unwrap().as_f64(), Some(2.5));
        assert!(v.path(&["Nested", "missing"]).is_none());
    }

    #[test]
    fn json_rendering_tags_objects_and_markers() {
        let json = sample().to_json();
        assert_eq!(json["__type"], "SampleParams");
        assert_eq!(json["Tags"][1], "b");
        assert_eq!(json["Nested"]["speed"], 2.5);

        let skipped = Value::Skipped("Deep".into()).to_json();
        assert_eq!(skipped["__skipped"], true);

        let weak = Value::WeakPtr("Thing[3]".into()).to_json();
        assert_eq!(weak["__weakPtr"], "Thing[3]");
    }

    #[test]
    fn items_is_empty_for_scalars() {
        assert_eq!(Value::Int(1).items().count(), 0);
        assert_eq!(sample().field("Tags").unwrap().items().count(), 2);
    }
}
