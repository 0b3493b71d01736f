//! Decoding tests against synthetic database buffers.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::cast_possible_truncation)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use starforge_forge::testkit::DbBuilder;
use starforge_forge::{ForgeView, InstanceReader, Value};

const GUID_A: [u8; 16] = [
    0x78, 0x56, 0x34, 0x12, 0xCD, 0xAB, 0x01, 0xEF, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77,
    0x88,
];

/// Two mapped `Thing` instances exercising every pointer kind, a `Leaf`
/// run targeted by class arrays, and a `Holder` with pool-backed arrays.
fn rich_database() -> ForgeView {
    let mut db = DbBuilder::new(6);

    let leaf = db.add_struct("Leaf", None, 4, &[("value", 0x000B, 0, 0)]);
    let thing = db.add_struct(
        "Thing",
        None,
        72,
        &[
            ("count", 0x0004, 0, 0),
            ("title", 0x000A, 0, 0),
            ("leaf", 0x0010, 0, leaf as u16),
            ("tags", 0x0006, 1, 0),
            ("next", 0x0110, 0, 0),
            ("buddy", 0x0210, 0, 0),
            ("target", 0x0310, 0, 0),
            ("ident", 0x000E, 0, 0),
        ],
    );
    let holder = db.add_struct(
        "Holder",
        None,
        16,
        &[
            ("leaves", 0x0010, 1, leaf as u16),
            ("labels", 0x000A, 1, 0),
        ],
    );
    let _orphan = db.add_struct("Orphan", None, 4, &[("gone", 0x0004, 0, 0)]);

    db.add_mapping(thing, 2);
    db.add_mapping(leaf, 2);
    db.add_mapping(holder, 1);

    db.add_record("thing_a", "libs/foo/thing.xml", thing, GUID_A, 0);

    // Thing[0]
    let alpha = db.intern_data("Alpha");
    let first_tag = db.pool_uint8(7);
    db.pool_uint8(8);
    db.pool_uint8(9);
    db.data.extend_from_slice(&42i32.to_le_bytes());
    db.data.extend_from_slice(&alpha.to_le_bytes());
    db.data.extend_from_slice(&1.5f32.to_le_bytes());
    db.push_array(3, first_tag);
    db.push_pointer(thing as u32, 1);
    db.push_pointer(leaf as u32, 1);
    db.push_reference(GUID_A);
    db.data.extend_from_slice(&GUID_A);

    // Thing[1]
    let beta = db.intern_data("Beta");
    db.data.extend_from_slice(&7i32.to_le_bytes());
    db.data.extend_from_slice(&beta.to_le_bytes());
    db.data.extend_from_slice(&2.5f32.to_le_bytes());
    db.push_array(0, 0);
    db.push_null_pointer();
    db.push_null_pointer();
    db.push_reference([0u8; 16]);
    db.data.extend_from_slice(&[0u8; 16]);

    // Leaf[0], Leaf[1]
    db.data.extend_from_slice(&10.0f32.to_le_bytes());
    db.data.extend_from_slice(&20.0f32.to_le_bytes());

    // Holder[0]
    let first_label = db.pool_string("x");
    db.pool_string("y");
    db.push_array(2, 0);
    db.push_array(2, first_label);

    ForgeView::parse(db.build()).expect("synthetic database parses")
}

#[test]
fn schema_and_record_names_resolve() {
    let view = rich_database();
    assert_eq!(view.version(), 6);
    assert_eq!(view.find_struct("Thing"), Some(1));
    assert_eq!(view.find_struct("Nope"), None);

    let record = &view.records()[0];
    assert_eq!(record.name, "thing_a");
    assert_eq!(record.file_name, "libs/foo/thing.xml");
    assert_eq!(record.struct_index, 1);
    assert_eq!(
        record.guid.to_string(),
        "12345678-abcd-ef01-1122-334455667788"
    );
}

#[test]
fn instance_tree_decodes_every_edge_kind() {
    let view = rich_database();
    let reader = InstanceReader::new(&view);
    let thing = view.find_struct("Thing").unwrap();

    let root = reader.read(thing, 0);
    assert_eq!(root.type_name(), Some("Thing"));
    assert_eq!(root.field("count").unwrap().as_i64(), Some(42));
    assert_eq!(root.field("title").unwrap().as_str(), Some("Alpha"));
    assert_eq!(root.path(&["leaf", "value"]).unwrap().as_f64(), Some(1.5));

    let tags: Vec<u64> = root
        .field("tags")
        .unwrap()
        .items()
        .filter_map(Value::as_u64)
        .collect();
    assert_eq!(tags, vec![7, 8, 9]);

    // Strong pointer chased into the pointee's mapped run.
    let next = root.field("next").unwrap();
    assert_eq!(next.type_name(), Some("Thing"));
    assert_eq!(next.field("title").unwrap().as_str(), Some("Beta"));
    assert_eq!(next.path(&["leaf", "value"]).unwrap().as_f64(), Some(2.5));
    assert!(next.field("next").unwrap().is_null());

    // Weak pointers are symbolic; null pointers decode as absent.
    assert_eq!(
        root.field("buddy").unwrap(),
        &Value::WeakPtr("Leaf[1]".into())
    );
    assert!(next.field("buddy").unwrap().is_null());

    assert_eq!(
        root.field("target").unwrap().as_guid().unwrap().to_string(),
        "12345678-abcd-ef01-1122-334455667788"
    );
    assert!(
        root.field("ident")
            .unwrap()
            .as_guid()
            .unwrap()
            .to_string()
            .starts_with("12345678")
    );
}

#[test]
fn class_and_string_arrays_read_from_pools() {
    let view = rich_database();
    let reader = InstanceReader::new(&view);
    let holder = view.find_struct("Holder").unwrap();

    let root = reader.read(holder, 0);
    let leaves: Vec<f64> = root
        .field("leaves")
        .unwrap()
        .items()
        .filter_map(|v| v.path(&["value"]).and_then(Value::as_f64))
        .collect();
    assert_eq!(leaves, vec![10.0, 20.0]);

    let labels: Vec<&str> = root
        .field("labels")
        .unwrap()
        .items()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(labels, vec!["x", "y"]);
}

#[test]
fn depth_bound_skips_but_keeps_alignment() {
    let view = rich_database();
    let reader = InstanceReader::new(&view).with_max_depth(0);
    let thing = view.find_struct("Thing").unwrap();

    let root = reader.read(thing, 0);
    assert_eq!(root.field("leaf").unwrap(), &Value::Skipped("Leaf".into()));
    assert_eq!(root.field("next").unwrap(), &Value::Skipped("Thing".into()));
    // Fields after the skipped class still land on their exact offsets.
    let tags: Vec<u64> = root
        .field("tags")
        .unwrap()
        .items()
        .filter_map(Value::as_u64)
        .collect();
    assert_eq!(tags, vec![7, 8, 9]);
}

#[test]
fn array_cap_truncates_corrupt_counts() {
    let view = rich_database();
    let reader = InstanceReader::new(&view).with_array_cap(2);
    let thing = view.find_struct("Thing").unwrap();

    let root = reader.read(thing, 0);
    assert_eq!(root.field("tags").unwrap().items().count(), 2);
}

#[test]
fn unmapped_struct_reads_as_absent() {
    let view = rich_database();
    let reader = InstanceReader::new(&view);
    let orphan = view.find_struct("Orphan").unwrap();
    assert!(reader.read(orphan, 0).is_null());
}

#[test]
fn strong_pointer_cycles_terminate_within_the_bound() {
    let mut db = DbBuilder::new(6);
    let node = db.add_struct("Node", None, 8, &[("next", 0x0110, 0, 0)]);
    db.add_mapping(node, 2);
    db.push_pointer(node as u32, 1);
    db.push_pointer(node as u32, 0);

    let view = ForgeView::parse(db.build()).unwrap();
    let reader = InstanceReader::new(&view).with_max_depth(4);

    let mut current = reader.read(node, 0);
    let mut hops = 0;
    loop {
        match current.field("next") {
            Some(Value::Skipped(name)) => {
                assert_eq!(name.as_str(), "Node");
                break;
            }
            Some(next @ Value::Object(_)) => {
                hops += 1;
                assert!(hops <= 4, "cycle was not cut by the depth bound");
                current = next.clone();
            }
            other => panic!("unexpected edge: {other:?}"),
        }
    }
    assert_eq!(hops, 4);
}

#[test]
fn parent_properties_come_first() {
    let mut db = DbBuilder::new(6);
    let base = db.add_struct("Base", None, 4, &[("base_field", 0x0004, 0, 0)]);
    let derived = db.add_struct("Derived", Some(base), 8, &[("own_field", 0x0004, 0, 0)]);
    db.add_mapping(derived, 1);
    db.data.extend_from_slice(&11i32.to_le_bytes());
    db.data.extend_from_slice(&22i32.to_le_bytes());

    let view = ForgeView::parse(db.build()).unwrap();
    let reader = InstanceReader::new(&view);
    let root = reader.read(derived, 0);

    let names: Vec<&str> = root
        .as_object()
        .unwrap()
        .fields
        .iter()
        .map(|(k, _)| k.as_str())
        .collect();
    assert_eq!(names, vec!["base_field", "own_field"]);
    assert_eq!(root.field("base_field").unwrap().as_i64(), Some(11));
    assert_eq!(root.field("own_field").unwrap().as_i64(), Some(22));
}

#[test]
fn unknown_tags_advance_conservatively() {
    let mut db = DbBuilder::new(6);
    let odd = db.add_struct(
        "Odd",
        None,
        8,
        &[("weird", 0x00AA, 0, 0), ("after", 0x0004, 0, 0)],
    );
    db.add_mapping(odd, 1);
    db.data.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    db.data.extend_from_slice(&99i32.to_le_bytes());

    let view = ForgeView::parse(db.build()).unwrap();
    let root = InstanceReader::new(&view).read(odd, 0);
    assert!(root.field("weird").unwrap().is_null());
    assert_eq!(root.field("after").unwrap().as_i64(), Some(99));
}

#[test]
fn v5_database_has_one_string_table_for_everything() {
    let mut db = DbBuilder::new(5);
    let simple = db.add_struct("Simple", None, 4, &[("num", 0x0004, 0, 0)]);
    db.add_mapping(simple, 1);
    db.add_record("simple_rec", "libs/simple.xml", simple, GUID_A, 0);
    db.data.extend_from_slice(&1234i32.to_le_bytes());

    let view = ForgeView::parse(db.build()).unwrap();
    assert_eq!(view.version(), 5);
    assert_eq!(view.structs()[0].name, "Simple");
    assert_eq!(view.records()[0].file_name, "libs/simple.xml");

    let root = InstanceReader::new(&view).read(simple, 0);
    assert_eq!(root.field("num").unwrap().as_i64(), Some(1234));
}

#[test]
fn pre_v5_databases_use_narrow_data_mappings() {
    let mut db = DbBuilder::new(4);
    let simple = db.add_struct("Simple", None, 4, &[("num", 0x0004, 0, 0)]);
    db.add_mapping(simple, 1);
    db.data.extend_from_slice(&77i32.to_le_bytes());

    let view = ForgeView::parse(db.build()).unwrap();
    assert_eq!(view.version(), 4);
    assert_eq!(view.mappings().len(), 1);
    assert_eq!(view.mappings()[0].struct_count, 1);

    let root = InstanceReader::new(&view).read(simple, 0);
    assert_eq!(root.field("num").unwrap().as_i64(), Some(77));
}

#[test]
fn unsupported_version_is_rejected() {
    let db = DbBuilder::new(9);
    assert!(ForgeView::parse(db.build()).is_err());
}

#[derive(Debug, Clone)]
enum Scalar {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Scalar {
    fn tag(&self) -> u16 {
        match self {
            Self::Bool(_) => 0x0001,
            Self::I8(_) => 0x0002,
            Self::I16(_) => 0x0003,
            Self::I32(_) => 0x0004,
            Self::I64(_) => 0x0005,
            Self::U8(_) => 0x0006,
            Self::U16(_) => 0x0007,
            Self::U32(_) => 0x0008,
            Self::U64(_) => 0x0009,
            Self::F32(_) => 0x000B,
            Self::F64(_) => 0x000C,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::Bool(v) => out.push(u8::from(*v)),
            Self::I8(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::I16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::I32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::I64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::U8(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::U64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::F32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::F64(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }

    fn expected(&self) -> Value {
        match self {
            Self::Bool(v) => Value::Bool(*v),
            Self::I8(v) => Value::Int(i64::from(*v)),
            Self::I16(v) => Value::Int(i64::from(*v)),
            Self::I32(v) => Value::Int(i64::from(*v)),
            Self::I64(v) => Value::Int(*v),
            Self::U8(v) => Value::UInt(u64::from(*v)),
            Self::U16(v) => Value::UInt(u64::from(*v)),
            Self::U32(v) => Value::UInt(u64::from(*v)),
            Self::U64(v) => Value::UInt(*v),
            Self::F32(v) => Value::Float(f64::from(*v)),
            Self::F64(v) => Value::Float(*v),
        }
    }
}

fn scalar_strategy() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        any::<bool>().prop_map(Scalar::Bool),
        any::<i8>().prop_map(Scalar::I8),
        any::<i16>().prop_map(Scalar::I16),
        any::<i32>().prop_map(Scalar::I32),
        any::<i64>().prop_map(Scalar::I64),
        any::<u8>().prop_map(Scalar::U8),
        any::<u16>().prop_map(Scalar::U16),
        any::<u32>().prop_map(Scalar::U32),
        any::<u64>().prop_map(Scalar::U64),
        any::<i16>().prop_map(|v| Scalar::F32(f32::from(v))),
        any::<i32>().prop_map(|v| Scalar::F64(f64::from(v))),
    ]
}

proptest! {
    /// Reading an inline property advances the cursor by exactly the tag's
    /// footprint: any slack or overshoot corrupts every later field.
    #[test]
    fn inline_reads_advance_exactly(scalars in prop::collection::vec(scalar_strategy(), 1..24)) {
        let mut db = DbBuilder::new(6);
        let names: Vec<String> = (0..scalars.len()).map(|i| format!("f{i}")).collect();
        let props: Vec<(&str, u16, u16, u16)> = names
            .iter()
            .zip(&scalars)
            .map(|(name, s)| (name.as_str(), s.tag(), 0, 0))
            .collect();

        let mut body = Vec::new();
        for s in &scalars {
            s.encode(&mut body);
        }
        let mixed = db.add_struct("Mixed", None, body.len() as u32, &props);
        db.add_mapping(mixed, 1);
        db.data.extend_from_slice(&body);

        let view = ForgeView::parse(db.build()).unwrap();
        let root = InstanceReader::new(&view).read(mixed, 0);
        for (name, scalar) in names.iter().zip(&scalars) {
            prop_assert_eq!(root.field(name).unwrap(), &scalar.expected());
        }
    }
}
