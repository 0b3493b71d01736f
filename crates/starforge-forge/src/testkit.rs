//! Synthetic database assembly for tests.
//!
//! Builds byte-exact database buffers without an archive: callers declare
//! schema, pools and records, append raw instance bytes to the data region
//! and get back a buffer that [`crate::ForgeView::parse`] accepts. Gated
//! behind the `testkit` feature so downstream crates can use it from their
//! dev-dependencies.

use crate::defs::NO_INDEX;

const SECOND_TABLE_VERSION: u32 = 6;

#[derive(Default)]
struct PoolBytes {
    bytes: Vec<u8>,
    count: u32,
}

impl PoolBytes {
    fn push(&mut self, raw: &[u8]) -> u32 {
        let index = self.count;
        self.bytes.extend_from_slice(raw);
        self.count += 1;
        index
    }
}

struct StructSpec {
    name_offset: u32,
    parent_index: i32,
    attribute_count: u16,
    first_attribute_index: u16,
    struct_size: u32,
}

struct PropertySpec {
    name_offset: u32,
    struct_index: u16,
    data_type: u16,
    conversion: u16,
}

struct RecordSpec {
    name_offset: u32,
    file_name_offset: u32,
    struct_index: i32,
    guid: [u8; 16],
    instance_index: u16,
    struct_size: u16,
}

/// Property declaration for [`DbBuilder::add_struct`]:
/// `(name, data_type_tag, conversion, pointee_struct_index)`.
pub type PropDecl<'a> = (&'a str, u16, u16, u16);

/// Incremental builder for a synthetic database buffer.
pub struct DbBuilder {
    version: u32,
    table1: Vec<u8>,
    table2: Vec<u8>,
    structs: Vec<StructSpec>,
    properties: Vec<PropertySpec>,
    mappings: Vec<(u32, u32)>,
    records: Vec<RecordSpec>,
    int8: PoolBytes,
    int16: PoolBytes,
    int32: PoolBytes,
    int64: PoolBytes,
    uint8: PoolBytes,
    uint16: PoolBytes,
    uint32: PoolBytes,
    uint64: PoolBytes,
    boolean: PoolBytes,
    single: PoolBytes,
    double: PoolBytes,
    guid: PoolBytes,
    string_id: PoolBytes,
    locale: PoolBytes,
    enum_value: PoolBytes,
    strong: PoolBytes,
    weak: PoolBytes,
    reference: PoolBytes,
    enum_option: PoolBytes,
    /// Raw data region; callers append instance bytes in mapping order.
    pub data: Vec<u8>,
}

impl DbBuilder {
    /// Start a builder for the given format version.
    pub fn new(version: u32) -> Self {
        Self {
            version,
            table1: vec![0],
            table2: vec![0],
            structs: Vec::new(),
            properties: Vec::new(),
            mappings: Vec::new(),
            records: Vec::new(),
            int8: PoolBytes::default(),
            int16: PoolBytes::default(),
            int32: PoolBytes::default(),
            int64: PoolBytes::default(),
            uint8: PoolBytes::default(),
            uint16: PoolBytes::default(),
            uint32: PoolBytes::default(),
            uint64: PoolBytes::default(),
            boolean: PoolBytes::default(),
            single: PoolBytes::default(),
            double: PoolBytes::default(),
            guid: PoolBytes::default(),
            string_id: PoolBytes::default(),
            locale: PoolBytes::default(),
            enum_value: PoolBytes::default(),
            strong: PoolBytes::default(),
            weak: PoolBytes::default(),
            reference: PoolBytes::default(),
            enum_option: PoolBytes::default(),
            data: Vec::new(),
        }
    }

    /// Intern a string into the data table (#1), returning its offset.
    pub fn intern_data(&mut self, s: &str) -> u32 {
        Self::intern(&mut self.table1, s)
    }

    fn intern_schema(&mut self, s: &str) -> u32 {
        if self.version >= SECOND_TABLE_VERSION {
            Self::intern(&mut self.table2, s)
        } else {
            Self::intern(&mut self.table1, s)
        }
    }

    fn intern(table: &mut Vec<u8>, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        let offset = table.len() as u32;
        table.extend_from_slice(s.as_bytes());
        table.push(0);
        offset
    }

    /// Declare a struct and its own properties; returns the struct index.
    pub fn add_struct(
        &mut self,
        name: &str,
        parent: Option<usize>,
        struct_size: u32,
        props: &[PropDecl<'_>],
    ) -> usize {
        let name_offset = self.intern_schema(name);
        let first_attribute_index = self.properties.len() as u16;
        for &(prop_name, data_type, conversion, struct_index) in props {
            let prop_name_offset = self.intern_schema(prop_name);
            self.properties.push(PropertySpec {
                name_offset: prop_name_offset,
                struct_index,
                data_type,
                conversion,
            });
        }
        self.structs.push(StructSpec {
            name_offset,
            parent_index: parent.map_or(-1, |p| p as i32),
            attribute_count: props.len() as u16,
            first_attribute_index,
            struct_size,
        });
        self.structs.len() - 1
    }

    /// Declare a data mapping.
    pub fn add_mapping(&mut self, struct_index: usize, count: u32) {
        self.mappings.push((count, struct_index as u32));
    }

    /// Declare a record.
    pub fn add_record(
        &mut self,
        name: &str,
        file_name: &str,
        struct_index: usize,
        guid: [u8; 16],
        instance_index: u16,
    ) {
        let name_offset = self.intern_schema(name);
        let file_name_offset = self.intern_data(file_name);
        let struct_size = self.structs[struct_index].struct_size as u16;
        self.records.push(RecordSpec {
            name_offset,
            file_name_offset,
            struct_index: struct_index as i32,
            guid,
            instance_index,
            struct_size,
        });
    }

    /// Push a uint8 pool element, returning its index.
    pub fn pool_uint8(&mut self, v: u8) -> u32 {
        self.uint8.push(&[v])
    }

    /// Push an int32 pool element, returning its index.
    pub fn pool_int32(&mut self, v: i32) -> u32 {
        self.int32.push(&v.to_le_bytes())
    }

    /// Push a single pool element, returning its index.
    pub fn pool_single(&mut self, v: f32) -> u32 {
        self.single.push(&v.to_le_bytes())
    }

    /// Push a string pool element, returning its index.
    pub fn pool_string(&mut self, s: &str) -> u32 {
        let offset = self.intern_data(s);
        self.string_id.push(&offset.to_le_bytes())
    }

    /// Push a strong-pointer pool element, returning its index.
    pub fn pool_strong(&mut self, struct_index: u32, variant: u16) -> u32 {
        let mut raw = [0u8; 8];
        raw[..4].copy_from_slice(&struct_index.to_le_bytes());
        raw[4..6].copy_from_slice(&variant.to_le_bytes());
        self.strong.push(&raw)
    }

    /// Push a weak-pointer pool element, returning its index.
    pub fn pool_weak(&mut self, struct_index: u32, variant: u16) -> u32 {
        let mut raw = [0u8; 8];
        raw[..4].copy_from_slice(&struct_index.to_le_bytes());
        raw[4..6].copy_from_slice(&variant.to_le_bytes());
        self.weak.push(&raw)
    }

    /// Push a reference pool element, returning its index.
    pub fn pool_reference(&mut self, guid: [u8; 16]) -> u32 {
        let mut raw = [0u8; 20];
        raw[4..].copy_from_slice(&guid);
        self.reference.push(&raw)
    }

    /// Append an inline strong/weak pointer to the data region.
    pub fn push_pointer(&mut self, struct_index: u32, variant: u16) {
        self.data.extend_from_slice(&struct_index.to_le_bytes());
        self.data.extend_from_slice(&variant.to_le_bytes());
        self.data.extend_from_slice(&[0u8; 2]);
    }

    /// Append an inline null pointer to the data region.
    pub fn push_null_pointer(&mut self) {
        self.push_pointer(NO_INDEX, 0);
    }

    /// Append an inline reference (tag + GUID) to the data region.
    pub fn push_reference(&mut self, guid: [u8; 16]) {
        self.data.extend_from_slice(&[0u8; 4]);
        self.data.extend_from_slice(&guid);
    }

    /// Append an array header `(count, first_index)` to the data region.
    pub fn push_array(&mut self, count: u32, first: u32) {
        self.data.extend_from_slice(&count.to_le_bytes());
        self.data.extend_from_slice(&first.to_le_bytes());
    }

    /// Assemble the buffer.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&[0u8; 4]); // signature
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&[0u8; 8]); // reserved

        let counters = [
            self.structs.len() as u32,
            self.properties.len() as u32,
            0, // enum definitions
            self.mappings.len() as u32,
            self.records.len() as u32,
            self.boolean.count,
            self.int8.count,
            self.int16.count,
            self.int32.count,
            self.int64.count,
            self.uint8.count,
            self.uint16.count,
            self.uint32.count,
            self.uint64.count,
            self.single.count,
            self.double.count,
            self.guid.count,
            self.string_id.count,
            self.locale.count,
            self.enum_value.count,
            self.strong.count,
            self.weak.count,
            self.reference.count,
            self.enum_option.count,
        ];
        for counter in counters {
            out.extend_from_slice(&counter.to_le_bytes());
        }
        out.extend_from_slice(&(self.table1.len() as u32).to_le_bytes());
        if self.version >= SECOND_TABLE_VERSION {
            out.extend_from_slice(&(self.table2.len() as u32).to_le_bytes());
        }

        for s in &self.structs {
            out.extend_from_slice(&s.name_offset.to_le_bytes());
            out.extend_from_slice(&s.parent_index.to_le_bytes());
            out.extend_from_slice(&s.attribute_count.to_le_bytes());
            out.extend_from_slice(&s.first_attribute_index.to_le_bytes());
            out.extend_from_slice(&s.struct_size.to_le_bytes());
        }
        for p in &self.properties {
            out.extend_from_slice(&p.name_offset.to_le_bytes());
            out.extend_from_slice(&p.struct_index.to_le_bytes());
            out.extend_from_slice(&p.data_type.to_le_bytes());
            out.extend_from_slice(&p.conversion.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes()); // padding
        }
        for &(count, index) in &self.mappings {
            if self.version >= 5 {
                out.extend_from_slice(&count.to_le_bytes());
                out.extend_from_slice(&index.to_le_bytes());
            } else {
                out.extend_from_slice(&(count as u16).to_le_bytes());
                out.extend_from_slice(&(index as u16).to_le_bytes());
            }
        }
        for r in &self.records {
            out.extend_from_slice(&(r.name_offset as i32).to_le_bytes());
            out.extend_from_slice(&(r.file_name_offset as i32).to_le_bytes());
            out.extend_from_slice(&r.struct_index.to_le_bytes());
            out.extend_from_slice(&r.guid);
            out.extend_from_slice(&r.instance_index.to_le_bytes());
            out.extend_from_slice(&r.struct_size.to_le_bytes());
        }

        // Pools in their fixed layout order.
        for pool in [
            &self.int8,
            &self.int16,
            &self.int32,
            &self.int64,
            &self.uint8,
            &self.uint16,
            &self.uint32,
            &self.uint64,
            &self.boolean,
            &self.single,
            &self.double,
            &self.guid,
            &self.string_id,
            &self.locale,
            &self.enum_value,
            &self.strong,
            &self.weak,
            &self.reference,
            &self.enum_option,
        ] {
            out.extend_from_slice(&pool.bytes);
        }

        out.extend_from_slice(&self.table1);
        if self.version >= SECOND_TABLE_VERSION {
            out.extend_from_slice(&self.table2);
        }
        out.extend_from_slice(&self.data);
        out
    }
}
